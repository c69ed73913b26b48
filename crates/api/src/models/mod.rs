//! Domain models.
//!
//! These structs double as database row types (`sqlx::FromRow`) and API
//! response bodies (serde, camelCase field names to match the storefront
//! client's JSON contract). Pure derived-value computations (cart totals,
//! review aggregates) live next to the types they describe.

pub mod address;
pub mod cart;
pub mod category;
pub mod order;
pub mod payment;
pub mod product;
pub mod review;
pub mod user;

pub use address::Address;
pub use cart::{Cart, CartItem, CartProduct, CartTotals};
pub use category::Category;
pub use order::{Order, OrderItem, OrderPage, PaymentResult};
pub use payment::{Payment, PaymentPage};
pub use product::{Product, ProductPage};
pub use review::{RatingSummary, Review};
pub use user::User;
