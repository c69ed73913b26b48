//! Catalog product routes, including the nested review-creation endpoint.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use orchard_core::{CategoryId, ProductId, Slug};

use crate::db::RepositoryError;
use crate::db::categories::CategoryRepository;
use crate::db::products::{
    NewProduct, ProductChanges, ProductFilter, ProductRepository, ProductSort, SortOrder,
};
use crate::db::reviews::ReviewRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{Product, ProductPage, RatingSummary};
use crate::routes::or_not_found;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/top", get(top_products))
        .route("/featured", get(featured_products))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/{id}/reviews", post(create_product_review))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    page_number: Option<i64>,
    keyword: Option<String>,
    category: Option<CategoryId>,
    brand: Option<String>,
    price_min: Option<Decimal>,
    price_max: Option<Decimal>,
    sort_by: Option<String>,
    sort_order: Option<String>,
}

/// `GET /api/products` - paginated, filtered product listing.
async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ProductPage>> {
    let filter = ProductFilter {
        keyword: query.keyword,
        category: query.category,
        brand: query.brand,
        price_min: query.price_min,
        price_max: query.price_max,
        sort_by: query.sort_by.as_deref().map(ProductSort::parse).unwrap_or_default(),
        sort_order: query
            .sort_order
            .as_deref()
            .map(SortOrder::parse)
            .unwrap_or_default(),
    };

    let page = ProductRepository::new(state.pool())
        .list(&filter, query.page_number.unwrap_or(1))
        .await?;
    Ok(Json(page))
}

/// `GET /api/products/top` - five best rated products.
async fn top_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).top(5).await?;
    Ok(Json(products))
}

#[derive(Debug, Deserialize)]
struct FeaturedQuery {
    count: Option<i64>,
}

/// `GET /api/products/featured` - featured products, default 8.
async fn featured_products(
    State(state): State<AppState>,
    Query(query): Query<FeaturedQuery>,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool())
        .featured(query.count.unwrap_or(8))
        .await?;
    Ok(Json(products))
}

/// `GET /api/products/{id}` - single product.
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await
        .map_err(|e| or_not_found(e, "Product not found"))?;
    Ok(Json(product))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateProductRequest {
    name: String,
    price: Decimal,
    description: String,
    rich_description: Option<String>,
    #[serde(default)]
    images: Vec<String>,
    brand: Option<String>,
    category: CategoryId,
    #[serde(default)]
    count_in_stock: i32,
    #[serde(default)]
    is_featured: bool,
    #[serde(default = "default_attributes")]
    attributes: serde_json::Value,
}

fn default_attributes() -> serde_json::Value {
    json!({})
}

/// `POST /api/products` - create a product (admin).
async fn create_product(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    let slug = Slug::from_name(&body.name)
        .map_err(|_| AppError::BadRequest("Invalid product data".to_owned()))?;

    CategoryRepository::new(state.pool())
        .get(body.category)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::BadRequest("Invalid category".to_owned()),
            other => other.into(),
        })?;

    let product = ProductRepository::new(state.pool())
        .create(&NewProduct {
            name: &body.name,
            slug: &slug,
            description: &body.description,
            rich_description: body.rich_description.as_deref(),
            images: &body.images,
            brand: body.brand.as_deref(),
            price: body.price,
            category_id: body.category,
            count_in_stock: body.count_in_stock,
            is_featured: body.is_featured,
            attributes: &body.attributes,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                AppError::BadRequest("Product with this name already exists".to_owned())
            }
            other => other.into(),
        })?;

    Ok((StatusCode::CREATED, Json(product)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProductRequest {
    name: Option<String>,
    price: Option<Decimal>,
    description: Option<String>,
    rich_description: Option<String>,
    images: Option<Vec<String>>,
    brand: Option<String>,
    category: Option<CategoryId>,
    count_in_stock: Option<i32>,
    is_featured: Option<bool>,
    is_active: Option<bool>,
    attributes: Option<serde_json::Value>,
    discount_price: Option<Decimal>,
    discount_percentage: Option<Decimal>,
}

/// `PUT /api/products/{id}` - partial product update (admin). A new name
/// also rewrites the slug.
async fn update_product(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<Product>> {
    if let Some(category) = body.category {
        CategoryRepository::new(state.pool())
            .get(category)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AppError::BadRequest("Invalid category".to_owned()),
                other => other.into(),
            })?;
    }

    let slug = match body.name.as_deref() {
        Some(name) => Some(
            Slug::from_name(name)
                .map_err(|_| AppError::BadRequest("Invalid product data".to_owned()))?,
        ),
        None => None,
    };

    let product = ProductRepository::new(state.pool())
        .update(
            id,
            &ProductChanges {
                name: body.name.as_deref(),
                slug: slug.as_ref(),
                description: body.description.as_deref(),
                rich_description: body.rich_description.as_deref(),
                images: body.images.as_deref(),
                brand: body.brand.as_deref(),
                price: body.price,
                category_id: body.category,
                count_in_stock: body.count_in_stock,
                is_featured: body.is_featured,
                is_active: body.is_active,
                attributes: body.attributes.as_ref(),
                discount_price: body.discount_price,
                discount_percentage: body.discount_percentage,
            },
        )
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                AppError::BadRequest("Product with this name already exists".to_owned())
            }
            other => or_not_found(other, "Product not found"),
        })?;

    Ok(Json(product))
}

/// `DELETE /api/products/{id}` - delete a product (admin).
async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<serde_json::Value>> {
    ProductRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| or_not_found(e, "Product not found"))?;
    Ok(Json(json!({ "message": "Product removed" })))
}

#[derive(Debug, Deserialize)]
struct CreateReviewRequest {
    rating: i32,
    title: String,
    comment: String,
}

/// `POST /api/products/{id}/reviews` - review a product, then recompute its
/// rating aggregate.
async fn create_product_review(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ProductId>,
    Json(body): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    if !(1..=5).contains(&body.rating) {
        return Err(AppError::BadRequest(
            "Rating must be between 1 and 5".to_owned(),
        ));
    }

    let products = ProductRepository::new(state.pool());
    products
        .get(id)
        .await
        .map_err(|e| or_not_found(e, "Product not found"))?;

    let reviews = ReviewRepository::new(state.pool());
    reviews
        .create(user.id, id, body.rating, &body.title, &body.comment)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                AppError::BadRequest("Product already reviewed".to_owned())
            }
            other => other.into(),
        })?;

    let ratings = reviews.ratings_for_product(id).await?;
    products.set_rating(id, RatingSummary::of(&ratings)).await?;

    Ok((StatusCode::CREATED, Json(json!({ "message": "Review added" }))))
}
