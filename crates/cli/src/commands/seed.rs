//! Demo catalog seeding.
//!
//! Inserts a small category tree and a handful of products so a fresh
//! install has something to browse. Re-running is safe; rows are keyed on
//! their slugs.

use super::{CommandError, connect};

const CATEGORIES: &[(&str, &str, &str)] = &[
    ("Fruit", "fruit", "Fresh orchard fruit"),
    ("Preserves", "preserves", "Jams, jellies and chutneys"),
    ("Juice", "juice", "Pressed and bottled on site"),
];

const PRODUCTS: &[(&str, &str, &str, &str, &str, i32)] = &[
    (
        "Honeycrisp Apples",
        "honeycrisp-apples",
        "Crisp, sweet-tart apples picked at peak season.",
        "fruit",
        "4.99",
        120,
    ),
    (
        "Bartlett Pears",
        "bartlett-pears",
        "Classic buttery pears, great for eating fresh or poaching.",
        "fruit",
        "3.49",
        80,
    ),
    (
        "Apple Butter",
        "apple-butter",
        "Slow-cooked apple butter with cinnamon and clove.",
        "preserves",
        "7.50",
        40,
    ),
    (
        "Sour Cherry Jam",
        "sour-cherry-jam",
        "Small-batch jam from Montmorency cherries.",
        "preserves",
        "8.25",
        35,
    ),
    (
        "Fresh Apple Cider",
        "fresh-apple-cider",
        "Unfiltered cider pressed from a blend of orchard apples.",
        "juice",
        "6.00",
        60,
    ),
];

/// Seed demo categories and products.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or an insert
/// fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Seeding categories...");
    for (name, slug, description) in CATEGORIES {
        sqlx::query(
            "INSERT INTO categories (name, slug, description)
             VALUES ($1, $2, $3)
             ON CONFLICT (slug) DO NOTHING",
        )
        .bind(name)
        .bind(slug)
        .bind(description)
        .execute(&pool)
        .await?;
    }

    tracing::info!("Seeding products...");
    for (name, slug, description, category_slug, price, stock) in PRODUCTS {
        sqlx::query(
            "INSERT INTO products (name, slug, description, category_id, price, count_in_stock)
             SELECT $1, $2, $3, c.id, $5::NUMERIC, $6
             FROM categories c WHERE c.slug = $4
             ON CONFLICT (slug) DO NOTHING",
        )
        .bind(name)
        .bind(slug)
        .bind(description)
        .bind(category_slug)
        .bind(price)
        .bind(stock)
        .execute(&pool)
        .await?;
    }

    tracing::info!("Seeding complete!");
    Ok(())
}
