//! Catalog category routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use orchard_core::{CategoryId, Slug};

use crate::db::RepositoryError;
use crate::db::categories::CategoryRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::Category;
use crate::routes::or_not_found;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
}

/// `GET /api/categories` - all categories, name ascending.
async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(Json(categories))
}

/// `GET /api/categories/{id}` - single category.
async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Category>> {
    let category = CategoryRepository::new(state.pool())
        .get(id)
        .await
        .map_err(|e| or_not_found(e, "Category not found"))?;
    Ok(Json(category))
}

#[derive(Debug, Deserialize)]
struct CreateCategoryRequest {
    name: String,
    description: Option<String>,
    image: Option<String>,
    parent: Option<CategoryId>,
}

/// `POST /api/categories` - create a category (admin).
async fn create_category(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(body): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>)> {
    let slug = Slug::from_name(&body.name)
        .map_err(|_| AppError::BadRequest("Invalid category data".to_owned()))?;

    let category = CategoryRepository::new(state.pool())
        .create(
            &body.name,
            &slug,
            body.description.as_deref(),
            body.image.as_deref(),
            body.parent,
        )
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                AppError::BadRequest("Category with this name already exists".to_owned())
            }
            RepositoryError::NotFound => {
                AppError::BadRequest("Parent category not found".to_owned())
            }
            other => other.into(),
        })?;

    Ok((StatusCode::CREATED, Json(category)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateCategoryRequest {
    name: Option<String>,
    description: Option<String>,
    image: Option<String>,
    parent: Option<CategoryId>,
    is_active: Option<bool>,
}

/// `PUT /api/categories/{id}` - partial category update (admin). A new
/// name also rewrites the slug.
async fn update_category(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<CategoryId>,
    Json(body): Json<UpdateCategoryRequest>,
) -> Result<Json<Category>> {
    let repo = CategoryRepository::new(state.pool());

    if let Some(parent) = body.parent {
        repo.get(parent).await.map_err(|e| match e {
            RepositoryError::NotFound => {
                AppError::BadRequest("Parent category not found".to_owned())
            }
            other => other.into(),
        })?;
    }

    let slug = match body.name.as_deref() {
        Some(name) => Some(
            Slug::from_name(name)
                .map_err(|_| AppError::BadRequest("Invalid category data".to_owned()))?,
        ),
        None => None,
    };

    let category = repo
        .update(
            id,
            body.name.as_deref(),
            slug.as_ref(),
            body.description.as_deref(),
            body.image.as_deref(),
            body.parent,
            body.is_active,
        )
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                AppError::BadRequest("Category with this name already exists".to_owned())
            }
            other => or_not_found(other, "Category not found"),
        })?;

    Ok(Json(category))
}

/// `DELETE /api/categories/{id}` - delete a category (admin).
async fn delete_category(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<CategoryId>,
) -> Result<Json<serde_json::Value>> {
    CategoryRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| or_not_found(e, "Category not found"))?;
    Ok(Json(json!({ "message": "Category removed" })))
}
