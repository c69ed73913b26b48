//! Review routes. Listing and reads are public; mutations belong to the
//! review's author or an admin and always recompute the product's rating
//! aggregate.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use orchard_core::{ProductId, ReviewId, UserId};

use crate::db::RepositoryError;
use crate::db::products::ProductRepository;
use crate::db::reviews::ReviewRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{RatingSummary, Review};
use crate::routes::or_not_found;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reviews).post(create_review))
        .route(
            "/{id}",
            get(get_review).put(update_review).delete(delete_review),
        )
        .route("/{id}/approve", put(approve_review))
}

fn validate_rating(rating: i32) -> Result<()> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "Rating must be between 1 and 5".to_owned(),
        ))
    }
}

/// Recompute and store a product's derived rating fields.
async fn refresh_product_rating(state: &AppState, product_id: ProductId) -> Result<()> {
    let ratings = ReviewRepository::new(state.pool())
        .ratings_for_product(product_id)
        .await?;
    ProductRepository::new(state.pool())
        .set_rating(product_id, RatingSummary::of(&ratings))
        .await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    product: Option<ProductId>,
    user: Option<UserId>,
}

/// `GET /api/reviews` - reviews, optionally filtered by product or author.
async fn list_reviews(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Review>>> {
    let reviews = ReviewRepository::new(state.pool())
        .list(query.product, query.user)
        .await?;
    Ok(Json(reviews))
}

/// `GET /api/reviews/{id}` - single review.
async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<ReviewId>,
) -> Result<Json<Review>> {
    let review = ReviewRepository::new(state.pool())
        .get(id)
        .await
        .map_err(|e| or_not_found(e, "Review not found"))?;
    Ok(Json(review))
}

#[derive(Debug, Deserialize)]
struct CreateReviewRequest {
    product: ProductId,
    rating: i32,
    title: String,
    comment: String,
}

/// `POST /api/reviews` - review a product.
async fn create_review(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>)> {
    validate_rating(body.rating)?;

    ProductRepository::new(state.pool())
        .get(body.product)
        .await
        .map_err(|e| or_not_found(e, "Product not found"))?;

    let review = ReviewRepository::new(state.pool())
        .create(user.id, body.product, body.rating, &body.title, &body.comment)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                AppError::BadRequest("Product already reviewed".to_owned())
            }
            other => other.into(),
        })?;

    refresh_product_rating(&state, body.product).await?;

    Ok((StatusCode::CREATED, Json(review)))
}

#[derive(Debug, Deserialize)]
struct UpdateReviewRequest {
    rating: Option<i32>,
    title: Option<String>,
    comment: Option<String>,
}

/// `PUT /api/reviews/{id}` - update a review, author or admin.
async fn update_review(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ReviewId>,
    Json(body): Json<UpdateReviewRequest>,
) -> Result<Json<Review>> {
    if let Some(rating) = body.rating {
        validate_rating(rating)?;
    }

    let repo = ReviewRepository::new(state.pool());
    let existing = repo
        .get(id)
        .await
        .map_err(|e| or_not_found(e, "Review not found"))?;

    if existing.user_id != user.id && !user.is_admin {
        return Err(AppError::Unauthorized("Not authorized".to_owned()));
    }

    let review = repo
        .update(id, body.rating, body.title.as_deref(), body.comment.as_deref())
        .await
        .map_err(|e| or_not_found(e, "Review not found"))?;

    refresh_product_rating(&state, review.product_id).await?;

    Ok(Json(review))
}

/// `DELETE /api/reviews/{id}` - delete a review, author or admin.
async fn delete_review(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ReviewId>,
) -> Result<Json<serde_json::Value>> {
    let repo = ReviewRepository::new(state.pool());
    let existing = repo
        .get(id)
        .await
        .map_err(|e| or_not_found(e, "Review not found"))?;

    if existing.user_id != user.id && !user.is_admin {
        return Err(AppError::Unauthorized("Not authorized".to_owned()));
    }

    repo.delete(id)
        .await
        .map_err(|e| or_not_found(e, "Review not found"))?;

    refresh_product_rating(&state, existing.product_id).await?;

    Ok(Json(json!({ "message": "Review removed" })))
}

/// `PUT /api/reviews/{id}/approve` - approve a review (admin).
async fn approve_review(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<ReviewId>,
) -> Result<Json<Review>> {
    let review = ReviewRepository::new(state.pool())
        .approve(id)
        .await
        .map_err(|e| or_not_found(e, "Review not found"))?;
    Ok(Json(review))
}
