//! Review and rating moderation, plus the rating star scale.
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, put},
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::info;

use super::{not_found, validated};
use crate::{
    AppState, Db, Result,
    auth::AdminUser,
    models::{RatingStar, RatingStarInput, Review},
};

#[derive(Deserialize)]
struct MovieScope {
    movie: Option<i64>,
}

#[derive(Serialize, FromRow)]
struct RatingEntry {
    id: i64,
    ip: String,
    movie_id: i64,
    movie_title: String,
    star: i64,
}

async fn list_reviews(
    _admin: AdminUser,
    State(db): State<Db>,
    Query(scope): Query<MovieScope>,
) -> Result<Json<Vec<Review>>> {
    let reviews = sqlx::query_as::<_, Review>(
        "SELECT id, name, email, text, parent_id, movie_id, created_at FROM reviews
            WHERE ?1 IS NULL OR movie_id = ?1
            ORDER BY id DESC",
    )
    .bind(scope.movie)
    .fetch_all(&db)
    .await?;

    Ok(Json(reviews))
}

async fn get_review(
    _admin: AdminUser,
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<Json<Review>> {
    sqlx::query_as::<_, Review>(
        "SELECT id, name, email, text, parent_id, movie_id, created_at FROM reviews WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&db)
    .await?
    .map(Json)
    .ok_or_else(|| not_found("review", id))
}

/// Remove a review. Its replies stay, detached from the thread.
async fn delete_review(
    _admin: AdminUser,
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let result = sqlx::query("DELETE FROM reviews WHERE id = ?")
        .bind(id)
        .execute(&db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(not_found("review", id));
    }
    info!(review = id, "review removed");
    Ok(StatusCode::NO_CONTENT)
}

async fn list_ratings(
    _admin: AdminUser,
    State(db): State<Db>,
    Query(scope): Query<MovieScope>,
) -> Result<Json<Vec<RatingEntry>>> {
    let ratings = sqlx::query_as::<_, RatingEntry>(
        "SELECT r.id, r.ip, r.movie_id, m.title AS movie_title, s.value AS star
            FROM rating r
            INNER JOIN movie m ON m.id = r.movie_id
            INNER JOIN rating_star s ON s.id = r.star_id
            WHERE ?1 IS NULL OR r.movie_id = ?1
            ORDER BY r.id",
    )
    .bind(scope.movie)
    .fetch_all(&db)
    .await?;

    Ok(Json(ratings))
}

async fn delete_rating(
    _admin: AdminUser,
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let result = sqlx::query("DELETE FROM rating WHERE id = ?")
        .bind(id)
        .execute(&db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(not_found("rating", id));
    }
    info!(rating = id, "rating removed");
    Ok(StatusCode::NO_CONTENT)
}

async fn list_stars(_admin: AdminUser, State(db): State<Db>) -> Result<Json<Vec<RatingStar>>> {
    let stars =
        sqlx::query_as::<_, RatingStar>("SELECT id, value FROM rating_star ORDER BY value DESC")
            .fetch_all(&db)
            .await?;

    Ok(Json(stars))
}

async fn create_star(
    _admin: AdminUser,
    State(db): State<Db>,
    Json(input): Json<RatingStarInput>,
) -> Result<(StatusCode, Json<RatingStar>)> {
    let input = validated(input)?;

    let star = sqlx::query_as::<_, RatingStar>(
        "INSERT INTO rating_star (value) VALUES (?) RETURNING id, value",
    )
    .bind(input.value)
    .fetch_one(&db)
    .await?;

    Ok((StatusCode::CREATED, Json(star)))
}

async fn update_star(
    _admin: AdminUser,
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<RatingStarInput>,
) -> Result<Json<RatingStar>> {
    let input = validated(input)?;

    sqlx::query_as::<_, RatingStar>(
        "UPDATE rating_star SET value = ? WHERE id = ? RETURNING id, value",
    )
    .bind(input.value)
    .bind(id)
    .fetch_optional(&db)
    .await?
    .map(Json)
    .ok_or_else(|| not_found("rating star", id))
}

/// Remove a star from the scale, along with every rating that used it.
async fn delete_star(
    _admin: AdminUser,
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let result = sqlx::query("DELETE FROM rating_star WHERE id = ?")
        .bind(id)
        .execute(&db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(not_found("rating star", id));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[rustfmt::skip]
pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/reviews",      get(list_reviews))
        .route("/reviews/{id}", get(get_review).delete(delete_review))
        .route("/ratings",      get(list_ratings))
        .route("/ratings/{id}", delete(delete_rating))
        .route("/stars",        get(list_stars).post(create_star))
        .route("/stars/{id}",   put(update_star).delete(delete_star))
}
