use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;

use super::{not_found, validated};
use crate::{
    AppState, Db, Result,
    auth::AdminUser,
    models::{MovieShot, MovieShotInput},
};

#[derive(Deserialize)]
struct ShotFilter {
    movie: Option<i64>,
}

async fn list(
    _admin: AdminUser,
    State(db): State<Db>,
    Query(filter): Query<ShotFilter>,
) -> Result<Json<Vec<MovieShot>>> {
    let shots = sqlx::query_as::<_, MovieShot>(
        "SELECT id, title, description, image, movie_id FROM movie_shots
            WHERE ?1 IS NULL OR movie_id = ?1
            ORDER BY movie_id, id",
    )
    .bind(filter.movie)
    .fetch_all(&db)
    .await?;

    Ok(Json(shots))
}

async fn get_one(
    _admin: AdminUser,
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<Json<MovieShot>> {
    sqlx::query_as::<_, MovieShot>(
        "SELECT id, title, description, image, movie_id FROM movie_shots WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&db)
    .await?
    .map(Json)
    .ok_or_else(|| not_found("movie shot", id))
}

async fn create(
    _admin: AdminUser,
    State(db): State<Db>,
    Json(input): Json<MovieShotInput>,
) -> Result<(StatusCode, Json<MovieShot>)> {
    let input = validated(input)?;

    let shot = sqlx::query_as::<_, MovieShot>(
        "INSERT INTO movie_shots (title, description, image, movie_id) VALUES (?, ?, ?, ?)
            RETURNING id, title, description, image, movie_id",
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.image)
    .bind(input.movie_id)
    .fetch_one(&db)
    .await?;

    Ok((StatusCode::CREATED, Json(shot)))
}

async fn update(
    _admin: AdminUser,
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<MovieShotInput>,
) -> Result<Json<MovieShot>> {
    let input = validated(input)?;

    sqlx::query_as::<_, MovieShot>(
        "UPDATE movie_shots SET title = ?, description = ?, image = ?, movie_id = ? WHERE id = ?
            RETURNING id, title, description, image, movie_id",
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.image)
    .bind(input.movie_id)
    .bind(id)
    .fetch_optional(&db)
    .await?
    .map(Json)
    .ok_or_else(|| not_found("movie shot", id))
}

async fn delete(
    _admin: AdminUser,
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let result = sqlx::query("DELETE FROM movie_shots WHERE id = ?")
        .bind(id)
        .execute(&db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(not_found("movie shot", id));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(get_one).put(update).delete(delete))
}
