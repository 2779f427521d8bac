//! Categories and genres share a shape, so they share their handlers.
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Serialize;
use sqlx::{FromRow, sqlite::SqliteRow};

use super::{not_found, validated};
use crate::{
    AppState, Db, Result,
    auth::AdminUser,
    models::{Category, Genre, TaxonomyInput},
};

/// A named, slugged grouping of movies.
pub(super) trait Taxonomy:
    for<'r> FromRow<'r, SqliteRow> + Serialize + Send + Sync + Unpin + 'static
{
    const TABLE: &'static str;
}

impl Taxonomy for Category {
    const TABLE: &'static str = "category";
}

impl Taxonomy for Genre {
    const TABLE: &'static str = "genre";
}

async fn list<T: Taxonomy>(_admin: AdminUser, State(db): State<Db>) -> Result<Json<Vec<T>>> {
    let rows = sqlx::query_as::<_, T>(&format!(
        "SELECT id, name, description, url FROM {} ORDER BY id",
        T::TABLE
    ))
    .fetch_all(&db)
    .await?;

    Ok(Json(rows))
}

async fn get_one<T: Taxonomy>(
    _admin: AdminUser,
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<Json<T>> {
    sqlx::query_as::<_, T>(&format!(
        "SELECT id, name, description, url FROM {} WHERE id = ?",
        T::TABLE
    ))
    .bind(id)
    .fetch_optional(&db)
    .await?
    .map(Json)
    .ok_or_else(|| not_found(T::TABLE, id))
}

async fn create<T: Taxonomy>(
    _admin: AdminUser,
    State(db): State<Db>,
    Json(input): Json<TaxonomyInput>,
) -> Result<(StatusCode, Json<T>)> {
    let input = validated(input)?;

    let row = sqlx::query_as::<_, T>(&format!(
        "INSERT INTO {} (name, description, url) VALUES (?, ?, ?)
            RETURNING id, name, description, url",
        T::TABLE
    ))
    .bind(&input.name)
    .bind(&input.description)
    .bind(&input.url)
    .fetch_one(&db)
    .await?;

    Ok((StatusCode::CREATED, Json(row)))
}

async fn update<T: Taxonomy>(
    _admin: AdminUser,
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<TaxonomyInput>,
) -> Result<Json<T>> {
    let input = validated(input)?;

    sqlx::query_as::<_, T>(&format!(
        "UPDATE {} SET name = ?, description = ?, url = ? WHERE id = ?
            RETURNING id, name, description, url",
        T::TABLE
    ))
    .bind(&input.name)
    .bind(&input.description)
    .bind(&input.url)
    .bind(id)
    .fetch_optional(&db)
    .await?
    .map(Json)
    .ok_or_else(|| not_found(T::TABLE, id))
}

async fn delete<T: Taxonomy>(
    _admin: AdminUser,
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", T::TABLE))
        .bind(id)
        .execute(&db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(not_found(T::TABLE, id));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub(super) fn routes<T: Taxonomy>() -> Router<AppState> {
    Router::new()
        .route("/", get(list::<T>).post(create::<T>))
        .route(
            "/{id}",
            get(get_one::<T>).put(update::<T>).delete(delete::<T>),
        )
}
