use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use super::{not_found, validated};
use crate::{
    AppState, Db, Result,
    auth::AdminUser,
    models::{ACTOR_COLUMNS, Actor, ActorInput},
};

async fn list(_admin: AdminUser, State(db): State<Db>) -> Result<Json<Vec<Actor>>> {
    let actors = sqlx::query_as::<_, Actor>(&format!(
        "SELECT {ACTOR_COLUMNS} FROM actor a ORDER BY a.name"
    ))
    .fetch_all(&db)
    .await?;

    Ok(Json(actors))
}

async fn get_one(
    _admin: AdminUser,
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<Json<Actor>> {
    sqlx::query_as::<_, Actor>(&format!("SELECT {ACTOR_COLUMNS} FROM actor a WHERE a.id = ?"))
        .bind(id)
        .fetch_optional(&db)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("actor", id))
}

async fn create(
    _admin: AdminUser,
    State(db): State<Db>,
    Json(input): Json<ActorInput>,
) -> Result<(StatusCode, Json<Actor>)> {
    let input = validated(input)?;

    let actor = sqlx::query_as::<_, Actor>(
        "INSERT INTO actor (name, age, description, image) VALUES (?, ?, ?, ?)
            RETURNING id, name, age, description, image",
    )
    .bind(&input.name)
    .bind(input.age)
    .bind(&input.description)
    .bind(&input.image)
    .fetch_one(&db)
    .await?;

    Ok((StatusCode::CREATED, Json(actor)))
}

async fn update(
    _admin: AdminUser,
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<ActorInput>,
) -> Result<Json<Actor>> {
    let input = validated(input)?;

    sqlx::query_as::<_, Actor>(
        "UPDATE actor SET name = ?, age = ?, description = ?, image = ? WHERE id = ?
            RETURNING id, name, age, description, image",
    )
    .bind(&input.name)
    .bind(input.age)
    .bind(&input.description)
    .bind(&input.image)
    .bind(id)
    .fetch_optional(&db)
    .await?
    .map(Json)
    .ok_or_else(|| not_found("actor", id))
}

async fn delete(
    _admin: AdminUser,
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let result = sqlx::query("DELETE FROM actor WHERE id = ?")
        .bind(id)
        .execute(&db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(not_found("actor", id));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(get_one).put(update).delete(delete))
}
