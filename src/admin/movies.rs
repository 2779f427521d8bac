//! Movie management, including drafts and bulk publication.
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};
use tracing::info;

use super::{not_found, validated};
use crate::{
    AppState, Db, Result,
    auth::AdminUser,
    catalog::{self, MovieDetail, escape_like},
    models::{MOVIE_COLUMNS, Movie, MovieInput, Review},
};

#[derive(Deserialize)]
struct MovieFilter {
    category: Option<i64>,
    draft: Option<bool>,
    year: Option<i64>,
    /// Matched against title, description and category name.
    q: Option<String>,
}

#[derive(Serialize, FromRow)]
struct MovieRow {
    #[serde(flatten)]
    #[sqlx(flatten)]
    movie: Movie,
    category_name: Option<String>,
}

/// The admin view of a movie: drafts included, with its reviews inline.
#[derive(Serialize)]
struct MovieAdminView {
    #[serde(flatten)]
    detail: MovieDetail,
    reviews: Vec<Review>,
}

#[derive(Deserialize)]
struct DraftInput {
    draft: bool,
}

#[derive(Deserialize)]
struct BulkInput {
    ids: Vec<i64>,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
struct BulkOutcome {
    updated: u64,
    message: String,
}

impl BulkOutcome {
    fn new(updated: u64) -> Self {
        let message = if updated == 1 {
            "1 record was updated".to_owned()
        } else {
            format!("{updated} records were updated")
        };

        Self { updated, message }
    }
}

async fn fetch(db: &Db, id: i64) -> Result<Movie> {
    sqlx::query_as::<_, Movie>(&format!("SELECT {MOVIE_COLUMNS} FROM movie m WHERE m.id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| not_found("movie", id))
}

/// Replace the genre and credit links of a movie.
async fn set_relations(
    conn: &mut SqliteConnection,
    movie_id: i64,
    input: &MovieInput,
) -> std::result::Result<(), sqlx::Error> {
    let links = [
        ("movie_genre", "genre_id", &input.genres),
        ("movie_director", "actor_id", &input.directors),
        ("movie_actor", "actor_id", &input.actors),
    ];

    for (table, column, ids) in links {
        _ = sqlx::query(&format!("DELETE FROM {table} WHERE movie_id = ?"))
            .bind(movie_id)
            .execute(&mut *conn)
            .await?;

        let mut ids = ids.clone();
        ids.sort_unstable();
        ids.dedup();

        for id in ids {
            _ = sqlx::query(&format!(
                "INSERT INTO {table} (movie_id, {column}) VALUES (?, ?)"
            ))
            .bind(movie_id)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        }
    }

    Ok(())
}

async fn list(
    _admin: AdminUser,
    State(db): State<Db>,
    Query(filter): Query<MovieFilter>,
) -> Result<Json<Vec<MovieRow>>> {
    let mut query: QueryBuilder<'_, Sqlite> = QueryBuilder::new(format!(
        "SELECT {MOVIE_COLUMNS}, c.name AS category_name FROM movie m
            LEFT JOIN category c ON c.id = m.category_id
            WHERE 1 = 1"
    ));

    if let Some(category) = filter.category {
        query.push(" AND m.category_id = ").push_bind(category);
    }
    if let Some(draft) = filter.draft {
        query.push(" AND m.draft = ").push_bind(draft);
    }
    if let Some(year) = filter.year {
        query.push(" AND m.year = ").push_bind(year);
    }
    if let Some(q) = filter.q.as_deref().filter(|q| !q.is_empty()) {
        let pattern = format!("%{}%", escape_like(q));
        query
            .push(r" AND (m.title LIKE ")
            .push_bind(pattern.clone())
            .push(r" ESCAPE '\' OR m.description LIKE ")
            .push_bind(pattern.clone())
            .push(r" ESCAPE '\' OR c.name LIKE ")
            .push_bind(pattern)
            .push(r" ESCAPE '\')");
    }

    query.push(" ORDER BY m.id");

    let rows = query.build_query_as::<MovieRow>().fetch_all(&db).await?;
    Ok(Json(rows))
}

async fn get_one(
    _admin: AdminUser,
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<Json<MovieAdminView>> {
    let movie = fetch(&db, id).await?;
    let detail = catalog::movie_detail(&db, movie).await?;

    let reviews = sqlx::query_as::<_, Review>(
        "SELECT id, name, email, text, parent_id, movie_id, created_at FROM reviews
            WHERE movie_id = ?
            ORDER BY id",
    )
    .bind(id)
    .fetch_all(&db)
    .await?;

    Ok(Json(MovieAdminView { detail, reviews }))
}

async fn create(
    _admin: AdminUser,
    State(db): State<Db>,
    Json(input): Json<MovieInput>,
) -> Result<(StatusCode, Json<Movie>)> {
    let input = validated(input)?;
    let mut tx = db.begin().await?;

    let movie = sqlx::query_as::<_, Movie>(
        "INSERT INTO movie (title, tagline, description, poster, year, country, category_id, url, draft)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, title, tagline, description, poster, year, country, category_id, url, draft",
    )
    .bind(&input.title)
    .bind(&input.tagline)
    .bind(&input.description)
    .bind(&input.poster)
    .bind(input.year)
    .bind(&input.country)
    .bind(input.category_id)
    .bind(&input.url)
    .bind(input.draft)
    .fetch_one(&mut *tx)
    .await?;

    set_relations(&mut tx, movie.id, &input).await?;
    tx.commit().await?;

    info!(movie = movie.id, url = %movie.url, "movie created");
    Ok((StatusCode::CREATED, Json(movie)))
}

async fn update(
    _admin: AdminUser,
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<MovieInput>,
) -> Result<Json<Movie>> {
    let input = validated(input)?;
    let mut tx = db.begin().await?;

    let movie = sqlx::query_as::<_, Movie>(
        "UPDATE movie SET title = ?, tagline = ?, description = ?, poster = ?, year = ?,
                country = ?, category_id = ?, url = ?, draft = ?
            WHERE id = ?
            RETURNING id, title, tagline, description, poster, year, country, category_id, url, draft",
    )
    .bind(&input.title)
    .bind(&input.tagline)
    .bind(&input.description)
    .bind(&input.poster)
    .bind(input.year)
    .bind(&input.country)
    .bind(input.category_id)
    .bind(&input.url)
    .bind(input.draft)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| not_found("movie", id))?;

    set_relations(&mut tx, movie.id, &input).await?;
    tx.commit().await?;

    Ok(Json(movie))
}

async fn set_draft(
    _admin: AdminUser,
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<DraftInput>,
) -> Result<Json<Movie>> {
    let result = sqlx::query("UPDATE movie SET draft = ? WHERE id = ?")
        .bind(input.draft)
        .bind(id)
        .execute(&db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(not_found("movie", id));
    }
    Ok(Json(fetch(&db, id).await?))
}

/// Set the draft flag on every listed movie.
async fn bulk_set_draft(db: &Db, ids: &[i64], draft: bool) -> Result<BulkOutcome> {
    if ids.is_empty() {
        return Ok(BulkOutcome::new(0));
    }

    let mut query: QueryBuilder<'_, Sqlite> = QueryBuilder::new("UPDATE movie SET draft = ");
    query.push_bind(draft).push(" WHERE id IN (");
    let mut list = query.separated(", ");
    for id in ids {
        list.push_bind(*id);
    }
    list.push_unseparated(")");

    let result = query.build().execute(db).await?;
    info!(draft, updated = result.rows_affected(), "bulk draft update");

    Ok(BulkOutcome::new(result.rows_affected()))
}

async fn publish(
    _admin: AdminUser,
    State(db): State<Db>,
    Json(input): Json<BulkInput>,
) -> Result<Json<BulkOutcome>> {
    Ok(Json(bulk_set_draft(&db, &input.ids, false).await?))
}

async fn unpublish(
    _admin: AdminUser,
    State(db): State<Db>,
    Json(input): Json<BulkInput>,
) -> Result<Json<BulkOutcome>> {
    Ok(Json(bulk_set_draft(&db, &input.ids, true).await?))
}

async fn delete(
    _admin: AdminUser,
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let result = sqlx::query("DELETE FROM movie WHERE id = ?")
        .bind(id)
        .execute(&db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(not_found("movie", id));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[rustfmt::skip]
pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/",           get(list).post(create))
        .route("/publish",    post(publish))
        .route("/unpublish",  post(unpublish))
        .route("/{id}",       get(get_one).put(update).delete(delete))
        .route("/{id}/draft", patch(set_draft))
}
