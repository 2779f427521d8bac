//! Public catalog queries: listings, filters, search and detail pages.
//!
//! Listings, filters, search and slug lookups only ever yield published movies
//! (`draft = 0`).
use anyhow::{Context as _, Result};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use thiserror::Error;

use crate::models::{ACTOR_COLUMNS, Actor, Category, Genre, MOVIE_COLUMNS, Movie, MovieShot};

/// A malformed filter query parameter.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("query parameter `{key}` must be an integer, got {value:?}")]
pub(crate) struct FilterParseError {
    key: &'static str,
    value: String,
}

/// Which filters a listing request asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FilterCriteria {
    /// Neither `year` nor `genre` was supplied: every published movie.
    Unfiltered,
    Years(Vec<i64>),
    Genres(Vec<i64>),
    /// Both were supplied, and a movie must match both.
    YearsAndGenres { years: Vec<i64>, genres: Vec<i64> },
}

impl FilterCriteria {
    pub(crate) fn new(years: Vec<i64>, genres: Vec<i64>) -> Self {
        match (years.is_empty(), genres.is_empty()) {
            (true, true) => Self::Unfiltered,
            (false, true) => Self::Years(years),
            (true, false) => Self::Genres(genres),
            (false, false) => Self::YearsAndGenres { years, genres },
        }
    }

    /// Parse the repeatable `year` and `genre` parameters out of a raw query string.
    ///
    /// Empty values are ignored; other keys are ignored.
    pub(crate) fn from_query(query: Option<&str>) -> Result<Self, FilterParseError> {
        let mut years = Vec::new();
        let mut genres = Vec::new();

        for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            let (key, target) = match &*key {
                "year" => ("year", &mut years),
                "genre" => ("genre", &mut genres),
                _ => continue,
            };

            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            let parsed = value.parse::<i64>().map_err(|_| FilterParseError {
                key,
                value: value.to_owned(),
            })?;
            target.push(parsed);
        }

        Ok(Self::new(years, genres))
    }

    fn years(&self) -> &[i64] {
        match self {
            Self::Years(years) | Self::YearsAndGenres { years, .. } => years,
            Self::Unfiltered | Self::Genres(_) => &[],
        }
    }

    fn genres(&self) -> &[i64] {
        match self {
            Self::Genres(genres) | Self::YearsAndGenres { genres, .. } => genres,
            Self::Unfiltered | Self::Years(_) => &[],
        }
    }
}

/// Sidebar context shared by the listing and detail pages.
#[derive(Debug, Serialize)]
pub(crate) struct Sidebar {
    pub genres: Vec<Genre>,
    /// Distinct years of published movies, ascending.
    pub years: Vec<i64>,
}

/// A movie with all of its relations resolved.
#[derive(Debug, Serialize)]
pub(crate) struct MovieDetail {
    #[serde(flatten)]
    pub movie: Movie,
    pub category: Option<Category>,
    pub genres: Vec<Genre>,
    pub directors: Vec<Actor>,
    pub actors: Vec<Actor>,
    pub shots: Vec<MovieShot>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ActorDetail {
    #[serde(flatten)]
    pub actor: Actor,
    /// Published movies this person acted in or directed.
    pub movies: Vec<Movie>,
}

pub(crate) async fn sidebar(db: &SqlitePool) -> Result<Sidebar> {
    let genres =
        sqlx::query_as::<_, Genre>("SELECT id, name, description, url FROM genre ORDER BY id")
            .fetch_all(db)
            .await
            .context("failed to fetch genres")?;

    let years = sqlx::query_scalar::<_, i64>(
        "SELECT DISTINCT year FROM movie WHERE draft = 0 ORDER BY year",
    )
    .fetch_all(db)
    .await
    .context("failed to fetch years")?;

    Ok(Sidebar { genres, years })
}

pub(crate) async fn list_published(db: &SqlitePool) -> Result<Vec<Movie>> {
    filter(db, &FilterCriteria::Unfiltered).await
}

/// Published movies matching the criteria. Year and genre filters combine with AND.
pub(crate) async fn filter(db: &SqlitePool, criteria: &FilterCriteria) -> Result<Vec<Movie>> {
    let years = criteria.years();
    let genres = criteria.genres();

    let mut query: QueryBuilder<'_, Sqlite> =
        QueryBuilder::new(format!("SELECT DISTINCT {MOVIE_COLUMNS} FROM movie m"));

    if !genres.is_empty() {
        query.push(" INNER JOIN movie_genre mg ON mg.movie_id = m.id");
    }

    query.push(" WHERE m.draft = 0");

    if !years.is_empty() {
        query.push(" AND m.year IN (");
        let mut list = query.separated(", ");
        for year in years {
            list.push_bind(*year);
        }
        list.push_unseparated(")");
    }

    if !genres.is_empty() {
        query.push(" AND mg.genre_id IN (");
        let mut list = query.separated(", ");
        for genre in genres {
            list.push_bind(*genre);
        }
        list.push_unseparated(")");
    }

    query.push(" ORDER BY m.id");

    query
        .build_query_as::<Movie>()
        .fetch_all(db)
        .await
        .context("failed to filter movies")
}

/// Escape `LIKE` wildcards so the needle matches literally.
pub(crate) fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Case-insensitive substring search over published movie titles.
///
/// Case is folded with Unicode rules, so non-Latin titles match too.
pub(crate) async fn search(db: &SqlitePool, needle: &str) -> Result<Vec<Movie>> {
    let needle = needle.to_lowercase();
    let movies = list_published(db)
        .await
        .context("failed to search movies")?;

    Ok(movies
        .into_iter()
        .filter(|movie| movie.title.to_lowercase().contains(&needle))
        .collect())
}

/// Look up a published movie by its slug.
pub(crate) async fn published_by_slug(db: &SqlitePool, slug: &str) -> Result<Option<Movie>> {
    sqlx::query_as::<_, Movie>(&format!(
        "SELECT {MOVIE_COLUMNS} FROM movie m WHERE m.url = ? AND m.draft = 0"
    ))
    .bind(slug)
    .fetch_optional(db)
    .await
    .context("failed to fetch movie")
}

/// Look up a published movie by its id.
pub(crate) async fn published_by_id(db: &SqlitePool, id: i64) -> Result<Option<Movie>> {
    sqlx::query_as::<_, Movie>(&format!(
        "SELECT {MOVIE_COLUMNS} FROM movie m WHERE m.id = ? AND m.draft = 0"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
    .context("failed to fetch movie")
}

/// People linked to a movie through one of the `movie_actor` / `movie_director` tables.
async fn credits(db: &SqlitePool, table: &str, movie_id: i64) -> Result<Vec<Actor>> {
    sqlx::query_as::<_, Actor>(&format!(
        "SELECT {ACTOR_COLUMNS} FROM actor a
            INNER JOIN {table} c ON c.actor_id = a.id
            WHERE c.movie_id = ?
            ORDER BY a.id"
    ))
    .bind(movie_id)
    .fetch_all(db)
    .await
    .with_context(|| format!("failed to fetch {table} credits"))
}

/// Resolve every relation of `movie`.
pub(crate) async fn movie_detail(db: &SqlitePool, movie: Movie) -> Result<MovieDetail> {
    let category = match movie.category_id {
        Some(id) => sqlx::query_as::<_, Category>(
            "SELECT id, name, description, url FROM category WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .context("failed to fetch category")?,
        None => None,
    };

    let genres = sqlx::query_as::<_, Genre>(
        "SELECT g.id, g.name, g.description, g.url FROM genre g
            INNER JOIN movie_genre mg ON mg.genre_id = g.id
            WHERE mg.movie_id = ?
            ORDER BY g.id",
    )
    .bind(movie.id)
    .fetch_all(db)
    .await
    .context("failed to fetch genres")?;

    let directors = credits(db, "movie_director", movie.id).await?;
    let actors = credits(db, "movie_actor", movie.id).await?;

    let shots = sqlx::query_as::<_, MovieShot>(
        "SELECT id, title, description, image, movie_id FROM movie_shots
            WHERE movie_id = ?
            ORDER BY id",
    )
    .bind(movie.id)
    .fetch_all(db)
    .await
    .context("failed to fetch movie shots")?;

    Ok(MovieDetail {
        movie,
        category,
        genres,
        directors,
        actors,
        shots,
    })
}

/// Look up an actor by slug, which for actors is their name.
pub(crate) async fn actor_detail(db: &SqlitePool, slug: &str) -> Result<Option<ActorDetail>> {
    let Some(actor) = sqlx::query_as::<_, Actor>(&format!(
        "SELECT {ACTOR_COLUMNS} FROM actor a WHERE a.name = ?"
    ))
    .bind(slug)
    .fetch_optional(db)
    .await
    .context("failed to fetch actor")?
    else {
        return Ok(None);
    };

    let movies = sqlx::query_as::<_, Movie>(&format!(
        "SELECT {MOVIE_COLUMNS} FROM movie m
            WHERE m.draft = 0 AND (
                m.id IN (SELECT movie_id FROM movie_actor WHERE actor_id = ?1)
                OR m.id IN (SELECT movie_id FROM movie_director WHERE actor_id = ?1)
            )
            ORDER BY m.year, m.id"
    ))
    .bind(actor.id)
    .fetch_all(db)
    .await
    .context("failed to fetch actor filmography")?;

    Ok(Some(ActorDetail { actor, movies }))
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Row builders shared by the unit tests.
    use sqlx::SqlitePool;

    pub(crate) async fn genre(db: &SqlitePool, name: &str) -> i64 {
        sqlx::query_scalar("INSERT INTO genre (name, url) VALUES (?, ?) RETURNING id")
            .bind(name)
            .bind(name.to_lowercase())
            .fetch_one(db)
            .await
            .unwrap()
    }

    pub(crate) async fn movie(db: &SqlitePool, title: &str, year: i64, draft: bool) -> i64 {
        let slug: String = title
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();

        sqlx::query_scalar(
            "INSERT INTO movie (title, year, url, draft) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(title)
        .bind(year)
        .bind(slug)
        .bind(draft)
        .fetch_one(db)
        .await
        .unwrap()
    }

    pub(crate) async fn tag(db: &SqlitePool, movie: i64, genre: i64) {
        sqlx::query("INSERT INTO movie_genre (movie_id, genre_id) VALUES (?, ?)")
            .bind(movie)
            .bind(genre)
            .execute(db)
            .await
            .unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{genre, movie, tag};
    use super::*;
    use crate::db::memory_pool;

    fn titles(movies: &[Movie]) -> Vec<&str> {
        movies.iter().map(|m| m.title.as_str()).collect()
    }

    #[test]
    fn criteria_from_query() {
        assert_eq!(
            FilterCriteria::from_query(None).unwrap(),
            FilterCriteria::Unfiltered
        );
        assert_eq!(
            FilterCriteria::from_query(Some("year=2020&year=2021&page=3")).unwrap(),
            FilterCriteria::Years(vec![2020, 2021])
        );
        assert_eq!(
            FilterCriteria::from_query(Some("genre=4&year=")).unwrap(),
            FilterCriteria::Genres(vec![4])
        );
        assert_eq!(
            FilterCriteria::from_query(Some("genre=1&year=1999")).unwrap(),
            FilterCriteria::YearsAndGenres {
                years: vec![1999],
                genres: vec![1]
            }
        );
        assert!(FilterCriteria::from_query(Some("year=last")).is_err());
    }

    #[test]
    fn like_escaping() {
        assert_eq!(escape_like("100%_\\"), "100\\%\\_\\\\");
        assert_eq!(escape_like("matrix"), "matrix");
    }

    #[tokio::test]
    async fn filter_combines_with_and() {
        let db = memory_pool().await.unwrap();
        let drama = genre(&db, "Drama").await;
        let comedy = genre(&db, "Comedy").await;

        let a = movie(&db, "A", 2020, false).await;
        let b = movie(&db, "B", 2020, false).await;
        let c = movie(&db, "C", 2019, false).await;
        let d = movie(&db, "D", 2020, true).await;
        tag(&db, a, drama).await;
        tag(&db, a, comedy).await;
        tag(&db, b, comedy).await;
        tag(&db, c, drama).await;
        tag(&db, d, drama).await;

        let both = filter(&db, &FilterCriteria::new(vec![2020], vec![drama]))
            .await
            .unwrap();
        assert_eq!(titles(&both), ["A"]);

        let years = filter(&db, &FilterCriteria::new(vec![2020], vec![]))
            .await
            .unwrap();
        assert_eq!(titles(&years), ["A", "B"]);

        // A movie in several requested genres is listed once.
        let genres = filter(&db, &FilterCriteria::new(vec![], vec![drama, comedy]))
            .await
            .unwrap();
        assert_eq!(titles(&genres), ["A", "B", "C"]);

        let all = filter(&db, &FilterCriteria::Unfiltered).await.unwrap();
        assert_eq!(titles(&all), ["A", "B", "C"]);
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_skips_drafts() {
        let db = memory_pool().await.unwrap();
        movie(&db, "The Matrix", 1999, false).await;
        movie(&db, "matrix reloaded", 2003, false).await;
        movie(&db, "Inception", 2010, false).await;
        movie(&db, "Matrix Resurrections", 2021, true).await;

        let found = search(&db, "MATRIX").await.unwrap();
        assert_eq!(titles(&found), ["The Matrix", "matrix reloaded"]);

        assert!(search(&db, "%").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_folds_non_latin_case() {
        let db = memory_pool().await.unwrap();
        movie(&db, "Матрица", 1999, false).await;
        movie(&db, "Начало", 2010, false).await;

        assert_eq!(titles(&search(&db, "матрица").await.unwrap()), ["Матрица"]);
        assert_eq!(titles(&search(&db, "МАТ").await.unwrap()), ["Матрица"]);
    }

    #[tokio::test]
    async fn sidebar_years_are_distinct_and_published() {
        let db = memory_pool().await.unwrap();
        genre(&db, "Drama").await;
        movie(&db, "A", 2021, false).await;
        movie(&db, "B", 2019, false).await;
        movie(&db, "C", 2021, false).await;
        movie(&db, "D", 2000, true).await;

        let sidebar = sidebar(&db).await.unwrap();
        assert_eq!(sidebar.years, [2019, 2021]);
        assert_eq!(sidebar.genres.len(), 1);
    }

    #[tokio::test]
    async fn drafts_have_no_public_detail() {
        let db = memory_pool().await.unwrap();
        let id = movie(&db, "Hidden", 2020, true).await;

        assert!(published_by_slug(&db, "hidden").await.unwrap().is_none());
        assert!(published_by_id(&db, id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn actor_filmography_includes_directing() {
        let db = memory_pool().await.unwrap();
        let acted = movie(&db, "Acted", 2001, false).await;
        let directed = movie(&db, "Directed", 2000, false).await;
        let hidden = movie(&db, "Hidden", 2002, true).await;

        let actor: i64 =
            sqlx::query_scalar("INSERT INTO actor (name) VALUES ('Keanu') RETURNING id")
                .fetch_one(&db)
                .await
                .unwrap();
        for (table, movie) in [
            ("movie_actor", acted),
            ("movie_director", directed),
            ("movie_actor", hidden),
        ] {
            sqlx::query(&format!(
                "INSERT INTO {table} (movie_id, actor_id) VALUES (?, ?)"
            ))
            .bind(movie)
            .bind(actor)
            .execute(&db)
            .await
            .unwrap();
        }

        let detail = actor_detail(&db, "Keanu").await.unwrap().unwrap();
        assert_eq!(titles(&detail.movies), ["Directed", "Acted"]);

        let movie = published_by_id(&db, acted).await.unwrap().unwrap();
        let detail = movie_detail(&db, movie).await.unwrap();
        assert_eq!(detail.actors.len(), 1);
        assert!(detail.directors.is_empty());

        assert!(actor_detail(&db, "Nobody").await.unwrap().is_none());
    }
}
