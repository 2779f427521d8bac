//! Star ratings, one per (client address, movie).
use anyhow::{Context as _, Result};
use serde::Deserialize;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::models::RatingStar;

/// The raw `add-rating` form. Every field is optional so that validation,
/// not extraction, decides the response.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RatingForm {
    #[serde(default)]
    pub movie: Option<String>,
    #[serde(default)]
    pub star: Option<String>,
}

/// Why a rating submission was rejected.
#[derive(Debug, Error)]
pub(crate) enum RatingError {
    #[error("missing field `{0}`")]
    Missing(&'static str),
    #[error("field `{field}` must be an integer id, got {value:?}")]
    Malformed { field: &'static str, value: String },
    #[error("no published movie with id {0}")]
    UnknownMovie(i64),
    #[error("no rating star with id {0}")]
    UnknownStar(i64),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// A validated rating submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Rating {
    pub movie_id: i64,
    pub star_id: i64,
}

fn parse_id(field: &'static str, value: Option<&str>) -> Result<i64, RatingError> {
    let value = value.map(str::trim).filter(|v| !v.is_empty());
    let value = value.ok_or(RatingError::Missing(field))?;

    value.parse().map_err(|_| RatingError::Malformed {
        field,
        value: value.to_owned(),
    })
}

impl RatingForm {
    /// Check that both referenced rows exist.
    pub(crate) async fn validate(&self, db: &SqlitePool) -> Result<Rating, RatingError> {
        let movie_id = parse_id("movie", self.movie.as_deref())?;
        let star_id = parse_id("star", self.star.as_deref())?;

        let movie: Option<i64> =
            sqlx::query_scalar("SELECT id FROM movie WHERE id = ? AND draft = 0")
                .bind(movie_id)
                .fetch_optional(db)
                .await
                .context("failed to look up movie")?;
        if movie.is_none() {
            return Err(RatingError::UnknownMovie(movie_id));
        }

        let star: Option<i64> = sqlx::query_scalar("SELECT id FROM rating_star WHERE id = ?")
            .bind(star_id)
            .fetch_optional(db)
            .await
            .context("failed to look up rating star")?;
        if star.is_none() {
            return Err(RatingError::UnknownStar(star_id));
        }

        Ok(Rating { movie_id, star_id })
    }
}

/// Create the rating for `(ip, movie)` or overwrite its star.
///
/// The store's unique `(ip, movie_id)` index arbitrates concurrent submissions.
pub(crate) async fn upsert(db: &SqlitePool, ip: &str, rating: Rating) -> Result<()> {
    _ = sqlx::query(
        "INSERT INTO rating (ip, movie_id, star_id)
            VALUES (?, ?, ?)
            ON CONFLICT (ip, movie_id) DO UPDATE SET
                star_id = excluded.star_id",
    )
    .bind(ip)
    .bind(rating.movie_id)
    .bind(rating.star_id)
    .execute(db)
    .await
    .context("failed to store rating")?;

    Ok(())
}

/// The star value `ip` gave `movie_id`, if any.
pub(crate) async fn user_stars(db: &SqlitePool, ip: &str, movie_id: i64) -> Result<Option<i64>> {
    sqlx::query_scalar(
        "SELECT s.value FROM rating r
            INNER JOIN rating_star s ON s.id = r.star_id
            WHERE r.ip = ? AND r.movie_id = ?",
    )
    .bind(ip)
    .bind(movie_id)
    .fetch_optional(db)
    .await
    .context("failed to fetch user rating")
}

/// Rating stars, highest first.
pub(crate) async fn stars(db: &SqlitePool) -> Result<Vec<RatingStar>> {
    sqlx::query_as::<_, RatingStar>("SELECT id, value FROM rating_star ORDER BY value DESC")
        .fetch_all(db)
        .await
        .context("failed to fetch rating stars")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::fixtures::movie, db::memory_pool};

    fn form(movie: &str, star: &str) -> RatingForm {
        RatingForm {
            movie: Some(movie.to_owned()),
            star: Some(star.to_owned()),
        }
    }

    #[tokio::test]
    async fn second_submission_overwrites() {
        let db = memory_pool().await.unwrap();
        let id = movie(&db, "Heat", 1995, false).await;

        let first = form(&id.to_string(), "2").validate(&db).await.unwrap();
        upsert(&db, "10.0.0.1", first).await.unwrap();
        let second = form(&id.to_string(), "5").validate(&db).await.unwrap();
        upsert(&db, "10.0.0.1", second).await.unwrap();
        upsert(&db, "10.0.0.2", first).await.unwrap();

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rating WHERE ip = '10.0.0.1'")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(rows, 1);
        assert_eq!(user_stars(&db, "10.0.0.1", id).await.unwrap(), Some(5));
        assert_eq!(user_stars(&db, "10.0.0.2", id).await.unwrap(), Some(2));
        assert_eq!(user_stars(&db, "10.0.0.3", id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn invalid_submissions_are_rejected() {
        let db = memory_pool().await.unwrap();
        let id = movie(&db, "Heat", 1995, false).await;
        let draft = movie(&db, "Unreleased", 2030, true).await;

        let missing = RatingForm {
            movie: Some(id.to_string()),
            star: None,
        };
        assert!(matches!(
            missing.validate(&db).await,
            Err(RatingError::Missing("star"))
        ));
        assert!(matches!(
            form("heat", "1").validate(&db).await,
            Err(RatingError::Malformed { field: "movie", .. })
        ));
        assert!(matches!(
            form("9999", "1").validate(&db).await,
            Err(RatingError::UnknownMovie(9999))
        ));
        assert!(matches!(
            form(&draft.to_string(), "1").validate(&db).await,
            Err(RatingError::UnknownMovie(_))
        ));
        assert!(matches!(
            form(&id.to_string(), "42").validate(&db).await,
            Err(RatingError::UnknownStar(42))
        ));
    }

    #[tokio::test]
    async fn stars_descend() {
        let db = memory_pool().await.unwrap();
        let values: Vec<i64> = stars(&db).await.unwrap().iter().map(|s| s.value).collect();
        assert_eq!(values, [5, 4, 3, 2, 1]);
    }
}
