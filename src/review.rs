//! Movie reviews and their reply threads.
use std::collections::{HashMap, HashSet};

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::models::Review;

/// The raw review form. Missing fields deserialize as empty and fail validation.
#[derive(Debug, Default, Deserialize, Validate)]
pub(crate) struct ReviewForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 5000))]
    pub text: String,
    /// Id of the review this one replies to.
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Debug, Error)]
pub(crate) enum ReviewError {
    #[error("invalid review: {0}")]
    Invalid(#[from] ValidationErrors),
    #[error("parent {0:?} is not a review id")]
    MalformedParent(String),
    #[error("review {0} is not a review of this movie")]
    UnknownParent(i64),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// A review with its replies, for display.
#[derive(Debug, Serialize)]
pub(crate) struct ReviewNode {
    pub id: i64,
    pub name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub replies: Vec<ReviewNode>,
}

impl ReviewForm {
    fn parent_id(&self) -> Result<Option<i64>, ReviewError> {
        match self.parent.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| ReviewError::MalformedParent(raw.to_owned())),
        }
    }
}

/// Validate `form` and attach it to `movie_id`, returning the new review's id.
pub(crate) async fn submit(
    db: &SqlitePool,
    movie_id: i64,
    form: &ReviewForm,
) -> Result<i64, ReviewError> {
    form.validate()?;
    let parent_id = form.parent_id()?;

    if let Some(parent_id) = parent_id {
        let parent: Option<i64> =
            sqlx::query_scalar("SELECT id FROM reviews WHERE id = ? AND movie_id = ?")
                .bind(parent_id)
                .bind(movie_id)
                .fetch_optional(db)
                .await
                .context("failed to look up parent review")?;
        if parent.is_none() {
            return Err(ReviewError::UnknownParent(parent_id));
        }
    }

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO reviews (email, name, text, parent_id, movie_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id",
    )
    .bind(&form.email)
    .bind(&form.name)
    .bind(&form.text)
    .bind(parent_id)
    .bind(movie_id)
    .bind(Utc::now())
    .fetch_one(db)
    .await
    .context("failed to store review")?;

    Ok(id)
}

/// All reviews of a movie arranged as reply trees, oldest first.
pub(crate) async fn thread(db: &SqlitePool, movie_id: i64) -> Result<Vec<ReviewNode>> {
    let reviews = sqlx::query_as::<_, Review>(
        "SELECT id, name, email, text, parent_id, movie_id, created_at FROM reviews
            WHERE movie_id = ?
            ORDER BY id",
    )
    .bind(movie_id)
    .fetch_all(db)
    .await
    .context("failed to fetch reviews")?;

    Ok(build_thread(reviews))
}

/// Arrange reviews (in id order) under their parents. Reviews whose parent is
/// not in the list become roots.
fn build_thread(reviews: Vec<Review>) -> Vec<ReviewNode> {
    let present: HashSet<i64> = reviews.iter().map(|r| r.id).collect();

    let mut roots = Vec::new();
    let mut children: HashMap<i64, Vec<Review>> = HashMap::new();
    for review in reviews {
        match review.parent_id {
            Some(parent) if present.contains(&parent) => {
                children.entry(parent).or_default().push(review);
            }
            _ => roots.push(review),
        }
    }

    roots
        .into_iter()
        .map(|review| attach(review, &mut children))
        .collect()
}

fn attach(review: Review, children: &mut HashMap<i64, Vec<Review>>) -> ReviewNode {
    let replies = children
        .remove(&review.id)
        .unwrap_or_default()
        .into_iter()
        .map(|reply| attach(reply, children))
        .collect();

    ReviewNode {
        id: review.id,
        name: review.name,
        text: review.text,
        created_at: review.created_at,
        replies,
    }
}
