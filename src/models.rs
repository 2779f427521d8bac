//! Row types for the catalog tables.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

/// Column list for `movie` rows, aliased as `m`.
pub(crate) const MOVIE_COLUMNS: &str = "m.id, m.title, m.tagline, m.description, m.poster, \
    m.year, m.country, m.category_id, m.url, m.draft";

/// Column list for `actor` rows, aliased as `a`.
pub(crate) const ACTOR_COLUMNS: &str = "a.id, a.name, a.age, a.description, a.image";

#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub(crate) struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub(crate) struct Genre {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub url: String,
}

/// A person credited on a movie, either as an actor or as a director.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub(crate) struct Actor {
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub description: String,
    /// Media path of the actor's photo.
    pub image: String,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub(crate) struct Movie {
    pub id: i64,
    pub title: String,
    pub tagline: String,
    pub description: String,
    /// Media path of the poster.
    pub poster: String,
    pub year: i64,
    pub country: String,
    pub category_id: Option<i64>,
    /// Unique slug.
    pub url: String,
    /// Unpublished movies are hidden from every public view.
    pub draft: bool,
}

impl Movie {
    /// The public detail page of this movie.
    pub(crate) fn absolute_url(&self) -> String {
        format!("/movie/{}", self.url)
    }
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub(crate) struct MovieShot {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image: String,
    pub movie_id: i64,
}

#[derive(Debug, Clone, Copy, Serialize, FromRow, PartialEq, Eq)]
pub(crate) struct RatingStar {
    pub id: i64,
    pub value: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub(crate) struct Review {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub text: String,
    pub parent_id: Option<i64>,
    pub movie_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Slugs are non-empty lowercase ASCII letters, digits, `-` and `_`.
pub(crate) fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let valid = !slug.is_empty()
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_');

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("slug"))
    }
}

/// Admin input for categories and genres.
#[derive(Debug, Clone, Deserialize, Validate)]
pub(crate) struct TaxonomyInput {
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(length(max = 160), custom(function = "validate_slug"))]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub(crate) struct ActorInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    #[validate(range(min = 0, max = 200))]
    pub age: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub(crate) struct MovieInput {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub tagline: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub poster: String,
    #[validate(range(min = 1800, max = 3000))]
    pub year: i64,
    #[serde(default)]
    #[validate(length(max = 30))]
    pub country: String,
    pub category_id: Option<i64>,
    #[validate(length(max = 130), custom(function = "validate_slug"))]
    pub url: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub genres: Vec<i64>,
    #[serde(default)]
    pub directors: Vec<i64>,
    #[serde(default)]
    pub actors: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub(crate) struct MovieShotInput {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    pub movie_id: i64,
}

#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub(crate) struct RatingStarInput {
    #[validate(range(min = 1, max = 5))]
    pub value: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs() {
        assert!(validate_slug("the-matrix_1999").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("The Matrix").is_err());
        assert!(validate_slug("матрица").is_err());
    }

    #[test]
    fn movie_input_is_validated() {
        let input: MovieInput = serde_json::from_value(serde_json::json!({
            "title": "",
            "year": 2020,
            "url": "Bad Slug",
        }))
        .unwrap();

        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("url"));
        assert!(!fields.contains_key("year"));
    }
}
