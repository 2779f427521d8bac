//! Content management backend.
//!
//! Every route requires the configured admin bearer token.
use anyhow::anyhow;
use axum::Router;
use validator::Validate;

use crate::{
    AppState, Error, Result,
    models::{Category, Genre},
};

mod actors;
mod moderation;
mod movies;
mod shots;
mod taxonomy;

/// Reject `input` with a 400 if it fails validation.
fn validated<T: Validate>(input: T) -> Result<T> {
    input.validate().map_err(Error::bad_request)?;
    Ok(input)
}

/// A 404 for a missing row of `table`.
fn not_found(table: &str, id: i64) -> Error {
    Error::not_found(anyhow!("no {table} with id {id}"))
}

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .nest("/categories", taxonomy::routes::<Category>())
        .nest("/genres", taxonomy::routes::<Genre>())
        .nest("/actors", actors::routes())
        .nest("/movies", movies::routes())
        .nest("/shots", shots::routes())
        .merge(moderation::routes())
}
