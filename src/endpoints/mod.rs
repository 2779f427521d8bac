//! Public pages.
use axum::Router;

use crate::AppState;

mod actors;
mod movies;
mod ratings;
mod reviews;

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .merge(movies::routes())
        .merge(actors::routes())
        .merge(reviews::routes())
        .merge(ratings::routes())
}
