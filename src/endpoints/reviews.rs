use anyhow::anyhow;
use axum::{
    Form, Router,
    extract::{Path, State, rejection::FormRejection},
    response::Redirect,
    routing::post,
};
use metrics::counter;
use tracing::{info, warn};

use crate::{
    AppState, Db, Error, Result, catalog,
    metrics::{REVIEW_ACCEPTED, REVIEW_DROPPED},
    review::{self, ReviewError, ReviewForm},
};

/// Attach a review to a movie and send the client back to the movie's page.
///
/// Invalid or unreadable submissions are discarded; the client is redirected either way.
async fn add_review(
    State(db): State<Db>,
    Path(movie_id): Path<i64>,
    form: std::result::Result<Form<ReviewForm>, FormRejection>,
) -> Result<Redirect> {
    let movie = catalog::published_by_id(&db, movie_id)
        .await?
        .ok_or_else(|| Error::not_found(anyhow!("no movie with id {movie_id}")))?;

    let Form(form) = match form {
        Ok(form) => form,
        Err(err) => {
            counter!(REVIEW_DROPPED).increment(1);
            warn!(movie = movie.id, "dropping unreadable review: {err}");
            return Ok(Redirect::to(&movie.absolute_url()));
        }
    };

    match review::submit(&db, movie.id, &form).await {
        Ok(id) => {
            counter!(REVIEW_ACCEPTED).increment(1);
            info!(review = id, movie = movie.id, "review stored");
        }
        Err(ReviewError::Store(err)) => return Err(err.into()),
        Err(err) => {
            counter!(REVIEW_DROPPED).increment(1);
            warn!(movie = movie.id, "dropping review: {err}");
        }
    }

    Ok(Redirect::to(&movie.absolute_url()))
}

pub(super) fn routes() -> Router<AppState> {
    Router::new().route("/review/{movie_id}", post(add_review))
}
