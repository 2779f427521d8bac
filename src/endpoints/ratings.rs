use axum::{
    Form, Router,
    extract::{State, rejection::FormRejection},
    http::StatusCode,
    routing::post,
};
use metrics::counter;
use tracing::debug;

use crate::{
    AppState, Db, Result,
    client_ip::ClientIp,
    metrics::{RATING_ACCEPTED, RATING_REJECTED},
    rating::{self, RatingError, RatingForm},
};

/// Record the client's star rating for a movie, replacing any earlier one.
///
/// Anything other than a valid rating is a bare 400, including unreadable bodies.
async fn add_rating(
    ClientIp(ip): ClientIp,
    State(db): State<Db>,
    form: std::result::Result<Form<RatingForm>, FormRejection>,
) -> Result<StatusCode> {
    let Form(form) = match form {
        Ok(form) => form,
        Err(err) => {
            counter!(RATING_REJECTED).increment(1);
            debug!(%ip, "unreadable rating form: {err}");
            return Ok(StatusCode::BAD_REQUEST);
        }
    };

    match form.validate(&db).await {
        Ok(submission) => {
            rating::upsert(&db, &ip, submission).await?;
            counter!(RATING_ACCEPTED).increment(1);
            Ok(StatusCode::CREATED)
        }
        Err(RatingError::Store(err)) => Err(err.into()),
        Err(err) => {
            counter!(RATING_REJECTED).increment(1);
            debug!(%ip, "rejecting rating: {err}");
            Ok(StatusCode::BAD_REQUEST)
        }
    }
}

pub(super) fn routes() -> Router<AppState> {
    Router::new().route("/add-rating", post(add_rating))
}
