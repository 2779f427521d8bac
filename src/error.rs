use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// `axum`-compatible error handler.
#[derive(Error)]
pub struct Error {
    status: StatusCode,
    err: anyhow::Error,
}

impl Error {
    pub fn not_found(err: impl Into<anyhow::Error>) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, err)
    }

    pub fn bad_request(err: impl Into<anyhow::Error>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, err)
    }

    pub fn conflict(err: impl Into<anyhow::Error>) -> Self {
        Self::with_status(StatusCode::CONFLICT, err)
    }

    pub fn unauthorized(err: impl Into<anyhow::Error>) -> Self {
        Self::with_status(StatusCode::UNAUTHORIZED, err)
    }

    pub fn forbidden(err: impl Into<anyhow::Error>) -> Self {
        Self::with_status(StatusCode::FORBIDDEN, err)
    }

    pub fn with_status(status: StatusCode, err: impl Into<anyhow::Error>) -> Self {
        Self {
            status,
            err: err.into(),
        }
    }

    /// The HTTP status this error will be reported with.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            err,
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        // Constraint violations are caused by the request, not the server.
        let status = match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => StatusCode::CONFLICT,
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => StatusCode::BAD_REQUEST,
            sqlx::Error::RowNotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        Self::with_status(status, err)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:?}", self.status, self.err)
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.err.fmt(f)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        if self.status.is_server_error() {
            error!("{:?}", self.err);
        } else {
            tracing::debug!(status = %self.status, "{:#}", self.err);
        }

        // N.B: Forward out the error message to the requester if this is a debug build.
        // This is insecure for production builds, so we'll return an empty body if this
        // is a release build.
        let body = if cfg!(debug_assertions) {
            Body::new(format!("{:?}", self.err))
        } else {
            Body::empty()
        };

        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn anyhow_errors_are_internal() {
        let err: Error = anyhow!("boom").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn missing_rows_are_not_found() {
        let err: Error = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn response_carries_status() {
        let response = Error::bad_request(anyhow!("invalid star")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
