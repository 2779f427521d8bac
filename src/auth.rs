//! Authentication for the admin backend.

use anyhow::anyhow;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use metrics::counter;

use crate::{AppState, Error, metrics::ADMIN_AUTH_FAILED};

/// A request carrying the configured admin bearer token.
pub(crate) struct AdminUser;

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.admin.token.as_deref() else {
            counter!(ADMIN_AUTH_FAILED).increment(1);
            return Err(Error::forbidden(anyhow!("admin backend is disabled")));
        };

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        if token == Some(expected) {
            Ok(Self)
        } else {
            counter!(ADMIN_AUTH_FAILED).increment(1);
            Err(Error::unauthorized(anyhow!("invalid admin token")))
        }
    }
}
