//! Client address resolution.
use std::net::SocketAddr;

use anyhow::anyhow;
use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};

use crate::Error;

/// The header reverse proxies use to pass on the original client address.
const FORWARDED_FOR: &str = "x-forwarded-for";

/// The address of the client that made the request, as far as we can tell.
///
/// Prefers the first entry of `X-Forwarded-For` and falls back to the peer address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ClientIp(pub String);

/// Resolve the client address from the request headers and the peer address.
fn resolve(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    let forwarded = headers
        .get(FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty());

    match forwarded {
        Some(first) => Some(first.to_owned()),
        None => peer.map(|addr| addr.ip().to_string()),
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        resolve(&parts.headers, peer)
            .map(Self)
            .ok_or_else(|| Error::bad_request(anyhow!("unable to determine client address")))
    }
}
