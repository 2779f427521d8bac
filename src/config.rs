//! Application configuration.
use std::{net::SocketAddr, path::PathBuf};

use serde::Deserialize;
use url::Url;

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
/// Metrics exporter configuration.
pub(crate) enum MetricConfig {
    /// Push metrics to a Prometheus push gateway.
    PrometheusPush(PrometheusConfig),
}

#[derive(Deserialize, Debug, Clone)]
/// Prometheus push gateway configuration.
pub(crate) struct PrometheusConfig {
    /// The push gateway endpoint.
    pub url: Url,
}

#[derive(Deserialize, Debug, Clone)]
/// Static media configuration (posters, actor photos, screenshots).
pub(crate) struct MediaConfig {
    /// The directory media paths are resolved against.
    pub path: PathBuf,
}

#[derive(Deserialize, Debug, Clone, Default)]
/// Admin backend configuration.
pub(crate) struct AdminConfig {
    /// Bearer token required by every `/admin` route. The backend is closed if unset.
    pub token: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
/// The top-level application configuration.
pub(crate) struct AppConfig {
    /// The address to listen on. Defaults to `127.0.0.1:8000`.
    pub listen_address: Option<SocketAddr>,
    /// The SQLite database URL.
    pub db: String,
    /// Media storage.
    pub media: MediaConfig,
    /// Admin backend.
    #[serde(default)]
    pub admin: AdminConfig,
    /// Optional metrics exporter.
    pub metrics: Option<MetricConfig>,
    /// Test mode.
    #[serde(default)]
    pub test: bool,
}
