//! Metric name constants.

use std::time::Duration;

use anyhow::Context;
use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::config;

pub const ADMIN_AUTH_FAILED: &str = "movies.admin.auth.failed"; // Counter.

pub const RATING_ACCEPTED: &str = "movies.rating.accepted"; // Counter.
pub const RATING_REJECTED: &str = "movies.rating.rejected"; // Counter.

pub const REVIEW_ACCEPTED: &str = "movies.review.accepted"; // Counter.
pub const REVIEW_DROPPED: &str = "movies.review.dropped"; // Counter.

pub const SEARCH_QUERIES: &str = "movies.search.queries"; // Counter.

/// Must be ran exactly once on startup. This will declare all of the instruments for `metrics`.
pub(crate) fn setup(config: Option<&config::MetricConfig>) -> anyhow::Result<()> {
    describe_counter!(
        ADMIN_AUTH_FAILED,
        "The number of rejected admin backend requests."
    );

    describe_counter!(RATING_ACCEPTED, "The count of stored or updated ratings.");
    describe_counter!(
        RATING_REJECTED,
        "The count of rating submissions that failed validation."
    );

    describe_counter!(REVIEW_ACCEPTED, "The count of stored reviews.");
    describe_counter!(
        REVIEW_DROPPED,
        "The count of invalid review submissions that were discarded."
    );

    describe_counter!(SEARCH_QUERIES, "The count of title searches.");

    if let Some(config) = config {
        match config {
            config::MetricConfig::PrometheusPush(prometheus_config) => {
                PrometheusBuilder::new()
                    .with_push_gateway(
                        prometheus_config.url.clone(),
                        Duration::from_secs(10),
                        None,
                        None,
                    )
                    .context("failed to set up push gateway")?
                    .install()
                    .context("failed to install metrics exporter")?;
            }
        }
    }

    Ok(())
}
