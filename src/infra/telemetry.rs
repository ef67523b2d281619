use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::cache::metrics as cache_metrics;
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            cache_metrics::FEED_CACHE_HIT,
            Unit::Count,
            "Total number of Markdown feed requests served from the cache."
        );
        describe_counter!(
            cache_metrics::FEED_CACHE_MISS,
            Unit::Count,
            "Total number of Markdown feed requests that had to be assembled."
        );
        describe_counter!(
            cache_metrics::FEED_CACHE_STORE,
            Unit::Count,
            "Total number of assembled Markdown feeds written to the cache."
        );
        describe_counter!(
            cache_metrics::FEED_CACHE_INVALIDATION,
            Unit::Count,
            "Total number of feed cache namespace sweeps triggered by content changes."
        );
    });
}
