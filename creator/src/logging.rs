use crate::config::{LoggingConfig, MetricsConfig};
use metrics_exporter_statsd::StatsdBuilder;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const METRICS_PREFIX: &str = "key_request_creator";

/// Log filter used when `RUST_LOG` is not set. Dependencies stay at `warn`.
pub fn default_filter(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("warn,keyrequests={level},key_request_creator={level}")
}

pub fn init_sentry(config: &LoggingConfig) -> sentry::ClientInitGuard {
    sentry::init((
        config.sentry_dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    ))
}

pub fn init_tracing(verbose: bool, sentry_enabled: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(sentry_enabled.then(|| sentry::integrations::tracing::layer()))
        .init();
}

/// Installs the statsd recorder. Without it all metrics are discarded.
pub fn init_metrics(config: &MetricsConfig) {
    let recorder = match StatsdBuilder::from(config.statsd_host.as_str(), config.statsd_port)
        .build(Some(METRICS_PREFIX))
    {
        Ok(recorder) => recorder,
        Err(e) => {
            tracing::warn!("Could not create statsd recorder, metrics disabled: {e}");
            return;
        }
    };

    if metrics::set_global_recorder(recorder).is_err() {
        tracing::warn!("A metrics recorder is already installed");
    }
}
