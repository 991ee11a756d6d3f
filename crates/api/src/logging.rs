use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;

/// Filter used when neither `RUST_LOG` nor `log.yml` sets one.
pub const DEFAULT_FILTER: &str = "discover_api=info,discover_db=info,tower_http=info";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `logLevel`; `isJson` switches to JSON lines.
pub fn init(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| filter_for(&config.log_level));

    let (plain, json) = if config.is_json {
        (None, Some(fmt::layer().json()))
    } else {
        (Some(fmt::layer()), None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(plain)
        .with(json)
        .init();
}

fn filter_for(log_level: &str) -> EnvFilter {
    let directive = log_level.trim();
    if directive.is_empty() {
        return EnvFilter::new(DEFAULT_FILTER);
    }
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
