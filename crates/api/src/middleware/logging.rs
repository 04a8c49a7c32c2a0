//! Logging initialization.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggingConfig;

/// sqlx logs every statement at info; import runs issue thousands.
const QUIET_TARGETS: &[&str] = &["sqlx=warn", "hyper=warn", "reqwest=warn"];

/// `RUST_LOG` wins when set; otherwise the configured level plus quiet targets.
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives = std::iter::once(level)
            .chain(QUIET_TARGETS.iter().copied())
            .collect::<Vec<_>>()
            .join(",");
        EnvFilter::new(directives)
    })
}

/// Initializes the global subscriber with JSON or pretty output.
pub fn init_logging(config: &LoggingConfig) {
    let subscriber = tracing_subscriber::registry().with(build_filter(&config.level));

    match config.format.as_str() {
        "json" => {
            let json_layer = fmt::layer()
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_current_span(true)
                .with_span_list(false)
                .with_target(true);
            subscriber.with(json_layer).init();
        }
        _ => {
            let pretty_layer = fmt::layer()
                .pretty()
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true);
            subscriber.with(pretty_layer).init();
        }
    }
}
