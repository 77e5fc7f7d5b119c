//! Subscriber setup for processes that embed the replay and routing core.
//!
//! The lab itself only emits events (see [`crate::obs`]); a host service or
//! batch runner calls [`init_tracing`] once so those events and the per-replay
//! spans reach its logs.

use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset: lab crates at `level`, everything
/// else (the host's HTTP stack, storage drivers) held at `warn`.
pub fn default_filter(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    format!("warn,strategy_lab_core={level},strategy_state={level}")
}

/// Install the global subscriber.
///
/// `json` switches to newline-delimited JSON for log shippers. Closing a
/// `replay` span logs its elapsed time, which gives per-episode replay
/// latency without a metrics backend. Later calls are no-ops.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    let layer = fmt::layer()
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE);
    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer)
            .try_init()
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_scopes_lab_crates() {
        assert_eq!(
            default_filter(Level::DEBUG),
            "warn,strategy_lab_core=debug,strategy_state=debug"
        );
    }

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(default_filter(Level::INFO)).is_ok());
    }

    #[test]
    fn test_init_tracing_twice_is_harmless() {
        init_tracing(false, Level::WARN);
        init_tracing(true, Level::DEBUG);
    }
}
