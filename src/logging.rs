//! Logging setup for the watcher and the CLI.
//!
//! Lines are compact and timestamped, and levels are configured per module:
//!
//! ```toml
//! [logging]
//! default = "warn"
//!
//! [logging.modules]
//! tablesync = "info"   # pipeline and watcher events
//! ```
//!
//! `RUST_LOG` takes precedence over the config:
//! ```bash
//! RUST_LOG=tablesync=debug tablesync watch
//! ```

use std::sync::Once;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Compact time format: HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Filter directive string built from the config, e.g. `warn,tablesync=info`.
///
/// Module overrides are emitted in name order so the result is stable.
pub fn filter_directives(config: &LoggingConfig) -> String {
    let mut modules: Vec<(&String, &String)> = config.modules.iter().collect();
    modules.sort();

    let mut directives = config.default.clone();
    for (module, level) in modules {
        directives.push_str(&format!(",{module}={level}"));
    }
    directives
}

/// Initialize logging with configuration.
///
/// Only the first call takes effect. `RUST_LOG` overrides the config.
pub fn init_with_config(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(filter_directives(config))
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_timer(CompactTime)
            .with_level(true)
            .with_filter(filter);

        tracing_subscriber::registry().with(fmt_layer).init();
    });
}

/// Initialize logging with the default (quiet) configuration.
pub fn init() {
    init_with_config(&LoggingConfig::default());
}

/// Log an event with component context.
///
/// # Examples
/// ```ignore
/// log_event!("sync", "replaced", "{table}: {count} rows");
/// log_event!("watcher", "started");
/// ```
#[macro_export]
macro_rules! log_event {
    ($component:expr, $event:expr) => {
        tracing::info!("[{}] {}", $component, $event)
    };
    ($component:expr, $event:expr, $($arg:tt)*) => {
        tracing::info!("[{}] {}: {}", $component, $event, format!($($arg)*))
    };
}

/// Debug-only event logging.
///
/// # Examples
/// ```ignore
/// debug_event!("watcher", "unmatched", "{}", path.display());
/// ```
#[macro_export]
macro_rules! debug_event {
    ($component:expr, $event:expr) => {
        tracing::debug!("[{}] {}", $component, $event)
    };
    ($component:expr, $event:expr, $($arg:tt)*) => {
        tracing::debug!("[{}] {}: {}", $component, $event, format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives() {
        let mut config = LoggingConfig::default();
        assert_eq!(filter_directives(&config), "warn");

        config.modules.insert("watcher".into(), "debug".into());
        config.modules.insert("sync".into(), "trace".into());
        assert_eq!(filter_directives(&config), "warn,sync=trace,watcher=debug");
    }
}
