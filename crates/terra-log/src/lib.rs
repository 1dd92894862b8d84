//! Structured logging setup for the terra tools.
//!
//! Library crates only emit `tracing` events. Binaries call [`init_logging`] once to
//! install a console subscriber, plus a JSON file log in debug builds.

use std::fs::File;
use std::path::Path;

use terra_config::Config;
use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Name of the JSON log file written in debug builds.
pub const LOG_FILE_NAME: &str = "terra.log";

const DEFAULT_DIRECTIVES: &str = "info";

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured `debug.log_level`, which wins over `"info"`.
/// When `debug_build` is set and `log_dir` can be created, events are also written
/// as JSON lines to `log_dir/terra.log`.
///
/// # Examples
///
/// ```no_run
/// use terra_config::Config;
/// use terra_log::init_logging;
///
/// let config = Config::default();
/// init_logging(Some(std::path::Path::new("./logs")), true, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let directives = filter_directives(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = File::create(log_dir.join(LOG_FILE_NAME))
    {
        subscriber.with(json_file_layer(log_file)).init();
        return;
    }

    subscriber.init();
}

/// The filter used when `RUST_LOG` is unset and no level is configured.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_DIRECTIVES)
}

/// Filter directives taken from the config, falling back to the default.
fn filter_directives(config: Option<&Config>) -> String {
    config
        .map(|c| c.debug.log_level.trim())
        .filter(|level| !level.is_empty())
        .unwrap_or(DEFAULT_DIRECTIVES)
        .to_string()
}

/// JSON lines without ANSI codes, for machine parsing after a run.
fn json_file_layer<S>(file: File) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true)
        .with_timer(fmt::time::uptime())
        .json()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_level() {
        assert_eq!(default_env_filter().to_string(), "info");
    }

    #[test]
    fn test_directives_follow_config() {
        assert_eq!(filter_directives(None), "info");

        let mut config = Config::default();
        config.debug.log_level = "warn,terra_grid=debug".to_string();
        assert_eq!(filter_directives(Some(&config)), "warn,terra_grid=debug");

        config.debug.log_level = "  ".to_string();
        assert_eq!(filter_directives(Some(&config)), "info");
    }

    #[test]
    fn test_env_filter_parsing() {
        for directives in ["info", "debug,terra_grid=trace", "warn,terra_grid::topology=debug", "error"] {
            assert!(
                EnvFilter::try_new(directives).is_ok(),
                "failed to parse filter: {directives}"
            );
        }
    }

    #[test]
    fn test_json_file_layer_writes_structured_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOG_FILE_NAME);
        let file = File::create(&path).unwrap();

        let subscriber = tracing_subscriber::registry().with(json_file_layer(file));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(vertices = 2562, "built mesh topology");
        });

        let contents = std::fs::read_to_string(&path).unwrap();
        let line = contents.lines().next().expect("no event written");
        let event: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(event["level"], "INFO");
        assert_eq!(event["fields"]["message"], "built mesh topology");
        assert_eq!(event["fields"]["vertices"], 2562);
    }
}
