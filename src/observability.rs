//! Observability hooks for the distributed filter engine.
//!
//! A group of processes that only talk through blocking messages is hard to debug
//! after the fact, so the gather choreography reports what it does through
//! structured log records. The `log_metric!` macro is the primary tool; it is
//! compiled out of release builds.

use colored::Colorize;
use log::{Level, LevelFilter};
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Once;

use crate::config::EngineConfig;
use crate::error::FieldError;

/// Logs a structured key-value metric line at debug level, only in debug builds.
///
/// # Example
/// ```
/// use fieldmesh::log_metric;
/// let rank = 2;
/// log_metric!("event" = "gather_recv", "source" = &rank);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        #[cfg(debug_assertions)]
        {
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+
            log::debug!("FIELDMESH_METRIC: {{ {} }}", parts.join(", "));
        }
    };
}

static INIT_LOGGER: Once = Once::new();

/// Initialises the global `env_logger` once per process.
///
/// Records are printed as `[LEVEL] message`. On stderr the level tag is
/// coloured; when `log_file` is given, records are appended to that file as
/// plain text instead. Subsequent calls are no-ops and do not touch `log_file`.
pub fn init_logging(level: LevelFilter, log_file: Option<&str>) -> Result<(), FieldError> {
    let mut result = Ok(());
    INIT_LOGGER.call_once(|| {
        let target = match log_file {
            Some(path) => match OpenOptions::new().append(true).create(true).open(path) {
                Ok(file) => Some(file),
                Err(e) => {
                    result = Err(FieldError::from(e));
                    return;
                }
            },
            None => None,
        };

        let mut builder = env_logger::Builder::new();
        builder.is_test(false);
        builder.filter_level(level);

        let colour = target.is_none();
        builder.format(move |buf, record| {
            writeln!(buf, "[{}] {}", level_tag(record.level(), colour), record.args())
        });

        if let Some(file) = target {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        let _ = builder.try_init();
    });
    result
}

/// Initialises logging at the level named by `config.log_level`.
pub fn init_logging_from(config: &EngineConfig, log_file: Option<&str>) -> Result<(), FieldError> {
    init_logging(config.level_filter(), log_file)
}

fn level_tag(level: Level, colour: bool) -> String {
    let tag = level.as_str();
    if !colour {
        return tag.to_string();
    }
    let painted = match level {
        Level::Error => tag.red().bold(),
        Level::Warn => tag.yellow(),
        Level::Info => tag.green(),
        Level::Debug => tag.blue(),
        Level::Trace => tag.dimmed(),
    };
    painted.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        assert!(init_logging(LevelFilter::Debug, None).is_ok());
        assert!(init_logging_from(&EngineConfig::default(), None).is_ok());
        log_metric!("event" = "test", "value" = 1);
    }

    #[test]
    fn test_later_calls_leave_the_log_file_alone() {
        init_logging(LevelFilter::Info, None).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.log");
        let path = path.to_str().unwrap();
        init_logging(LevelFilter::Info, Some(path)).unwrap();
        assert!(!std::path::Path::new(path).exists());
    }

    #[test]
    fn test_level_tags() {
        assert!(level_tag(Level::Warn, true).contains("WARN"));
        assert!(level_tag(Level::Error, true).contains("ERROR"));
        assert_eq!(level_tag(Level::Info, false), "INFO");
        assert_eq!(level_tag(Level::Trace, false), "TRACE");
    }
}
