//! Logging setup for the binaries, on `tracing` + `tracing-subscriber`.
//!
//! `RUST_LOG` wins when set; otherwise the level comes from `-v` count.
//! Events go to stderr so stdout carries only command output (JSON).

use std::io::{self, IsTerminal};

use tracing::{Level, Subscriber};
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    EnvFilter,
};

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, multi-line
    #[default]
    Pretty,
    /// One line per event
    Compact,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub format: LogFormat,
    pub with_target: bool,
    /// Color codes; off when stderr is not a terminal
    pub with_ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: Level::INFO,
            format: LogFormat::default(),
            with_target: false,
            with_ansi: io::stderr().is_terminal(),
        }
    }
}

impl LogConfig {
    /// 0 → info, 1 → debug, 2+ → trace
    pub fn from_verbosity(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        };
        LogConfig {
            level,
            ..Default::default()
        }
    }

    pub fn compact(mut self) -> Self {
        self.format = LogFormat::Compact;
        self
    }

    /// Filter directive used when `RUST_LOG` is absent
    pub fn default_directive(&self) -> String {
        let level = self.level.to_string().to_lowercase();
        format!("catalog_match={level},catalog_server={level},warn")
    }
}

/// Subscriber writing formatted events to `writer`
pub fn build_subscriber<W>(
    config: &LogConfig,
    writer: W,
) -> anyhow::Result<Box<dyn Subscriber + Send + Sync>>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.default_directive()))?;

    let registry = tracing_subscriber::registry().with(filter);
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(config.with_ansi)
        .with_target(config.with_target);

    Ok(match config.format {
        LogFormat::Pretty => Box::new(registry.with(layer.pretty())),
        LogFormat::Compact => Box::new(registry.with(layer.compact())),
    })
}

/// Install the global subscriber on stderr; errors if one is already set
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    init_logging_with_writer(config, io::stderr)
}

/// Install the global subscriber on a custom writer
pub fn init_logging_with_writer<W>(config: &LogConfig, writer: W) -> anyhow::Result<()>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    tracing::subscriber::set_global_default(build_subscriber(config, writer)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_from_verbosity() {
        assert_eq!(LogConfig::from_verbosity(0).level, Level::INFO);
        assert_eq!(LogConfig::from_verbosity(1).level, Level::DEBUG);
        assert_eq!(LogConfig::from_verbosity(5).level, Level::TRACE);
    }

    #[test]
    fn test_default_directive() {
        assert_eq!(
            LogConfig::from_verbosity(1).default_directive(),
            "catalog_match=debug,catalog_server=debug,warn"
        );
    }

    #[test]
    fn test_events_go_to_the_given_writer_without_color() {
        let captured = Captured::default();
        let config = LogConfig {
            level: Level::INFO,
            format: LogFormat::Compact,
            with_target: false,
            with_ansi: false,
        };

        let subscriber = build_subscriber(&config, captured.clone()).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(rows = 3, "catalog import warning");
        });

        let text = captured.text();
        assert!(text.contains("catalog import warning"));
        assert!(text.contains("rows=3"));
        assert!(!text.contains('\u{1b}'));
    }
}
