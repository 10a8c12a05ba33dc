use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};

/// Filter used by [`LoggingConfig::verbose`].
const VERBOSE_FILTER: &str = "hudpaint_engine=debug,wgpu=warn,naga=warn";

/// Logger settings for [`init_logging`].
///
/// Filter precedence: `env_filter`, then `RUST_LOG`, then `default_level`.
/// Filters use the `env_logger` syntax ("info", "hudpaint_engine=trace").
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub default_level: log::LevelFilter,
    pub write_style: env_logger::WriteStyle,
    /// Route output through the test harness capture.
    pub is_test: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            default_level: log::LevelFilter::Info,
            write_style: env_logger::WriteStyle::Auto,
            is_test: false,
        }
    }
}

impl LoggingConfig {
    /// Context and rasterizer diagnostics at debug; GPU stack internals at warn.
    pub fn verbose() -> Self {
        Self {
            env_filter: Some(VERBOSE_FILTER.to_string()),
            ..Self::default()
        }
    }

    /// Captured, debug-level output for unit tests.
    pub fn for_tests() -> Self {
        Self {
            is_test: true,
            ..Self::verbose()
        }
    }

    fn builder(&self) -> env_logger::Builder {
        let mut builder = env_logger::Builder::new();
        match (&self.env_filter, std::env::var("RUST_LOG")) {
            (Some(filter), _) => builder.parse_filters(filter),
            (None, Ok(filter)) => builder.parse_filters(&filter),
            (None, Err(_)) => builder.filter_level(self.default_level),
        };
        builder.write_style(self.write_style).is_test(self.is_test);
        builder
    }
}

static INIT: Once = Once::new();
static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Installs `env_logger` as the global `log` backend.
///
/// Only the first call does anything. Returns whether `env_logger` is the
/// installed backend; `false` when the host had already installed another.
pub fn init_logging(config: LoggingConfig) -> bool {
    INIT.call_once(|| {
        if config.builder().try_init().is_ok() {
            INSTALLED.store(true, Ordering::Release);
            log::debug!("logging: env_logger installed");
        }
    });
    INSTALLED.load(Ordering::Acquire)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_call_wins_and_later_calls_agree() {
        let first = init_logging(LoggingConfig::for_tests());
        let second = init_logging(LoggingConfig::default());
        assert_eq!(first, second);
        log::debug!("logging test still alive");
    }

    #[test]
    fn verbose_filter_targets_the_engine() {
        let cfg = LoggingConfig::verbose();
        assert_eq!(cfg.env_filter.as_deref(), Some(VERBOSE_FILTER));
        assert_eq!(cfg.default_level, log::LevelFilter::Info);
        assert!(LoggingConfig::for_tests().is_test);
    }
}
