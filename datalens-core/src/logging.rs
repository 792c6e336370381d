//! Logging setup.
//!
//! Analysis operations emit structured `tracing` events; this module wires
//! those events to a subscriber without forcing a particular format on
//! embedding applications.

/// Utilities for installing a `tracing` subscriber.
pub mod setup {
    use tracing::Level;

    /// Subscriber configuration.
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Log level for the application as a whole.
        pub level: Level,
        /// Log level for datalens components specifically.
        pub datalens_level: Level,
        /// Whether to emit JSON instead of human-readable lines.
        pub json_format: bool,
        /// Environment filter override; `RUST_LOG` still wins when set.
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::INFO,
                datalens_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        /// Creates a configuration for production use.
        pub fn production() -> Self {
            Self {
                level: Level::WARN,
                datalens_level: Level::INFO,
                json_format: true,
                env_filter: None,
            }
        }

        /// Creates a configuration for development use.
        pub fn development() -> Self {
            Self {
                level: Level::DEBUG,
                datalens_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }

        /// Sets the log level for the application.
        pub fn with_level(mut self, level: Level) -> Self {
            self.level = level;
            self
        }

        /// Sets the log level for datalens components.
        pub fn with_datalens_level(mut self, level: Level) -> Self {
            self.datalens_level = level;
            self
        }

        /// Sets whether to use JSON output format.
        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        /// Sets a custom environment filter.
        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// Builds the environment filter string.
        pub fn env_filter(&self) -> String {
            if let Some(ref filter) = self.env_filter {
                filter.clone()
            } else {
                format!(
                    "{},datalens_core={}",
                    self.level.as_str().to_lowercase(),
                    self.datalens_level.as_str().to_lowercase()
                )
            }
        }
    }

    /// Installs a global subscriber.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use datalens_core::logging::setup::{init_logging, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::development()).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

        let fmt_layer = if config.json_format {
            tracing_subscriber::fmt::layer().json().boxed()
        } else {
            tracing_subscriber::fmt::layer().boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::setup::LoggingConfig;
    use tracing::Level;

    #[test]
    fn test_env_filter_string() {
        let config = LoggingConfig::default();
        assert_eq!(config.env_filter(), "info,datalens_core=debug");

        let config = LoggingConfig::default().with_env_filter("trace");
        assert_eq!(config.env_filter(), "trace");
    }

    #[test]
    fn test_production_preset_is_quiet_and_structured() {
        let config = LoggingConfig::production();
        assert_eq!(config.level, Level::WARN);
        assert!(config.json_format);
    }
}
