use config::{builder::BuilderState, ConfigBuilder, ConfigError, Value};
use envconfig::Envconfig;
use tracing::debug;

use crate::log::{LogFormat, LogLevel};

/// Environment variables that take precedence over the configuration file.
#[derive(Envconfig, Debug, Default)]
pub struct EnvVarOverrides {
    #[envconfig(from = "LOG_LEVEL")]
    pub log_level: Option<LogLevel>,
    #[envconfig(from = "LOG_FORMAT")]
    pub log_format: Option<LogFormat>,
    #[envconfig(from = "LOG_FILTER")]
    pub log_filter: Option<String>,

    #[envconfig(from = "PORT")]
    pub http_port: Option<u16>,
    #[envconfig(from = "HOST")]
    pub http_host: Option<String>,
    #[envconfig(from = "GRAPHQL_ENDPOINT")]
    pub graphql_endpoint: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum EnvVarOverridesError {
    #[error("Failed to override '{key}': {source}")]
    FailedToOverrideConfig {
        key: &'static str,
        #[source]
        source: ConfigError,
    },
}

impl EnvVarOverrides {
    /// The configuration keys set by the environment, paired with their values.
    fn entries(self) -> Vec<(&'static str, Value)> {
        let candidates: [(&'static str, Option<Value>); 6] = [
            ("log.level", self.log_level.map(|v| v.as_str().into())),
            ("log.format", self.log_format.map(|v| v.as_str().into())),
            ("log.filter", self.log_filter.map(Value::from)),
            ("http.port", self.http_port.map(|v| i64::from(v).into())),
            ("http.host", self.http_host.map(Value::from)),
            ("http.graphql_endpoint", self.graphql_endpoint.map(Value::from)),
        ];

        candidates
            .into_iter()
            .filter_map(|(key, value)| value.map(|value| (key, value)))
            .collect()
    }

    pub fn apply_overrides<T: BuilderState>(
        self,
        config: ConfigBuilder<T>,
    ) -> Result<ConfigBuilder<T>, EnvVarOverridesError> {
        self.entries()
            .into_iter()
            .try_fold(config, |config, (key, value)| {
                debug!(key, value = %value, "applying environment override");
                config
                    .set_override(key, value)
                    .map_err(|source| EnvVarOverridesError::FailedToOverrideConfig { key, source })
            })
    }
}
