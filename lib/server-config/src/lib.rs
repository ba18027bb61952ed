mod env_overrides;
pub mod http_server;
pub mod log;

use config::{Config, File, FileFormat, FileSourceFile};
use envconfig::Envconfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{
    env_overrides::{EnvVarOverrides, EnvVarOverridesError},
    http_server::HttpServerConfig,
    log::LoggingConfig,
};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// The server logger configuration.
    ///
    /// The server is configured to be mostly silent (`info`) level in release builds, and will print only important messages, warnings, and errors.
    #[serde(default)]
    pub log: LoggingConfig,

    /// Configuration for the HTTP server/listener.
    #[serde(default)]
    pub http: HttpServerConfig,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        self.http.address()
    }

    pub fn graphql_path(&self) -> &str {
        &self.http.graphql_endpoint
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerConfigError {
    #[error("Failed to load configuration: {0}")]
    ConfigLoadError(#[from] config::ConfigError),
    #[error("Failed to apply configuration overrides: {0}")]
    EnvVarOverridesError(#[from] EnvVarOverridesError),
    #[error("Failed to load the environment variables: {0}")]
    EnvVarLoadError(#[from] envconfig::Error),
}

static DEFAULT_FILE_NAMES: &[&str] = &[
    "minigraph.config.yaml",
    "minigraph.config.yml",
    "minigraph.config.json",
    "minigraph.config.json5",
];

/// Loads the configuration from `override_config_path` (required to exist) or from one of the
/// default file names in the working directory (all optional), then applies environment overrides.
pub fn load_config(override_config_path: Option<String>) -> Result<ServerConfig, ServerConfigError> {
    let env_overrides = EnvVarOverrides::init_from_env()?;
    load_config_with_overrides(override_config_path, env_overrides)
}

fn load_config_with_overrides(
    override_config_path: Option<String>,
    env_overrides: EnvVarOverrides,
) -> Result<ServerConfig, ServerConfigError> {
    let mut config = Config::builder();

    if let Some(path_str) = override_config_path {
        let as_file: File<FileSourceFile, FileFormat> = PathBuf::from(path_str).into();
        config = config.add_source(as_file.required(true));
    } else {
        for name in DEFAULT_FILE_NAMES {
            config = config.add_source(File::with_name(name).required(false));
        }
    }

    config = env_overrides.apply_overrides(config)?;

    Ok(config.build()?.try_deserialize::<ServerConfig>()?)
}

pub fn parse_yaml_config(config_raw: &str) -> Result<ServerConfig, ServerConfigError> {
    Config::builder()
        .add_source(File::from_str(config_raw, FileFormat::Yaml))
        .build()?
        .try_deserialize::<ServerConfig>()
        .map_err(ServerConfigError::ConfigLoadError)
}
