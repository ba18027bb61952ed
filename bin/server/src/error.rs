use minigraph_config::ServerConfigError;
use minigraph_executor::{BindingError, SchemaError};

use crate::logger::LoggingInitError;

#[derive(Debug, thiserror::Error)]
pub enum ServerInitError {
    #[error(transparent)]
    ServerConfigError(#[from] ServerConfigError),
    #[error(transparent)]
    LoggingInitError(#[from] LoggingInitError),
    #[error("Invalid schema: {0}")]
    SchemaError(#[from] SchemaError),
    #[error("Invalid resolver binding: {0}")]
    BindingError(#[from] BindingError),
    #[error("GraphQL endpoint '{0}' must start with '/' and must not shadow '/health'")]
    InvalidGraphQLEndpoint(String),
    #[error("Failed to bind HTTP server to address: {0}. Error: {1}")]
    HttpServerBindError(String, std::io::Error),
    #[error("Failed to start HTTP server: {0}")]
    HttpServerStartError(std::io::Error),
    #[error("HTTP server task failed: {0}")]
    HttpServerTaskError(#[from] tokio::task::JoinError),
}
