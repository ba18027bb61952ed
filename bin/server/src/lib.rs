pub mod error;
pub mod http_utils;
pub mod logger;
pub mod pipeline;
pub mod shared_state;
pub mod tutorial;

use std::{future::Future, net::SocketAddr};

use axum::{
    body::Body,
    routing::{any, get},
    Router,
};
use http::{Method, Request};
use minigraph_config::ServerConfig;
use minigraph_executor::Executor;
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{debug_span, info};

use crate::{
    http_utils::{
        probes::health_check_handler,
        request_id::{RequestIdGenerator, REQUEST_ID_HEADER_NAME},
    },
    pipeline::graphql_request_handler,
    shared_state::ServerSharedState,
};

pub use crate::error::ServerInitError;

pub const HEALTH_ENDPOINT: &str = "/health";

/// Builds the HTTP application: the GraphQL endpoint (GET and POST) and the
/// health probe.
pub fn configure_app(config: &ServerConfig, executor: Executor) -> Router {
    let shared_state = ServerSharedState::new(executor);

    Router::new()
        .route(config.graphql_path(), any(graphql_request_handler))
        .route(HEALTH_ENDPOINT, get(health_check_handler))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    REQUEST_ID_HEADER_NAME.clone(),
                    RequestIdGenerator,
                ))
                .layer(
                    TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        let request_id = request
                            .extensions()
                            .get::<RequestId>()
                            .and_then(|v| v.header_value().to_str().ok())
                            .unwrap_or_default();

                        debug_span!(
                            "http_request",
                            request_id = %request_id,
                            method = %request.method(),
                            uri = %request.uri(),
                        )
                    }),
                )
                .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER_NAME.clone()))
                .layer(
                    CorsLayer::new()
                        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                        .allow_headers(vec![
                            http::header::ACCEPT,
                            http::header::CONTENT_TYPE,
                        ])
                        .allow_origin(tower_http::cors::Any),
                ),
        )
        .with_state(shared_state)
}

/// A running server.
///
/// Dropping the handle also triggers a graceful shutdown.
pub struct ServerHandle {
    local_addr: SocketAddr,
    url: String,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server_task: JoinHandle<std::io::Result<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// URL of the GraphQL endpoint, e.g. `http://localhost:4000/`.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Stops accepting connections and waits for in-flight requests to finish.
    pub async fn shutdown(mut self) -> Result<(), ServerInitError> {
        self.trigger_shutdown();
        self.join().await
    }

    /// Serves until `signal` completes, then shuts down gracefully.
    pub async fn run_until<F>(mut self, signal: F) -> Result<(), ServerInitError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            _ = signal => {
                info!("shutdown signal received, stopping server");
                self.trigger_shutdown();
            }
            result = &mut self.server_task => {
                return result?.map_err(ServerInitError::HttpServerStartError);
            }
        }

        self.join().await
    }

    /// Waits for the server to terminate.
    pub async fn join(self) -> Result<(), ServerInitError> {
        self.server_task
            .await?
            .map_err(ServerInitError::HttpServerStartError)
    }

    fn trigger_shutdown(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
    }
}

/// Binds the configured address and starts serving `executor` in the
/// background. Port `0` binds an ephemeral port.
pub async fn listen(
    config: &ServerConfig,
    executor: Executor,
) -> Result<ServerHandle, ServerInitError> {
    let endpoint = config.graphql_path();
    if !endpoint.starts_with('/') || endpoint == HEALTH_ENDPOINT {
        return Err(ServerInitError::InvalidGraphQLEndpoint(endpoint.to_string()));
    }

    let app = configure_app(config, executor);

    let addr = config.address();
    let listener = TcpListener::bind(addr.as_str())
        .await
        .map_err(|err| ServerInitError::HttpServerBindError(addr.clone(), err))?;
    let local_addr = listener
        .local_addr()
        .map_err(ServerInitError::HttpServerStartError)?;
    let url = endpoint_url(local_addr, endpoint);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server_task = tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(async move {
                // A dropped sender counts as a shutdown request.
                let _ = shutdown_rx.await;
            })
            .await
    });

    info!("server started at {}", url);

    Ok(ServerHandle {
        local_addr,
        url,
        shutdown_tx: Some(shutdown_tx),
        server_task,
    })
}

fn endpoint_url(addr: SocketAddr, endpoint: &str) -> String {
    let host = match addr {
        addr if addr.ip().is_unspecified() => "localhost".to_string(),
        SocketAddr::V6(v6) => format!("[{}]", v6.ip()),
        SocketAddr::V4(v4) => v4.ip().to_string(),
    };
    format!("http://{}:{}{}", host, addr.port(), endpoint)
}
