use std::net::SocketAddr;

use minigraph_config::{parse_yaml_config, ServerConfig};
use minigraph_executor::{Executor, Value};
use minigraph_server::{listen, tutorial::tutorial_executor, ServerHandle};
use reqwest::Response;
use sonic_rs::json;
use tracing_subscriber::EnvFilter;

pub fn init_logger() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct TestServerBuilder {
    inline_config: String,
    executor: Option<Executor>,
}

impl TestServerBuilder {
    pub fn new() -> Self {
        Self {
            inline_config: String::new(),
            executor: None,
        }
    }

    /// YAML merged over `127.0.0.1` and an ephemeral port.
    pub fn inline_config(mut self, config: &str) -> Self {
        self.inline_config = config.to_string();
        self
    }

    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn build(self) -> TestServerConfig {
        let mut config = if self.inline_config.trim().is_empty() {
            ServerConfig::default()
        } else {
            parse_yaml_config(&self.inline_config).expect("failed to parse inline config")
        };
        config.http.host = "127.0.0.1".to_string();
        config.http.port = 0;

        TestServerConfig {
            config,
            executor: self.executor,
        }
    }
}

pub struct TestServerConfig {
    pub config: ServerConfig,
    executor: Option<Executor>,
}

impl TestServerConfig {
    pub async fn start(self) -> TestServer {
        init_logger();

        let executor = match self.executor {
            Some(executor) => executor,
            None => tutorial_executor().expect("tutorial schema is valid"),
        };
        let handle = listen(&self.config, executor)
            .await
            .expect("failed to start test server");

        TestServer {
            handle,
            client: reqwest::Client::new(),
        }
    }
}

pub struct TestServer {
    handle: ServerHandle,
    client: reqwest::Client,
}

impl TestServer {
    pub fn addr(&self) -> SocketAddr {
        self.handle.local_addr()
    }

    pub fn url(&self) -> &str {
        self.handle.url()
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("http://{}{}", self.addr(), path)
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub async fn send_graphql_request(&self, query: &str, variables: Option<sonic_rs::Value>) -> Response {
        let body = json!({
            "query": query,
            "variables": variables,
        });

        self.client
            .post(self.url())
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("failed to send graphql request")
    }

    pub async fn shutdown(self) {
        self.handle
            .shutdown()
            .await
            .expect("server did not shut down cleanly");
    }
}

/// Re-serializes a JSON response body with stable, readable formatting.
pub async fn pretty_body(response: Response) -> String {
    let body = response.text().await.expect("failed to read response body");
    let value: Value = sonic_rs::from_str(&body).expect("response body is not JSON");
    sonic_rs::to_string_pretty(&value).expect("failed to serialize response")
}
