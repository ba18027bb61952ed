#[cfg(test)]
mod startup_e2e_tests {
    use minigraph_config::{parse_yaml_config, ServerConfig};
    use minigraph_server::{listen, tutorial::tutorial_executor, ServerInitError};

    use crate::testkit::{init_logger, TestServerBuilder};

    #[test]
    fn should_default_to_port_4000() {
        let config = ServerConfig::default();
        assert_eq!(config.address(), "0.0.0.0:4000");
        assert_eq!(config.graphql_path(), "/");
    }

    #[tokio::test]
    async fn should_fail_to_bind_an_occupied_port() {
        init_logger();
        let server = TestServerBuilder::new().build().start().await;
        let port = server.addr().port();

        let config = parse_yaml_config(&format!(
            r#"
            http:
                host: 127.0.0.1
                port: {port}
            "#
        ))
        .unwrap();
        let result = listen(&config, tutorial_executor().unwrap()).await;

        match result {
            Err(err @ ServerInitError::HttpServerBindError(..)) => {
                assert!(err
                    .to_string()
                    .starts_with(&format!("Failed to bind HTTP server to address: 127.0.0.1:{port}")));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("binding an occupied port must fail"),
        }

        // The first server is unaffected.
        let res = server.send_graphql_request("{ hello }", None).await;
        assert_eq!(res.status(), 200);
    }

    #[tokio::test]
    async fn should_stop_serving_after_shutdown() {
        let server = TestServerBuilder::new().build().start().await;
        let health_url = server.url_for("/health");
        let client = server.client().clone();

        assert!(client.get(&health_url).send().await.unwrap().status().is_success());

        server.shutdown().await;

        assert!(client.get(&health_url).send().await.is_err());
    }
}
