#[cfg(test)]
mod probes_e2e_tests {
    use crate::testkit::TestServerBuilder;

    #[tokio::test]
    async fn should_respond_to_health_probe() {
        let server = TestServerBuilder::new().build().start().await;

        let res = server
            .client()
            .get(server.url_for("/health"))
            .send()
            .await
            .unwrap();
        assert!(res.status().is_success());

        // Only GET is routed to the probe.
        let res = server
            .client()
            .post(server.url_for("/health"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 405);
    }
}
