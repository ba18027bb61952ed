#[cfg(test)]
mod http_tests {
    use http::header::{ACCEPT, CONTENT_TYPE};

    use crate::testkit::{pretty_body, TestServerBuilder};

    #[tokio::test]
    async fn should_allow_to_customize_graphql_endpoint() {
        let server = TestServerBuilder::new()
            .inline_config(
                r#"
                http:
                    graphql_endpoint: /custom
                "#,
            )
            .build()
            .start()
            .await;

        assert!(server.url().ends_with("/custom"));

        let res = server.send_graphql_request("{ hello }", None).await;
        assert_eq!(res.status(), 200);

        let res = server
            .client()
            .post(server.url_for("/graphql"))
            .header(CONTENT_TYPE, "application/json")
            .body(r#"{"query":"{ hello }"}"#)
            .send()
            .await
            .expect("failed to send graphql request");
        assert_eq!(res.status(), 404);
    }

    #[tokio::test]
    async fn should_execute_queries_over_get() {
        let server = TestServerBuilder::new().build().start().await;

        let res = server
            .client()
            .get(server.url())
            .query(&[
                ("query", "query Greet($name: String) { greeting(name: $name) }"),
                ("variables", r#"{"name":"GET"}"#),
                ("operationName", "Greet"),
            ])
            .send()
            .await
            .expect("failed to send graphql request");

        assert_eq!(res.status(), 200);
        insta::assert_snapshot!(pretty_body(res).await, @r###"
        {
          "data": {
            "greeting": "Hello, GET!"
          }
        }
        "###);
    }

    #[tokio::test]
    async fn should_reject_mutations_over_get() {
        let server = TestServerBuilder::new().build().start().await;

        let res = server
            .client()
            .get(server.url())
            .query(&[("query", "mutation { increment }")])
            .send()
            .await
            .expect("failed to send graphql request");

        assert_eq!(res.status(), 405);

        // The counter was left untouched.
        let res = server.send_graphql_request("{ counter }", None).await;
        assert!(pretty_body(res).await.contains("\"counter\": 0"));
    }

    #[tokio::test]
    async fn should_pick_status_codes_from_the_accept_header() {
        let server = TestServerBuilder::new().build().start().await;
        let body = r#"{"query":"query A { hello } query B { hello }"}"#;

        let legacy = server
            .client()
            .post(server.url())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .expect("failed to send graphql request");
        assert_eq!(legacy.status(), 200);
        assert_eq!(
            legacy.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let modern = server
            .client()
            .post(server.url())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/graphql-response+json")
            .body(body)
            .send()
            .await
            .expect("failed to send graphql request");
        assert_eq!(modern.status(), 400);
        assert_eq!(
            modern.headers().get(CONTENT_TYPE).unwrap(),
            "application/graphql-response+json"
        );
        insta::assert_snapshot!(pretty_body(modern).await, @r###"
        {
          "errors": [
            {
              "message": "Must provide operation name if query contains multiple operations.",
              "extensions": {
                "code": "OPERATION_RESOLUTION_FAILURE"
              }
            }
          ]
        }
        "###);
    }

    #[tokio::test]
    async fn should_report_invalid_variables() {
        let server = TestServerBuilder::new().build().start().await;

        let res = server
            .send_graphql_request(
                "query ($id: ID!) { user(id: $id) { username } }",
                Some(sonic_rs::json!({ "id": true })),
            )
            .await;

        assert_eq!(res.status(), 200);
        let body = pretty_body(res).await;
        assert!(body.contains("BAD_USER_INPUT"), "{}", body);
        assert!(!body.contains("\"data\""), "{}", body);
    }

    #[tokio::test]
    async fn should_propagate_request_ids() {
        let server = TestServerBuilder::new().build().start().await;

        let res = server
            .client()
            .post(server.url())
            .header(CONTENT_TYPE, "application/json")
            .header("x-request-id", "req-42")
            .body(r#"{"query":"{ hello }"}"#)
            .send()
            .await
            .expect("failed to send graphql request");

        assert_eq!(res.headers().get("x-request-id").unwrap(), "req-42");

        let res = server.send_graphql_request("{ hello }", None).await;
        let generated = res
            .headers()
            .get("x-request-id")
            .expect("request id is generated");
        assert_eq!(generated.len(), 26);
    }
}
