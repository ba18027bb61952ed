#[cfg(test)]
mod execution_e2e_tests {
    use std::{
        sync::{
            atomic::{AtomicI64, Ordering},
            Arc,
        },
        time::Duration,
    };

    use minigraph_executor::{
        from_fn, Executor, OperationType, ResolverTable, SchemaRegistry, Value,
    };
    use sonic_rs::json;
    use tokio::sync::Barrier;

    use crate::testkit::{pretty_body, TestServerBuilder};

    fn executor(sdl: &str, bind: impl FnOnce(&mut ResolverTable)) -> Executor {
        let schema = Arc::new(SchemaRegistry::from_sdl(sdl).expect("schema is valid"));
        let mut table = ResolverTable::new(schema);
        bind(&mut table);
        Executor::new(table)
    }

    #[tokio::test]
    async fn should_answer_hello_world() {
        let server = TestServerBuilder::new().build().start().await;

        let res = server.send_graphql_request("{ hello }", None).await;

        assert_eq!(res.status(), 200);
        insta::assert_snapshot!(pretty_body(res).await, @r###"
        {
          "data": {
            "hello": "hello world"
          }
        }
        "###);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn should_report_null_for_a_non_null_field() {
        let executor = executor("type Query { hello: String! }", |table| {
            table
                .bind(
                    OperationType::Query,
                    "hello",
                    from_fn(|_| async { Ok(Value::Null) }),
                )
                .expect("field exists");
        });
        let server = TestServerBuilder::new()
            .with_executor(executor)
            .build()
            .start()
            .await;

        let res = server.send_graphql_request("{ hello }", None).await;

        assert_eq!(res.status(), 200);
        insta::assert_snapshot!(pretty_body(res).await, @r###"
        {
          "data": null,
          "errors": [
            {
              "message": "Cannot return null for non-nullable field Query.hello.",
              "locations": [
                {
                  "line": 1,
                  "column": 3
                }
              ],
              "path": [
                "hello"
              ],
              "extensions": {
                "code": "INTERNAL_SERVER_ERROR"
              }
            }
          ]
        }
        "###);
    }

    #[tokio::test]
    async fn should_keep_siblings_when_a_list_element_is_null() {
        let server = TestServerBuilder::new()
            .with_executor(executor(
                r#"
                type Query { tags: [String!] hello: String }
                "#,
                |table| {
                    table
                        .bind(
                            OperationType::Query,
                            "tags",
                            from_fn(|_| async {
                                Ok(Value::List(vec!["a".into(), Value::Null, "c".into()]))
                            }),
                        )
                        .and_then(|table| {
                            table.bind(
                                OperationType::Query,
                                "hello",
                                from_fn(|_| async { Ok(Value::from("still here")) }),
                            )
                        })
                        .expect("fields exist");
                },
            ))
            .build()
            .start()
            .await;

        let res = server.send_graphql_request("{ tags hello }", None).await;

        insta::assert_snapshot!(pretty_body(res).await, @r###"
        {
          "data": {
            "tags": null,
            "hello": "still here"
          },
          "errors": [
            {
              "message": "Cannot return null for non-nullable list element of field Query.tags.",
              "locations": [
                {
                  "line": 1,
                  "column": 3
                }
              ],
              "path": [
                "tags",
                1
              ],
              "extensions": {
                "code": "INTERNAL_SERVER_ERROR"
              }
            }
          ]
        }
        "###);
    }

    #[tokio::test]
    async fn should_run_mutations_in_request_order() {
        let counter = Arc::new(AtomicI64::new(0));
        let resolver_counter = counter.clone();
        let server = TestServerBuilder::new()
            .with_executor(executor(
                r#"
                type Query { count: Int! }
                type Mutation { add(by: Int!, delayMs: Int!): Int! }
                "#,
                move |table| {
                    table
                        .bind(
                            OperationType::Mutation,
                            "add",
                            from_fn(move |ctx| {
                                let counter = resolver_counter.clone();
                                async move {
                                    let delay = ctx.arg("delayMs").and_then(Value::as_i64).unwrap_or(0);
                                    let by = ctx.arg("by").and_then(Value::as_i64).unwrap_or(0);
                                    tokio::time::sleep(Duration::from_millis(delay as u64)).await;
                                    Ok(Value::Int(counter.fetch_add(by, Ordering::SeqCst) + by))
                                }
                            }),
                        )
                        .expect("field exists");
                },
            ))
            .build()
            .start()
            .await;

        let res = server
            .send_graphql_request(
                "mutation { first: add(by: 1, delayMs: 60) second: add(by: 10, delayMs: 0) third: add(by: 100, delayMs: 20) }",
                None,
            )
            .await;

        insta::assert_snapshot!(pretty_body(res).await, @r###"
        {
          "data": {
            "first": 1,
            "second": 11,
            "third": 111
          }
        }
        "###);
        assert_eq!(counter.load(Ordering::SeqCst), 111);
    }

    #[tokio::test]
    async fn should_serve_connections_concurrently() {
        // Both requests park at the barrier; they only finish if served at the same time.
        let barrier = Arc::new(Barrier::new(2));
        let server = TestServerBuilder::new()
            .with_executor(executor("type Query { rendezvous: Boolean! }", move |table| {
                table
                    .bind(
                        OperationType::Query,
                        "rendezvous",
                        from_fn(move |_| {
                            let barrier = barrier.clone();
                            async move {
                                barrier.wait().await;
                                Ok(Value::Boolean(true))
                            }
                        }),
                    )
                    .expect("field exists");
            }))
            .build()
            .start()
            .await;

        let both = futures::future::join(
            server.send_graphql_request("{ rendezvous }", None),
            server.send_graphql_request("{ rendezvous }", None),
        );
        let (a, b) = tokio::time::timeout(Duration::from_secs(5), both)
            .await
            .expect("requests were not served concurrently");

        assert_eq!(a.status(), 200);
        assert_eq!(b.status(), 200);
        assert!(pretty_body(a).await.contains("\"rendezvous\": true"));
    }

    #[tokio::test]
    async fn should_null_the_register_payload_on_a_null_error_entry() {
        let server = TestServerBuilder::new()
            .with_executor(executor(
                r#"
                type Query { hello: String }
                type Mutation { register(input: RegisterInput!): RegisterResponse ping: String! }
                type Error { field: String! message: String! }
                type User { id: ID! }
                type RegisterResponse { errors: [Error!]! user: User }
                input RegisterInput { username: String! password: String! }
                "#,
                |table| {
                    table
                        .bind(
                            OperationType::Mutation,
                            "register",
                            from_fn(|_| async {
                                Ok(Value::object([
                                    (
                                        "errors",
                                        Value::List(vec![
                                            Value::object([("field", "username"), ("message", "bad")]),
                                            Value::Null,
                                        ]),
                                    ),
                                    ("user", Value::object([("id", 1)])),
                                ]))
                            }),
                        )
                        .and_then(|table| {
                            table.bind(
                                OperationType::Mutation,
                                "ping",
                                from_fn(|_| async { Ok(Value::from("pong")) }),
                            )
                        })
                        .expect("fields exist");
                },
            ))
            .build()
            .start()
            .await;

        let res = server
            .send_graphql_request(
                "mutation Register($input: RegisterInput!) { register(input: $input) { errors { field message } user { id } } ping }",
                Some(json!({ "input": { "username": "ada", "password": "secret" } })),
            )
            .await;

        insta::assert_snapshot!(pretty_body(res).await, @r###"
        {
          "data": {
            "register": null,
            "ping": "pong"
          },
          "errors": [
            {
              "message": "Cannot return null for non-nullable list element of field RegisterResponse.errors.",
              "locations": [
                {
                  "line": 1,
                  "column": 71
                }
              ],
              "path": [
                "register",
                "errors",
                1
              ],
              "extensions": {
                "code": "INTERNAL_SERVER_ERROR"
              }
            }
          ]
        }
        "###);
    }
}
