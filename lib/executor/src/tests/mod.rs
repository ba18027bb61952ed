use std::{
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::sync::Barrier;

use crate::{
    from_fn, ArgumentValues, ExecutionRequest, ExecutionResponse, Executor, FieldSelection,
    OperationType, ResolverError, ResolverTable, SchemaRegistry, Value,
};

fn tutorial_schema() -> Arc<SchemaRegistry> {
    let sdl = std::fs::read_to_string("./src/tests/fixtures/tutorial/schema.graphql")
        .expect("Unable to read input file");
    Arc::new(SchemaRegistry::from_sdl(&sdl).expect("Failed to build schema registry"))
}

fn executor(bind: impl FnOnce(&mut ResolverTable)) -> Executor {
    let mut table = ResolverTable::new(tutorial_schema());
    bind(&mut table);
    Executor::new(table)
}

fn hello_world(table: &mut ResolverTable) {
    table
        .bind(
            OperationType::Query,
            "hello",
            from_fn(|_| async { Ok(Value::from("hello world")) }),
        )
        .expect("hello is declared");
}

async fn execute(executor: &Executor, request: ExecutionRequest) -> ExecutionResponse {
    executor.execute_request(&request).await
}

fn pretty(response: &ExecutionResponse) -> String {
    sonic_rs::to_string_pretty(response).expect("response serializes")
}

fn data(response: &ExecutionResponse) -> &Value {
    response.data.as_ref().expect("execution started")
}

#[tokio::test]
async fn hello_world_query() {
    let executor = executor(hello_world);
    let response = execute(&executor, ExecutionRequest::new("{ hello }")).await;

    assert!(response.is_ok());
    insta::assert_snapshot!(pretty(&response), @r###"
    {
      "data": {
        "hello": "hello world"
      }
    }
    "###);
}

#[tokio::test]
async fn non_null_field_resolving_to_null_nulls_the_data() {
    let executor = executor(|table| {
        table
            .bind(
                OperationType::Query,
                "hello",
                from_fn(|_| async { Ok(Value::Null) }),
            )
            .expect("hello is declared");
    });
    let response = execute(&executor, ExecutionRequest::new("{ hello }")).await;

    insta::assert_snapshot!(pretty(&response), @r###"
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
async fn nullable_field_resolving_to_null_is_not_an_error() {
    let executor = executor(hello_world);
    let response = execute(&executor, ExecutionRequest::new("{ greeting hello }")).await;

    assert!(response.is_ok());
    assert_eq!(
        data(&response),
        &Value::object([
            ("greeting", Value::Null),
            ("hello", Value::from("hello world")),
        ])
    );
}

#[tokio::test]
async fn null_element_in_non_null_list_is_reported_with_its_index() {
    let executor = executor(|table| {
        table
            .bind(
                OperationType::Query,
                "tags",
                from_fn(|_| async {
                    Ok(Value::List(vec![
                        Value::from("a"),
                        Value::Null,
                        Value::from("c"),
                    ]))
                }),
            )
            .expect("tags is declared");
    });
    let response = execute(&executor, ExecutionRequest::new("{ tags }")).await;

    assert_eq!(data(&response), &Value::object([("tags", Value::Null)]));
    assert_eq!(response.errors.len(), 1);
    assert_eq!(
        response.errors[0].path,
        Some(vec!["tags".into(), 1usize.into()])
    );
    assert_eq!(
        response.errors[0].message,
        "Cannot return null for non-nullable list element of field Query.tags."
    );
}

#[tokio::test]
async fn register_errors_bubble_to_the_nullable_mutation_field() {
    let counter = Arc::new(AtomicI64::new(0));
    let executor = executor(|table| {
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
                        ("user", Value::object([("id", "1"), ("name", "ada")])),
                    ]))
                }),
            )
            .expect("register is declared")
            .bind(
                OperationType::Mutation,
                "increment",
                from_fn(move |_| {
                    let counter = counter.clone();
                    async move { Ok(Value::Int(counter.fetch_add(1, Ordering::SeqCst) + 1)) }
                }),
            )
            .expect("increment is declared");
    });

    let response = execute(
        &executor,
        ExecutionRequest::new(
            r#"mutation {
              register(input: { username: "ada", password: "secret" }) {
                errors { field message }
                user { id name }
              }
              increment
            }"#,
        ),
    )
    .await;

    assert_eq!(
        data(&response),
        &Value::object([("register", Value::Null), ("increment", Value::Int(1))])
    );
    assert_eq!(response.errors.len(), 1);
    assert_eq!(
        response.errors[0].path,
        Some(vec!["register".into(), "errors".into(), 1usize.into()])
    );
    assert!(response.errors[0].message.contains("non-null"));
}

#[tokio::test]
async fn mutation_fields_run_in_request_order() {
    let counter = Arc::new(AtomicI64::new(0));
    let executor = executor(|table| {
        table
            .bind(
                OperationType::Mutation,
                "increment",
                from_fn(move |ctx| {
                    let counter = counter.clone();
                    async move {
                        let by = ctx.arg("by").and_then(Value::as_i64).unwrap_or(1);
                        let delay = ctx.arg("delayMs").and_then(Value::as_i64).unwrap_or(0);
                        tokio::time::sleep(Duration::from_millis(delay as u64)).await;
                        Ok(Value::Int(counter.fetch_add(by, Ordering::SeqCst) + by))
                    }
                }),
            )
            .expect("increment is declared");
    });

    let response = execute(
        &executor,
        ExecutionRequest::new(
            "mutation { first: increment(delayMs: 30) second: increment(delayMs: 0) third: increment(by: 10, delayMs: 10) }",
        ),
    )
    .await;

    insta::assert_snapshot!(pretty(&response), @r###"
    {
      "data": {
        "first": 1,
        "second": 2,
        "third": 12
      }
    }
    "###);
}

#[tokio::test]
async fn query_fields_resolve_concurrently_and_keep_selection_order() {
    // Each resolver parks until its sibling arrives, so serial execution would hang.
    let barrier = Arc::new(Barrier::new(2));
    let executor = executor(move |table| {
        table
            .bind(
                OperationType::Query,
                "echo",
                from_fn(move |ctx| {
                    let barrier = barrier.clone();
                    async move {
                        let message = ctx.required_arg("message")?.clone();
                        barrier.wait().await;
                        Ok(message)
                    }
                }),
            )
            .expect("echo is declared");
    });

    let response = tokio::time::timeout(
        Duration::from_secs(5),
        execute(
            &executor,
            ExecutionRequest::new(r#"{ slow: echo(message: "slow") fast: echo(message: "fast") }"#),
        ),
    )
    .await
    .expect("sibling query fields run concurrently");

    assert_eq!(
        data(&response),
        &Value::object([("slow", "slow"), ("fast", "fast")])
    );
}

#[tokio::test]
async fn failed_non_null_mutation_field_stops_later_mutations() {
    let counter = Arc::new(AtomicI64::new(0));
    let resolver_counter = counter.clone();
    let executor = executor(move |table| {
        table
            .bind(
                OperationType::Mutation,
                "increment",
                from_fn(move |ctx| {
                    let counter = resolver_counter.clone();
                    async move {
                        let by = ctx.arg("by").and_then(Value::as_i64).unwrap_or(1);
                        if by == 99 {
                            return Err(ResolverError::new("increment rejected"));
                        }
                        Ok(Value::Int(counter.fetch_add(by, Ordering::SeqCst) + by))
                    }
                }),
            )
            .expect("increment is declared");
    });

    let response = execute(
        &executor,
        ExecutionRequest::new(
            "mutation { before: increment(by: 1) bad: increment(by: 99) after: increment(by: 10) }",
        ),
    )
    .await;

    assert_eq!(response.data, Some(Value::Null));
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].message, "increment rejected");
    assert_eq!(response.errors[0].path, Some(vec!["bad".into()]));
    // `before` ran, `after` never did.
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn type_mismatch_on_a_non_null_list() {
    let executor = executor(|table| {
        table
            .bind(
                OperationType::Query,
                "users",
                from_fn(|_| async { Ok(Value::from("nope")) }),
            )
            .expect("users is declared");
    });
    let response = execute(&executor, ExecutionRequest::new("{ users { id } }")).await;

    assert_eq!(data(&response), &Value::Null);
    assert_eq!(
        response.errors[0].message,
        "Expected a list for field Query.users, but received string."
    );
    assert_eq!(response.errors[0].path, Some(vec!["users".into()]));
}

#[tokio::test]
async fn scalar_results_are_coerced() {
    let executor = executor(|table| {
        table
            .bind(
                OperationType::Query,
                "count",
                from_fn(|_| async { Ok(Value::from("12")) }),
            )
            .expect("count is declared")
            .bind(
                OperationType::Query,
                "users",
                from_fn(|_| async {
                    Ok(Value::List(vec![
                        Value::object([("id", Value::Int(1)), ("name", Value::from("Ada"))]),
                        Value::object([("id", Value::Int(2)), ("name", Value::List(Vec::new()))]),
                    ]))
                }),
            )
            .expect("users is declared");
    });

    let response = execute(&executor, ExecutionRequest::new("{ count users { id } }")).await;
    insta::assert_snapshot!(pretty(&response), @r###"
    {
      "data": {
        "count": 12,
        "users": [
          {
            "id": "1"
          },
          {
            "id": "2"
          }
        ]
      }
    }
    "###);

    // `name` is `String!`, so the second user and then the whole non-null list fail.
    let response = execute(&executor, ExecutionRequest::new("{ count users { name } }")).await;
    assert_eq!(data(&response), &Value::Null);
    assert_eq!(response.errors.len(), 1);
    assert_eq!(
        response.errors[0].message,
        "String cannot represent value: []"
    );
    assert_eq!(
        response.errors[0].path,
        Some(vec!["users".into(), 1usize.into(), "name".into()])
    );
}

#[tokio::test]
async fn resolver_errors_carry_their_code() {
    let executor = executor(|table| {
        table
            .bind(
                OperationType::Query,
                "user",
                from_fn(|ctx| async move {
                    Err(ResolverError::new(format!(
                        "No user with id {}",
                        ctx.arg_str("id").unwrap_or_default()
                    ))
                    .with_code("NOT_FOUND"))
                }),
            )
            .expect("user is declared");
    });
    let response = execute(&executor, ExecutionRequest::new(r#"{ user(id: "42") { id } }"#)).await;

    insta::assert_snapshot!(pretty(&response), @r###"
    {
      "data": {
        "user": null
      },
      "errors": [
        {
          "message": "No user with id 42",
          "locations": [
            {
              "line": 1,
              "column": 3
            }
          ],
          "path": [
            "user"
          ],
          "extensions": {
            "code": "NOT_FOUND"
          }
        }
      ]
    }
    "###);
}

#[tokio::test]
async fn variables_fragments_and_directives() {
    let executor = executor(|table| {
        table
            .bind(
                OperationType::Query,
                "user",
                from_fn(|ctx| async move {
                    Ok(Value::object([
                        ("id", ctx.required_arg("id")?.clone()),
                        ("name", Value::from("Ada")),
                    ]))
                }),
            )
            .expect("user is declared");
    });

    let query = r#"
      query UserQuery($id: ID!, $withName: Boolean!) {
        person: user(id: $id) {
          __typename
          ...UserFields
          name @include(if: $withName)
          ... on User { id }
        }
      }

      fragment UserFields on User {
        id
      }
    "#;

    let response = execute(
        &executor,
        ExecutionRequest::new(query)
            .variable("id", 7)
            .variable("withName", false),
    )
    .await;
    insta::assert_snapshot!(pretty(&response), @r###"
    {
      "data": {
        "person": {
          "__typename": "User",
          "id": "7"
        }
      }
    }
    "###);

    let response = execute(
        &executor,
        ExecutionRequest::new(query)
            .variable("id", "ada")
            .variable("withName", true),
    )
    .await;
    assert_eq!(
        data(&response).get("person").and_then(|p| p.get("name")),
        Some(&Value::from("Ada"))
    );
}

#[tokio::test]
async fn validation_errors_prevent_execution() {
    let executor = executor(hello_world);
    let response = execute(
        &executor,
        ExecutionRequest::new("{ hello { length } users goodbye user { id } }"),
    )
    .await;

    assert!(response.data.is_none());
    let messages: Vec<&str> = response.errors.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "Field \"hello\" must not have a selection since type \"String!\" has no subfields.",
            "Field \"users\" of type \"[User!]!\" must have a selection of subfields. Did you mean \"users { ... }\"?",
            "Cannot query field \"goodbye\" on type \"Query\".",
            "Field \"user\" argument \"id\" of type \"ID!\" is required, but it was not provided.",
        ]
    );
    assert!(response
        .errors
        .iter()
        .all(|e| e.code() == Some("GRAPHQL_VALIDATION_FAILED")));
}

#[tokio::test]
async fn request_errors() {
    let executor = executor(hello_world);

    let response = execute(&executor, ExecutionRequest::new("{ hello")).await;
    assert!(response.data.is_none());
    assert_eq!(response.errors[0].code(), Some("GRAPHQL_PARSE_FAILED"));
    assert!(response.errors[0].message.starts_with("Syntax Error:"));

    let response = execute(
        &executor,
        ExecutionRequest::new("query A { hello } query B { hello }"),
    )
    .await;
    assert_eq!(
        response.errors[0].message,
        "Must provide operation name if query contains multiple operations."
    );
    assert_eq!(response.errors[0].code(), Some("OPERATION_RESOLUTION_FAILURE"));

    let response = execute(
        &executor,
        ExecutionRequest::new("query A { hello } query B { hello }").operation_name("B"),
    )
    .await;
    assert_eq!(
        data(&response),
        &Value::object([("hello", "hello world")])
    );

    let response = execute(
        &executor,
        ExecutionRequest::new("query ($id: ID!) { user(id: $id) { id } }"),
    )
    .await;
    assert!(response.data.is_none());
    assert_eq!(response.errors[0].code(), Some("BAD_USER_INPUT"));

    let response = execute(&executor, ExecutionRequest::new("subscription { hello }")).await;
    assert_eq!(response.errors[0].code(), Some("OPERATION_RESOLUTION_FAILURE"));
}

#[tokio::test]
async fn execute_single_root_field() {
    let executor = executor(|table| {
        table
            .bind(
                OperationType::Mutation,
                "register",
                from_fn(|ctx| async move {
                    let username = ctx
                        .required_arg("input")?
                        .get("username")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string();
                    Ok(Value::object([
                        ("errors", Value::List(Vec::new())),
                        (
                            "user",
                            Value::object([("id", Value::from("1")), ("name", Value::from(username))]),
                        ),
                    ]))
                }),
            )
            .expect("register is declared");
    });

    let mut args = ArgumentValues::new();
    args.insert(
        "input".to_string(),
        Value::object([("username", "ada"), ("password", "secret")]),
    );
    let response = executor
        .execute(
            OperationType::Mutation,
            "register",
            args,
            vec![FieldSelection::new("user").select(FieldSelection::new("name"))],
        )
        .await;
    insta::assert_snapshot!(pretty(&response), @r###"
    {
      "data": {
        "register": {
          "user": {
            "name": "ada"
          }
        }
      }
    }
    "###);

    let response = executor
        .execute(OperationType::Mutation, "register", ArgumentValues::new(), Vec::new())
        .await;
    assert!(response.data.is_none());
    assert_eq!(response.errors[0].code(), Some("BAD_USER_INPUT"));

    let response = executor
        .execute(OperationType::Query, "goodbye", ArgumentValues::new(), Vec::new())
        .await;
    assert_eq!(data(&response), &Value::object([("goodbye", Value::Null)]));
    assert_eq!(
        response.errors[0].message,
        "Cannot query field \"goodbye\" on type \"Query\"."
    );
}
