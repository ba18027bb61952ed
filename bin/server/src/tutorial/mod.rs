//! The schema and resolvers served by the `minigraph` binary: a greeting,
//! a small in-memory user directory and a counter.

use std::{
    future::Future,
    sync::{
        atomic::{AtomicI32, AtomicU64, Ordering},
        Arc,
    },
};

use minigraph_executor::{
    from_fn, BindingError, Executor, OperationType, Resolver, ResolverContext, ResolverError,
    ResolverTable, SchemaRegistry, Value,
};
use tokio::sync::RwLock;
use tracing::info;

use crate::error::ServerInitError;

pub static TUTORIAL_SDL: &str = include_str!("schema.graphql");

const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone)]
struct TutorialUser {
    id: u64,
    username: String,
}

impl TutorialUser {
    fn to_value(&self) -> Value {
        Value::object([
            ("id", Value::from(self.id.to_string())),
            ("username", Value::from(self.username.as_str())),
        ])
    }
}

#[derive(Debug, Default)]
pub struct TutorialState {
    users: RwLock<Vec<TutorialUser>>,
    next_user_id: AtomicU64,
    counter: AtomicI32,
}

impl TutorialState {
    pub fn with_users<'a>(usernames: impl IntoIterator<Item = &'a str>) -> Self {
        let state = TutorialState::default();
        let users = usernames
            .into_iter()
            .map(|username| TutorialUser {
                id: state.allocate_id(),
                username: username.to_string(),
            })
            .collect();
        TutorialState {
            users: RwLock::new(users),
            ..state
        }
    }

    fn allocate_id(&self) -> u64 {
        self.next_user_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn user(&self, ctx: ResolverContext) -> Result<Value, ResolverError> {
        let id = ctx
            .required_arg("id")?
            .as_str()
            .ok_or_else(|| ResolverError::new("Argument 'id' must be an ID"))?;
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|user| user.id.to_string() == id)
            .map(TutorialUser::to_value)
            .unwrap_or_default())
    }

    async fn users(&self) -> Value {
        let users = self.users.read().await;
        Value::List(users.iter().map(TutorialUser::to_value).collect())
    }

    async fn register(&self, ctx: ResolverContext) -> Result<Value, ResolverError> {
        let input = ctx.required_arg("input")?;
        let username = input
            .get("username")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim();
        let password = input
            .get("password")
            .and_then(Value::as_str)
            .unwrap_or_default();

        let mut users = self.users.write().await;
        let mut errors = Vec::new();
        if username.is_empty() {
            errors.push(input_error("username", "Username must not be empty"));
        } else if users.iter().any(|user| user.username == username) {
            errors.push(input_error("username", "Username is already taken"));
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.push(input_error(
                "password",
                &format!("Password must be at least {} characters long", MIN_PASSWORD_LENGTH),
            ));
        }

        if !errors.is_empty() {
            return Ok(Value::object([
                ("errors", Value::List(errors)),
                ("user", Value::Null),
            ]));
        }

        let user = TutorialUser {
            id: self.allocate_id(),
            username: username.to_string(),
        };
        info!(user_id = user.id, "registered user '{}'", user.username);
        let value = user.to_value();
        users.push(user);

        Ok(Value::object([
            ("errors", Value::List(Vec::new())),
            ("user", value),
        ]))
    }

    /// Adds `by` to the counter. The counter is an `Int`, so a sum outside
    /// the 32-bit range is rejected and leaves it unchanged.
    fn increment(&self, ctx: &ResolverContext) -> Result<Value, ResolverError> {
        let by = ctx.arg("by").and_then(Value::as_i64).unwrap_or(1);
        let out_of_range = || {
            ResolverError::new(format!(
                "Cannot increment the counter by {}: the result does not fit in an Int",
                by
            ))
            .with_code("BAD_USER_INPUT")
        };
        let by = i32::try_from(by).map_err(|_| out_of_range())?;

        let previous = self
            .counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                current.checked_add(by)
            })
            .map_err(|_| out_of_range())?;
        Ok(Value::Int(i64::from(previous + by)))
    }
}

fn input_error(field: &str, message: &str) -> Value {
    Value::object([("field", field), ("message", message)])
}

/// Wraps a resolver that needs the shared tutorial state.
fn with_state<F, Fut>(state: &Arc<TutorialState>, f: F) -> impl Resolver + 'static
where
    F: Fn(Arc<TutorialState>, ResolverContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ResolverError>> + Send + 'static,
{
    let state = state.clone();
    from_fn(move |ctx| f(state.clone(), ctx))
}

pub fn tutorial_resolvers(
    schema: Arc<SchemaRegistry>,
    state: Arc<TutorialState>,
) -> Result<ResolverTable, BindingError> {
    let mut table = ResolverTable::new(schema);

    table
        .bind(
            OperationType::Query,
            "hello",
            from_fn(|_| async { Ok(Value::from("hello world")) }),
        )?
        .bind(
            OperationType::Query,
            "greeting",
            from_fn(|ctx| async move {
                let name = ctx.arg_str("name").unwrap_or("world");
                Ok(Value::from(format!("Hello, {}!", name)))
            }),
        )?
        .bind(
            OperationType::Query,
            "favoriteNumbers",
            from_fn(|_| async { Ok(Value::from(vec![7, 13, 42])) }),
        )?
        .bind(
            OperationType::Query,
            "user",
            with_state(&state, |state, ctx| async move { state.user(ctx).await }),
        )?
        .bind(
            OperationType::Query,
            "users",
            with_state(&state, |state, _| async move { Ok(state.users().await) }),
        )?
        .bind(
            OperationType::Query,
            "counter",
            with_state(&state, |state, _| async move {
                Ok(Value::Int(i64::from(state.counter.load(Ordering::SeqCst))))
            }),
        )?
        .bind(
            OperationType::Mutation,
            "register",
            with_state(&state, |state, ctx| async move { state.register(ctx).await }),
        )?
        .bind(
            OperationType::Mutation,
            "increment",
            with_state(&state, |state, ctx| async move { state.increment(&ctx) }),
        )?;

    Ok(table)
}

/// Builds the executor for the tutorial schema, seeded with two users.
pub fn tutorial_executor() -> Result<Executor, ServerInitError> {
    let schema = Arc::new(SchemaRegistry::from_sdl(TUTORIAL_SDL)?);
    let state = Arc::new(TutorialState::with_users(["ada", "grace"]));
    let resolvers = tutorial_resolvers(schema, state)?;
    Ok(Executor::new(resolvers))
}
