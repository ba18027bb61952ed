pub mod error;

use std::{collections::HashMap, future::Future, sync::Arc};

use async_trait::async_trait;
use indexmap::IndexMap;
use tracing::debug;

use crate::{
    resolvers::error::{BindingError, ResolverError},
    response::{graphql_error::GraphQLErrorPathSegment, value::Value},
    schema::{definition::OperationType, SchemaRegistry},
};

/// Coerced argument values of a field, in declaration order.
pub type ArgumentValues = IndexMap<String, Value>;

/// What a resolver receives for one field invocation.
#[derive(Debug, Clone)]
pub struct ResolverContext {
    /// Value of the enclosing object. `null` for root fields.
    pub parent: Arc<Value>,
    pub args: ArgumentValues,
    /// Response path of the field being resolved.
    pub path: Vec<GraphQLErrorPathSegment>,
}

impl ResolverContext {
    pub fn new(parent: Arc<Value>, args: ArgumentValues, path: Vec<GraphQLErrorPathSegment>) -> Self {
        ResolverContext { parent, args, path }
    }

    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name).filter(|value| !value.is_null())
    }

    pub fn arg_str(&self, name: &str) -> Option<&str> {
        self.arg(name).and_then(Value::as_str)
    }

    pub fn required_arg(&self, name: &str) -> Result<&Value, ResolverError> {
        self.arg(name)
            .ok_or_else(|| ResolverError::new(format!("Argument '{}' was not provided", name)))
    }
}

#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, ctx: ResolverContext) -> Result<Value, ResolverError>;
}

#[async_trait]
impl<F, Fut> Resolver for F
where
    F: Fn(ResolverContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, ResolverError>> + Send + 'static,
{
    async fn resolve(&self, ctx: ResolverContext) -> Result<Value, ResolverError> {
        (self)(ctx).await
    }
}

/// Turns an async closure into a [`Resolver`], letting the compiler infer the
/// closure's argument and output types.
pub fn from_fn<F, Fut>(f: F) -> F
where
    F: Fn(ResolverContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ResolverError>> + Send + 'static,
{
    f
}

/// Resolver bindings keyed by `(type, field)`, validated against the schema.
///
/// Fields without a binding fall back to reading the property of the same
/// name from the parent object.
pub struct ResolverTable {
    schema: Arc<SchemaRegistry>,
    resolvers: HashMap<(String, String), Arc<dyn Resolver>>,
}

impl ResolverTable {
    pub fn new(schema: Arc<SchemaRegistry>) -> Self {
        ResolverTable {
            schema,
            resolvers: HashMap::new(),
        }
    }

    pub fn schema(&self) -> &Arc<SchemaRegistry> {
        &self.schema
    }

    /// Binds a resolver to a root field of `operation`.
    pub fn bind<R>(
        &mut self,
        operation: OperationType,
        field_name: &str,
        resolver: R,
    ) -> Result<&mut Self, BindingError>
    where
        R: Resolver + 'static,
    {
        let type_name = self
            .schema
            .root_type_name(operation)
            .ok_or(BindingError::MissingRootType(operation))?
            .to_string();
        self.bind_field(&type_name, field_name, resolver)
    }

    /// Binds a resolver to a field of any object type.
    pub fn bind_field<R>(
        &mut self,
        type_name: &str,
        field_name: &str,
        resolver: R,
    ) -> Result<&mut Self, BindingError>
    where
        R: Resolver + 'static,
    {
        let type_definition = self
            .schema
            .lookup(type_name)
            .ok_or_else(|| BindingError::UnknownType(type_name.to_string()))?;
        if !type_definition.is_object() {
            return Err(BindingError::NotAnObjectType(type_name.to_string()));
        }
        if type_definition.field(field_name).is_none() {
            return Err(BindingError::UnknownField {
                type_name: type_name.to_string(),
                field_name: field_name.to_string(),
            });
        }

        let key = (type_name.to_string(), field_name.to_string());
        if self.resolvers.contains_key(&key) {
            return Err(BindingError::DuplicateBinding {
                type_name: key.0,
                field_name: key.1,
            });
        }

        debug!("bound resolver to '{}.{}'", type_name, field_name);
        self.resolvers.insert(key, Arc::new(resolver));
        Ok(self)
    }

    pub fn is_bound(&self, type_name: &str, field_name: &str) -> bool {
        self.resolvers
            .contains_key(&(type_name.to_string(), field_name.to_string()))
    }

    /// Invokes the resolver bound to a root field of `operation`.
    pub async fn resolve(
        &self,
        operation: OperationType,
        field_name: &str,
        ctx: ResolverContext,
    ) -> Result<Value, ResolverError> {
        let type_name = self.schema.root_type_name(operation).ok_or_else(|| {
            ResolverError::new(format!("The schema does not declare a {} root type", operation))
        })?;
        self.resolve_field(type_name, field_name, ctx).await
    }

    pub async fn resolve_field(
        &self,
        type_name: &str,
        field_name: &str,
        ctx: ResolverContext,
    ) -> Result<Value, ResolverError> {
        match self
            .resolvers
            .get(&(type_name.to_string(), field_name.to_string()))
        {
            Some(resolver) => resolver.resolve(ctx).await,
            None => Ok(ctx.parent.get(field_name).cloned().unwrap_or_default()),
        }
    }
}
