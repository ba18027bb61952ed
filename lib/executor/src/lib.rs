pub mod ast;
pub mod execution;
pub mod resolvers;
pub mod response;
pub mod schema;

#[cfg(test)]
mod tests;

pub use execution::{
    error::{FieldError, FieldErrorKind, RequestError},
    plan::FieldSelection,
    ExecutionRequest, Executor, PreparedOperation,
};
pub use resolvers::{
    error::{BindingError, ResolverError},
    from_fn, ArgumentValues, Resolver, ResolverContext, ResolverTable,
};
pub use response::{graphql_error::GraphQLError, value::Value, ExecutionResponse};
pub use schema::{
    definition::OperationType, error::SchemaError, SchemaRegistry, SchemaRegistryBuilder,
};
