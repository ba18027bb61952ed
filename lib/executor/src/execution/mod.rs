mod complete;
pub mod error;
pub(crate) mod input;
pub mod plan;
mod scalar;
mod validation;

use std::{collections::HashMap, sync::Arc};

use graphql_parser::{
    query::{Definition, OperationDefinition, SelectionSet, VariableDefinition},
    Pos,
};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    execution::{
        complete::ExecutionContext,
        error::{FieldError, FieldErrorKind, RequestError},
        input::{coerce_argument_values, coerce_variable_values},
        plan::{FieldSelection, PlanContext},
        validation::Validator,
    },
    resolvers::{ArgumentValues, ResolverTable},
    response::{graphql_error::GraphQLError, value::Value, ExecutionResponse},
    schema::{definition::OperationType, SchemaRegistry},
};

/// An operation as sent by a client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    pub query: String,
    #[serde(default)]
    pub operation_name: Option<String>,
    #[serde(default)]
    pub variables: Option<HashMap<String, Value>>,
}

impl ExecutionRequest {
    pub fn new(query: impl Into<String>) -> Self {
        ExecutionRequest {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn operation_name(mut self, operation_name: impl Into<String>) -> Self {
        self.operation_name = Some(operation_name.into());
        self
    }

    pub fn variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }
}

/// A parsed, validated operation with coerced variables, ready to run.
#[derive(Debug, Clone)]
pub struct PreparedOperation {
    pub operation_type: OperationType,
    pub operation_name: Option<String>,
    pub fields: Vec<FieldSelection>,
}

struct SelectedOperation<'a, 'd> {
    operation_type: OperationType,
    name: Option<&'a str>,
    variable_definitions: &'a [VariableDefinition<'d, String>],
    selection_set: &'a SelectionSet<'d, String>,
    position: Pos,
}

/// Runs operations against one schema and its resolvers.
#[derive(Clone)]
pub struct Executor {
    schema: Arc<SchemaRegistry>,
    resolvers: Arc<ResolverTable>,
}

impl Executor {
    pub fn new(resolvers: ResolverTable) -> Self {
        Executor {
            schema: resolvers.schema().clone(),
            resolvers: Arc::new(resolvers),
        }
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    /// Parses, validates and plans `request`. Failures here are reported
    /// without `data`.
    pub fn prepare(&self, request: &ExecutionRequest) -> Result<PreparedOperation, Vec<RequestError>> {
        self.prepare_operation(request).inspect_err(|errors| {
            for error in errors {
                warn!(
                    code = error.graphql_error_code(),
                    "operation rejected: {}", error
                );
            }
        })
    }

    fn prepare_operation(
        &self,
        request: &ExecutionRequest,
    ) -> Result<PreparedOperation, Vec<RequestError>> {
        let document = graphql_parser::parse_query::<String>(&request.query).map_err(|err| {
            let message = err.to_string();
            let message = message
                .trim_start_matches("query parse error:")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            vec![RequestError::Parse(message)]
        })?;

        let mut operations = Vec::new();
        let mut fragments = HashMap::new();
        let mut errors = Vec::new();
        for definition in &document.definitions {
            match definition {
                Definition::Operation(operation) => operations.push(operation),
                Definition::Fragment(fragment) => {
                    if fragments.insert(fragment.name.as_str(), fragment).is_some() {
                        errors.push(RequestError::validation(
                            format!("There can be only one fragment named \"{}\".", fragment.name),
                            fragment.position,
                        ));
                    }
                }
            }
        }

        let operation = select_operation(&operations, request.operation_name.as_deref())
            .map_err(|err| vec![err])?;

        let root_type = self.schema.root_type(operation.operation_type).ok_or_else(|| {
            vec![RequestError::validation(
                format!(
                    "Schema is not configured to execute {} operation.",
                    operation.operation_type
                ),
                operation.position,
            )]
        })?;

        errors.extend(Validator::new(&self.schema, &fragments).validate(
            root_type,
            operation.variable_definitions,
            operation.selection_set,
        ));
        if !errors.is_empty() {
            return Err(errors);
        }

        let variables = coerce_variable_values(
            &self.schema,
            operation.variable_definitions,
            request.variables.as_ref(),
        )?;

        let planner = PlanContext {
            schema: &self.schema,
            fragments: &fragments,
            variables: &variables,
        };
        let mut fields = Vec::new();
        planner
            .collect_fields(root_type, operation.selection_set, &mut fields)
            .map_err(|err| vec![err])?;

        Ok(PreparedOperation {
            operation_type: operation.operation_type,
            operation_name: operation.name.map(str::to_string),
            fields,
        })
    }

    /// Executes a prepared operation. Query root fields run concurrently,
    /// mutation root fields strictly in order.
    pub async fn run(&self, operation: &PreparedOperation) -> ExecutionResponse {
        let Some(root_type) = self.schema.root_type(operation.operation_type) else {
            return ExecutionResponse::from(vec![RequestError::OperationResolution(format!(
                "Schema is not configured to execute {} operation.",
                operation.operation_type
            ))]);
        };

        debug!(
            operation_type = %operation.operation_type,
            operation_name = operation.operation_name.as_deref(),
            fields = operation.fields.len(),
            "executing operation"
        );

        let ctx = ExecutionContext {
            schema: &self.schema,
            resolvers: &self.resolvers,
        };
        let root = Arc::new(Value::Null);
        let (data, errors) = match operation.operation_type {
            OperationType::Query => {
                ctx.execute_fields(root_type, root, &operation.fields, &[])
                    .await
            }
            OperationType::Mutation => {
                ctx.execute_fields_serially(root_type, root, &operation.fields, &[])
                    .await
            }
        };

        debug!(errors = errors.len(), "operation executed");

        ExecutionResponse {
            data: Some(data.unwrap_or_default()),
            errors: errors.into_iter().map(GraphQLError::from).collect(),
        }
    }

    pub async fn execute_request(&self, request: &ExecutionRequest) -> ExecutionResponse {
        match self.prepare(request) {
            Ok(operation) => self.run(&operation).await,
            Err(errors) => ExecutionResponse::from(errors),
        }
    }

    /// Executes a single root field with the given arguments and requested
    /// subfields. Arguments are coerced against the field's definition;
    /// nested selections are taken as given.
    pub async fn execute(
        &self,
        operation_type: OperationType,
        field_name: &str,
        args: ArgumentValues,
        requested: Vec<FieldSelection>,
    ) -> ExecutionResponse {
        let root_field = self
            .schema
            .root_type_name(operation_type)
            .and_then(|type_name| self.schema.field(type_name, field_name).map(|f| (type_name, f)));

        let arguments = match root_field {
            Some((type_name, definition)) => {
                match coerce_argument_values(&self.schema, definition, args) {
                    Ok(arguments) => arguments,
                    Err(reason) => {
                        let kind = FieldErrorKind::InvalidArguments {
                            type_name: type_name.to_string(),
                            field_name: field_name.to_string(),
                            reason,
                        };
                        let error = FieldError::new(kind, &[field_name.into()], None);
                        return ExecutionResponse::from_errors(vec![error.into()]);
                    }
                }
            }
            // Unknown fields are reported by the engine with their path.
            None => args,
        };

        let mut selection = FieldSelection::new(field_name);
        selection.arguments = arguments;
        selection.selections = requested;

        self.run(&PreparedOperation {
            operation_type,
            operation_name: None,
            fields: vec![selection],
        })
        .await
    }
}

fn select_operation<'a, 'd>(
    operations: &[&'a OperationDefinition<'d, String>],
    operation_name: Option<&str>,
) -> Result<SelectedOperation<'a, 'd>, RequestError> {
    let operation = match operation_name {
        Some(name) => operations
            .iter()
            .find(|operation| name_of(operation) == Some(name))
            .ok_or_else(|| {
                RequestError::OperationResolution(format!("Unknown operation named \"{}\".", name))
            })?,
        None => match operations {
            [operation] => operation,
            [] => {
                return Err(RequestError::OperationResolution(
                    "Must provide an operation.".to_string(),
                ))
            }
            _ => {
                return Err(RequestError::OperationResolution(
                    "Must provide operation name if query contains multiple operations."
                        .to_string(),
                ))
            }
        },
    };

    match *operation {
        OperationDefinition::SelectionSet(selection_set) => Ok(SelectedOperation {
            operation_type: OperationType::Query,
            name: None,
            variable_definitions: &[],
            selection_set,
            position: selection_set.span.0,
        }),
        OperationDefinition::Query(query) => Ok(SelectedOperation {
            operation_type: OperationType::Query,
            name: query.name.as_deref(),
            variable_definitions: &query.variable_definitions,
            selection_set: &query.selection_set,
            position: query.position,
        }),
        OperationDefinition::Mutation(mutation) => Ok(SelectedOperation {
            operation_type: OperationType::Mutation,
            name: mutation.name.as_deref(),
            variable_definitions: &mutation.variable_definitions,
            selection_set: &mutation.selection_set,
            position: mutation.position,
        }),
        OperationDefinition::Subscription(_) => Err(RequestError::OperationResolution(
            "Subscription operations are not supported.".to_string(),
        )),
    }
}

fn name_of<'a>(operation: &'a OperationDefinition<'_, String>) -> Option<&'a str> {
    match operation {
        OperationDefinition::SelectionSet(_) => None,
        OperationDefinition::Query(query) => query.name.as_deref(),
        OperationDefinition::Mutation(mutation) => mutation.name.as_deref(),
        OperationDefinition::Subscription(subscription) => subscription.name.as_deref(),
    }
}
