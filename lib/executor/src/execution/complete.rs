use std::sync::Arc;

use futures::{future::BoxFuture, FutureExt};
use indexmap::IndexMap;
use tracing::debug;

use crate::{
    execution::{
        error::{FieldError, FieldErrorKind},
        plan::{FieldSelection, TYPENAME_FIELD},
        scalar::serialize_scalar,
    },
    resolvers::{ResolverContext, ResolverTable},
    response::{graphql_error::GraphQLErrorPathSegment, value::Value},
    schema::{
        definition::{TypeDefinition, TypeKind, TypeRef},
        SchemaRegistry,
    },
};

type Path = Vec<GraphQLErrorPathSegment>;

/// Outcome of completing one position of the response.
#[derive(Debug)]
pub(crate) enum Completion {
    Value(Value),
    /// `null` that the position allows.
    Null,
    /// `null` at a non-null position; the nearest nullable ancestor becomes `null`.
    Failed,
}

impl Completion {
    fn null_for(ty: &TypeRef) -> Self {
        if ty.nullable {
            Completion::Null
        } else {
            Completion::Failed
        }
    }
}

/// A completion together with the errors raised below it, in selection order.
pub(crate) struct Completed {
    pub completion: Completion,
    pub errors: Vec<FieldError>,
}

impl Completed {
    fn ok(value: Value) -> Self {
        Completed {
            completion: Completion::Value(value),
            errors: Vec::new(),
        }
    }

    fn failed(completion: Completion, error: FieldError) -> Self {
        debug!(path = %render_path(&error.path), "field failed: {}", error.kind);
        Completed {
            completion,
            errors: vec![error],
        }
    }
}

fn render_path(path: &[GraphQLErrorPathSegment]) -> String {
    path.iter()
        .map(|segment| segment.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

fn child_path(path: &[GraphQLErrorPathSegment], segment: GraphQLErrorPathSegment) -> Path {
    let mut child = Vec::with_capacity(path.len() + 1);
    child.extend_from_slice(path);
    child.push(segment);
    child
}

/// Assembles the object for `selections` from per-field results. `None`
/// when a non-null field failed.
fn merge_fields(
    selections: &[FieldSelection],
    results: Vec<Completed>,
) -> (Option<Value>, Vec<FieldError>) {
    let mut object = IndexMap::with_capacity(selections.len());
    let mut errors = Vec::new();
    let mut failed = false;

    for (selection, result) in selections.iter().zip(results) {
        errors.extend(result.errors);
        match result.completion {
            Completion::Value(value) => {
                object.insert(selection.response_key.clone(), value);
            }
            Completion::Null => {
                object.insert(selection.response_key.clone(), Value::Null);
            }
            Completion::Failed => failed = true,
        }
    }

    if failed {
        (None, errors)
    } else {
        (Some(Value::Object(object)), errors)
    }
}

pub(crate) struct ExecutionContext<'a> {
    pub schema: &'a SchemaRegistry,
    pub resolvers: &'a ResolverTable,
}

impl<'a> ExecutionContext<'a> {
    /// Executes sibling fields concurrently.
    pub fn execute_fields<'r>(
        &'r self,
        parent_type: &'r TypeDefinition,
        parent: Arc<Value>,
        selections: &'r [FieldSelection],
        path: &'r [GraphQLErrorPathSegment],
    ) -> BoxFuture<'r, (Option<Value>, Vec<FieldError>)> {
        async move {
            let futures = selections.iter().map(|selection| {
                let field_path = child_path(path, selection.response_key.as_str().into());
                self.execute_field(parent_type, parent.clone(), selection, field_path)
            });
            let results = futures::future::join_all(futures).await;
            merge_fields(selections, results)
        }
        .boxed()
    }

    /// Executes fields one after another, each fully completed before the
    /// next resolver is invoked.
    ///
    /// Stops at the first field whose failure nulls the whole object: the
    /// remaining resolvers are never called.
    pub async fn execute_fields_serially(
        &self,
        parent_type: &TypeDefinition,
        parent: Arc<Value>,
        selections: &[FieldSelection],
        path: &[GraphQLErrorPathSegment],
    ) -> (Option<Value>, Vec<FieldError>) {
        let mut results = Vec::with_capacity(selections.len());
        for (index, selection) in selections.iter().enumerate() {
            let field_path = child_path(path, selection.response_key.as_str().into());
            let result = self
                .execute_field(parent_type, parent.clone(), selection, field_path)
                .await;
            if matches!(result.completion, Completion::Failed) {
                let skipped = selections.len() - index - 1;
                if skipped > 0 {
                    debug!(skipped, "non-null field failed, skipping remaining serial fields");
                }
                let errors = results
                    .into_iter()
                    .flat_map(|completed: Completed| completed.errors)
                    .chain(result.errors)
                    .collect();
                return (None, errors);
            }
            results.push(result);
        }
        merge_fields(selections, results)
    }

    fn execute_field<'r>(
        &'r self,
        parent_type: &'r TypeDefinition,
        parent: Arc<Value>,
        selection: &'r FieldSelection,
        path: Path,
    ) -> BoxFuture<'r, Completed> {
        async move {
            if selection.field_name == TYPENAME_FIELD {
                return Completed::ok(Value::from(parent_type.name.as_str()));
            }

            let Some(definition) = parent_type.field(&selection.field_name) else {
                let kind = FieldErrorKind::UnknownField {
                    type_name: parent_type.name.clone(),
                    field_name: selection.field_name.clone(),
                };
                return Completed::failed(
                    Completion::Null,
                    FieldError::new(kind, &path, selection.position),
                );
            };

            let ctx = ResolverContext::new(parent, selection.arguments.clone(), path.clone());
            let resolved = self
                .resolvers
                .resolve_field(&parent_type.name, &selection.field_name, ctx)
                .await;

            match resolved {
                Ok(raw) => {
                    self.complete_value(parent_type, &definition.ty, selection, raw, path)
                        .await
                }
                Err(error) => Completed::failed(
                    Completion::null_for(&definition.ty),
                    FieldError::new(FieldErrorKind::Resolver(error), &path, selection.position),
                ),
            }
        }
        .boxed()
    }

    /// Coerces a raw value against `ty`, recursing into lists and objects.
    fn complete_value<'r>(
        &'r self,
        parent_type: &'r TypeDefinition,
        ty: &'r TypeRef,
        selection: &'r FieldSelection,
        raw: Value,
        path: Path,
    ) -> BoxFuture<'r, Completed> {
        async move {
            let mismatch = |message: String| {
                Completed::failed(
                    Completion::null_for(ty),
                    FieldError::new(FieldErrorKind::TypeMismatch(message), &path, selection.position),
                )
            };

            if raw.is_null() {
                if ty.nullable {
                    return Completed {
                        completion: Completion::Null,
                        errors: Vec::new(),
                    };
                }
                let type_name = parent_type.name.clone();
                let field_name = selection.field_name.clone();
                let kind = match path.last() {
                    Some(GraphQLErrorPathSegment::Index(_)) => FieldErrorKind::NullListElement {
                        type_name,
                        field_name,
                    },
                    _ => FieldErrorKind::NullConstraint {
                        type_name,
                        field_name,
                    },
                };
                return Completed::failed(
                    Completion::Failed,
                    FieldError::new(kind, &path, selection.position),
                );
            }

            if ty.list {
                let received = raw.kind_str();
                let Value::List(items) = raw else {
                    return mismatch(format!(
                        "Expected a list for field {}.{}, but received {}.",
                        parent_type.name, selection.field_name, received
                    ));
                };
                return self
                    .complete_list(parent_type, ty, selection, items, &path)
                    .await;
            }

            let Some(type_definition) = self.schema.lookup(&ty.name) else {
                return mismatch(format!("Unknown type \"{}\".", ty.name));
            };

            match type_definition.kind {
                TypeKind::Scalar => match serialize_scalar(&ty.name, raw) {
                    Ok(value) => Completed::ok(value),
                    Err(message) => mismatch(message),
                },
                TypeKind::Object => {
                    if raw.as_object().is_none() {
                        return mismatch(format!(
                            "Expected an object of type \"{}\" for field {}.{}, but received {}.",
                            ty.name,
                            parent_type.name,
                            selection.field_name,
                            raw.kind_str()
                        ));
                    }
                    let (value, errors) = self
                        .execute_fields(type_definition, Arc::new(raw), &selection.selections, &path)
                        .await;
                    let completion = match value {
                        Some(value) => Completion::Value(value),
                        None => Completion::null_for(ty),
                    };
                    Completed { completion, errors }
                }
                TypeKind::Input => mismatch(format!(
                    "Input type \"{}\" cannot be used as an output type.",
                    ty.name
                )),
            }
        }
        .boxed()
    }

    /// Completes list elements concurrently. A failed non-null element makes
    /// the whole list `null`.
    async fn complete_list(
        &self,
        parent_type: &TypeDefinition,
        ty: &TypeRef,
        selection: &FieldSelection,
        items: Vec<Value>,
        path: &[GraphQLErrorPathSegment],
    ) -> Completed {
        let element_type = ty.element();
        let futures = items.into_iter().enumerate().map(|(index, item)| {
            let item_path = child_path(path, GraphQLErrorPathSegment::Index(index));
            self.complete_value(parent_type, &element_type, selection, item, item_path)
        });
        let completed = futures::future::join_all(futures).await;

        let mut values = Vec::with_capacity(completed.len());
        let mut errors = Vec::new();
        let mut failed = false;
        for element in completed {
            errors.extend(element.errors);
            match element.completion {
                Completion::Value(value) => values.push(value),
                Completion::Null => values.push(Value::Null),
                Completion::Failed => failed = true,
            }
        }

        let completion = if failed {
            Completion::null_for(ty)
        } else {
            Completion::Value(Value::List(values))
        };
        Completed { completion, errors }
    }
}
