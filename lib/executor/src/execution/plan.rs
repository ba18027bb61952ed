use std::collections::HashMap;

use graphql_parser::{
    query::{Directive, FragmentDefinition, Selection, SelectionSet, TypeCondition},
    Pos,
};

use crate::{
    ast::{value_from_ast, VariableValues},
    execution::{
        error::RequestError,
        input::{coerce_argument_values, provided_arguments},
    },
    resolvers::ArgumentValues,
    schema::{definition::TypeDefinition, SchemaRegistry},
};

pub const TYPENAME_FIELD: &str = "__typename";

/// One field to resolve, with its arguments already coerced and its
/// subselection flattened (fragments inlined, skipped fields removed).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSelection {
    /// Alias or field name; the key in the response object.
    pub response_key: String,
    pub field_name: String,
    pub arguments: ArgumentValues,
    pub selections: Vec<FieldSelection>,
    pub position: Option<Pos>,
}

impl FieldSelection {
    pub fn new(field_name: impl Into<String>) -> Self {
        let field_name = field_name.into();
        FieldSelection {
            response_key: field_name.clone(),
            field_name,
            arguments: ArgumentValues::new(),
            selections: Vec::new(),
            position: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.response_key = alias.into();
        self
    }

    pub fn argument(mut self, name: impl Into<String>, value: impl Into<crate::response::value::Value>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }

    pub fn select(mut self, selection: FieldSelection) -> Self {
        self.selections.push(selection);
        self
    }
}

pub(crate) struct PlanContext<'a, 'd> {
    pub schema: &'a SchemaRegistry,
    pub fragments: &'a HashMap<&'a str, &'a FragmentDefinition<'d, String>>,
    pub variables: &'a VariableValues,
}

impl<'a, 'd> PlanContext<'a, 'd> {
    /// Flattens `selection_set` on `parent_type` into `out`, merging fields
    /// that share a response key.
    pub fn collect_fields(
        &self,
        parent_type: &TypeDefinition,
        selection_set: &SelectionSet<'d, String>,
        out: &mut Vec<FieldSelection>,
    ) -> Result<(), RequestError> {
        for selection in &selection_set.items {
            match selection {
                Selection::Field(field) => {
                    if !self.should_include(&field.directives)? {
                        continue;
                    }
                    let response_key = field.alias.as_ref().unwrap_or(&field.name);

                    let index = match out.iter().position(|f| &f.response_key == response_key) {
                        Some(index) => {
                            if out[index].field_name != field.name {
                                return Err(RequestError::validation(
                                    format!(
                                        "Fields \"{}\" conflict because \"{}\" and \"{}\" are different fields.",
                                        response_key, out[index].field_name, field.name
                                    ),
                                    field.position,
                                ));
                            }
                            index
                        }
                        None => {
                            out.push(self.plan_field(parent_type, response_key, field)?);
                            out.len() - 1
                        }
                    };

                    if field.selection_set.items.is_empty() {
                        continue;
                    }
                    let child_type = parent_type
                        .field(&field.name)
                        .and_then(|definition| self.schema.lookup(definition.type_name()))
                        .ok_or_else(|| {
                            RequestError::validation(
                                format!(
                                    "Cannot query field \"{}\" on type \"{}\".",
                                    field.name, parent_type.name
                                ),
                                field.position,
                            )
                        })?;
                    self.collect_fields(child_type, &field.selection_set, &mut out[index].selections)?;
                }
                Selection::FragmentSpread(spread) => {
                    if !self.should_include(&spread.directives)? {
                        continue;
                    }
                    let fragment = self
                        .fragments
                        .get(spread.fragment_name.as_str())
                        .ok_or_else(|| {
                            RequestError::validation(
                                format!("Unknown fragment \"{}\".", spread.fragment_name),
                                spread.position,
                            )
                        })?;
                    let TypeCondition::On(type_condition) = &fragment.type_condition;
                    if type_condition == &parent_type.name {
                        self.collect_fields(parent_type, &fragment.selection_set, out)?;
                    }
                }
                Selection::InlineFragment(inline) => {
                    if !self.should_include(&inline.directives)? {
                        continue;
                    }
                    let applies = match &inline.type_condition {
                        Some(TypeCondition::On(type_condition)) => type_condition == &parent_type.name,
                        None => true,
                    };
                    if applies {
                        self.collect_fields(parent_type, &inline.selection_set, out)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn plan_field(
        &self,
        parent_type: &TypeDefinition,
        response_key: &str,
        field: &graphql_parser::query::Field<'d, String>,
    ) -> Result<FieldSelection, RequestError> {
        let mut selection = FieldSelection::new(field.name.as_str()).alias(response_key);
        selection.position = Some(field.position);

        if field.name == TYPENAME_FIELD {
            return Ok(selection);
        }

        let definition = parent_type.field(&field.name).ok_or_else(|| {
            RequestError::validation(
                format!(
                    "Cannot query field \"{}\" on type \"{}\".",
                    field.name, parent_type.name
                ),
                field.position,
            )
        })?;

        selection.arguments = provided_arguments(&field.arguments, self.variables)
            .and_then(|provided| coerce_argument_values(self.schema, definition, provided))
            .map_err(|reason| {
                RequestError::InvalidVariables(format!(
                    "Invalid arguments for field \"{}.{}\": {}",
                    parent_type.name, field.name, reason
                ))
            })?;

        Ok(selection)
    }

    /// Evaluates `@skip(if:)` and `@include(if:)`.
    fn should_include(&self, directives: &[Directive<'d, String>]) -> Result<bool, RequestError> {
        for directive in directives {
            let skip_when = match directive.name.as_str() {
                "skip" => true,
                "include" => false,
                _ => continue,
            };
            let condition = directive
                .arguments
                .iter()
                .find(|(name, _)| name == "if")
                .map(|(_, value)| value_from_ast(value, Some(self.variables)))
                .transpose()
                .map_err(RequestError::InvalidVariables)?;

            match condition.as_ref().and_then(|value| value.as_bool()) {
                Some(condition) if condition == skip_when => return Ok(false),
                Some(_) => {}
                None => {
                    return Err(RequestError::InvalidVariables(format!(
                        "Argument \"if\" of directive \"@{}\" must be a Boolean.",
                        directive.name
                    )))
                }
            }
        }
        Ok(true)
    }
}
