use std::collections::{HashMap, HashSet};

use graphql_parser::{
    query::{Directive, FragmentDefinition, Selection, SelectionSet, TypeCondition, Value as AstValue, VariableDefinition},
    Pos,
};

use crate::{
    ast::{type_ref_from_ast, value_from_ast},
    execution::{error::RequestError, input::coerce_input_value, plan::TYPENAME_FIELD},
    schema::{
        definition::{TypeDefinition, TypeKind},
        SchemaRegistry,
    },
};

/// Static checks of one operation against the schema. Runs before variables
/// are coerced, so variable values are never inspected here.
pub(crate) struct Validator<'a, 'd> {
    schema: &'a SchemaRegistry,
    fragments: &'a HashMap<&'a str, &'a FragmentDefinition<'d, String>>,
    defined_variables: HashSet<&'a str>,
    fragment_stack: Vec<&'a str>,
    errors: Vec<RequestError>,
}

impl<'a, 'd> Validator<'a, 'd> {
    pub fn new(
        schema: &'a SchemaRegistry,
        fragments: &'a HashMap<&'a str, &'a FragmentDefinition<'d, String>>,
    ) -> Self {
        Validator {
            schema,
            fragments,
            defined_variables: HashSet::new(),
            fragment_stack: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn validate(
        mut self,
        root_type: &'a TypeDefinition,
        variable_definitions: &'a [VariableDefinition<'d, String>],
        selection_set: &'a SelectionSet<'d, String>,
    ) -> Vec<RequestError> {
        self.validate_variable_definitions(variable_definitions);
        self.validate_selection_set(root_type, selection_set);
        self.errors
    }

    fn error(&mut self, message: String, position: Pos) {
        self.errors.push(RequestError::validation(message, position));
    }

    fn validate_variable_definitions(&mut self, definitions: &'a [VariableDefinition<'d, String>]) {
        for definition in definitions {
            if !self.defined_variables.insert(definition.name.as_str()) {
                self.error(
                    format!("There can be only one variable named \"${}\".", definition.name),
                    definition.position,
                );
                continue;
            }

            let ty = match type_ref_from_ast(&definition.var_type) {
                Ok(ty) => ty,
                Err(type_expr) => {
                    self.error(
                        format!(
                            "Variable \"${}\" has unsupported type \"{}\".",
                            definition.name, type_expr
                        ),
                        definition.position,
                    );
                    continue;
                }
            };

            match self.schema.lookup(&ty.name) {
                None => self.error(format!("Unknown type \"{}\".", ty.name), definition.position),
                Some(t) if t.is_object() => self.error(
                    format!(
                        "Variable \"${}\" cannot be non-input type \"{}\".",
                        definition.name, ty
                    ),
                    definition.position,
                ),
                Some(_) => {
                    if let Some(default_value) = &definition.default_value {
                        let checked = value_from_ast(default_value, None)
                            .and_then(|value| coerce_input_value(self.schema, &ty, value));
                        if let Err(reason) = checked {
                            self.error(
                                format!(
                                    "Variable \"${}\" has an invalid default value: {}",
                                    definition.name, reason
                                ),
                                definition.position,
                            );
                        }
                    }
                }
            }
        }
    }

    fn validate_selection_set(
        &mut self,
        parent_type: &'a TypeDefinition,
        selection_set: &'a SelectionSet<'d, String>,
    ) {
        for selection in &selection_set.items {
            match selection {
                Selection::Field(field) => {
                    self.validate_directives(&field.directives);
                    for (_, value) in &field.arguments {
                        self.validate_variable_usage(value, field.position);
                    }

                    if field.name == TYPENAME_FIELD {
                        if !field.selection_set.items.is_empty() {
                            self.error(
                                format!(
                                    "Field \"{}\" must not have a selection since type \"String!\" has no subfields.",
                                    TYPENAME_FIELD
                                ),
                                field.position,
                            );
                        }
                        continue;
                    }

                    let Some(definition) = parent_type.field(&field.name) else {
                        self.error(
                            format!(
                                "Cannot query field \"{}\" on type \"{}\".",
                                field.name, parent_type.name
                            ),
                            field.position,
                        );
                        continue;
                    };

                    for (name, value) in &field.arguments {
                        let Some(argument) = definition.argument(name) else {
                            self.error(
                                format!(
                                    "Unknown argument \"{}\" on field \"{}.{}\".",
                                    name, parent_type.name, field.name
                                ),
                                field.position,
                            );
                            continue;
                        };
                        // Values containing variables are checked once variables are coerced.
                        if let Ok(literal) = value_from_ast(value, None) {
                            if let Err(reason) = coerce_input_value(self.schema, &argument.ty, literal) {
                                self.error(
                                    format!(
                                        "Argument \"{}\" has invalid value {}: {}",
                                        name, value, reason
                                    ),
                                    field.position,
                                );
                            }
                        }
                    }
                    for argument in definition.arguments.iter().filter(|a| a.is_required()) {
                        if !field.arguments.iter().any(|(name, _)| name == &argument.name) {
                            self.error(
                                format!(
                                    "Field \"{}\" argument \"{}\" of type \"{}\" is required, but it was not provided.",
                                    field.name, argument.name, argument.ty
                                ),
                                field.position,
                            );
                        }
                    }

                    let Some(field_type) = self.schema.lookup(definition.type_name()) else {
                        continue;
                    };
                    match (field_type.kind, field.selection_set.items.is_empty()) {
                        (TypeKind::Object, true) => self.error(
                            format!(
                                "Field \"{}\" of type \"{}\" must have a selection of subfields. Did you mean \"{} {{ ... }}\"?",
                                field.name, definition.ty, field.name
                            ),
                            field.position,
                        ),
                        (TypeKind::Object, false) => {
                            self.validate_selection_set(field_type, &field.selection_set)
                        }
                        (_, false) => self.error(
                            format!(
                                "Field \"{}\" must not have a selection since type \"{}\" has no subfields.",
                                field.name, definition.ty
                            ),
                            field.position,
                        ),
                        (_, true) => {}
                    }
                }
                Selection::FragmentSpread(spread) => {
                    self.validate_directives(&spread.directives);
                    let name = spread.fragment_name.as_str();
                    let Some(fragment) = self.fragments.get(name).copied() else {
                        self.error(format!("Unknown fragment \"{}\".", name), spread.position);
                        continue;
                    };
                    if self.fragment_stack.contains(&name) {
                        self.error(
                            format!("Cannot spread fragment \"{}\" within itself.", name),
                            spread.position,
                        );
                        continue;
                    }
                    let TypeCondition::On(type_condition) = &fragment.type_condition;
                    let Some(fragment_type) =
                        self.check_type_condition(parent_type, type_condition, spread.position)
                    else {
                        continue;
                    };
                    self.fragment_stack.push(fragment.name.as_str());
                    self.validate_selection_set(fragment_type, &fragment.selection_set);
                    self.fragment_stack.pop();
                }
                Selection::InlineFragment(inline) => {
                    self.validate_directives(&inline.directives);
                    let fragment_type = match &inline.type_condition {
                        Some(TypeCondition::On(type_condition)) => {
                            match self.check_type_condition(parent_type, type_condition, inline.position) {
                                Some(fragment_type) => fragment_type,
                                None => continue,
                            }
                        }
                        None => parent_type,
                    };
                    self.validate_selection_set(fragment_type, &inline.selection_set);
                }
            }
        }
    }

    /// Only object types exist, so a fragment applies exactly when its type
    /// condition names the parent type.
    fn check_type_condition(
        &mut self,
        parent_type: &TypeDefinition,
        type_condition: &str,
        position: Pos,
    ) -> Option<&'a TypeDefinition> {
        let schema = self.schema;
        match schema.lookup(type_condition) {
            None => {
                self.error(format!("Unknown type \"{}\".", type_condition), position);
                None
            }
            Some(t) if !t.is_object() => {
                self.error(
                    format!(
                        "Fragment cannot condition on non composite type \"{}\".",
                        type_condition
                    ),
                    position,
                );
                None
            }
            Some(t) if t.name != parent_type.name => {
                self.error(
                    format!(
                        "Fragment cannot be spread here as objects of type \"{}\" can never be of type \"{}\".",
                        parent_type.name, type_condition
                    ),
                    position,
                );
                None
            }
            Some(t) => Some(t),
        }
    }

    fn validate_directives(&mut self, directives: &'a [Directive<'d, String>]) {
        for directive in directives {
            match directive.name.as_str() {
                "skip" | "include" => {
                    match directive.arguments.iter().find(|(name, _)| name == "if") {
                        Some((_, value)) => {
                            if let AstValue::Variable(_) = value {
                                self.validate_variable_usage(value, directive.position);
                            } else if !matches!(value, AstValue::Boolean(_)) {
                                self.error(
                                    format!(
                                        "Argument \"if\" of directive \"@{}\" has invalid value {}.",
                                        directive.name, value
                                    ),
                                    directive.position,
                                );
                            }
                        }
                        None => self.error(
                            format!(
                                "Directive \"@{}\" argument \"if\" of type \"Boolean!\" is required, but it was not provided.",
                                directive.name
                            ),
                            directive.position,
                        ),
                    }
                }
                other => self.error(format!("Unknown directive \"@{}\".", other), directive.position),
            }
        }
    }

    fn validate_variable_usage(&mut self, value: &'a AstValue<'d, String>, position: Pos) {
        match value {
            AstValue::Variable(name) => {
                if !self.defined_variables.contains(name.as_str()) {
                    self.error(format!("Variable \"${}\" is not defined.", name), position);
                }
            }
            AstValue::List(items) => {
                for item in items {
                    self.validate_variable_usage(item, position);
                }
            }
            AstValue::Object(fields) => {
                for item in fields.values() {
                    self.validate_variable_usage(item, position);
                }
            }
            _ => {}
        }
    }
}
