use std::collections::HashMap;

use graphql_parser::query::{Value as AstValue, VariableDefinition};
use indexmap::IndexMap;

use crate::{
    ast::{type_ref_from_ast, value_from_ast, VariableValues},
    execution::error::RequestError,
    resolvers::ArgumentValues,
    response::value::Value,
    schema::{
        definition::{
            FieldDefinition, TypeKind, TypeRef, BOOLEAN_SCALAR, FLOAT_SCALAR, ID_SCALAR,
            INT_SCALAR, STRING_SCALAR,
        },
        SchemaRegistry,
    },
};

/// Coerces the request's variables against the operation's variable
/// definitions. Variables that are neither provided nor defaulted are absent
/// from the result.
pub(crate) fn coerce_variable_values(
    schema: &SchemaRegistry,
    definitions: &[VariableDefinition<'_, String>],
    provided: Option<&HashMap<String, Value>>,
) -> Result<VariableValues, Vec<RequestError>> {
    let mut coerced = VariableValues::new();
    let mut errors = Vec::new();

    for definition in definitions {
        let name = definition.name.as_str();
        let ty = match type_ref_from_ast(&definition.var_type) {
            Ok(ty) => ty,
            Err(type_expr) => {
                errors.push(RequestError::InvalidVariables(format!(
                    "Variable \"${}\" has unsupported type \"{}\".",
                    name, type_expr
                )));
                continue;
            }
        };

        if let Some(value) = provided.and_then(|variables| variables.get(name)) {
            match coerce_input_value(schema, &ty, value.clone()) {
                Ok(value) => {
                    coerced.insert(name.to_string(), value);
                }
                Err(reason) => errors.push(RequestError::InvalidVariables(format!(
                    "Variable \"${}\" got invalid value {}; {}",
                    name, value, reason
                ))),
            }
            continue;
        }

        if let Some(default_value) = &definition.default_value {
            let default_value = value_from_ast(default_value, None)
                .and_then(|value| coerce_input_value(schema, &ty, value));
            match default_value {
                Ok(value) => {
                    coerced.insert(name.to_string(), value);
                }
                Err(reason) => errors.push(RequestError::InvalidVariables(format!(
                    "Variable \"${}\" has an invalid default value; {}",
                    name, reason
                ))),
            }
            continue;
        }

        if !ty.nullable {
            errors.push(RequestError::InvalidVariables(format!(
                "Variable \"${}\" of required type \"{}\" was not provided.",
                name, ty
            )));
        }
    }

    if errors.is_empty() {
        Ok(coerced)
    } else {
        Err(errors)
    }
}

/// Collects the argument values written in the operation. An argument given
/// as a variable that has no value counts as not provided.
pub(crate) fn provided_arguments(
    arguments: &[(String, AstValue<'_, String>)],
    variables: &VariableValues,
) -> Result<ArgumentValues, String> {
    let mut provided = ArgumentValues::new();
    for (name, value) in arguments {
        if let AstValue::Variable(variable_name) = value {
            if !variables.contains_key(variable_name) {
                continue;
            }
        }
        provided.insert(name.clone(), value_from_ast(value, Some(variables))?);
    }
    Ok(provided)
}

/// Coerces provided argument values against a field's argument definitions,
/// applying defaults.
pub(crate) fn coerce_argument_values(
    schema: &SchemaRegistry,
    field: &FieldDefinition,
    mut provided: ArgumentValues,
) -> Result<ArgumentValues, String> {
    let mut coerced = ArgumentValues::with_capacity(field.arguments.len());

    for argument in &field.arguments {
        match provided.shift_remove(&argument.name) {
            Some(value) => {
                let value = coerce_input_value(schema, &argument.ty, value).map_err(|reason| {
                    format!("Argument \"{}\" has invalid value: {}", argument.name, reason)
                })?;
                coerced.insert(argument.name.clone(), value);
            }
            None => {
                if let Some(default_value) = &argument.default_value {
                    coerced.insert(argument.name.clone(), default_value.clone());
                } else if !argument.ty.nullable {
                    return Err(format!(
                        "Argument \"{}\" of required type \"{}\" was not provided.",
                        argument.name, argument.ty
                    ));
                }
            }
        }
    }

    if let Some(unknown) = provided.keys().next() {
        return Err(format!("Unknown argument \"{}\".", unknown));
    }

    Ok(coerced)
}

/// Input coercion of a single value against a type reference.
pub(crate) fn coerce_input_value(
    schema: &SchemaRegistry,
    ty: &TypeRef,
    value: Value,
) -> Result<Value, String> {
    if value.is_null() {
        return if ty.nullable {
            Ok(Value::Null)
        } else {
            Err(format!("Expected non-nullable type \"{}\" not to be null.", ty))
        };
    }

    if ty.list {
        let element = ty.element();
        return match value {
            Value::List(items) => items
                .into_iter()
                .map(|item| coerce_input_value(schema, &element, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            single => Ok(Value::List(vec![coerce_input_value(schema, &element, single)?])),
        };
    }

    let type_definition = schema
        .lookup(&ty.name)
        .ok_or_else(|| format!("Unknown type \"{}\".", ty.name))?;

    match type_definition.kind {
        TypeKind::Scalar => coerce_scalar_input(&ty.name, value),
        TypeKind::Input => {
            let Value::Object(mut fields) = value else {
                return Err(format!(
                    "Expected type \"{}\" to be an object, got {}.",
                    ty.name,
                    value.kind_str()
                ));
            };

            let mut coerced = IndexMap::with_capacity(fields.len());
            for field in type_definition.fields() {
                match fields.shift_remove(&field.name) {
                    Some(field_value) => {
                        let field_value = coerce_input_value(schema, &field.ty, field_value)
                            .map_err(|reason| format!("at \"{}\": {}", field.name, reason))?;
                        coerced.insert(field.name.clone(), field_value);
                    }
                    None => {
                        if let Some(default_value) = &field.default_value {
                            coerced.insert(field.name.clone(), default_value.clone());
                        } else if !field.ty.nullable {
                            return Err(format!(
                                "Field \"{}\" of required type \"{}\" was not provided.",
                                field.name, field.ty
                            ));
                        }
                    }
                }
            }

            if let Some(unknown) = fields.keys().next() {
                return Err(format!(
                    "Field \"{}\" is not defined by type \"{}\".",
                    unknown, ty.name
                ));
            }

            Ok(Value::Object(coerced))
        }
        TypeKind::Object => Err(format!("Type \"{}\" is not an input type.", ty.name)),
    }
}

fn coerce_scalar_input(type_name: &str, value: Value) -> Result<Value, String> {
    match (type_name, value) {
        (STRING_SCALAR, value @ Value::String(_)) => Ok(value),
        (INT_SCALAR, Value::Int(i)) if i32::try_from(i).is_ok() => Ok(Value::Int(i)),
        (INT_SCALAR, Value::Float(f))
            if f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 =>
        {
            Ok(Value::Int(f as i64))
        }
        (FLOAT_SCALAR, Value::Int(i)) => Ok(Value::Float(i as f64)),
        (FLOAT_SCALAR, value @ Value::Float(_)) => Ok(value),
        (BOOLEAN_SCALAR, value @ Value::Boolean(_)) => Ok(value),
        (ID_SCALAR, value @ Value::String(_)) => Ok(value),
        (ID_SCALAR, Value::Int(i)) => Ok(Value::String(i.to_string())),
        (STRING_SCALAR | INT_SCALAR | FLOAT_SCALAR | BOOLEAN_SCALAR | ID_SCALAR, value) => Err(
            format!("{} cannot represent value: {}", type_name, value),
        ),
        (_, value) => Ok(value),
    }
}
