//! Conversions from `graphql-parser` AST nodes into the executor's own model.

use graphql_parser::query::{Type, Value as AstValue};
use indexmap::IndexMap;

use crate::{response::value::Value, schema::definition::TypeRef};

/// Coerced variable values of one operation.
pub type VariableValues = IndexMap<String, Value>;

/// Converts a type expression into a [`TypeRef`].
///
/// Fails with the rendered expression when it nests lists.
pub fn type_ref_from_ast(ty: &Type<'_, String>) -> Result<TypeRef, String> {
    let nested = || Err(ty.to_string());

    match ty {
        Type::NamedType(name) => Ok(TypeRef::named(name.as_str())),
        Type::NonNullType(inner) => match inner.as_ref() {
            Type::NamedType(name) => Ok(TypeRef::named(name.as_str()).non_null()),
            Type::ListType(element) => match list_element(element) {
                Some((name, element_nullable)) => {
                    Ok(TypeRef::list_of(name, element_nullable).non_null())
                }
                None => nested(),
            },
            Type::NonNullType(_) => nested(),
        },
        Type::ListType(element) => match list_element(element) {
            Some((name, element_nullable)) => Ok(TypeRef::list_of(name, element_nullable)),
            None => nested(),
        },
    }
}

fn list_element<'t>(element: &'t Type<'_, String>) -> Option<(&'t str, bool)> {
    match element {
        Type::NamedType(name) => Some((name.as_str(), true)),
        Type::NonNullType(inner) => match inner.as_ref() {
            Type::NamedType(name) => Some((name.as_str(), false)),
            _ => None,
        },
        Type::ListType(_) => None,
    }
}

/// Converts a literal into a [`Value`].
///
/// `variables` is `None` in constant positions (schema defaults, variable
/// defaults) where referencing a variable is an error. A variable that was not
/// provided resolves to `null`.
pub fn value_from_ast(
    value: &AstValue<'_, String>,
    variables: Option<&VariableValues>,
) -> Result<Value, String> {
    match value {
        AstValue::Null => Ok(Value::Null),
        AstValue::Boolean(b) => Ok(Value::Boolean(*b)),
        AstValue::String(s) => Ok(Value::String(s.clone())),
        AstValue::Enum(e) => Ok(Value::String(e.clone())),
        AstValue::Int(n) => n
            .as_i64()
            .map(Value::Int)
            .ok_or_else(|| "integer literal is out of range".to_string()),
        AstValue::Float(f) => Ok(Value::Float(*f)),
        AstValue::List(items) => items
            .iter()
            .map(|item| value_from_ast(item, variables))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        AstValue::Object(fields) => fields
            .iter()
            .map(|(key, item)| Ok((key.clone(), value_from_ast(item, variables)?)))
            .collect::<Result<IndexMap<_, _>, String>>()
            .map(Value::Object),
        AstValue::Variable(name) => match variables {
            Some(variables) => Ok(variables.get(name).cloned().unwrap_or(Value::Null)),
            None => Err(format!("variable '${}' cannot be used in a constant value", name)),
        },
    }
}
