use graphql_parser::schema::{
    Definition, Field, InputValue, TypeDefinition as AstTypeDefinition, TypeExtension,
};
use indexmap::IndexMap;

use crate::{
    ast::{type_ref_from_ast, value_from_ast},
    schema::{
        definition::{FieldDefinition, InputValueDefinition, TypeDefinition, TypeKind, TypeRef},
        error::SchemaError,
    },
};

#[derive(Debug, Default, Clone)]
pub(crate) struct SchemaRoots {
    pub query: Option<String>,
    pub mutation: Option<String>,
}

#[derive(Debug, Default)]
pub(crate) struct ParsedTypeDefs {
    pub types: Vec<TypeDefinition>,
    pub schema_roots: Option<SchemaRoots>,
}

/// Parses SDL into type definitions, checking only what a single document can
/// tell: duplicate fields/arguments, type shapes and unsupported definitions.
/// Cross-type references are checked when the registry is built.
pub(crate) fn parse_type_definitions(sdl: &str) -> Result<ParsedTypeDefs, SchemaError> {
    let document = graphql_parser::parse_schema::<String>(sdl)?;
    let mut parsed = ParsedTypeDefs::default();

    for definition in document.definitions {
        match definition {
            Definition::SchemaDefinition(schema_definition) => {
                if parsed.schema_roots.is_some() {
                    return Err(SchemaError::DuplicateSchemaDefinition);
                }
                if schema_definition.subscription.is_some() {
                    return Err(SchemaError::UnsupportedDefinition {
                        kind: "subscription root",
                        line: schema_definition.position.line,
                    });
                }
                parsed.schema_roots = Some(SchemaRoots {
                    query: schema_definition.query,
                    mutation: schema_definition.mutation,
                });
            }
            Definition::TypeDefinition(type_definition) => {
                parsed.types.push(convert_type_definition(type_definition)?);
            }
            Definition::TypeExtension(extension) => {
                let line = match &extension {
                    TypeExtension::Scalar(ext) => ext.position.line,
                    TypeExtension::Object(ext) => ext.position.line,
                    TypeExtension::Interface(ext) => ext.position.line,
                    TypeExtension::Union(ext) => ext.position.line,
                    TypeExtension::Enum(ext) => ext.position.line,
                    TypeExtension::InputObject(ext) => ext.position.line,
                };
                return Err(SchemaError::UnsupportedDefinition {
                    kind: "type extension",
                    line,
                });
            }
            Definition::DirectiveDefinition(directive) => {
                return Err(SchemaError::UnsupportedDefinition {
                    kind: "directive",
                    line: directive.position.line,
                });
            }
        }
    }

    Ok(parsed)
}

fn convert_type_definition(
    type_definition: AstTypeDefinition<'_, String>,
) -> Result<TypeDefinition, SchemaError> {
    match type_definition {
        AstTypeDefinition::Scalar(scalar) => Ok(TypeDefinition::scalar(scalar.name)),
        AstTypeDefinition::Object(object) => {
            if !object.implements_interfaces.is_empty() {
                return Err(SchemaError::UnsupportedDefinition {
                    kind: "interface implementation",
                    line: object.position.line,
                });
            }
            let mut fields = IndexMap::with_capacity(object.fields.len());
            for field in &object.fields {
                let definition = convert_field(&object.name, field)?;
                insert_unique_field(&object.name, &mut fields, definition)?;
            }
            build_type(object.name, TypeKind::Object, fields)
        }
        AstTypeDefinition::InputObject(input) => {
            let mut fields = IndexMap::with_capacity(input.fields.len());
            for input_field in &input.fields {
                let location = format!("{}.{}", input.name, input_field.name);
                let value = convert_input_value(&location, input_field)?;
                let definition = FieldDefinition {
                    default_value: value.default_value,
                    ..FieldDefinition::new(value.name, value.ty)
                };
                insert_unique_field(&input.name, &mut fields, definition)?;
            }
            build_type(input.name, TypeKind::Input, fields)
        }
        AstTypeDefinition::Interface(interface) => Err(SchemaError::UnsupportedDefinition {
            kind: "interface",
            line: interface.position.line,
        }),
        AstTypeDefinition::Union(union) => Err(SchemaError::UnsupportedDefinition {
            kind: "union",
            line: union.position.line,
        }),
        AstTypeDefinition::Enum(enum_type) => Err(SchemaError::UnsupportedDefinition {
            kind: "enum",
            line: enum_type.position.line,
        }),
    }
}

fn build_type(
    name: String,
    kind: TypeKind,
    fields: IndexMap<String, FieldDefinition>,
) -> Result<TypeDefinition, SchemaError> {
    if fields.is_empty() {
        return Err(SchemaError::EmptyType(name));
    }
    Ok(TypeDefinition { name, kind, fields })
}

fn insert_unique_field(
    type_name: &str,
    fields: &mut IndexMap<String, FieldDefinition>,
    definition: FieldDefinition,
) -> Result<(), SchemaError> {
    if fields.contains_key(&definition.name) {
        return Err(SchemaError::DuplicateField {
            type_name: type_name.to_string(),
            field_name: definition.name,
        });
    }
    fields.insert(definition.name.clone(), definition);
    Ok(())
}

fn convert_field(type_name: &str, field: &Field<'_, String>) -> Result<FieldDefinition, SchemaError> {
    let location = format!("{}.{}", type_name, field.name);
    let ty = convert_type(&location, &field.field_type)?;

    let mut arguments: Vec<InputValueDefinition> = Vec::with_capacity(field.arguments.len());
    for argument in &field.arguments {
        if arguments.iter().any(|existing| existing.name == argument.name) {
            return Err(SchemaError::DuplicateArgument {
                type_name: type_name.to_string(),
                field_name: field.name.clone(),
                argument_name: argument.name.clone(),
            });
        }
        let argument_location = format!("{}({}:)", location, argument.name);
        arguments.push(convert_input_value(&argument_location, argument)?);
    }

    Ok(FieldDefinition {
        arguments,
        ..FieldDefinition::new(field.name.as_str(), ty)
    })
}

fn convert_input_value(
    location: &str,
    input_value: &InputValue<'_, String>,
) -> Result<InputValueDefinition, SchemaError> {
    let ty = convert_type(location, &input_value.value_type)?;
    let default_value = input_value
        .default_value
        .as_ref()
        .map(|value| value_from_ast(value, None))
        .transpose()
        .map_err(|reason| SchemaError::InvalidDefaultValue {
            location: location.to_string(),
            reason,
        })?;

    Ok(InputValueDefinition {
        name: input_value.name.clone(),
        ty,
        default_value,
    })
}

fn convert_type(
    location: &str,
    ty: &graphql_parser::schema::Type<'_, String>,
) -> Result<TypeRef, SchemaError> {
    type_ref_from_ast(ty).map_err(|type_expr| SchemaError::NestedListType {
        type_expr,
        location: location.to_string(),
    })
}
