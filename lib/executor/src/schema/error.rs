#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Failed to parse type definitions: {0}")]
    Parse(#[from] graphql_parser::schema::ParseError),
    #[error("Type '{0}' is defined more than once")]
    DuplicateType(String),
    #[error("Field '{type_name}.{field_name}' is defined more than once")]
    DuplicateField {
        type_name: String,
        field_name: String,
    },
    #[error("Argument '{argument_name}' of '{type_name}.{field_name}' is defined more than once")]
    DuplicateArgument {
        type_name: String,
        field_name: String,
        argument_name: String,
    },
    #[error("Unknown type '{referenced}' referenced by '{location}'")]
    UnknownType { referenced: String, location: String },
    #[error("Unsupported type '{type_expr}' at '{location}': nested list types are not supported")]
    NestedListType { type_expr: String, location: String },
    #[error("'{location}' must be {expected} type, but '{referenced}' is {found}")]
    InvalidTypeReference {
        location: String,
        referenced: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("Invalid default value for '{location}': {reason}")]
    InvalidDefaultValue { location: String, reason: String },
    #[error("Unsupported {kind} definition at line {line}")]
    UnsupportedDefinition { kind: &'static str, line: usize },
    #[error("Type '{0}' must declare at least one field")]
    EmptyType(String),
    #[error("Schema definition is declared more than once")]
    DuplicateSchemaDefinition,
    #[error("The {operation} root type '{type_name}' is not defined")]
    MissingRootType {
        operation: &'static str,
        type_name: String,
    },
    #[error("The {operation} root type '{type_name}' must be an object type")]
    InvalidRootType {
        operation: &'static str,
        type_name: String,
    },
}
