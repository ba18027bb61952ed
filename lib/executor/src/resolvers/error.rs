use crate::schema::definition::OperationType;

/// Raised by a resolver; reported in the response `errors` at the field's path.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ResolverError {
    pub message: String,
    /// Reported as `extensions.code`. Defaults to `INTERNAL_SERVER_ERROR`.
    pub code: Option<String>,
}

impl ResolverError {
    pub fn new(message: impl Into<String>) -> Self {
        ResolverError {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl From<&str> for ResolverError {
    fn from(message: &str) -> Self {
        ResolverError::new(message)
    }
}

impl From<String> for ResolverError {
    fn from(message: String) -> Self {
        ResolverError::new(message)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BindingError {
    #[error("Cannot bind a resolver to unknown type '{0}'")]
    UnknownType(String),
    #[error("Cannot bind a resolver to '{0}': only object type fields have resolvers")]
    NotAnObjectType(String),
    #[error("The schema does not declare a {0} root type")]
    MissingRootType(OperationType),
    #[error("Field '{field_name}' is not declared on type '{type_name}'")]
    UnknownField {
        type_name: String,
        field_name: String,
    },
    #[error("A resolver is already bound to '{type_name}.{field_name}'")]
    DuplicateBinding {
        type_name: String,
        field_name: String,
    },
}
