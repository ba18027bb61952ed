use graphql_parser::Pos;

use crate::{
    resolvers::error::ResolverError,
    response::{
        graphql_error::{GraphQLError, GraphQLErrorExtensions, GraphQLErrorLocation, GraphQLErrorPathSegment},
        ExecutionResponse,
    },
};

pub const PARSE_FAILED_CODE: &str = "GRAPHQL_PARSE_FAILED";
pub const VALIDATION_FAILED_CODE: &str = "GRAPHQL_VALIDATION_FAILED";
pub const OPERATION_RESOLUTION_FAILURE_CODE: &str = "OPERATION_RESOLUTION_FAILURE";
pub const BAD_USER_INPUT_CODE: &str = "BAD_USER_INPUT";
pub const INTERNAL_SERVER_ERROR_CODE: &str = "INTERNAL_SERVER_ERROR";

/// A failure that prevents an operation from executing at all.
///
/// Reported as `{ "errors": [...] }` without `data`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RequestError {
    #[error("Syntax Error: {0}")]
    Parse(String),
    #[error("{0}")]
    OperationResolution(String),
    #[error("{message}")]
    Validation { message: String, locations: Vec<Pos> },
    #[error("{0}")]
    InvalidVariables(String),
}

impl RequestError {
    pub fn validation(message: impl Into<String>, location: Pos) -> Self {
        RequestError::Validation {
            message: message.into(),
            locations: vec![location],
        }
    }

    pub fn graphql_error_code(&self) -> &'static str {
        match self {
            RequestError::Parse(_) => PARSE_FAILED_CODE,
            RequestError::OperationResolution(_) => OPERATION_RESOLUTION_FAILURE_CODE,
            RequestError::Validation { .. } => VALIDATION_FAILED_CODE,
            RequestError::InvalidVariables(_) => BAD_USER_INPUT_CODE,
        }
    }
}

impl From<&RequestError> for GraphQLError {
    fn from(error: &RequestError) -> Self {
        let mut graphql_error = GraphQLError::from_message_and_extensions(
            error.to_string(),
            GraphQLErrorExtensions::new_from_code(error.graphql_error_code()),
        );
        if let RequestError::Validation { locations, .. } = error {
            if !locations.is_empty() {
                graphql_error.locations =
                    Some(locations.iter().copied().map(GraphQLErrorLocation::from).collect());
            }
        }
        graphql_error
    }
}

impl From<Vec<RequestError>> for ExecutionResponse {
    fn from(errors: Vec<RequestError>) -> Self {
        ExecutionResponse::from_errors(errors.iter().map(GraphQLError::from).collect())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldErrorKind {
    #[error("Cannot query field \"{field_name}\" on type \"{type_name}\".")]
    UnknownField {
        type_name: String,
        field_name: String,
    },
    #[error("Argument error on field \"{type_name}.{field_name}\": {reason}")]
    InvalidArguments {
        type_name: String,
        field_name: String,
        reason: String,
    },
    #[error(transparent)]
    Resolver(ResolverError),
    #[error("Cannot return null for non-nullable field {type_name}.{field_name}.")]
    NullConstraint {
        type_name: String,
        field_name: String,
    },
    #[error("Cannot return null for non-nullable list element of field {type_name}.{field_name}.")]
    NullListElement {
        type_name: String,
        field_name: String,
    },
    #[error("{0}")]
    TypeMismatch(String),
}

/// A failure of one field during execution, tagged with its response path.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub kind: FieldErrorKind,
    pub path: Vec<GraphQLErrorPathSegment>,
    pub location: Option<Pos>,
}

impl FieldError {
    pub fn new(kind: FieldErrorKind, path: &[GraphQLErrorPathSegment], location: Option<Pos>) -> Self {
        FieldError {
            kind,
            path: path.to_vec(),
            location,
        }
    }

    pub fn graphql_error_code(&self) -> &str {
        match &self.kind {
            FieldErrorKind::UnknownField { .. } => VALIDATION_FAILED_CODE,
            FieldErrorKind::InvalidArguments { .. } => BAD_USER_INPUT_CODE,
            FieldErrorKind::Resolver(error) => {
                error.code.as_deref().unwrap_or(INTERNAL_SERVER_ERROR_CODE)
            }
            FieldErrorKind::NullConstraint { .. }
            | FieldErrorKind::NullListElement { .. }
            | FieldErrorKind::TypeMismatch(_) => INTERNAL_SERVER_ERROR_CODE,
        }
    }
}

impl From<FieldError> for GraphQLError {
    fn from(error: FieldError) -> Self {
        GraphQLError {
            message: error.kind.to_string(),
            locations: error.location.map(|pos| vec![pos.into()]),
            extensions: GraphQLErrorExtensions::new_from_code(error.graphql_error_code()),
            path: Some(error.path),
        }
    }
}
