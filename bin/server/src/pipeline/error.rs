use axum::{body::Body, extract::rejection::QueryRejection, response::IntoResponse};
use http::{header::CONTENT_TYPE, HeaderName, Method, Request, Response, StatusCode};
use minigraph_executor::{
    execution::error::{INTERNAL_SERVER_ERROR_CODE, VALIDATION_FAILED_CODE},
    response::graphql_error::GraphQLErrorExtensions,
    ExecutionResponse, GraphQLError, RequestError,
};
use tracing::error;

use crate::pipeline::header::{
    RequestAccepts, APPLICATION_GRAPHQL_RESPONSE_JSON, APPLICATION_GRAPHQL_RESPONSE_JSON_STR,
    APPLICATION_JSON,
};

#[derive(Debug)]
pub struct PipelineError {
    /// The client only understands `application/json`, so GraphQL failures
    /// are reported with `200 OK`.
    pub accept_ok: bool,
    pub error: PipelineErrorVariant,
}

pub trait PipelineErrorFromAcceptHeader {
    fn new_pipeline_error(&self, error: PipelineErrorVariant) -> PipelineError;
}

impl PipelineErrorFromAcceptHeader for Request<Body> {
    fn new_pipeline_error(&self, error: PipelineErrorVariant) -> PipelineError {
        let accept_ok = !self.accepts_content_type(&APPLICATION_GRAPHQL_RESPONSE_JSON_STR);
        PipelineError { accept_ok, error }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineErrorVariant {
    // Internal errors
    #[error("Internal service error: {0}")]
    InternalServiceError(&'static str),

    // HTTP-related errors
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedHttpMethod(Method),
    #[error("Header '{0}' has invalid value")]
    InvalidHeaderValue(HeaderName),
    #[error("Failed to read body: {0}")]
    FailedToReadBodyBytes(axum::Error),
    #[error("Content-Type header is missing")]
    MissingContentTypeHeader,
    #[error("Content-Type header is not supported")]
    UnsupportedContentType,

    // GET specific errors
    #[error("Failed to deserialize query parameters: {0}")]
    GetInvalidQueryParams(QueryRejection),
    #[error("Missing query parameter: {0}")]
    GetMissingQueryParam(&'static str),
    #[error("Cannot perform mutations over GET")]
    MutationNotAllowedOverHttpGet,

    // GraphQL-specific errors
    #[error("Failed to parse GraphQL request payload: {0}")]
    FailedToParseBody(sonic_rs::Error),
    #[error("Failed to parse GraphQL variables JSON: {0}")]
    FailedToParseVariables(sonic_rs::Error),
    /// Parse, operation resolution, validation or variable coercion failures.
    #[error("Invalid GraphQL request")]
    RequestErrors(Vec<RequestError>),
}

impl PipelineErrorVariant {
    pub fn graphql_error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedHttpMethod(_) | Self::MutationNotAllowedOverHttpGet => {
                "METHOD_NOT_ALLOWED"
            }
            Self::InternalServiceError(_) => INTERNAL_SERVER_ERROR_CODE,
            Self::RequestErrors(errors) => errors
                .first()
                .map(RequestError::graphql_error_code)
                .unwrap_or(VALIDATION_FAILED_CODE),
            _ => "BAD_REQUEST",
        }
    }

    pub fn graphql_error_message(&self) -> String {
        match self {
            Self::InternalServiceError(_) => "Unexpected error".to_string(),
            _ => self.to_string(),
        }
    }

    pub fn default_status_code(&self, prefer_ok: bool) -> StatusCode {
        match (self, prefer_ok) {
            (Self::InternalServiceError(_), _) => StatusCode::INTERNAL_SERVER_ERROR,
            (Self::UnsupportedHttpMethod(_), _) => StatusCode::METHOD_NOT_ALLOWED,
            (Self::MutationNotAllowedOverHttpGet, _) => StatusCode::METHOD_NOT_ALLOWED,
            (Self::FailedToReadBodyBytes(_), _) => StatusCode::BAD_REQUEST,
            (Self::InvalidHeaderValue(_), _) => StatusCode::BAD_REQUEST,
            (Self::GetInvalidQueryParams(_), _) => StatusCode::BAD_REQUEST,
            (Self::GetMissingQueryParam(_), _) => StatusCode::BAD_REQUEST,
            (Self::FailedToParseBody(_), _) => StatusCode::BAD_REQUEST,
            (Self::FailedToParseVariables(_), _) => StatusCode::BAD_REQUEST,
            (Self::MissingContentTypeHeader, _) => StatusCode::NOT_ACCEPTABLE,
            (Self::UnsupportedContentType, _) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            (Self::RequestErrors(_), true) => StatusCode::OK,
            (Self::RequestErrors(_), false) => StatusCode::BAD_REQUEST,
        }
    }

    fn into_graphql_errors(self) -> Vec<GraphQLError> {
        match self {
            Self::RequestErrors(errors) => errors.iter().map(GraphQLError::from).collect(),
            other => vec![GraphQLError::from_message_and_extensions(
                other.graphql_error_message(),
                GraphQLErrorExtensions::new_from_code(other.graphql_error_code()),
            )],
        }
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response<Body> {
        let status = self.error.default_status_code(self.accept_ok);
        let content_type = if self.accept_ok {
            APPLICATION_JSON.clone()
        } else {
            APPLICATION_GRAPHQL_RESPONSE_JSON.clone()
        };

        let response = ExecutionResponse::from_errors(self.error.into_graphql_errors());
        match response.to_vec() {
            Ok(body) => (status, [(CONTENT_TYPE, content_type)], body).into_response(),
            Err(err) => {
                error!("Failed to serialize error response: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
