use axum::body::Body;
use http::{header::CONTENT_TYPE, HeaderValue, Request};
use lazy_static::lazy_static;
use tracing::{trace, warn};

use crate::pipeline::error::{PipelineError, PipelineErrorFromAcceptHeader, PipelineErrorVariant};

lazy_static! {
    pub static ref APPLICATION_JSON_STR: &'static str = "application/json";
    pub static ref APPLICATION_JSON: HeaderValue = HeaderValue::from_static(&APPLICATION_JSON_STR);
    pub static ref APPLICATION_GRAPHQL_RESPONSE_JSON_STR: &'static str =
        "application/graphql-response+json";
    pub static ref APPLICATION_GRAPHQL_RESPONSE_JSON: HeaderValue =
        HeaderValue::from_static(&APPLICATION_GRAPHQL_RESPONSE_JSON_STR);
}

pub trait RequestAccepts {
    fn accepts_content_type(&self, content_type: &str) -> bool;

    /// The media type the response body is sent with.
    fn response_content_type(&self) -> &'static HeaderValue {
        if self.accepts_content_type(&APPLICATION_GRAPHQL_RESPONSE_JSON_STR) {
            &*APPLICATION_GRAPHQL_RESPONSE_JSON
        } else {
            &*APPLICATION_JSON
        }
    }
}

impl RequestAccepts for Request<Body> {
    fn accepts_content_type(&self, content_type: &str) -> bool {
        self.headers()
            .get(http::header::ACCEPT)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains(content_type))
    }
}

pub trait AssertRequestJson {
    fn assert_json_content_type(&self) -> Result<(), PipelineError>;
}

impl AssertRequestJson for Request<Body> {
    fn assert_json_content_type(&self) -> Result<(), PipelineError> {
        let Some(content_type) = self.headers().get(CONTENT_TYPE) else {
            trace!("POST without content type detected");
            return Err(self.new_pipeline_error(PipelineErrorVariant::MissingContentTypeHeader));
        };

        let content_type = content_type.to_str().map_err(|_| {
            self.new_pipeline_error(PipelineErrorVariant::InvalidHeaderValue(CONTENT_TYPE))
        })?;

        if !content_type.contains(*APPLICATION_JSON_STR) {
            warn!("Invalid content type on a POST request: {}", content_type);
            return Err(self.new_pipeline_error(PipelineErrorVariant::UnsupportedContentType));
        }

        Ok(())
    }
}
