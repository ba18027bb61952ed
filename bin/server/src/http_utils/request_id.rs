use http::{HeaderName, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use ulid::Ulid;

pub static REQUEST_ID_HEADER_NAME: HeaderName = HeaderName::from_static("x-request-id");

/// Reuses the client's `x-request-id` or mints a ULID.
#[derive(Debug, Clone)]
pub struct RequestIdGenerator;

impl MakeRequestId for RequestIdGenerator {
    fn make_request_id<B>(&mut self, request: &Request<B>) -> Option<RequestId> {
        let request_id = match request.headers().get(&REQUEST_ID_HEADER_NAME) {
            Some(value) => value.clone(),
            None => HeaderValue::from_str(&Ulid::new().to_string()).ok()?,
        };

        Some(RequestId::new(request_id))
    }
}
