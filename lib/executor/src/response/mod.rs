pub mod graphql_error;
pub mod value;

use serde::Serialize;

use crate::response::{graphql_error::GraphQLError, value::Value};

/// The `{ data, errors }` result of one operation.
///
/// `data` is `None` when the request failed before execution started (parse,
/// validation or variable errors); once execution starts it is always present,
/// possibly `null` when a non-null violation reached the root.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ExecutionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQLError>,
}

impl ExecutionResponse {
    pub fn from_errors(errors: Vec<GraphQLError>) -> Self {
        ExecutionResponse { data: None, errors }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, sonic_rs::Error> {
        sonic_rs::to_vec(self)
    }
}
