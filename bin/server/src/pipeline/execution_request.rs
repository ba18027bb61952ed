use axum::{body::Body, extract::Query};
use http::{Method, Request};
use http_body_util::BodyExt;
use minigraph_executor::ExecutionRequest;
use serde::Deserialize;
use tracing::{trace, warn};

use crate::pipeline::{
    error::{PipelineError, PipelineErrorFromAcceptHeader, PipelineErrorVariant},
    header::AssertRequestJson,
};

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GETQueryParams {
    pub query: Option<String>,
    pub operation_name: Option<String>,
    /// JSON encoded object.
    pub variables: Option<String>,
}

impl TryInto<ExecutionRequest> for GETQueryParams {
    type Error = PipelineErrorVariant;

    fn try_into(self) -> Result<ExecutionRequest, Self::Error> {
        let query = match self.query {
            Some(q) => q,
            None => return Err(PipelineErrorVariant::GetMissingQueryParam("query")),
        };

        let variables = match self.variables.as_deref() {
            Some(v_str) if !v_str.is_empty() => match sonic_rs::from_str(v_str) {
                Ok(vars) => Some(vars),
                Err(e) => {
                    return Err(PipelineErrorVariant::FailedToParseVariables(e));
                }
            },
            _ => None,
        };

        Ok(ExecutionRequest {
            query,
            operation_name: self.operation_name.filter(|name| !name.is_empty()),
            variables,
        })
    }
}

#[inline]
pub async fn get_execution_request(
    req: &mut Request<Body>,
) -> Result<ExecutionRequest, PipelineError> {
    let http_method = req.method().clone();
    let execution_request = match http_method {
        Method::GET => {
            trace!("processing GET GraphQL operation");

            let query_params = Query::<GETQueryParams>::try_from_uri(req.uri())
                .map_err(|qe| {
                    req.new_pipeline_error(PipelineErrorVariant::GetInvalidQueryParams(qe))
                })?
                .0;

            trace!("parsed GET query params: {:?}", query_params);

            query_params
                .try_into()
                .map_err(|err| req.new_pipeline_error(err))?
        }
        Method::POST => {
            trace!("processing POST GraphQL request");

            req.assert_json_content_type()?;

            let body_bytes = match req.body_mut().collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(err) => {
                    warn!("Failed to read body bytes: {}", err);
                    return Err(
                        req.new_pipeline_error(PipelineErrorVariant::FailedToReadBodyBytes(err))
                    );
                }
            };

            sonic_rs::from_slice::<ExecutionRequest>(&body_bytes).map_err(|e| {
                warn!("Failed to parse body: {}", e);
                req.new_pipeline_error(PipelineErrorVariant::FailedToParseBody(e))
            })?
        }
        _ => {
            warn!("unsupported HTTP method: {}", http_method);

            return Err(
                req.new_pipeline_error(PipelineErrorVariant::UnsupportedHttpMethod(http_method))
            );
        }
    };

    Ok(execution_request)
}
