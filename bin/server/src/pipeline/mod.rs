use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    response::{IntoResponse, Response},
};
use http::{header::CONTENT_TYPE, Method, Request, StatusCode};
use minigraph_executor::OperationType;
use tracing::{debug, error};

use crate::{
    pipeline::{
        error::{PipelineError, PipelineErrorFromAcceptHeader, PipelineErrorVariant},
        execution_request::get_execution_request,
        header::RequestAccepts,
    },
    shared_state::ServerSharedState,
};

pub mod error;
pub mod execution_request;
pub mod header;

pub async fn graphql_request_handler(
    State(state): State<Arc<ServerSharedState>>,
    mut req: Request<Body>,
) -> Response {
    match execute_pipeline(&state, &mut req).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn execute_pipeline(
    state: &ServerSharedState,
    req: &mut Request<Body>,
) -> Result<Response, PipelineError> {
    let execution_request = get_execution_request(req).await?;

    let operation = state
        .executor
        .prepare(&execution_request)
        .map_err(|errors| req.new_pipeline_error(PipelineErrorVariant::RequestErrors(errors)))?;

    if req.method() == Method::GET && operation.operation_type == OperationType::Mutation {
        debug!("rejecting mutation sent over GET");
        return Err(req.new_pipeline_error(PipelineErrorVariant::MutationNotAllowedOverHttpGet));
    }

    let response = state.executor.run(&operation).await;
    let body = response.to_vec().map_err(|err| {
        error!("Failed to serialize execution response: {}", err);
        req.new_pipeline_error(PipelineErrorVariant::InternalServiceError(
            "failed to serialize execution response",
        ))
    })?;

    Ok((
        StatusCode::OK,
        [(CONTENT_TYPE, req.response_content_type().clone())],
        body,
    )
        .into_response())
}
