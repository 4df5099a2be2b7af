// src/handlers/chat.rs
use crate::models::chat::{ChatRequest, ChatResponse, ErrorDetail};
use crate::provider::{CompletionParams, ProviderError};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("{}", .0.body_text())]
    InvalidRequest(#[from] JsonRejection),
    #[error("{0}")]
    Provider(#[from] ProviderError),
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = match &self {
            // Syntax errors and a missing content type are reported like schema errors.
            ChatError::InvalidRequest(rejection) => {
                tracing::warn!(status = %rejection.status(), "Rejected chat request: {}", rejection.body_text());
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ChatError::Provider(e) => {
                tracing::error!("Provider call failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(ErrorDetail { detail: self.to_string() })).into_response()
    }
}

pub fn chat_routes() -> Router {
    Router::new().route("/chat", post(chat))
}

async fn chat(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ChatError> {
    let Json(request) = payload?;
    let params = CompletionParams::from(request);
    let stream = params.stream;

    let completion = state.provider.complete(params).await?;
    let response = completion.into_text().await?;

    tracing::info!(
        model = %state.provider.model(),
        stream,
        response_len = response.len(),
        "chat completion finished"
    );

    Ok(Json(ChatResponse { response }))
}
