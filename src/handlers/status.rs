// src/handlers/status.rs
use crate::AppState;
use axum::{
    extract::Extension,
    response::{Html, Json},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn status_routes() -> Router {
    Router::new()
        .route("/api/status", get(api_status))
        .route("/api/docs", get(api_documentation))
}

async fn api_status(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "provider": {
            "name": state.provider.name(),
            "model": state.provider.model()
        },
        "endpoints": {
            "chat": "/chat",
            "status": "/api/status",
            "documentation": "/api/docs"
        }
    }))
}

// API Documentation endpoint
async fn api_documentation() -> Html<&'static str> {
    Html(
        r###"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>LLAMA API - Documentation</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; max-width: 960px; margin: 0 auto; padding: 20px; line-height: 1.6; }
        .header { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; padding: 2rem; border-radius: 10px; margin-bottom: 2rem; }
        .endpoint { background: #f8f9fa; border-left: 4px solid #007bff; padding: 1rem; margin: 1rem 0; border-radius: 5px; }
        .method { display: inline-block; padding: 0.25rem 0.5rem; border-radius: 3px; color: white; font-weight: bold; margin-right: 0.5rem; }
        .get { background: #28a745; }
        .post { background: #007bff; }
        code { background: #e9ecef; padding: 0.2rem 0.4rem; border-radius: 3px; }
    </style>
</head>
<body>
    <div class="header">
        <h1>LLAMA API</h1>
        <p>API for interacting with the LLAMA model</p>
    </div>

    <div class="endpoint">
        <span class="method post">POST</span>
        <strong>/chat</strong><br>
        Send one message and receive the generated reply<br>
        <strong>Body:</strong> <code>{"message": "Say hi", "temperature": 1.0, "max_tokens": 1024, "top_p": 1.0, "stream": false}</code><br>
        Only <code>message</code> is required. With <code>stream</code> set, the streamed reply is collected before responding.<br>
        <strong>Returns:</strong> <code>{"response": "..."}</code>, or <code>{"detail": "..."}</code> with status 500 when the model call fails
    </div>

    <div class="endpoint">
        <span class="method get">GET</span>
        <strong>/api/status</strong><br>
        Service status, version and configured model
    </div>
</body>
</html>
"###,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Completion, CompletionParams, CompletionProvider, ProviderError};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    struct StaticProvider;

    #[async_trait]
    impl CompletionProvider for StaticProvider {
        fn name(&self) -> &str {
            "groq"
        }

        fn model(&self) -> &str {
            "llama3-70b-8192"
        }

        async fn complete(&self, _params: CompletionParams) -> Result<Completion, ProviderError> {
            Ok(Completion::Complete(String::new()))
        }
    }

    #[tokio::test]
    async fn test_status_reports_model() {
        let app = crate::build_router(Arc::new(AppState {
            provider: Arc::new(StaticProvider),
        }));
        let resp = app
            .oneshot(Request::builder().uri("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(&to_bytes(resp.into_body(), usize::MAX).await.unwrap()).unwrap();
        assert_eq!(body["status"], "operational");
        assert_eq!(body["provider"]["name"], "groq");
        assert_eq!(body["provider"]["model"], "llama3-70b-8192");
    }
}
