use llama_chat_api::{build_router, AppConfig, AppState, GroqClient};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_logging()?;

    let config = AppConfig::from_env()?;
    tracing::info!(
        "Configuration - Model: {}, Provider URL: {}, Timeout: {}s",
        config.model,
        config.base_url,
        config.request_timeout.as_secs()
    );

    let provider = GroqClient::new(
        config.api_key.clone(),
        config.base_url.clone(),
        config.model.clone(),
        config.request_timeout,
    );
    tracing::info!("Groq client initialized ({})", config.model);

    let shared_state = Arc::new(AppState {
        provider: Arc::new(provider),
    });

    let app = build_router(shared_state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}

// Production-grade logging configuration
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,llama_chat_api=trace,reqwest=info,hyper=info,tower=info".to_string()
        } else {
            "info,llama_chat_api=info,reqwest=warn,hyper=warn,tower=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        // JSON logging for log aggregation
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();

    tracing::info!("LLAMA API starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Build mode: {}", if cfg!(debug_assertions) { "development" } else { "production" });
    tracing::info!("Log level: {}", log_level);
    tracing::info!(
        "Credentials - Groq API key: {}",
        if std::env::var("GROQ_API_KEY").map(|k| !k.is_empty()).unwrap_or(false) { "✅" } else { "❌" }
    );

    Ok(())
}
