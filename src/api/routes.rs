//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, Json},
    routing::{get, post},
    Form, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::agent::{crypto_data_agent, price_prompt, Agent};
use crate::config::Config;
use crate::llm::GeminiClient;

use super::ui::{render_page, Notice, PageView, EMPTY_INPUT_WARNING};

/// Shared application state. Immutable after startup.
pub struct AppState {
    /// Reported by the health endpoint
    pub config: Config,
    /// The agent used for every lookup
    pub agent: Agent,
}

/// Result of handling one submitted coin name.
#[derive(Debug)]
enum Lookup {
    /// Empty input; nothing was requested.
    EmptyInput,
    Answer(String),
    Fault(String),
}

/// Validate the input, then run the agent to completion.
async fn lookup(state: &AppState, raw: &str) -> Lookup {
    let coin = raw.trim();
    if coin.is_empty() {
        tracing::info!("Rejected empty lookup");
        return Lookup::EmptyInput;
    }

    tracing::info!("Looking up price for {:?}", coin);
    match state.agent.run(&price_prompt(coin)).await {
        Ok(result) => Lookup::Answer(result.final_output),
        Err(e) => {
            tracing::error!("Lookup for {:?} failed: {:#}", coin, e);
            Lookup::Fault(format!("{:#}", e))
        }
    }
}

/// Build the router for the given state.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .route("/api/price", post(price))
        .route("/api/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let llm = Arc::new(GeminiClient::from_config(&config)?);
    let agent = crypto_data_agent(&config, llm)?;

    let addr = config.bind_addr();
    tracing::info!(
        "Agent {} ready (model={}, tickers={})",
        agent.name,
        agent.model,
        config.tickers_url
    );

    let state = Arc::new(AppState { config, agent });
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Form body posted by the page.
#[derive(Debug, Deserialize)]
pub struct PriceForm {
    #[serde(default)]
    pub coin: String,
}

/// GET /
async fn index() -> Html<String> {
    Html(render_page(&PageView::default()))
}

/// POST /
/// Waits for the whole agent run before rendering.
async fn submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<PriceForm>,
) -> (StatusCode, Html<String>) {
    let (status, notice) = match lookup(&state, &form.coin).await {
        Lookup::EmptyInput => (
            StatusCode::OK,
            Notice::Warning(EMPTY_INPUT_WARNING.to_string()),
        ),
        Lookup::Answer(text) => (StatusCode::OK, Notice::Success(text)),
        Lookup::Fault(message) => (StatusCode::INTERNAL_SERVER_ERROR, Notice::Error(message)),
    };

    let view = PageView {
        coin: form.coin,
        notice: Some(notice),
    };
    (status, Html(render_page(&view)))
}

#[derive(Debug, Deserialize)]
pub struct PriceRequest {
    #[serde(default)]
    pub coin: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PriceResponse {
    pub output: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceErrorResponse {
    Warning(String),
    Error(String),
}

/// POST /api/price
async fn price(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PriceRequest>,
) -> Result<Json<PriceResponse>, (StatusCode, Json<PriceErrorResponse>)> {
    match lookup(&state, &req.coin).await {
        Lookup::Answer(output) => Ok(Json(PriceResponse { output })),
        Lookup::EmptyInput => Err((
            StatusCode::BAD_REQUEST,
            Json(PriceErrorResponse::Warning(EMPTY_INPUT_WARNING.to_string())),
        )),
        Lookup::Fault(message) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(PriceErrorResponse::Error(message)),
        )),
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model: String,
    pub tickers_url: String,
}

/// GET /api/health
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.config.model.clone(),
        tickers_url: state.config.tickers_url.clone(),
    })
}
