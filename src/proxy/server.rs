//! HTTP server setup and configuration.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use super::handlers;
use crate::config::Config;
use crate::sms::{LibPhoneNumber, ProviderRegistry, SmsService};

/// Response header: correlation ID (UUID v4).
pub const SMSGATE_REQUEST_ID_HEADER: &str = "x-smsgate-request-id";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub sms: Arc<SmsService>,
}

/// Correlation ID assigned to every request.
#[derive(Debug, Clone, Copy)]
pub struct RequestId(pub Uuid);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

async fn assign_request_id(mut request: Request, next: Next) -> Response {
    let id = RequestId(Uuid::new_v4());
    request.extensions_mut().insert(id);

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(SMSGATE_REQUEST_ID_HEADER), value);
    }
    response
}

/// Create the axum router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/send", post(handlers::send))
        .route("/health", get(handlers::health))
        .route("/providers", get(handlers::list_providers))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(assign_request_id)),
        )
}

/// Run the HTTP server.
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let listen_addr = config.server.listen.clone();

    // One pooled client shared by every vendor
    let http_client = Client::builder()
        .timeout(Duration::from_secs(config.server.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .build()?;

    let routing = Arc::new(config.routing);
    let registry = Arc::new(ProviderRegistry::from_config(&routing, http_client));
    let sms = SmsService::new(routing, registry, Arc::new(LibPhoneNumber));

    let state = AppState { sms: Arc::new(sms) };
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    tracing::info!(address = %listen_addr, "Starting smsgate server");

    axum::serve(listener, app).await?;

    Ok(())
}
