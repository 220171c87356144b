//! HTTP request handlers.

use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};

use super::server::{AppState, RequestId};
use super::types::{ResponseBody, SendRequest};
use crate::error::Error;

/// Response header: provider name that handled the request.
pub const SMSGATE_PROVIDER_HEADER: &str = "x-smsgate-provider";

/// Attach the provider header when a provider was selected.
fn attach_provider_header(response: &mut Response, provider: Option<&str>) {
    if let Some(value) = provider.and_then(|p| HeaderValue::from_str(p).ok()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(SMSGATE_PROVIDER_HEADER), value);
    }
}

/// Handle POST /send
pub async fn send(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<SendRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::info!(request_id = %request_id, error = %rejection.body_text(), "Rejected malformed request");
            return Error::BadRequest(rejection.body_text()).into_response();
        }
    };

    tracing::info!(
        request_id = %request_id,
        app_id = %request.app_id,
        to = %request.to,
        template = ?request.template_name,
        "Received send request"
    );

    if request.app_id.is_empty() {
        return Error::BadRequest("app_id is required".to_string()).into_response();
    }
    if request.to.is_empty() {
        return Error::BadRequest("to is required".to_string()).into_response();
    }

    let content = request.content();
    match state.sms.send(&request.app_id, &request.to, &content).await {
        Ok(outcome) => {
            let provider = outcome.provider.clone();
            let body = ResponseBody::from(outcome);
            let mut response = (body.code.status_code(), Json(body)).into_response();
            attach_provider_header(&mut response, Some(&provider));
            response
        }
        Err(error) => {
            let provider = error.provider().map(str::to_string);
            let mut response = error.into_response();
            attach_provider_header(&mut response, provider.as_deref());
            response
        }
    }
}

/// Handle GET /health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "smsgate"
    }))
}

/// Handle GET /providers - configured providers and rules, without credentials
pub async fn list_providers(State(state): State<AppState>) -> impl IntoResponse {
    let routing = state.sms.routing();

    let providers: Vec<serde_json::Value> = routing
        .providers
        .iter()
        .map(|p| {
            serde_json::json!({
                "name": p.name,
                "type": p.provider_type(),
            })
        })
        .collect();

    Json(serde_json::json!({
        "providers": providers,
        "rules": routing.rules,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;

    #[test]
    fn test_attach_provider_header() {
        let mut response = Response::builder()
            .status(StatusCode::OK)
            .body(Body::empty())
            .unwrap();
        attach_provider_header(&mut response, Some("twilio-global"));
        assert_eq!(
            response.headers().get("x-smsgate-provider").unwrap(),
            "twilio-global"
        );
    }

    #[test]
    fn test_no_provider_header_before_selection() {
        let mut response = Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .body(Body::empty())
            .unwrap();
        attach_provider_header(&mut response, None);
        assert!(response.headers().get("x-smsgate-provider").is_none());
    }
}
