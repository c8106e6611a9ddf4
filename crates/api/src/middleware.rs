use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request log line with a request id (generated when the client did
/// not send one). The id is echoed back on the response.
pub async fn request_logging(mut req: Request<Body>, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::now_v7().to_string());

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    req.extensions_mut().insert(RequestId(request_id.clone()));

    tracing::info!(%method, path, request_id, "incoming request");

    let mut response = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Request id attached to request extensions for downstream handlers.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);
