//! HTTP 中间件
//!
//! 提供请求追踪、指标收集和请求 ID 的中间件。

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, info_span};

use super::metrics;

/// 请求 ID 头
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// HTTP 请求追踪和指标中间件
///
/// 为每个请求创建追踪 span 并记录指标。指标中的 path 使用路由模板，
/// 避免用户 ID 等路径参数造成标签基数膨胀。
///
/// # Example
///
/// ```ignore
/// use axum::{Router, middleware};
/// use campus_shared::observability::middleware::http_tracing;
///
/// let app = Router::new()
///     .route("/health", get(health))
///     .layer(middleware::from_fn(http_tracing));
/// ```
pub async fn http_tracing(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let uri = request.uri().path().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| uri.clone());

    let span = info_span!(
        "http_request",
        method = %method,
        uri = %uri,
        status = tracing::field::Empty,
        latency_ms = tracing::field::Empty,
    );

    let start = Instant::now();
    let response = next.run(request).instrument(span.clone()).await;
    let latency = start.elapsed();
    let status = response.status().as_u16();

    span.record("status", status);
    span.record("latency_ms", latency.as_millis() as i64);

    metrics::record_http_request(&method, &route, status, latency.as_secs_f64());

    response
}

/// 请求 ID 中间件
///
/// 沿用调用方传入的 x-request-id，没有则生成新的，并在响应头中返回。
pub async fn request_id(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    request.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// 请求 ID 包装类型
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
