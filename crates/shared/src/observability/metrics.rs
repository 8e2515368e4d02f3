//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过独立的 HTTP 端口暴露，供 Prometheus 抓取。

use anyhow::Result;
use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

use super::ObservabilityConfig;

/// Metrics 资源守卫
pub struct MetricsHandle {
    _server_handle: tokio::task::JoinHandle<()>,
}

/// 初始化 Prometheus 指标导出
///
/// 启动一个独立的 HTTP 服务器在指定端口暴露 `/metrics` 端点。
pub async fn init(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    register_common_metrics(&config.service_name);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    let server_handle = start_metrics_server(addr, handle).await?;

    Ok(MetricsHandle {
        _server_handle: server_handle,
    })
}

/// 注册通用指标描述
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!("http_requests_total", "Total number of HTTP requests");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );

    metrics::describe_counter!("points_awards_total", "Total number of points awards");
    metrics::describe_counter!("points_awarded_sum", "Total points handed out");

    metrics::describe_counter!("redemptions_total", "Total number of redemptions");
    metrics::describe_histogram!(
        "redemption_duration_seconds",
        "Redemption duration in seconds"
    );

    metrics::describe_counter!(
        "leaderboard_recomputes_total",
        "Total number of full leaderboard rebuilds"
    );

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

/// 启动指标 HTTP 服务器
async fn start_metrics_server(
    addr: SocketAddr,
    handle: PrometheusHandle,
) -> Result<tokio::task::JoinHandle<()>> {
    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(handle.render())))
        .route("/health", get(|| async { "OK" }));

    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on {}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(server_handle)
}

// ============================================================================
// 便捷的指标记录函数
// ============================================================================

/// 记录 HTTP 请求
#[inline]
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let status_str = status.to_string();
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str.clone()
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str
    )
    .record(duration_secs);
}

/// 记录积分发放
#[inline]
pub fn record_points_award(category: &str, repeat: bool, points: i32) {
    metrics::counter!(
        "points_awards_total",
        "category" => category.to_string(),
        "repeat" => repeat.to_string()
    )
    .increment(1);

    metrics::counter!("points_awarded_sum", "category" => category.to_string())
        .increment(points.max(0) as u64);
}

/// 记录兑换
#[inline]
pub fn record_redemption(reward_id: i64, status: &str, duration_secs: f64) {
    metrics::counter!(
        "redemptions_total",
        "reward_id" => reward_id.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "redemption_duration_seconds",
        "reward_id" => reward_id.to_string()
    )
    .record(duration_secs);
}

/// 记录排行榜重建
#[inline]
pub fn record_leaderboard_recompute(entries: u64) {
    metrics::counter!("leaderboard_recomputes_total").increment(1);
    metrics::gauge!("leaderboard_entries").set(entries as f64);
}
