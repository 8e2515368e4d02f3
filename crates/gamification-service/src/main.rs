//! 校园积分服务
//!
//! 提供积分发放、奖品兑换与排行榜的 REST API。

use axum::http::HeaderValue;
use campus_gamification::{AppState, PointsCalculator, PointsPolicy, build_router};
use campus_shared::{
    config::AppConfig, credentials::ServiceAccount, database::Database, error::CampusError,
    observability,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

const SERVICE_NAME: &str = "campus-gamification";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load(SERVICE_NAME)?;

    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    let _guard = observability::init(&obs_config).await?;

    info!("Starting {} on {}", config.service_name, config.server_addr());

    // 积分策略不合法时拒绝启动
    let calculator = PointsCalculator::new(PointsPolicy::from(&config.points))?;
    info!(policy = ?calculator.policy(), "积分策略已加载");

    // 凭证文件缺失或不可读是致命错误
    let account = ServiceAccount::load(&config.database.credentials_path)
        .inspect_err(|e| log_startup_failure("credentials", e))?;
    info!(project_id = %account.project_id, "服务账号凭证已加载");

    let db = Database::connect(&config.database, &account)
        .await
        .inspect_err(|e| log_startup_failure("connect", e))?;
    if config.database.run_migrations {
        db.run_migrations()
            .await
            .inspect_err(|e| log_startup_failure("migrations", e))?;
    }
    db.verify_collections()
        .await
        .inspect_err(|e| log_startup_failure("collections", e))?;

    let state = AppState::postgres(db.clone(), calculator);
    let app = build_router(state).layer(cors_layer(&config));

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");

    Ok(())
}

fn log_startup_failure(stage: &str, err: &CampusError) {
    error!(
        stage,
        code = err.code(),
        fatal = err.is_fatal(),
        error = %err,
        "启动失败"
    );
}

/// CORS 配置：`server.cors_origins` 为逗号分隔的来源列表，"*" 表示全部
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let allowed_origins = config.server.cors_origins.trim();

    if allowed_origins == "*" {
        if config.is_production() {
            warn!("cors_origins=\"*\" 在生产环境中不安全，请设置为具体域名");
        }
        info!("CORS allowed_origins: * (all origins)");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        info!("CORS allowed_origins: {}", allowed_origins);
        let origins: Vec<_> = allowed_origins
            .split(',')
            .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// 监听关闭信号
///
/// 收到 SIGTERM 或 Ctrl+C 后返回，触发 axum 的优雅关闭流程
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "注册 Ctrl+C 处理器失败");
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
                error!(error = %e, "注册 SIGTERM 处理器失败");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}
