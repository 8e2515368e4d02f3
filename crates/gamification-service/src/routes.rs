//! 路由配置模块
//!
//! 定义所有 REST API 端点的路由映射

use axum::{
    Router, middleware,
    routing::{get, patch, post},
};
use campus_shared::observability::middleware as obs_middleware;

use crate::{handlers, state::AppState};

/// 用户与积分路由
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(handlers::user::register_user))
        .route("/users/{user_id}", get(handlers::user::get_user))
        .route(
            "/users/{user_id}/points",
            get(handlers::user::get_points_summary),
        )
        .route(
            "/users/{user_id}/points/history",
            get(handlers::user::get_points_history),
        )
        .route(
            "/users/{user_id}/redemptions",
            get(handlers::user::list_user_redemptions),
        )
        .route("/points/award", post(handlers::points::award_points))
}

/// 奖品与兑换路由
fn reward_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/rewards",
            get(handlers::reward::list_rewards).post(handlers::reward::create_reward),
        )
        .route("/rewards/{id}", get(handlers::reward::get_reward))
        .route(
            "/rewards/{id}/availability",
            patch(handlers::reward::set_availability),
        )
        .route("/rewards/{id}/redeem", post(handlers::reward::redeem))
        .route(
            "/redemptions/{id}/fulfill",
            post(handlers::reward::fulfill_redemption),
        )
}

/// 排行榜路由
fn leaderboard_routes() -> Router<AppState> {
    Router::new()
        .route("/leaderboard", get(handlers::leaderboard::get_leaderboard))
        .route(
            "/leaderboard/users/{user_id}",
            get(handlers::leaderboard::get_user_standing),
        )
        .route(
            "/leaderboard/recompute",
            post(handlers::leaderboard::recompute),
        )
}

/// 构建所有 API 路由（挂载在 /api/v1 下）
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(user_routes())
        .merge(reward_routes())
        .merge(leaderboard_routes())
}

/// 构建完整应用路由，包含探针与可观测性中间件
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes())
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        .with_state(state)
}
