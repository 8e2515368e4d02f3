//! 用户 API 处理器

use axum::{Json, extract::State};
use validator::Validate;

use crate::{
    dto::{ApiResponse, LimitParams, RegisterUserRequest},
    error::GamificationError,
    extract::{ApiJson, ApiPath, ApiQuery},
    models::{PointsHistory, Redemption, User},
    service::PointsSummaryDto,
    state::AppState,
};

/// 注册用户
///
/// POST /api/v1/users
pub async fn register_user(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterUserRequest>,
) -> Result<Json<ApiResponse<User>>, GamificationError> {
    req.validate()?;

    let user = state.user_service.register(req.into()).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// 获取用户
///
/// GET /api/v1/users/{user_id}
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<String>,
) -> Result<Json<ApiResponse<User>>, GamificationError> {
    let user = state.user_service.get_user(&user_id).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// 积分概览
///
/// GET /api/v1/users/{user_id}/points
pub async fn get_points_summary(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<String>,
) -> Result<Json<ApiResponse<PointsSummaryDto>>, GamificationError> {
    let summary = state.user_service.get_points_summary(&user_id).await?;
    Ok(Json(ApiResponse::success(summary)))
}

/// 积分流水
///
/// GET /api/v1/users/{user_id}/points/history?limit=
pub async fn get_points_history(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<String>,
    ApiQuery(params): ApiQuery<LimitParams>,
) -> Result<Json<ApiResponse<Vec<PointsHistory>>>, GamificationError> {
    let history = state
        .user_service
        .get_points_history(&user_id, params.limit())
        .await?;
    Ok(Json(ApiResponse::success(history)))
}

/// 用户兑换记录
///
/// GET /api/v1/users/{user_id}/redemptions?limit=
pub async fn list_user_redemptions(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<String>,
    ApiQuery(params): ApiQuery<LimitParams>,
) -> Result<Json<ApiResponse<Vec<Redemption>>>, GamificationError> {
    let redemptions = state
        .reward_service
        .list_user_redemptions(&user_id, params.limit())
        .await?;
    Ok(Json(ApiResponse::success(redemptions)))
}
