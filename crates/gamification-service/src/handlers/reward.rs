//! 奖品与兑换 API 处理器

use axum::{Json, extract::State, http::HeaderMap};
use validator::Validate;

use crate::{
    dto::{
        ApiResponse, CreateRewardRequest, RedeemRequest, RewardQuery, UpdateAvailabilityRequest,
    },
    error::GamificationError,
    extract::{ApiJson, ApiPath, ApiQuery},
    models::{Redemption, Reward},
    service::RedeemResult,
    state::AppState,
};

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// 奖品列表
///
/// GET /api/v1/rewards?availableOnly=
pub async fn list_rewards(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RewardQuery>,
) -> Result<Json<ApiResponse<Vec<Reward>>>, GamificationError> {
    let rewards = state.reward_service.list_rewards(query.available_only).await?;
    Ok(Json(ApiResponse::success(rewards)))
}

/// 创建奖品
///
/// POST /api/v1/rewards
pub async fn create_reward(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateRewardRequest>,
) -> Result<Json<ApiResponse<Reward>>, GamificationError> {
    req.validate()?;

    let reward = state.reward_service.create_reward(req.into()).await?;
    Ok(Json(ApiResponse::success(reward)))
}

/// 奖品详情
///
/// GET /api/v1/rewards/{id}
pub async fn get_reward(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<Reward>>, GamificationError> {
    let reward = state.reward_service.get_reward(id).await?;
    Ok(Json(ApiResponse::success(reward)))
}

/// 上架或下架奖品
///
/// PATCH /api/v1/rewards/{id}/availability
pub async fn set_availability(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdateAvailabilityRequest>,
) -> Result<Json<ApiResponse<Reward>>, GamificationError> {
    let reward = state
        .reward_service
        .set_availability(id, req.available)
        .await?;
    Ok(Json(ApiResponse::success(reward)))
}

/// 兑换奖品
///
/// POST /api/v1/rewards/{id}/redeem
pub async fn redeem(
    State(state): State<AppState>,
    ApiPath(reward_id): ApiPath<i64>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<RedeemRequest>,
) -> Result<Json<ApiResponse<RedeemResult>>, GamificationError> {
    req.validate()?;

    // 优先使用请求体中的幂等键，其次从 Idempotency-Key 头读取
    let idempotency_key = req.idempotency_key.or_else(|| {
        headers
            .get(IDEMPOTENCY_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    });

    let result = state
        .reward_service
        .redeem(&req.user_id, reward_id, idempotency_key)
        .await?;
    let message = result.message.clone();
    Ok(Json(ApiResponse::success_with_message(result, message)))
}

/// 标记兑换已领取
///
/// POST /api/v1/redemptions/{id}/fulfill
pub async fn fulfill_redemption(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<Redemption>>, GamificationError> {
    let redemption = state.reward_service.fulfill_redemption(id).await?;
    Ok(Json(ApiResponse::success(redemption)))
}
