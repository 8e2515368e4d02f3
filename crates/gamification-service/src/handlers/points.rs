//! 积分发放 API 处理器

use axum::{Json, extract::State};
use validator::Validate;

use crate::{
    dto::{ApiResponse, AwardPointsRequest},
    error::GamificationError,
    extract::ApiJson,
    service::AwardPointsResult,
    state::AppState,
};

/// 为参加活动的用户发放积分
///
/// POST /api/v1/points/award
pub async fn award_points(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<AwardPointsRequest>,
) -> Result<Json<ApiResponse<AwardPointsResult>>, GamificationError> {
    req.validate()?;

    let result = state
        .points_service
        .award_points(&req.user_id, &req.event_id, &req.category)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}
