//! 排行榜 API 处理器

use axum::{Json, extract::State};

use crate::{
    dto::{ApiResponse, PageResponse, PaginationParams, RecomputeResponse},
    error::GamificationError,
    extract::{ApiPath, ApiQuery},
    models::LeaderboardEntry,
    state::AppState,
};

/// 分页查询排行榜
///
/// GET /api/v1/leaderboard?page=&pageSize=
pub async fn get_leaderboard(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<LeaderboardEntry>>>, GamificationError> {
    let (page, page_size) = (params.page(), params.limit());
    let (entries, total) = state
        .leaderboard_service
        .get_leaderboard(page, page_size)
        .await?;
    Ok(Json(ApiResponse::success(PageResponse::new(
        entries, total, page, page_size,
    ))))
}

/// 用户排名
///
/// GET /api/v1/leaderboard/users/{user_id}
pub async fn get_user_standing(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<String>,
) -> Result<Json<ApiResponse<LeaderboardEntry>>, GamificationError> {
    let entry = state.leaderboard_service.get_user_standing(&user_id).await?;
    Ok(Json(ApiResponse::success(entry)))
}

/// 由积分流水重建排行榜
///
/// POST /api/v1/leaderboard/recompute
pub async fn recompute(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<RecomputeResponse>>, GamificationError> {
    let entries = state.leaderboard_service.recompute().await?;
    Ok(Json(ApiResponse::success(RecomputeResponse { entries })))
}
