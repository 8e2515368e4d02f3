//! 积分发放服务
//!
//! ## 发放流程
//!
//! 1. 校验参数 -> 2. 加载用户 -> 3. 判断是否重复参加 -> 4. 计算积分
//!    -> 5. 原子写入流水与余额 -> 6. 刷新排行榜

use std::sync::Arc;

use campus_shared::observability::metrics;
use chrono::Utc;
use tracing::{info, instrument, warn};

use super::dto::AwardPointsResult;
use super::leaderboard_service::LeaderboardService;
use super::points_calculator::PointsCalculator;
use crate::error::{GamificationError, Result};
use crate::models::{EventCategory, NewPointsHistory, UnknownCategory};
use crate::repository::{PointsRepositoryTrait, UserRepositoryTrait};

/// 标识符最大长度，与表结构保持一致
pub const MAX_IDENTIFIER_LEN: usize = 128;

/// 校验标识符非空且不超长
pub fn validate_identifier(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(GamificationError::Validation(format!("{field} 不能为空")));
    }
    if value.chars().count() > MAX_IDENTIFIER_LEN {
        return Err(GamificationError::Validation(format!(
            "{field} 长度不能超过 {MAX_IDENTIFIER_LEN}"
        )));
    }
    Ok(())
}

pub struct PointsService {
    user_repo: Arc<dyn UserRepositoryTrait>,
    points_repo: Arc<dyn PointsRepositoryTrait>,
    leaderboard: Arc<LeaderboardService>,
    calculator: PointsCalculator,
}

impl PointsService {
    pub fn new(
        user_repo: Arc<dyn UserRepositoryTrait>,
        points_repo: Arc<dyn PointsRepositoryTrait>,
        leaderboard: Arc<LeaderboardService>,
        calculator: PointsCalculator,
    ) -> Self {
        Self {
            user_repo,
            points_repo,
            leaderboard,
            calculator,
        }
    }

    /// 为用户参加的活动发放积分
    ///
    /// 每次调用恰好写入一条积分流水，余额增加的数值与流水一致。
    /// 排行榜刷新失败只记录日志，不影响发放结果
    #[instrument(skip(self), fields(points = tracing::field::Empty))]
    pub async fn award_points(
        &self,
        user_id: &str,
        event_id: &str,
        category: &str,
    ) -> Result<AwardPointsResult> {
        validate_identifier("userId", user_id)?;
        validate_identifier("eventId", event_id)?;
        let category: EventCategory = category
            .parse()
            .map_err(|UnknownCategory(raw)| GamificationError::InvalidCategory(raw))?;

        let user = self
            .user_repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| GamificationError::UserNotFound(user_id.to_string()))?;

        let repeat = self.points_repo.has_attended_event(user_id, event_id).await?;
        let new_category = !user.has_attended(category);
        let points = self
            .calculator
            .calculate(category, &user.attended_categories, repeat);
        tracing::Span::current().record("points", points);

        let record = self
            .points_repo
            .record_award(&NewPointsHistory {
                user_id: user_id.to_string(),
                event_id: event_id.to_string(),
                category,
                points,
                is_repeat: repeat,
                awarded_at: Utc::now(),
            })
            .await?;

        metrics::record_points_award(category.as_str(), repeat, points);
        info!(
            user_id,
            event_id,
            %category,
            repeat,
            balance = record.balance,
            "积分发放成功"
        );

        if let Err(e) = self
            .leaderboard
            .refresh_user(user_id, &user.display_name, record.lifetime_points)
            .await
        {
            warn!(user_id, error = %e, "排行榜刷新失败，等待重建修复");
        }

        Ok(AwardPointsResult {
            points_awarded: points,
            balance: record.balance,
            lifetime_points: record.lifetime_points,
            new_category,
            entry: record.entry,
        })
    }
}
