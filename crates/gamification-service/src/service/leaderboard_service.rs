//! 排行榜服务
//!
//! 每次发放积分后即时刷新该用户的榜单条目；
//! 榜单与余额之间不做强一致，必要时通过重建修复

use std::sync::Arc;

use campus_shared::observability::metrics;
use tracing::{info, instrument};

use crate::error::{GamificationError, Result};
use crate::models::{LeaderboardEntry, rank_standings};
use crate::repository::{LeaderboardRepositoryTrait, UserRepositoryTrait};

pub struct LeaderboardService {
    user_repo: Arc<dyn UserRepositoryTrait>,
    leaderboard_repo: Arc<dyn LeaderboardRepositoryTrait>,
}

impl LeaderboardService {
    pub fn new(
        user_repo: Arc<dyn UserRepositoryTrait>,
        leaderboard_repo: Arc<dyn LeaderboardRepositoryTrait>,
    ) -> Self {
        Self {
            user_repo,
            leaderboard_repo,
        }
    }

    /// 写入用户最新的累计积分
    pub async fn refresh_user(
        &self,
        user_id: &str,
        display_name: &str,
        total_points: i64,
    ) -> Result<()> {
        self.leaderboard_repo
            .upsert_standing(user_id, display_name, total_points)
            .await
    }

    /// 分页查询排行榜
    ///
    /// 返回当前页条目和榜单总人数，名次从 1 开始连续编号
    #[instrument(skip(self))]
    pub async fn get_leaderboard(
        &self,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<LeaderboardEntry>, i64)> {
        let offset = (page - 1)
            .max(0)
            .checked_mul(page_size.max(0))
            .ok_or_else(|| GamificationError::Validation(format!("页码超出范围: {page}")))?;
        let standings = self
            .leaderboard_repo
            .list_standings(page_size, offset)
            .await?;
        let total = self.leaderboard_repo.count_standings().await?;

        Ok((rank_standings(standings, offset), total))
    }

    #[instrument(skip(self))]
    pub async fn get_user_standing(&self, user_id: &str) -> Result<LeaderboardEntry> {
        if self.user_repo.get_user(user_id).await?.is_none() {
            return Err(GamificationError::UserNotFound(user_id.to_string()));
        }

        self.leaderboard_repo
            .find_entry(user_id)
            .await?
            .ok_or_else(|| GamificationError::LeaderboardEntryNotFound(user_id.to_string()))
    }

    /// 由积分流水重建整个排行榜
    #[instrument(skip(self))]
    pub async fn recompute(&self) -> Result<u64> {
        let entries = self.leaderboard_repo.rebuild().await?;
        metrics::record_leaderboard_recompute(entries);
        info!(entries, "排行榜重建完成");
        Ok(entries)
    }
}
