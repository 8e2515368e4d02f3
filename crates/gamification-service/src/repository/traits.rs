//! 仓储 Trait 定义
//!
//! 服务层只依赖这些接口，PostgreSQL 与内存实现可以互换，测试时使用 mock

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    AwardRecord, CategoryPoints, LeaderboardEntry, NewPointsHistory, NewRedemption, NewReward,
    NewUser, PointsHistory, Redemption, RedemptionStatus, Reward, Standing, User,
};

/// 用户仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    /// 用户 ID 已存在时返回 `UserAlreadyExists`
    async fn create_user(&self, user: &NewUser) -> Result<User>;
    async fn get_user(&self, user_id: &str) -> Result<Option<User>>;
}

/// 积分仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PointsRepositoryTrait: Send + Sync {
    /// 用户是否已有该活动的积分流水
    async fn has_attended_event(&self, user_id: &str, event_id: &str) -> Result<bool>;

    /// 原子地写入一条流水并更新余额、累计积分、已参加类别和分类汇总
    async fn record_award(&self, award: &NewPointsHistory) -> Result<AwardRecord>;

    async fn list_history(&self, user_id: &str, limit: i64) -> Result<Vec<PointsHistory>>;
    async fn list_category_totals(&self, user_id: &str) -> Result<Vec<CategoryPoints>>;
}

/// 奖品仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RewardRepositoryTrait: Send + Sync {
    async fn create_reward(&self, reward: &NewReward) -> Result<Reward>;
    async fn get_reward(&self, id: i64) -> Result<Option<Reward>>;
    async fn list_rewards(&self, only_available: bool) -> Result<Vec<Reward>>;
    async fn update_availability(&self, id: i64, available: bool) -> Result<Option<Reward>>;
}

/// 兑换仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RedemptionRepositoryTrait: Send + Sync {
    async fn get_by_idempotency_key(&self, idempotency_key: &str) -> Result<Option<Redemption>>;

    /// 原子兑换：锁定用户与奖品，校验上架状态、库存和余额后扣减并写入兑换记录
    async fn create_redemption(&self, redemption: &NewRedemption) -> Result<Redemption>;

    async fn get_redemption(&self, id: i64) -> Result<Option<Redemption>>;
    async fn list_by_user(&self, user_id: &str, limit: i64) -> Result<Vec<Redemption>>;

    /// 仅当当前状态为 `from` 时更新，否则返回 None
    async fn update_status(
        &self,
        id: i64,
        from: RedemptionStatus,
        to: RedemptionStatus,
    ) -> Result<Option<Redemption>>;
}

/// 排行榜仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeaderboardRepositoryTrait: Send + Sync {
    async fn upsert_standing(&self, user_id: &str, display_name: &str, total_points: i64)
    -> Result<()>;

    /// 按排行榜全序返回一页快照
    async fn list_standings(&self, limit: i64, offset: i64) -> Result<Vec<Standing>>;
    async fn count_standings(&self) -> Result<i64>;
    async fn find_entry(&self, user_id: &str) -> Result<Option<LeaderboardEntry>>;

    /// 由积分流水重建排行榜，返回条目数
    async fn rebuild(&self) -> Result<u64>;
}
