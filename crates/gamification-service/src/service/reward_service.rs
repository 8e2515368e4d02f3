//! 奖品兑换服务
//!
//! 处理奖品管理与积分兑换，包括：
//! - 幂等处理（同一幂等键只兑换一次）
//! - 奖品上架状态与库存检查
//! - 用户余额检查
//! - 事务性扣减与兑换记录创建
//!
//! ## 兑换流程
//!
//! 1. 幂等检查 -> 2. 用户与奖品存在性 -> 3. 上架与库存 -> 4. 余额
//!    -> 5. 事务写入（锁内复核余额与库存）

use std::sync::Arc;
use std::time::Instant;

use campus_shared::observability::metrics;
use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::RedeemResult;
use super::points_service::validate_identifier;
use crate::error::{GamificationError, Result};
use crate::models::{NewRedemption, NewReward, Redemption, RedemptionStatus, Reward};
use crate::repository::{RedemptionRepositoryTrait, RewardRepositoryTrait, UserRepositoryTrait};

pub struct RewardService {
    user_repo: Arc<dyn UserRepositoryTrait>,
    reward_repo: Arc<dyn RewardRepositoryTrait>,
    redemption_repo: Arc<dyn RedemptionRepositoryTrait>,
}

impl RewardService {
    pub fn new(
        user_repo: Arc<dyn UserRepositoryTrait>,
        reward_repo: Arc<dyn RewardRepositoryTrait>,
        redemption_repo: Arc<dyn RedemptionRepositoryTrait>,
    ) -> Self {
        Self {
            user_repo,
            reward_repo,
            redemption_repo,
        }
    }

    pub async fn list_rewards(&self, only_available: bool) -> Result<Vec<Reward>> {
        self.reward_repo.list_rewards(only_available).await
    }

    pub async fn get_reward(&self, id: i64) -> Result<Reward> {
        self.reward_repo
            .get_reward(id)
            .await?
            .ok_or(GamificationError::RewardNotFound(id))
    }

    #[instrument(skip(self, reward), fields(name = %reward.name))]
    pub async fn create_reward(&self, reward: NewReward) -> Result<Reward> {
        if reward.cost <= 0 {
            return Err(GamificationError::Validation("cost 必须大于 0".to_string()));
        }
        if reward.stock.is_some_and(|s| s < 0) {
            return Err(GamificationError::Validation("stock 不能为负数".to_string()));
        }

        let created = self.reward_repo.create_reward(&reward).await?;
        info!(reward_id = created.id, "奖品创建成功");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn set_availability(&self, id: i64, available: bool) -> Result<Reward> {
        self.reward_repo
            .update_availability(id, available)
            .await?
            .ok_or(GamificationError::RewardNotFound(id))
    }

    /// 用积分兑换奖品
    ///
    /// 余额不足时直接拒绝，余额不变；成功时恰好扣减奖品积分
    #[instrument(skip(self))]
    pub async fn redeem(
        &self,
        user_id: &str,
        reward_id: i64,
        idempotency_key: Option<String>,
    ) -> Result<RedeemResult> {
        let started = Instant::now();
        validate_identifier("userId", user_id)?;

        // 1. 幂等检查
        if let Some(key) = idempotency_key.as_deref() {
            validate_identifier("idempotencyKey", key)?;
            if let Some(replayed) = self.replay(key, user_id, reward_id).await? {
                return Ok(replayed);
            }
        }

        let result = self
            .redeem_new(user_id, reward_id, idempotency_key.clone())
            .await;

        let elapsed = started.elapsed().as_secs_f64();
        match result {
            Ok(redemption) => {
                metrics::record_redemption(reward_id, "success", elapsed);
                info!(
                    redemption_id = redemption.id,
                    redemption_no = %redemption.redemption_no,
                    cost = redemption.cost,
                    "兑换成功"
                );
                Ok(RedeemResult::created(redemption))
            }
            Err(e) => {
                // 同键并发请求都未命中预检查时，胜出方提交后落败方会在
                // 幂等键、余额或库存校验处失败，此时返回胜出方的记录
                let replay_key = idempotency_key.as_deref().filter(|_| is_concurrent_loser(&e));
                if let Some(key) = replay_key {
                    if let Some(replayed) = self.replay(key, user_id, reward_id).await? {
                        metrics::record_redemption(reward_id, "replayed", elapsed);
                        return Ok(replayed);
                    }
                }
                metrics::record_redemption(reward_id, e.error_code(), elapsed);
                Err(e)
            }
        }
    }

    /// 校验并写入一次新的兑换
    async fn redeem_new(
        &self,
        user_id: &str,
        reward_id: i64,
        idempotency_key: Option<String>,
    ) -> Result<Redemption> {
        // 2. 用户与奖品
        let user = self
            .user_repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| GamificationError::UserNotFound(user_id.to_string()))?;
        let reward = self.get_reward(reward_id).await?;

        // 3. 上架与库存
        if !reward.available {
            return Err(GamificationError::RewardUnavailable(reward_id));
        }
        if !reward.has_stock() {
            return Err(GamificationError::RewardOutOfStock(reward_id));
        }

        // 4. 余额
        if !user.can_afford(reward.cost) {
            return Err(GamificationError::InsufficientPoints {
                required: reward.cost,
                available: user.balance,
            });
        }

        // 5. 事务写入
        self.redemption_repo
            .create_redemption(&NewRedemption {
                redemption_no: generate_redemption_no(),
                user_id: user_id.to_string(),
                reward_id,
                idempotency_key,
            })
            .await
    }

    /// 按幂等键查找已有兑换
    ///
    /// 同一用户兑换同一奖品时返回重放结果；键被其他请求占用时返回 `DuplicateRedemption`
    async fn replay(
        &self,
        key: &str,
        user_id: &str,
        reward_id: i64,
    ) -> Result<Option<RedeemResult>> {
        let Some(existing) = self.redemption_repo.get_by_idempotency_key(key).await? else {
            return Ok(None);
        };

        if existing.user_id != user_id || existing.reward_id != reward_id {
            warn!(idempotency_key = key, "幂等键已被其他兑换请求使用");
            return Err(GamificationError::DuplicateRedemption(key.to_string()));
        }

        info!(redemption_id = existing.id, "幂等请求，返回已存在的兑换记录");
        Ok(Some(RedeemResult::from_existing(existing)))
    }

    pub async fn list_user_redemptions(&self, user_id: &str, limit: i64) -> Result<Vec<Redemption>> {
        if self.user_repo.get_user(user_id).await?.is_none() {
            return Err(GamificationError::UserNotFound(user_id.to_string()));
        }
        self.redemption_repo.list_by_user(user_id, limit).await
    }

    /// 标记奖品已领取，仅 PENDING 状态可操作
    #[instrument(skip(self))]
    pub async fn fulfill_redemption(&self, id: i64) -> Result<Redemption> {
        let current = self
            .redemption_repo
            .get_redemption(id)
            .await?
            .ok_or(GamificationError::RedemptionNotFound(id))?;

        if current.status != RedemptionStatus::Pending {
            return Err(GamificationError::InvalidRedemptionStatus {
                id,
                current: current.status,
            });
        }

        // 并发领取时条件更新只会成功一次
        let updated = self
            .redemption_repo
            .update_status(id, RedemptionStatus::Pending, RedemptionStatus::Fulfilled)
            .await?
            .ok_or(GamificationError::InvalidRedemptionStatus {
                id,
                current: RedemptionStatus::Fulfilled,
            })?;

        info!(redemption_id = id, "兑换已领取");
        Ok(updated)
    }
}

/// 可能由同键并发请求的胜出方造成的失败
fn is_concurrent_loser(err: &GamificationError) -> bool {
    matches!(
        err,
        GamificationError::DuplicateRedemption(_)
            | GamificationError::InsufficientPoints { .. }
            | GamificationError::RewardOutOfStock(_)
    )
}

/// 生成兑换单号
///
/// 格式: RD + 年月日时分秒 + 6 位随机数
fn generate_redemption_no() -> String {
    let now = Utc::now();
    let random = Uuid::new_v4().as_u128() % 1_000_000;
    format!("RD{}{:06}", now.format("%Y%m%d%H%M%S"), random)
}
