//! 兑换仓储
//!
//! 兑换在单个事务内完成：锁定用户与奖品、扣减库存与余额、写入兑换记录。
//! 加锁顺序固定为先用户后奖品

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::RedemptionRepositoryTrait;
use crate::error::{GamificationError, Result, is_unique_violation};
use crate::models::{NewRedemption, Redemption, RedemptionStatus, Reward};

const REDEMPTION_COLUMNS: &str = "id, redemption_no, user_id, reward_id, reward_name, cost, \
     status, idempotency_key, created_at, updated_at";

pub struct RedemptionRepository {
    pool: PgPool,
}

impl RedemptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_idempotency_key(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<Redemption>> {
        let sql = format!("SELECT {REDEMPTION_COLUMNS} FROM redemptions WHERE idempotency_key = $1");
        let redemption = sqlx::query_as::<_, Redemption>(&sql)
            .bind(idempotency_key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(redemption)
    }

    /// 执行兑换
    ///
    /// 任一校验失败时事务回滚，余额与库存保持不变
    pub async fn create_redemption(&self, redemption: &NewRedemption) -> Result<Redemption> {
        let mut tx = self.pool.begin().await?;

        let balance: Option<i64> =
            sqlx::query_scalar("SELECT balance FROM users WHERE user_id = $1 FOR UPDATE")
                .bind(&redemption.user_id)
                .fetch_optional(&mut *tx)
                .await?;
        let balance =
            balance.ok_or_else(|| GamificationError::UserNotFound(redemption.user_id.clone()))?;

        // 同一用户的并发请求在行锁上串行，后到者在此看到已提交的幂等键
        if let Some(key) = &redemption.idempotency_key {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM redemptions WHERE idempotency_key = $1)",
            )
            .bind(key)
            .fetch_one(&mut *tx)
            .await?;
            if exists {
                return Err(GamificationError::DuplicateRedemption(key.clone()));
            }
        }

        let reward = sqlx::query_as::<_, Reward>(
            r#"
            SELECT id, name, description, cost, available, stock, created_at, updated_at
            FROM rewards
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(redemption.reward_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(GamificationError::RewardNotFound(redemption.reward_id))?;

        if !reward.available {
            return Err(GamificationError::RewardUnavailable(reward.id));
        }
        if !reward.has_stock() {
            return Err(GamificationError::RewardOutOfStock(reward.id));
        }
        if balance < reward.cost {
            return Err(GamificationError::InsufficientPoints {
                required: reward.cost,
                available: balance,
            });
        }

        if reward.stock.is_some() {
            sqlx::query("UPDATE rewards SET stock = stock - 1, updated_at = NOW() WHERE id = $1")
                .bind(reward.id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("UPDATE users SET balance = balance - $2, updated_at = NOW() WHERE user_id = $1")
            .bind(&redemption.user_id)
            .bind(reward.cost)
            .execute(&mut *tx)
            .await?;

        let sql = format!(
            r#"
            INSERT INTO redemptions (redemption_no, user_id, reward_id, reward_name, cost, status, idempotency_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {REDEMPTION_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, Redemption>(&sql)
            .bind(&redemption.redemption_no)
            .bind(&redemption.user_id)
            .bind(reward.id)
            .bind(&reward.name)
            .bind(reward.cost)
            .bind(RedemptionStatus::Pending)
            .bind(&redemption.idempotency_key)
            .fetch_one(&mut *tx)
            .await;

        let created = match created {
            Ok(created) => created,
            Err(e) if is_unique_violation(&e) => {
                return Err(GamificationError::DuplicateRedemption(
                    redemption.idempotency_key.clone().unwrap_or_default(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;
        Ok(created)
    }

    pub async fn get_redemption(&self, id: i64) -> Result<Option<Redemption>> {
        let sql = format!("SELECT {REDEMPTION_COLUMNS} FROM redemptions WHERE id = $1");
        let redemption = sqlx::query_as::<_, Redemption>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(redemption)
    }

    /// 列出用户的兑换记录，按时间倒序
    pub async fn list_by_user(&self, user_id: &str, limit: i64) -> Result<Vec<Redemption>> {
        let sql = format!(
            "SELECT {REDEMPTION_COLUMNS} FROM redemptions WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2"
        );
        let redemptions = sqlx::query_as::<_, Redemption>(&sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(redemptions)
    }

    pub async fn update_status(
        &self,
        id: i64,
        from: RedemptionStatus,
        to: RedemptionStatus,
    ) -> Result<Option<Redemption>> {
        let sql = format!(
            "UPDATE redemptions SET status = $3, updated_at = NOW() \
             WHERE id = $1 AND status = $2 RETURNING {REDEMPTION_COLUMNS}"
        );
        let redemption = sqlx::query_as::<_, Redemption>(&sql)
            .bind(id)
            .bind(from)
            .bind(to)
            .fetch_optional(&self.pool)
            .await?;

        Ok(redemption)
    }
}

#[async_trait]
impl RedemptionRepositoryTrait for RedemptionRepository {
    async fn get_by_idempotency_key(&self, idempotency_key: &str) -> Result<Option<Redemption>> {
        self.get_by_idempotency_key(idempotency_key).await
    }

    async fn create_redemption(&self, redemption: &NewRedemption) -> Result<Redemption> {
        self.create_redemption(redemption).await
    }

    async fn get_redemption(&self, id: i64) -> Result<Option<Redemption>> {
        self.get_redemption(id).await
    }

    async fn list_by_user(&self, user_id: &str, limit: i64) -> Result<Vec<Redemption>> {
        self.list_by_user(user_id, limit).await
    }

    async fn update_status(
        &self,
        id: i64,
        from: RedemptionStatus,
        to: RedemptionStatus,
    ) -> Result<Option<Redemption>> {
        self.update_status(id, from, to).await
    }
}
