//! 奖品仓储

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::RewardRepositoryTrait;
use crate::error::Result;
use crate::models::{NewReward, Reward};

pub struct RewardRepository {
    pool: PgPool,
}

impl RewardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_reward(&self, reward: &NewReward) -> Result<Reward> {
        let created = sqlx::query_as::<_, Reward>(
            r#"
            INSERT INTO rewards (name, description, cost, available, stock)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, cost, available, stock, created_at, updated_at
            "#,
        )
        .bind(&reward.name)
        .bind(&reward.description)
        .bind(reward.cost)
        .bind(reward.available)
        .bind(reward.stock)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn get_reward(&self, id: i64) -> Result<Option<Reward>> {
        let reward = sqlx::query_as::<_, Reward>(
            r#"
            SELECT id, name, description, cost, available, stock, created_at, updated_at
            FROM rewards
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reward)
    }

    /// 按积分从低到高列出奖品
    pub async fn list_rewards(&self, only_available: bool) -> Result<Vec<Reward>> {
        let rewards = sqlx::query_as::<_, Reward>(
            r#"
            SELECT id, name, description, cost, available, stock, created_at, updated_at
            FROM rewards
            WHERE ($1 = FALSE OR available = TRUE)
            ORDER BY cost ASC, id ASC
            "#,
        )
        .bind(only_available)
        .fetch_all(&self.pool)
        .await?;

        Ok(rewards)
    }

    pub async fn update_availability(&self, id: i64, available: bool) -> Result<Option<Reward>> {
        let reward = sqlx::query_as::<_, Reward>(
            r#"
            UPDATE rewards
            SET available = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, cost, available, stock, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(available)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reward)
    }
}

#[async_trait]
impl RewardRepositoryTrait for RewardRepository {
    async fn create_reward(&self, reward: &NewReward) -> Result<Reward> {
        self.create_reward(reward).await
    }

    async fn get_reward(&self, id: i64) -> Result<Option<Reward>> {
        self.get_reward(id).await
    }

    async fn list_rewards(&self, only_available: bool) -> Result<Vec<Reward>> {
        self.list_rewards(only_available).await
    }

    async fn update_availability(&self, id: i64, available: bool) -> Result<Option<Reward>> {
        self.update_availability(id, available).await
    }
}
