//! 排行榜仓储
//!
//! 排名统一使用 `total_points DESC, user_id ASC`

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::LeaderboardRepositoryTrait;
use crate::error::Result;
use crate::models::{LeaderboardEntry, Standing};

pub struct LeaderboardRepository {
    pool: PgPool,
}

impl LeaderboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 累计积分只增不减，乱序到达的旧值不会覆盖新值
    pub async fn upsert_standing(
        &self,
        user_id: &str,
        display_name: &str,
        total_points: i64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO leaderboard (user_id, display_name, total_points, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id) DO UPDATE
            SET display_name = EXCLUDED.display_name,
                total_points = GREATEST(leaderboard.total_points, EXCLUDED.total_points),
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user_id)
        .bind(display_name)
        .bind(total_points)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_standings(&self, limit: i64, offset: i64) -> Result<Vec<Standing>> {
        let standings = sqlx::query_as::<_, Standing>(
            r#"
            SELECT user_id, display_name, total_points, updated_at
            FROM leaderboard
            ORDER BY total_points DESC, user_id ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(standings)
    }

    pub async fn count_standings(&self) -> Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leaderboard")
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }

    pub async fn find_entry(&self, user_id: &str) -> Result<Option<LeaderboardEntry>> {
        let entry = sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            SELECT rank, user_id, display_name, total_points
            FROM (
                SELECT ROW_NUMBER() OVER (ORDER BY total_points DESC, user_id ASC) AS rank,
                       user_id, display_name, total_points
                FROM leaderboard
            ) ranked
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    /// 清空后按积分流水汇总重建，只包含至少获得过一次积分的用户
    pub async fn rebuild(&self) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM leaderboard")
            .execute(&mut *tx)
            .await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO leaderboard (user_id, display_name, total_points, updated_at)
            SELECT h.user_id, u.display_name, SUM(h.points)::BIGINT, NOW()
            FROM points_history h
            JOIN users u ON u.user_id = h.user_id
            GROUP BY h.user_id, u.display_name
            "#,
        )
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        Ok(inserted)
    }
}

#[async_trait]
impl LeaderboardRepositoryTrait for LeaderboardRepository {
    async fn upsert_standing(
        &self,
        user_id: &str,
        display_name: &str,
        total_points: i64,
    ) -> Result<()> {
        self.upsert_standing(user_id, display_name, total_points).await
    }

    async fn list_standings(&self, limit: i64, offset: i64) -> Result<Vec<Standing>> {
        self.list_standings(limit, offset).await
    }

    async fn count_standings(&self) -> Result<i64> {
        self.count_standings().await
    }

    async fn find_entry(&self, user_id: &str) -> Result<Option<LeaderboardEntry>> {
        self.find_entry(user_id).await
    }

    async fn rebuild(&self) -> Result<u64> {
        self.rebuild().await
    }
}
