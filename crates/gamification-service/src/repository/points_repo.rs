//! 积分仓储
//!
//! 积分流水只追加；每次发放在一个事务内同时更新用户余额和分类汇总

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool, Row};

use super::traits::PointsRepositoryTrait;
use crate::error::{GamificationError, Result};
use crate::models::{AwardRecord, CategoryPoints, EventCategory, NewPointsHistory, PointsHistory};

pub struct PointsRepository {
    pool: PgPool,
}

impl PointsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn has_attended_event(&self, user_id: &str, event_id: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM points_history WHERE user_id = $1 AND event_id = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// 发放积分
    ///
    /// 先锁定用户行，保证并发发放时余额与已参加类别不会丢失更新
    pub async fn record_award(&self, award: &NewPointsHistory) -> Result<AwardRecord> {
        let mut tx = self.pool.begin().await?;

        let attended: Option<Json<Vec<EventCategory>>> = sqlx::query_scalar(
            "SELECT attended_categories FROM users WHERE user_id = $1 FOR UPDATE",
        )
        .bind(&award.user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Json(mut attended) =
            attended.ok_or_else(|| GamificationError::UserNotFound(award.user_id.clone()))?;
        if !attended.contains(&award.category) {
            attended.push(award.category);
        }

        let id = Self::insert_history_in_tx(&mut *tx, award).await?;

        let row = sqlx::query(
            r#"
            UPDATE users
            SET balance = balance + $2,
                lifetime_points = lifetime_points + $2,
                attended_categories = $3,
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING balance, lifetime_points
            "#,
        )
        .bind(&award.user_id)
        .bind(i64::from(award.points))
        .bind(Json(&attended))
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO points (user_id, category, total_points, award_count, last_awarded_at)
            VALUES ($1, $2, $3, 1, $4)
            ON CONFLICT (user_id, category) DO UPDATE
            SET total_points = points.total_points + EXCLUDED.total_points,
                award_count = points.award_count + 1,
                last_awarded_at = EXCLUDED.last_awarded_at
            "#,
        )
        .bind(&award.user_id)
        .bind(award.category)
        .bind(i64::from(award.points))
        .bind(award.awarded_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(AwardRecord {
            entry: award.clone().with_id(id),
            balance: row.get("balance"),
            lifetime_points: row.get("lifetime_points"),
        })
    }

    async fn insert_history_in_tx(conn: &mut PgConnection, award: &NewPointsHistory) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO points_history (user_id, event_id, category, points, is_repeat, awarded_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&award.user_id)
        .bind(&award.event_id)
        .bind(award.category)
        .bind(award.points)
        .bind(award.is_repeat)
        .bind(award.awarded_at)
        .fetch_one(conn)
        .await?;

        Ok(id)
    }

    /// 按发放时间倒序
    pub async fn list_history(&self, user_id: &str, limit: i64) -> Result<Vec<PointsHistory>> {
        let entries = sqlx::query_as::<_, PointsHistory>(
            r#"
            SELECT id, user_id, event_id, category, points, is_repeat, awarded_at
            FROM points_history
            WHERE user_id = $1
            ORDER BY awarded_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    pub async fn list_category_totals(&self, user_id: &str) -> Result<Vec<CategoryPoints>> {
        let totals = sqlx::query_as::<_, CategoryPoints>(
            r#"
            SELECT user_id, category, total_points, award_count, last_awarded_at
            FROM points
            WHERE user_id = $1
            ORDER BY total_points DESC, category ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(totals)
    }
}

#[async_trait]
impl PointsRepositoryTrait for PointsRepository {
    async fn has_attended_event(&self, user_id: &str, event_id: &str) -> Result<bool> {
        self.has_attended_event(user_id, event_id).await
    }

    async fn record_award(&self, award: &NewPointsHistory) -> Result<AwardRecord> {
        self.record_award(award).await
    }

    async fn list_history(&self, user_id: &str, limit: i64) -> Result<Vec<PointsHistory>> {
        self.list_history(user_id, limit).await
    }

    async fn list_category_totals(&self, user_id: &str) -> Result<Vec<CategoryPoints>> {
        self.list_category_totals(user_id).await
    }
}
