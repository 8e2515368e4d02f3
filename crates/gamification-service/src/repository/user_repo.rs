//! 用户仓储

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::UserRepositoryTrait;
use crate::error::{GamificationError, Result, is_unique_violation};
use crate::models::{NewUser, User};

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 创建用户，主键冲突时返回 `UserAlreadyExists`
    pub async fn create_user(&self, user: &NewUser) -> Result<User> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (user_id, display_name, email)
            VALUES ($1, $2, $3)
            RETURNING user_id, display_name, email, balance, lifetime_points,
                      attended_categories, active, created_at, updated_at
            "#,
        )
        .bind(&user.user_id)
        .bind(&user.display_name)
        .bind(&user.email)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(e) if is_unique_violation(&e) => {
                Err(GamificationError::UserAlreadyExists(user.user_id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, display_name, email, balance, lifetime_points,
                   attended_categories, active, created_at, updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn create_user(&self, user: &NewUser) -> Result<User> {
        self.create_user(user).await
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        self.get_user(user_id).await
    }
}
