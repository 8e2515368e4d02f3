//! 用户服务
//!
//! 用户注册与积分查询

use std::sync::Arc;

use tracing::{info, instrument};

use super::dto::PointsSummaryDto;
use super::points_service::validate_identifier;
use crate::error::{GamificationError, Result};
use crate::models::{NewUser, PointsHistory, User};
use crate::repository::{PointsRepositoryTrait, UserRepositoryTrait};

pub struct UserService {
    user_repo: Arc<dyn UserRepositoryTrait>,
    points_repo: Arc<dyn PointsRepositoryTrait>,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepositoryTrait>,
        points_repo: Arc<dyn PointsRepositoryTrait>,
    ) -> Self {
        Self {
            user_repo,
            points_repo,
        }
    }

    /// 注册用户，用户 ID 重复时返回 `UserAlreadyExists`
    #[instrument(skip(self, user), fields(user_id = %user.user_id))]
    pub async fn register(&self, user: NewUser) -> Result<User> {
        validate_identifier("userId", &user.user_id)?;
        if user.display_name.trim().is_empty() {
            return Err(GamificationError::Validation(
                "displayName 不能为空".to_string(),
            ));
        }

        let created = self.user_repo.create_user(&user).await?;
        info!(user_id = %created.user_id, "用户注册成功");
        Ok(created)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User> {
        self.user_repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| GamificationError::UserNotFound(user_id.to_string()))
    }

    /// 余额、累计积分与分类汇总
    #[instrument(skip(self))]
    pub async fn get_points_summary(&self, user_id: &str) -> Result<PointsSummaryDto> {
        let user = self.get_user(user_id).await?;
        let categories = self.points_repo.list_category_totals(user_id).await?;

        Ok(PointsSummaryDto {
            user_id: user.user_id,
            balance: user.balance,
            lifetime_points: user.lifetime_points,
            categories,
        })
    }

    /// 最近的积分流水，按时间倒序
    #[instrument(skip(self))]
    pub async fn get_points_history(&self, user_id: &str, limit: i64) -> Result<Vec<PointsHistory>> {
        self.get_user(user_id).await?;
        self.points_repo.list_history(user_id, limit).await
    }
}
