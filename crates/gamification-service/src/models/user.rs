//! 用户实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::EventCategory;

/// 用户
///
/// 注册时创建，每次获得积分或兑换奖品时更新，不做物理删除
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// 用户标识（学号或统一身份 ID）
    pub user_id: String,
    pub display_name: String,
    #[sqlx(default)]
    pub email: Option<String>,
    /// 可用积分余额 = 累计获得 - 兑换消耗
    pub balance: i64,
    /// 累计获得积分，等于积分流水之和
    pub lifetime_points: i64,
    /// 已参加过的活动类别
    #[sqlx(json)]
    pub attended_categories: Vec<EventCategory>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// 是否参加过某类活动
    pub fn has_attended(&self, category: EventCategory) -> bool {
        self.attended_categories.contains(&category)
    }

    /// 是否有足够积分支付
    pub fn can_afford(&self, cost: i64) -> bool {
        self.balance >= cost
    }
}

/// 新用户
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub user_id: String,
    pub display_name: String,
    pub email: Option<String>,
}

impl NewUser {
    /// 转换为初始状态的用户
    pub fn into_user(self, now: DateTime<Utc>) -> User {
        User {
            user_id: self.user_id,
            display_name: self.display_name,
            email: self.email,
            balance: 0,
            lifetime_points: 0,
            attended_categories: Vec::new(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
