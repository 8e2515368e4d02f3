//! 积分相关实体定义
//!
//! 包含积分流水、分类积分汇总和一次发放的落库结果

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::EventCategory;

/// 积分流水
///
/// 只追加，每次发放对应一条
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PointsHistory {
    pub id: i64,
    pub user_id: String,
    /// 活动 ID
    pub event_id: String,
    pub category: EventCategory,
    /// 本次发放的积分
    pub points: i32,
    /// 是否重复参加同一活动
    pub is_repeat: bool,
    pub awarded_at: DateTime<Utc>,
}

/// 待写入的积分流水
#[derive(Debug, Clone, PartialEq)]
pub struct NewPointsHistory {
    pub user_id: String,
    pub event_id: String,
    pub category: EventCategory,
    pub points: i32,
    pub is_repeat: bool,
    pub awarded_at: DateTime<Utc>,
}

impl NewPointsHistory {
    pub fn with_id(self, id: i64) -> PointsHistory {
        PointsHistory {
            id,
            user_id: self.user_id,
            event_id: self.event_id,
            category: self.category,
            points: self.points,
            is_repeat: self.is_repeat,
            awarded_at: self.awarded_at,
        }
    }
}

/// 按类别汇总的积分（points 集合）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPoints {
    pub user_id: String,
    pub category: EventCategory,
    pub total_points: i64,
    pub award_count: i64,
    pub last_awarded_at: DateTime<Utc>,
}

/// 一次积分发放落库后的结果
///
/// 流水写入与余额更新在同一原子边界内完成
#[derive(Debug, Clone, PartialEq)]
pub struct AwardRecord {
    pub entry: PointsHistory,
    /// 更新后的可用余额
    pub balance: i64,
    /// 更新后的累计积分
    pub lifetime_points: i64,
}
