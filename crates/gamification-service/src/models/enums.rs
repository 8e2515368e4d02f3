//! 积分服务枚举类型定义
//!
//! 所有枚举都支持数据库（sqlx）和 JSON（serde）序列化

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 活动类别
///
/// 积分计算以类别为单位判断用户是否首次参加
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum EventCategory {
    /// 学术讲座、研讨会
    Academic,
    /// 社团聚会、迎新
    Social,
    /// 体育赛事
    Sports,
    /// 文艺演出、展览
    Cultural,
    /// 志愿服务
    Volunteering,
    /// 招聘会、职业发展
    Career,
    /// 心理健康、身心活动
    Wellness,
}

impl EventCategory {
    /// 全部类别
    pub const ALL: [EventCategory; 7] = [
        EventCategory::Academic,
        EventCategory::Social,
        EventCategory::Sports,
        EventCategory::Cultural,
        EventCategory::Volunteering,
        EventCategory::Career,
        EventCategory::Wellness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Academic => "academic",
            Self::Social => "social",
            Self::Sports => "sports",
            Self::Cultural => "cultural",
            Self::Volunteering => "volunteering",
            Self::Career => "career",
            Self::Wellness => "wellness",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 类别解析错误，携带原始输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl FromStr for EventCategory {
    type Err = UnknownCategory;

    /// 忽略首尾空白和大小写
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// 兑换状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum RedemptionStatus {
    /// 待领取 - 积分已扣减，奖品尚未发放
    #[default]
    Pending,
    /// 已领取
    Fulfilled,
}

impl RedemptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Fulfilled => "FULFILLED",
        }
    }
}

impl fmt::Display for RedemptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
