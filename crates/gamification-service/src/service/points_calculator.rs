//! 积分计算器
//!
//! 纯函数，根据活动类别、用户已参加类别和是否重复参加计算本次积分。
//!
//! | 类别已参加过 | 重复参加同一活动 | 积分 |
//! |---|---|---|
//! | 否 | 任意 | `new_category_points` |
//! | 是 | 否 | `same_category_points` |
//! | 是 | 是 | `repeat_event_points` |

use campus_shared::config::PointsConfig;
use thiserror::Error;

use crate::models::EventCategory;

/// 积分策略配置无效
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("积分策略无效: {0}")]
pub struct InvalidPolicy(pub String);

/// 积分发放策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointsPolicy {
    pub new_category_points: i32,
    pub same_category_points: i32,
    pub repeat_event_points: i32,
}

impl Default for PointsPolicy {
    fn default() -> Self {
        Self::from(&PointsConfig::default())
    }
}

impl From<&PointsConfig> for PointsPolicy {
    fn from(config: &PointsConfig) -> Self {
        Self {
            new_category_points: config.new_category_points,
            same_category_points: config.same_category_points,
            repeat_event_points: config.repeat_event_points,
        }
    }
}

impl PointsPolicy {
    /// 要求 new >= same >= repeat >= 0
    pub fn validate(&self) -> Result<(), InvalidPolicy> {
        if self.repeat_event_points < 0 {
            return Err(InvalidPolicy(format!(
                "repeat_event_points 不能为负数: {}",
                self.repeat_event_points
            )));
        }
        if self.same_category_points < self.repeat_event_points {
            return Err(InvalidPolicy(format!(
                "same_category_points({}) 不能小于 repeat_event_points({})",
                self.same_category_points, self.repeat_event_points
            )));
        }
        if self.new_category_points < self.same_category_points {
            return Err(InvalidPolicy(format!(
                "new_category_points({}) 不能小于 same_category_points({})",
                self.new_category_points, self.same_category_points
            )));
        }
        Ok(())
    }
}

/// 积分计算器
#[derive(Debug, Clone, Copy, Default)]
pub struct PointsCalculator {
    policy: PointsPolicy,
}

impl PointsCalculator {
    /// 策略不合法时拒绝构造
    pub fn new(policy: PointsPolicy) -> Result<Self, InvalidPolicy> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &PointsPolicy {
        &self.policy
    }

    pub fn calculate(
        &self,
        category: EventCategory,
        attended_categories: &[EventCategory],
        repeat: bool,
    ) -> i32 {
        if !attended_categories.contains(&category) {
            self.policy.new_category_points
        } else if repeat {
            self.policy.repeat_event_points
        } else {
            self.policy.same_category_points
        }
    }
}
