//! 奖品与兑换记录实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::RedemptionStatus;

/// 奖品
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: i64,
    pub name: String,
    #[sqlx(default)]
    pub description: Option<String>,
    /// 兑换所需积分
    pub cost: i64,
    /// 是否上架
    pub available: bool,
    /// 剩余库存，None 表示不限量
    #[sqlx(default)]
    pub stock: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reward {
    /// 是否还有库存
    pub fn has_stock(&self) -> bool {
        self.stock.is_none_or(|s| s > 0)
    }
}

/// 新建奖品
#[derive(Debug, Clone, PartialEq)]
pub struct NewReward {
    pub name: String,
    pub description: Option<String>,
    pub cost: i64,
    pub available: bool,
    pub stock: Option<i32>,
}

/// 兑换记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    pub id: i64,
    /// 兑换单号
    pub redemption_no: String,
    pub user_id: String,
    pub reward_id: i64,
    /// 兑换时的奖品名称快照
    pub reward_name: String,
    /// 实际扣减的积分
    pub cost: i64,
    pub status: RedemptionStatus,
    #[sqlx(default)]
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 待写入的兑换记录
#[derive(Debug, Clone, PartialEq)]
pub struct NewRedemption {
    pub redemption_no: String,
    pub user_id: String,
    pub reward_id: i64,
    pub idempotency_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reward(stock: Option<i32>) -> Reward {
        Reward {
            id: 1,
            name: "Campus Mug".to_string(),
            description: None,
            cost: 50,
            available: true,
            stock,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_has_stock() {
        assert!(reward(None).has_stock());
        assert!(reward(Some(3)).has_stock());
        assert!(!reward(Some(0)).has_stock());
    }
}
