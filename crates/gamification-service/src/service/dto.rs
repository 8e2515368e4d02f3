//! 服务层数据传输对象

use serde::{Deserialize, Serialize};

use crate::models::{CategoryPoints, PointsHistory, Redemption};

/// 积分发放结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardPointsResult {
    pub entry: PointsHistory,
    pub points_awarded: i32,
    /// 发放后的可用余额
    pub balance: i64,
    pub lifetime_points: i64,
    /// 是否首次参加该类别
    pub new_category: bool,
}

/// 用户积分概览
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsSummaryDto {
    pub user_id: String,
    pub balance: i64,
    pub lifetime_points: i64,
    pub categories: Vec<CategoryPoints>,
}

/// 兑换结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemResult {
    pub redemption: Redemption,
    /// 是否为幂等重放
    pub replayed: bool,
    pub message: String,
}

impl RedeemResult {
    pub fn created(redemption: Redemption) -> Self {
        Self {
            redemption,
            replayed: false,
            message: "兑换成功".to_string(),
        }
    }

    pub fn from_existing(redemption: Redemption) -> Self {
        Self {
            redemption,
            replayed: true,
            message: "幂等请求，返回已存在的兑换记录".to_string(),
        }
    }
}
