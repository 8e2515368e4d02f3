//! 排行榜实体定义与排名计算
//!
//! 排名规则：总积分降序，积分相同时按 user_id 升序，保证全序

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 排行榜中用户的积分快照（leaderboard 集合）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub user_id: String,
    pub display_name: String,
    pub total_points: i64,
    pub updated_at: DateTime<Utc>,
}

/// 带名次的排行榜条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// 名次，从 1 开始
    pub rank: i64,
    pub user_id: String,
    pub display_name: String,
    pub total_points: i64,
}

/// 排行榜全序比较
pub fn ranking_order(a: &Standing, b: &Standing) -> Ordering {
    b.total_points
        .cmp(&a.total_points)
        .then_with(|| a.user_id.cmp(&b.user_id))
}

/// 对快照排序并分配名次
///
/// `offset` 为分页偏移，第一条的名次为 `offset + 1`
pub fn rank_standings(mut standings: Vec<Standing>, offset: i64) -> Vec<LeaderboardEntry> {
    standings.sort_by(ranking_order);
    standings
        .into_iter()
        .enumerate()
        .map(|(i, s)| LeaderboardEntry {
            rank: offset + i as i64 + 1,
            user_id: s.user_id,
            display_name: s.display_name,
            total_points: s.total_points,
        })
        .collect()
}
