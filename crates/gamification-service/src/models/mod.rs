//! 积分服务领域模型

pub mod enums;
pub mod leaderboard;
pub mod points;
pub mod reward;
pub mod user;

pub use enums::{EventCategory, RedemptionStatus, UnknownCategory};
pub use leaderboard::{LeaderboardEntry, Standing, rank_standings, ranking_order};
pub use points::{AwardRecord, CategoryPoints, NewPointsHistory, PointsHistory};
pub use reward::{NewRedemption, NewReward, Redemption, Reward};
pub use user::{NewUser, User};
