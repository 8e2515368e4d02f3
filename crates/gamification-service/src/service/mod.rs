//! 服务层
//!
//! 实现积分业务逻辑，协调仓储层。
//!
//! ## 模块结构
//!
//! - `dto`: 数据传输对象定义
//! - `points_calculator`: 积分计算规则（纯函数）
//! - `points_service`: 积分发放
//! - `user_service`: 用户注册与积分查询
//! - `reward_service`: 奖品管理与兑换
//! - `leaderboard_service`: 排行榜查询与重建

pub mod dto;
pub mod leaderboard_service;
pub mod points_calculator;
pub mod points_service;
pub mod reward_service;
pub mod user_service;

pub use dto::*;
pub use leaderboard_service::LeaderboardService;
pub use points_calculator::{InvalidPolicy, PointsCalculator, PointsPolicy};
pub use points_service::PointsService;
pub use reward_service::RewardService;
pub use user_service::UserService;
