//! 校园积分服务
//!
//! 为参加校园活动的学生发放积分，支持积分兑换奖品与排行榜。
//!
//! ## 核心功能
//!
//! - **积分发放**：按活动类别与是否重复参加计算积分，原子写入流水与余额
//! - **奖品兑换**：幂等兑换，锁内复核余额与库存
//! - **排行榜**：按累计积分排名，支持由流水重建
//!
//! ## 模块结构
//!
//! - `models`: 领域实体
//! - `repository`: 仓储接口及 PostgreSQL / 内存实现
//! - `service`: 业务逻辑
//! - `dto`: HTTP 请求与响应
//! - `extract`: 请求提取器，解析失败时返回统一错误响应
//! - `handlers` / `routes` / `state`: Axum 接入层

pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod service;
pub mod state;

pub use error::{GamificationError, Result};
pub use models::{
    EventCategory, LeaderboardEntry, PointsHistory, Redemption, RedemptionStatus, Reward, User,
};
pub use routes::build_router;
pub use service::{PointsCalculator, PointsPolicy};
pub use state::{AppState, Repositories};
