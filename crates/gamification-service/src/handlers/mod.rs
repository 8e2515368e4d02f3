//! HTTP 请求处理器模块

pub mod health;
pub mod leaderboard;
pub mod points;
pub mod reward;
pub mod user;
