//! 共享库
//!
//! 包含校园积分服务共用的配置、凭证、错误处理、数据库连接和可观测性等基础设施代码。

pub mod config;
pub mod credentials;
pub mod database;
pub mod error;
pub mod observability;
