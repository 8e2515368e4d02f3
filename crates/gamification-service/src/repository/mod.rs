//! 数据库仓储层
//!
//! 提供所有实体的数据访问接口，封装 SQL 操作细节。
//!
//! ## 设计原则
//!
//! - 仓储只负责数据持久化，不包含业务逻辑
//! - 需要原子性的写操作（发放积分、兑换）在仓储内以单个事务完成
//! - 定义 trait 接口以支持 mock 测试
//! - `InMemoryRepository` 提供与 PostgreSQL 实现一致语义的内存版本

mod leaderboard_repo;
mod memory;
mod points_repo;
mod redemption_repo;
mod reward_repo;
mod traits;
mod user_repo;

pub use leaderboard_repo::LeaderboardRepository;
pub use memory::InMemoryRepository;
pub use points_repo::PointsRepository;
pub use redemption_repo::RedemptionRepository;
pub use reward_repo::RewardRepository;
pub use traits::*;
pub use user_repo::UserRepository;
