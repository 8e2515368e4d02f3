//! 应用状态定义
//!
//! 仓储在此组装为服务，服务通过 Arc 在 handler 间共享

use std::sync::Arc;

use campus_shared::database::Database;
use sqlx::PgPool;

use crate::repository::{
    InMemoryRepository, LeaderboardRepository, LeaderboardRepositoryTrait, PointsRepository,
    PointsRepositoryTrait, RedemptionRepository, RedemptionRepositoryTrait, RewardRepository,
    RewardRepositoryTrait, UserRepository, UserRepositoryTrait,
};
use crate::service::{
    LeaderboardService, PointsCalculator, PointsService, RewardService, UserService,
};

/// 各集合的仓储
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepositoryTrait>,
    pub points: Arc<dyn PointsRepositoryTrait>,
    pub rewards: Arc<dyn RewardRepositoryTrait>,
    pub redemptions: Arc<dyn RedemptionRepositoryTrait>,
    pub leaderboard: Arc<dyn LeaderboardRepositoryTrait>,
}

impl Repositories {
    /// PostgreSQL 实现，共享同一个连接池
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            points: Arc::new(PointsRepository::new(pool.clone())),
            rewards: Arc::new(RewardRepository::new(pool.clone())),
            redemptions: Arc::new(RedemptionRepository::new(pool.clone())),
            leaderboard: Arc::new(LeaderboardRepository::new(pool)),
        }
    }

    /// 内存实现，所有集合共享同一个存储
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryRepository::new());
        Self {
            users: store.clone(),
            points: store.clone(),
            rewards: store.clone(),
            redemptions: store.clone(),
            leaderboard: store,
        }
    }
}

/// Axum 应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub points_service: Arc<PointsService>,
    pub reward_service: Arc<RewardService>,
    pub leaderboard_service: Arc<LeaderboardService>,
    /// 就绪检查使用；内存模式下为 None
    pub database: Option<Database>,
}

impl AppState {
    pub fn new(
        repos: Repositories,
        calculator: PointsCalculator,
        database: Option<Database>,
    ) -> Self {
        let leaderboard_service = Arc::new(LeaderboardService::new(
            repos.users.clone(),
            repos.leaderboard.clone(),
        ));

        Self {
            user_service: Arc::new(UserService::new(repos.users.clone(), repos.points.clone())),
            points_service: Arc::new(PointsService::new(
                repos.users.clone(),
                repos.points.clone(),
                leaderboard_service.clone(),
                calculator,
            )),
            reward_service: Arc::new(RewardService::new(
                repos.users,
                repos.rewards,
                repos.redemptions,
            )),
            leaderboard_service,
            database,
        }
    }

    /// 基于 PostgreSQL 数据库构建
    pub fn postgres(database: Database, calculator: PointsCalculator) -> Self {
        Self::new(
            Repositories::postgres(database.pool().clone()),
            calculator,
            Some(database),
        )
    }

    /// 基于内存仓储构建，用于本地开发与测试
    pub fn in_memory(calculator: PointsCalculator) -> Self {
        Self::new(Repositories::in_memory(), calculator, None)
    }
}
