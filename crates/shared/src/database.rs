//! 数据库连接管理模块
//!
//! 提供 PostgreSQL 连接池管理，以及各逻辑数据集合的命名引用。

use crate::config::DatabaseConfig;
use crate::credentials::ServiceAccount;
use crate::error::{CampusError, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::fmt;
use std::time::Duration;
use tracing::{info, instrument};

/// 逻辑数据集合
///
/// 每个集合对应一张表，集合名与表名的映射集中在此处
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Points,
    Rewards,
    Redemptions,
    PointsHistory,
    Leaderboard,
}

impl Collection {
    /// 全部集合
    pub const ALL: [Collection; 6] = [
        Collection::Users,
        Collection::Points,
        Collection::Rewards,
        Collection::Redemptions,
        Collection::PointsHistory,
        Collection::Leaderboard,
    ];

    /// 逻辑集合名
    pub fn name(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Points => "points",
            Self::Rewards => "rewards",
            Self::Redemptions => "redemptions",
            Self::PointsHistory => "pointsHistory",
            Self::Leaderboard => "leaderboard",
        }
    }

    /// 物理表名
    pub fn table(&self) -> &'static str {
        match self {
            Self::PointsHistory => "points_history",
            other => other.name(),
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 数据库连接池包装
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 使用服务账号凭证创建数据库连接池
    #[instrument(skip(config, account), fields(project_id = %account.project_id))]
    pub async fn connect(config: &DatabaseConfig, account: &ServiceAccount) -> Result<Self> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(account.database_url())
            .await?;

        info!("Database connection pool created");

        Ok(Self { pool })
    }

    /// 用已有连接池构建（测试使用）
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 获取连接池引用
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 健康检查
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(CampusError::from)
    }

    /// 运行内置迁移
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// 校验所有数据集合都已存在
    ///
    /// 任一集合缺失返回 `MissingCollection`
    #[instrument(skip(self))]
    pub async fn verify_collections(&self) -> Result<()> {
        for collection in Collection::ALL {
            let exists: bool = sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
                .bind(collection.table())
                .fetch_one(&self.pool)
                .await?;

            if !exists {
                return Err(CampusError::MissingCollection {
                    collection: collection.name().to_string(),
                });
            }
        }

        info!("All collections present");
        Ok(())
    }

    /// 关闭连接池
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database connection pool closed");
    }
}

impl std::ops::Deref for Database {
    type Target = PgPool;

    fn deref(&self) -> &Self::Target {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_names() {
        assert_eq!(Collection::PointsHistory.name(), "pointsHistory");
        assert_eq!(Collection::PointsHistory.table(), "points_history");
        assert_eq!(Collection::Users.table(), "users");
        assert_eq!(Collection::Leaderboard.to_string(), "leaderboard");
        assert_eq!(Collection::ALL.len(), 6);
    }

    #[tokio::test]
    #[ignore] // 需要数据库连接
    async fn test_database_connection() {
        let url = std::env::var("DATABASE_URL").unwrap();
        let raw = format!(
            r#"{{"project_id":"test","client_email":"test@local","database_url":"{}"}}"#,
            url
        );
        let account = ServiceAccount::from_json(&raw).unwrap();
        let db = Database::connect(&DatabaseConfig::default(), &account)
            .await
            .unwrap();
        db.health_check().await.unwrap();
        db.run_migrations().await.unwrap();
        db.verify_collections().await.unwrap();
    }
}
