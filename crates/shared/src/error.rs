//! 统一错误处理模块
//!
//! 定义基础设施层共享的错误类型，使用 thiserror 提供良好的错误信息。

use thiserror::Error;

/// 基础设施错误类型
#[derive(Debug, Error)]
pub enum CampusError {
    // ==================== 数据库错误 ====================
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("数据库迁移失败: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("数据集合缺失: {collection}")]
    MissingCollection { collection: String },

    // ==================== 配置错误 ====================
    #[error("配置错误: {0}")]
    Config(#[from] config::ConfigError),

    #[error("服务账号凭证无效: {path} - {message}")]
    Credentials { path: String, message: String },

    // ==================== 通用错误 ====================
    #[error("内部错误: {0}")]
    Internal(String),
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, CampusError>;

impl CampusError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Database(_) => "DATABASE_ERROR",
            Self::Migration(_) => "MIGRATION_ERROR",
            Self::MissingCollection { .. } => "MISSING_COLLECTION",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Credentials { .. } => "INVALID_CREDENTIALS",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 是否为启动期致命错误
    ///
    /// 配置、凭证和数据集合缺失都无法在运行期恢复
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::Credentials { .. }
                | Self::MissingCollection { .. }
                | Self::Migration(_)
        )
    }
}
