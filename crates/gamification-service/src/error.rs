//! 积分服务错误类型
//!
//! 业务错误映射为 4xx，系统错误统一返回 500 且不向调用方暴露细节

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::models::RedemptionStatus;

/// 积分服务错误类型
#[derive(Debug, Error)]
pub enum GamificationError {
    // === 参数错误 ===
    #[error("参数校验失败: {0}")]
    Validation(String),

    #[error("无效的活动类别: {0}")]
    InvalidCategory(String),

    // === 资源不存在 ===
    #[error("用户不存在: {0}")]
    UserNotFound(String),

    #[error("奖品不存在: {0}")]
    RewardNotFound(i64),

    #[error("兑换记录不存在: {0}")]
    RedemptionNotFound(i64),

    #[error("用户尚未上榜: {0}")]
    LeaderboardEntryNotFound(String),

    // === 业务规则 ===
    #[error("用户已存在: {0}")]
    UserAlreadyExists(String),

    #[error("积分不足: 需要 {required}, 可用 {available}")]
    InsufficientPoints { required: i64, available: i64 },

    #[error("奖品已下架: reward_id={0}")]
    RewardUnavailable(i64),

    #[error("奖品库存不足: reward_id={0}")]
    RewardOutOfStock(i64),

    #[error("重复的兑换请求: idempotency_key={0}")]
    DuplicateRedemption(String),

    #[error("兑换状态不允许此操作: redemption_id={id}, current_status={current}")]
    InvalidRedemptionStatus { id: i64, current: RedemptionStatus },

    // === 系统错误 ===
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON 序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 积分服务 Result 类型别名
pub type Result<T> = std::result::Result<T, GamificationError>;

impl GamificationError {
    /// 检查是否为业务错误（非系统错误）
    pub fn is_business_error(&self) -> bool {
        !matches!(
            self,
            Self::Database(_) | Self::Serialization(_) | Self::Internal(_)
        )
    }

    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidCategory(_) => StatusCode::BAD_REQUEST,

            Self::UserNotFound(_)
            | Self::RewardNotFound(_)
            | Self::RedemptionNotFound(_)
            | Self::LeaderboardEntryNotFound(_) => StatusCode::NOT_FOUND,

            Self::UserAlreadyExists(_)
            | Self::InsufficientPoints { .. }
            | Self::RewardUnavailable(_)
            | Self::RewardOutOfStock(_)
            | Self::DuplicateRedemption(_)
            | Self::InvalidRedemptionStatus { .. } => StatusCode::CONFLICT,

            Self::Database(_) | Self::Serialization(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidCategory(_) => "INVALID_CATEGORY",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::RewardNotFound(_) => "REWARD_NOT_FOUND",
            Self::RedemptionNotFound(_) => "REDEMPTION_NOT_FOUND",
            Self::LeaderboardEntryNotFound(_) => "LEADERBOARD_ENTRY_NOT_FOUND",
            Self::UserAlreadyExists(_) => "USER_ALREADY_EXISTS",
            Self::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            Self::RewardUnavailable(_) => "REWARD_UNAVAILABLE",
            Self::RewardOutOfStock(_) => "REWARD_OUT_OF_STOCK",
            Self::DuplicateRedemption(_) => "DUPLICATE_REDEMPTION",
            Self::InvalidRedemptionStatus { .. } => "INVALID_REDEMPTION_STATUS",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// 判断数据库错误是否为唯一约束冲突
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

impl IntoResponse for GamificationError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, "数据库操作失败");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Serialization(e) => {
                tracing::error!(error = %e, "序列化失败");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "内部错误");
                "服务内部错误，请稍后重试".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for GamificationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}
