//! 请求 DTO 定义
//!
//! 所有 REST API 的请求参数和请求体结构

use serde::Deserialize;
use validator::Validate;

use crate::models::{NewReward, NewUser};

/// 注册用户请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    #[validate(length(min = 1, max = 128, message = "用户ID长度必须在1-128个字符之间"))]
    pub user_id: String,
    #[validate(length(min = 1, max = 100, message = "显示名称长度必须在1-100个字符之间"))]
    pub display_name: String,
    #[validate(email(message = "邮箱格式不正确"))]
    pub email: Option<String>,
}

impl From<RegisterUserRequest> for NewUser {
    fn from(req: RegisterUserRequest) -> Self {
        Self {
            user_id: req.user_id,
            display_name: req.display_name,
            email: req.email,
        }
    }
}

/// 发放积分请求
///
/// 类别在服务层解析，非法类别返回 INVALID_CATEGORY
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AwardPointsRequest {
    #[validate(length(min = 1, max = 128, message = "用户ID长度必须在1-128个字符之间"))]
    pub user_id: String,
    #[validate(length(min = 1, max = 128, message = "活动ID长度必须在1-128个字符之间"))]
    pub event_id: String,
    pub category: String,
}

/// 创建奖品请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRewardRequest {
    #[validate(length(min = 1, max = 100, message = "奖品名称长度必须在1-100个字符之间"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 1, message = "兑换积分必须大于0"))]
    pub cost: i64,
    #[serde(default = "default_available")]
    pub available: bool,
    /// 不传表示不限量
    #[validate(range(min = 0, message = "库存不能为负数"))]
    pub stock: Option<i32>,
}

fn default_available() -> bool {
    true
}

impl From<CreateRewardRequest> for NewReward {
    fn from(req: CreateRewardRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            cost: req.cost,
            available: req.available,
            stock: req.stock,
        }
    }
}

/// 上下架请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAvailabilityRequest {
    pub available: bool,
}

/// 兑换请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RedeemRequest {
    #[validate(length(min = 1, max = 128, message = "用户ID长度必须在1-128个字符之间"))]
    pub user_id: String,
    /// 幂等键，也可通过 Idempotency-Key 头传入
    #[validate(length(min = 1, max = 128, message = "幂等键长度必须在1-128个字符之间"))]
    pub idempotency_key: Option<String>,
}

/// 页码上限，保证 `(page - 1) * page_size` 不会溢出
pub const MAX_PAGE: i64 = i64::MAX / 100;

/// 分页查询参数
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl PaginationParams {
    /// 页码从 1 开始
    pub fn page(&self) -> i64 {
        self.page.clamp(1, MAX_PAGE)
    }

    /// 获取限制条数（最大100）
    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, 100)
    }
}

/// 列表条数参数
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitParams {
    #[serde(default = "default_page_size")]
    pub limit: i64,
}

impl LimitParams {
    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, 100)
    }
}

/// 奖品列表过滤
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardQuery {
    #[serde(default)]
    pub available_only: bool,
}
