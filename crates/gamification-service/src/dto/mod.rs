//! HTTP 请求与响应 DTO

pub mod request;
pub mod response;

pub use request::{
    AwardPointsRequest, CreateRewardRequest, LimitParams, PaginationParams, RedeemRequest,
    RegisterUserRequest, RewardQuery, UpdateAvailabilityRequest,
};
pub use response::{ApiResponse, PageResponse, RecomputeResponse};
