//! 请求/响应 DTO 模块

pub mod request;
pub mod response;

pub use request::{
    AdjustPointsBody, CreateRewardBody, DeliveredBody, PaginationParams, RedeemBody,
    RedemptionListParams, ReviewBody, SetActiveBody, SetRoleBody, SubmitDeliveryBody,
    UpdateProfileBody, UpdateRewardBody,
};
pub use response::{ApiResponse, PageResponse};
