//! REST API 请求 DTO 定义
//!
//! 所有端点的请求参数和请求体结构，入参校验使用 validator。

use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use recycle_core::models::{MaterialKind, RewardCategory, UserRole};

/// 分页查询参数
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    #[validate(range(min = 1, message = "页码从 1 开始"))]
    #[serde(default = "default_page")]
    pub page: i64,
    #[validate(range(min = 1, max = 100, message = "每页条数必须在 1-100 之间"))]
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
    /// SQL OFFSET 值
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

/// 提交投递请求体
///
/// 照片通过 multipart 的 photo 字段单独携带，不在 JSON 体内
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitDeliveryBody {
    pub material: MaterialKind,
    #[validate(range(min = 0.001, message = "重量必须为正数"))]
    pub weight_kg: f64,
    #[validate(length(max = 500, message = "备注不超过 500 字符"))]
    pub comment: Option<String>,
}

/// 审核判定请求体（投递与兑换共用）
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReviewBody {
    pub approve: bool,
    /// 拒绝原因（拒绝时必填，由服务层校验）
    #[validate(length(max = 500, message = "拒绝原因不超过 500 字符"))]
    pub reason: Option<String>,
    /// 运营备注
    #[validate(length(max = 500, message = "备注不超过 500 字符"))]
    pub comment: Option<String>,
}

/// 确认送达请求体（可附带凭证照片）
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredBody {
    #[validate(length(max = 512, message = "凭证照片地址不超过 512 字符"))]
    pub receipt_photo_url: Option<String>,
}

/// 兑换申请请求体
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RedeemBody {
    #[validate(length(min = 1, max = 64, message = "奖励 ID 长度非法"))]
    pub reward_id: String,
    #[validate(length(max = 500, message = "备注不超过 500 字符"))]
    pub comment: Option<String>,
}

/// 创建奖励请求体
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRewardBody {
    #[validate(length(min = 1, max = 200, message = "标题长度必须在 1-200 字符之间"))]
    pub title: String,
    #[validate(length(min = 1, max = 2000, message = "描述长度必须在 1-2000 字符之间"))]
    pub description: String,
    pub category: RewardCategory,
    #[validate(range(min = 1, message = "兑换积分必须为正"))]
    pub cost_points: i64,
    pub monetary_value: f64,
    pub image_url: Option<String>,
    /// 库存数量（-1 表示不限量）
    #[validate(range(min = -1, message = "库存数量非法"))]
    pub quantity: i64,
    #[serde(default)]
    pub requirements: Vec<String>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
}

/// 更新奖励请求体
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRewardBody {
    #[validate(length(min = 1, max = 200, message = "标题长度必须在 1-200 字符之间"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 2000, message = "描述长度必须在 1-2000 字符之间"))]
    pub description: Option<String>,
    pub category: Option<RewardCategory>,
    pub cost_points: Option<i64>,
    pub monetary_value: Option<f64>,
    pub image_url: Option<String>,
    pub quantity: Option<i64>,
    pub requirements: Option<Vec<String>>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
}

/// 上架/下架请求体（奖励与用户停启用共用）
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveBody {
    pub active: bool,
}

/// 更新个人资料请求体
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileBody {
    #[validate(length(min = 1, max = 100, message = "姓名长度必须在 1-100 字符之间"))]
    pub name: Option<String>,
    #[validate(length(max = 32, message = "电话不超过 32 字符"))]
    pub phone: Option<String>,
    #[validate(length(max = 500, message = "地址不超过 500 字符"))]
    pub address: Option<String>,
    pub photo_url: Option<String>,
}

/// 调整用户角色请求体
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRoleBody {
    pub role: UserRole,
}

/// 积分调整请求体
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdjustPointsBody {
    /// 调整量，正数补偿、负数扣减，不允许为零
    pub delta: i64,
    #[validate(length(max = 500, message = "备注不超过 500 字符"))]
    pub remark: Option<String>,
}

/// 兑换列表过滤参数
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionListParams {
    pub state: Option<recycle_core::models::RedemptionState>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

impl RedemptionListParams {
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}
