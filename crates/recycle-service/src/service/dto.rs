//! 服务层 DTO 定义
//!
//! 服务入参使用独立的请求结构，出参尽量复用领域模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{MaterialKind, RewardCategory};

/// 投递提交请求
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitDeliveryRequest {
    pub user_id: String,
    pub material: MaterialKind,
    pub weight_kg: f64,
    #[serde(default)]
    pub comment: Option<String>,
    /// 凭证照片（提交时上传，可选）
    #[serde(skip)]
    pub photo: Option<PhotoUpload>,
}

/// 照片上传内容
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    /// 文件扩展名（jpg/png）
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// 审核决定（投递与兑换共用）
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDecision {
    pub approve: bool,
    /// 拒绝原因（拒绝时必填）
    #[serde(default)]
    pub reason: Option<String>,
    /// 运营备注
    #[serde(default)]
    pub comment: Option<String>,
}

/// 兑换申请请求
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemRequest {
    pub user_id: String,
    pub reward_id: String,
    #[serde(default)]
    pub comment: Option<String>,
}

/// 奖励创建请求
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRewardRequest {
    pub title: String,
    pub description: String,
    pub category: RewardCategory,
    pub cost_points: i64,
    pub monetary_value: f64,
    #[serde(default)]
    pub image_url: Option<String>,
    /// 库存数量（-1 表示不限量）
    pub quantity: i64,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
}

/// 材料积分率说明（回收指南）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialRateDto {
    pub material: MaterialKind,
    pub points_per_kg: f64,
}
