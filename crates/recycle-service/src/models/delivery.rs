//! 投递实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{DeliveryState, MaterialKind};

/// 材料投递记录
///
/// 公民提交的一次回收投递，`points` 在提交时按材料率折算并冻结，
/// 审核通过时按该值入账（提交后费率调整不影响已提交的投递）
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub id: String,
    /// 投递用户 ID
    pub user_id: String,
    /// 投递用户名称（冗余字段，便于列表展示）
    pub user_name: String,
    /// 材料类型
    pub material: MaterialKind,
    /// 重量（公斤）
    pub weight_kg: f64,
    /// 折算积分（提交时计算）
    pub points: i64,
    /// 凭证照片 URL
    #[sqlx(default)]
    pub photo_url: Option<String>,
    /// 当前状态
    pub state: DeliveryState,
    /// 用户备注
    #[sqlx(default)]
    pub comment: Option<String>,
    /// 审核人 ID
    #[sqlx(default)]
    pub reviewed_by: Option<String>,
    /// 审核时间
    #[sqlx(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    /// 拒绝原因
    #[sqlx(default)]
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Delivery {
    /// 是否还可以被审核
    pub fn is_reviewable(&self) -> bool {
        self.state == DeliveryState::Pending
    }
}

/// 投递统计
///
/// 按用户聚合的投递数据，用于个人回收画像
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryStats {
    /// 已审核通过的投递次数
    pub approved_count: i64,
    /// 累计回收重量（公斤）
    pub total_weight_kg: f64,
    /// 累计获得积分
    pub total_points: i64,
    /// 待审核投递数
    pub pending_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_reviewable() {
        let mut delivery = Delivery {
            id: "d-1".to_string(),
            user_id: "u-1".to_string(),
            user_name: "Citizen".to_string(),
            material: MaterialKind::Pet,
            weight_kg: 2.0,
            points: 20,
            photo_url: None,
            state: DeliveryState::Pending,
            comment: None,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(delivery.is_reviewable());

        delivery.state = DeliveryState::Approved;
        assert!(!delivery.is_reviewable());
    }
}
