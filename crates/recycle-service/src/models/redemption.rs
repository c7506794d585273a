//! 兑换实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::RedemptionState;

/// 兑换申请
///
/// `points_spent` 与 `reward_title` 在申请时冻结快照，
/// 后续奖励价格或名称调整不影响已存在的申请
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    pub id: String,
    /// 申请用户 ID
    pub user_id: String,
    /// 申请用户名称（冗余字段）
    pub user_name: String,
    /// 奖励 ID
    pub reward_id: String,
    /// 奖励标题快照
    pub reward_title: String,
    /// 扣减积分快照
    pub points_spent: i64,
    /// 当前状态
    pub state: RedemptionState,
    /// 用户备注
    #[sqlx(default)]
    pub user_comment: Option<String>,
    /// 审核人 ID
    #[sqlx(default)]
    pub reviewed_by: Option<String>,
    /// 审核时间
    #[sqlx(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    /// 拒绝原因
    #[sqlx(default)]
    pub rejection_reason: Option<String>,
    /// 运营备注
    #[sqlx(default)]
    pub admin_comment: Option<String>,
    /// 送达时间
    #[sqlx(default)]
    pub delivered_at: Option<DateTime<Utc>>,
    /// 送达凭证照片
    #[sqlx(default)]
    pub receipt_photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Redemption {
    /// 用户是否还能取消（仅审核前）
    pub fn is_cancellable(&self) -> bool {
        self.state == RedemptionState::Requested
    }
}
