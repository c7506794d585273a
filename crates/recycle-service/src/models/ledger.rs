//! 积分账本实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{ChangeType, SourceType};

/// 积分账本条目
///
/// 每次余额变动追加一条记录。`(ref_type, ref_id, change_type)`
/// 上有唯一索引，同一来源的同类变动至多入账一次，
/// 这是入账幂等性的数据库级保证
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: i64,
    /// 用户 ID
    pub user_id: String,
    /// 变动类型
    pub change_type: ChangeType,
    /// 变动金额（有符号，正为入账负为扣减）
    pub amount: i64,
    /// 变动后余额
    pub balance_after: i64,
    /// 关联来源类型
    pub ref_type: SourceType,
    /// 关联来源 ID（投递 ID / 兑换 ID / 操作单号）
    pub ref_id: String,
    /// 备注
    #[sqlx(default)]
    pub remark: Option<String>,
    pub created_at: DateTime<Utc>,
}
