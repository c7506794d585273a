//! 积分账本仓储
//!
//! 账本条目只追加不修改，(ref_type, ref_id, change_type) 唯一索引
//! 提供数据库级的入账幂等保证

use sqlx::{PgConnection, PgPool, Row};

use crate::error::Result;
use crate::models::{ChangeType, LedgerEntry, SourceType};

/// 积分账本仓储
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 查询操作 ====================

    /// 列出用户的账本流水（按时间倒序）
    pub async fn list_by_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LedgerEntry>> {
        let entries = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT id, user_id, change_type, amount, balance_after, ref_type, ref_id,
                   remark, created_at
            FROM point_ledger
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// 检查某来源的某类变动是否已入账（幂等检查）
    pub async fn exists_ref(
        &self,
        ref_type: SourceType,
        ref_id: &str,
        change_type: ChangeType,
    ) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM point_ledger
                WHERE ref_type = $1 AND ref_id = $2 AND change_type = $3
            ) AS found
            "#,
        )
        .bind(ref_type)
        .bind(ref_id)
        .bind(change_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("found"))
    }

    // ==================== 事务操作 ====================

    /// 在事务中追加账本条目，返回条目 ID
    ///
    /// 余额更新与条目追加必须在同一事务内，唯一索引冲突
    /// 会使整个事务回滚，从而阻止重复入账
    pub async fn append_in_tx(tx: &mut PgConnection, entry: &LedgerEntry) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO point_ledger (user_id, change_type, amount, balance_after,
                                      ref_type, ref_id, remark, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&entry.user_id)
        .bind(entry.change_type)
        .bind(entry.amount)
        .bind(entry.balance_after)
        .bind(entry.ref_type)
        .bind(&entry.ref_id)
        .bind(&entry.remark)
        .bind(entry.created_at)
        .fetch_one(tx)
        .await?;

        Ok(row.get("id"))
    }

    /// 在事务中检查某来源的某类变动是否已入账
    pub async fn exists_ref_in_tx(
        tx: &mut PgConnection,
        ref_type: SourceType,
        ref_id: &str,
        change_type: ChangeType,
    ) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM point_ledger
                WHERE ref_type = $1 AND ref_id = $2 AND change_type = $3
            ) AS found
            "#,
        )
        .bind(ref_type)
        .bind(ref_id)
        .bind(change_type)
        .fetch_one(tx)
        .await?;

        Ok(row.get("found"))
    }
}
