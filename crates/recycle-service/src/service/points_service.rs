//! 积分账本服务
//!
//! 用户积分余额的唯一修改入口，包括：
//! - 事务内入账/扣减（供投递审核与兑换流程复用）
//! - 入账幂等检查
//! - 运营手动调整
//! - 余额与流水查询
//!
//! 余额物化在 users.points，每次变动同步追加账本条目，
//! 两者在同一事务内更新，账本重放恒等于当前余额

use std::sync::Arc;

use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::models::{ChangeType, LedgerEntry, SourceType};
use crate::repository::{LedgerRepository, UserRepository};

/// 积分账本服务
pub struct PointsService {
    user_repo: Arc<UserRepository>,
    ledger_repo: Arc<LedgerRepository>,
    pool: PgPool,
}

impl PointsService {
    pub fn new(
        user_repo: Arc<UserRepository>,
        ledger_repo: Arc<LedgerRepository>,
        pool: PgPool,
    ) -> Self {
        Self {
            user_repo,
            ledger_repo,
            pool,
        }
    }

    // ==================== 事务内操作 ====================

    /// 在事务中入账，返回变动后余额
    ///
    /// 幂等：同一 (ref_type, ref_id, change_type) 已入账时直接跳过，
    /// 返回当前余额，不产生第二次变动
    pub async fn credit_in_tx(
        tx: &mut PgConnection,
        user_id: &str,
        amount: i64,
        change_type: ChangeType,
        ref_type: SourceType,
        ref_id: &str,
        remark: Option<String>,
    ) -> Result<i64> {
        if amount <= 0 {
            return Err(CoreError::Validation(format!(
                "入账金额必须为正: {amount}"
            )));
        }

        if LedgerRepository::exists_ref_in_tx(tx, ref_type, ref_id, change_type).await? {
            info!(user_id, ref_id, ?change_type, "入账已存在，跳过重复操作");
            let user = UserRepository::get_user_for_update(tx, user_id)
                .await?
                .ok_or_else(|| CoreError::UserNotFound(user_id.to_string()))?;
            return Ok(user.points);
        }

        let balance_after = UserRepository::update_points_in_tx(tx, user_id, amount).await?;
        Self::append_entry_in_tx(
            tx,
            user_id,
            change_type,
            amount,
            balance_after,
            ref_type,
            ref_id,
            remark,
        )
        .await?;

        metrics::counter!("points_credited_total").increment(amount as u64);
        Ok(balance_after)
    }

    /// 在事务中扣减，返回变动后余额
    ///
    /// 先锁定用户行（FOR UPDATE）再检查余额，余额不足返回
    /// InsufficientBalance 并使整个事务回滚
    pub async fn debit_in_tx(
        tx: &mut PgConnection,
        user_id: &str,
        amount: i64,
        change_type: ChangeType,
        ref_type: SourceType,
        ref_id: &str,
        remark: Option<String>,
    ) -> Result<i64> {
        if amount <= 0 {
            return Err(CoreError::Validation(format!(
                "扣减金额必须为正: {amount}"
            )));
        }

        let user = UserRepository::get_user_for_update(tx, user_id)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(user_id.to_string()))?;

        if user.points < amount {
            return Err(CoreError::InsufficientBalance {
                required: amount,
                available: user.points,
            });
        }

        let balance_after = UserRepository::update_points_in_tx(tx, user_id, -amount).await?;
        Self::append_entry_in_tx(
            tx,
            user_id,
            change_type,
            -amount,
            balance_after,
            ref_type,
            ref_id,
            remark,
        )
        .await?;

        metrics::counter!("points_debited_total").increment(amount as u64);
        Ok(balance_after)
    }

    #[allow(clippy::too_many_arguments)]
    async fn append_entry_in_tx(
        tx: &mut PgConnection,
        user_id: &str,
        change_type: ChangeType,
        amount: i64,
        balance_after: i64,
        ref_type: SourceType,
        ref_id: &str,
        remark: Option<String>,
    ) -> Result<i64> {
        let entry = LedgerEntry {
            id: 0,
            user_id: user_id.to_string(),
            change_type,
            amount,
            balance_after,
            ref_type,
            ref_id: ref_id.to_string(),
            remark,
            created_at: Utc::now(),
        };
        LedgerRepository::append_in_tx(tx, &entry).await
    }

    // ==================== 对外操作 ====================

    /// 查询用户当前余额
    #[instrument(skip(self))]
    pub async fn balance(&self, user_id: &str) -> Result<i64> {
        let user = self
            .user_repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(user_id.to_string()))?;

        Ok(user.points)
    }

    /// 查询用户账本流水
    #[instrument(skip(self))]
    pub async fn history(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<crate::models::LedgerEntry>> {
        self.ledger_repo.list_by_user(user_id, limit, offset).await
    }

    /// 检查某来源的某类变动是否已入账
    pub async fn has_applied(
        &self,
        ref_type: SourceType,
        ref_id: &str,
        change_type: ChangeType,
    ) -> Result<bool> {
        self.ledger_repo
            .exists_ref(ref_type, ref_id, change_type)
            .await
    }

    /// 运营手动调整余额（可正可负）
    ///
    /// 每次调整生成独立操作单号，负向调整同样受余额下限约束
    #[instrument(skip(self), fields(user_id = %user_id, delta = %delta))]
    pub async fn adjust(
        &self,
        user_id: &str,
        delta: i64,
        operator_id: &str,
        remark: Option<String>,
    ) -> Result<i64> {
        if delta == 0 {
            return Err(CoreError::Validation("调整金额不能为零".to_string()));
        }

        let op_ref = format!("adj-{}", Uuid::new_v4());
        let remark = remark.or_else(|| Some(format!("运营调整，操作人: {operator_id}")));

        let mut tx = self.pool.begin().await?;
        let balance_after = if delta > 0 {
            Self::credit_in_tx(
                &mut tx,
                user_id,
                delta,
                ChangeType::Adjustment,
                SourceType::Manual,
                &op_ref,
                remark,
            )
            .await?
        } else {
            Self::debit_in_tx(
                &mut tx,
                user_id,
                -delta,
                ChangeType::Adjustment,
                SourceType::Manual,
                &op_ref,
                remark,
            )
            .await?
        };
        tx.commit().await?;

        info!(user_id, delta, balance_after, op_ref, "余额调整完成");
        Ok(balance_after)
    }
}
