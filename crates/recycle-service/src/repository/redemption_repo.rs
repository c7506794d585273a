//! 兑换仓储
//!
//! 提供兑换申请的数据访问，状态流转只能走事务内操作

use sqlx::{PgConnection, PgPool};

use crate::error::Result;
use crate::models::{Redemption, RedemptionState};

/// 兑换仓储
pub struct RedemptionRepository {
    pool: PgPool,
}

impl RedemptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 查询操作 ====================

    /// 根据 ID 获取兑换申请
    pub async fn get_redemption(&self, id: &str) -> Result<Option<Redemption>> {
        let redemption = sqlx::query_as::<_, Redemption>(
            r#"
            SELECT id, user_id, user_name, reward_id, reward_title, points_spent, state,
                   user_comment, reviewed_by, reviewed_at, rejection_reason, admin_comment,
                   delivered_at, receipt_photo_url, created_at, updated_at
            FROM redemptions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(redemption)
    }

    /// 列出用户的兑换申请（按申请时间倒序）
    pub async fn list_by_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Redemption>> {
        let redemptions = sqlx::query_as::<_, Redemption>(
            r#"
            SELECT id, user_id, user_name, reward_id, reward_title, points_spent, state,
                   user_comment, reviewed_by, reviewed_at, rejection_reason, admin_comment,
                   delivered_at, receipt_photo_url, created_at, updated_at
            FROM redemptions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(redemptions)
    }

    /// 按状态列出兑换申请（审核队列按申请时间正序）
    pub async fn list_by_state(
        &self,
        state: RedemptionState,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Redemption>> {
        let redemptions = sqlx::query_as::<_, Redemption>(
            r#"
            SELECT id, user_id, user_name, reward_id, reward_title, points_spent, state,
                   user_comment, reviewed_by, reviewed_at, rejection_reason, admin_comment,
                   delivered_at, receipt_photo_url, created_at, updated_at
            FROM redemptions
            WHERE state = $1
            ORDER BY created_at ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(state)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(redemptions)
    }

    // ==================== 事务操作 ====================

    /// 在事务中创建兑换申请
    ///
    /// 创建必须与扣积分、占库存在同一事务内
    pub async fn create_redemption_in_tx(
        tx: &mut PgConnection,
        redemption: &Redemption,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO redemptions (id, user_id, user_name, reward_id, reward_title, points_spent,
                                     state, user_comment, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&redemption.id)
        .bind(&redemption.user_id)
        .bind(&redemption.user_name)
        .bind(&redemption.reward_id)
        .bind(&redemption.reward_title)
        .bind(redemption.points_spent)
        .bind(redemption.state)
        .bind(&redemption.user_comment)
        .bind(redemption.created_at)
        .bind(redemption.updated_at)
        .execute(tx)
        .await?;

        Ok(())
    }

    /// 在事务中获取兑换申请（带行级锁）
    ///
    /// 审核/取消路径必须持有行锁，保证状态迁移至多发生一次
    pub async fn get_redemption_for_update(
        tx: &mut PgConnection,
        id: &str,
    ) -> Result<Option<Redemption>> {
        let redemption = sqlx::query_as::<_, Redemption>(
            r#"
            SELECT id, user_id, user_name, reward_id, reward_title, points_spent, state,
                   user_comment, reviewed_by, reviewed_at, rejection_reason, admin_comment,
                   delivered_at, receipt_photo_url, created_at, updated_at
            FROM redemptions
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(tx)
        .await?;

        Ok(redemption)
    }

    /// 在事务中写入审核结果
    pub async fn apply_review_in_tx(
        tx: &mut PgConnection,
        id: &str,
        state: RedemptionState,
        reviewer_id: &str,
        rejection_reason: Option<&str>,
        admin_comment: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE redemptions
            SET state = $2, reviewed_by = $3, reviewed_at = NOW(),
                rejection_reason = $4, admin_comment = $5, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(state)
        .bind(reviewer_id)
        .bind(rejection_reason)
        .bind(admin_comment)
        .execute(tx)
        .await?;

        Ok(())
    }

    /// 在事务中更新状态（取消/发放流转）
    ///
    /// 送达时可附带凭证照片
    pub async fn update_state_in_tx(
        tx: &mut PgConnection,
        id: &str,
        state: RedemptionState,
        receipt_photo_url: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE redemptions
            SET state = $2,
                delivered_at = CASE WHEN $2 = 'DELIVERED' THEN NOW() ELSE delivered_at END,
                receipt_photo_url = COALESCE($3, receipt_photo_url),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(state)
        .bind(receipt_photo_url)
        .execute(tx)
        .await?;

        Ok(())
    }
}
