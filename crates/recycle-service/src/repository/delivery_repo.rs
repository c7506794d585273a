//! 投递仓储
//!
//! 提供投递记录的数据访问，审核路径支持事务和行级锁

use sqlx::{PgConnection, PgPool};

use crate::error::Result;
use crate::models::{Delivery, DeliveryState, DeliveryStats};

/// 投递仓储
pub struct DeliveryRepository {
    pool: PgPool,
}

impl DeliveryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 查询操作 ====================

    /// 根据 ID 获取投递记录
    pub async fn get_delivery(&self, id: &str) -> Result<Option<Delivery>> {
        let delivery = sqlx::query_as::<_, Delivery>(
            r#"
            SELECT id, user_id, user_name, material, weight_kg, points, photo_url, state,
                   comment, reviewed_by, reviewed_at, rejection_reason, created_at, updated_at
            FROM deliveries
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(delivery)
    }

    /// 列出用户的投递记录（按提交时间倒序）
    pub async fn list_by_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Delivery>> {
        let deliveries = sqlx::query_as::<_, Delivery>(
            r#"
            SELECT id, user_id, user_name, material, weight_kg, points, photo_url, state,
                   comment, reviewed_by, reviewed_at, rejection_reason, created_at, updated_at
            FROM deliveries
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

        Ok(deliveries)
    }

    /// 按状态列出投递记录（审核队列按提交时间正序）
    pub async fn list_by_state(
        &self,
        state: DeliveryState,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Delivery>> {
        let deliveries = sqlx::query_as::<_, Delivery>(
            r#"
            SELECT id, user_id, user_name, material, weight_kg, points, photo_url, state,
                   comment, reviewed_by, reviewed_at, rejection_reason, created_at, updated_at
            FROM deliveries
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

        Ok(deliveries)
    }

    /// 用户投递统计
    pub async fn user_stats(&self, user_id: &str) -> Result<DeliveryStats> {
        let stats = sqlx::query_as::<_, DeliveryStats>(
            r#"
            SELECT COUNT(*) FILTER (WHERE state = 'APPROVED') AS approved_count,
                   COALESCE(SUM(weight_kg) FILTER (WHERE state = 'APPROVED'), 0)::float8 AS total_weight_kg,
                   COALESCE(SUM(points) FILTER (WHERE state = 'APPROVED'), 0) AS total_points,
                   COUNT(*) FILTER (WHERE state = 'PENDING') AS pending_count
            FROM deliveries
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    // ==================== 写入操作 ====================

    /// 创建投递记录
    pub async fn create_delivery(&self, delivery: &Delivery) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO deliveries (id, user_id, user_name, material, weight_kg, points, photo_url,
                                    state, comment, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(&delivery.id)
        .bind(&delivery.user_id)
        .bind(&delivery.user_name)
        .bind(delivery.material)
        .bind(delivery.weight_kg)
        .bind(delivery.points)
        .bind(&delivery.photo_url)
        .bind(delivery.state)
        .bind(&delivery.comment)
        .bind(delivery.created_at)
        .bind(delivery.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 删除投递记录（仅用于用户撤回待审核投递）
    pub async fn delete_delivery(&self, id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM deliveries WHERE id = $1 AND state = 'PENDING'")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    // ==================== 事务操作 ====================

    /// 在事务中获取投递记录（带行级锁）
    ///
    /// 审核路径必须持有行锁，保证同一投递至多被判定一次
    pub async fn get_delivery_for_update(
        tx: &mut PgConnection,
        id: &str,
    ) -> Result<Option<Delivery>> {
        let delivery = sqlx::query_as::<_, Delivery>(
            r#"
            SELECT id, user_id, user_name, material, weight_kg, points, photo_url, state,
                   comment, reviewed_by, reviewed_at, rejection_reason, created_at, updated_at
            FROM deliveries
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(tx)
        .await?;

        Ok(delivery)
    }

    /// 在事务中写入审核结果
    pub async fn apply_review_in_tx(
        tx: &mut PgConnection,
        id: &str,
        state: DeliveryState,
        reviewer_id: &str,
        rejection_reason: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE deliveries
            SET state = $2, reviewed_by = $3, reviewed_at = NOW(),
                rejection_reason = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(state)
        .bind(reviewer_id)
        .bind(rejection_reason)
        .execute(tx)
        .await?;

        Ok(())
    }
}
