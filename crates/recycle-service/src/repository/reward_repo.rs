//! 奖励仓储
//!
//! 提供奖励数据访问，库存变更只能走事务内的条件更新

use sqlx::{PgConnection, PgPool};

use crate::error::Result;
use crate::models::{Reward, RewardUpdate, UNLIMITED_STOCK};

/// 奖励仓储
pub struct RewardRepository {
    pool: PgPool,
}

impl RewardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 查询操作 ====================

    /// 根据 ID 获取奖励
    pub async fn get_reward(&self, id: &str) -> Result<Option<Reward>> {
        let reward = sqlx::query_as::<_, Reward>(
            r#"
            SELECT id, title, description, category, cost_points, monetary_value, image_url,
                   quantity, active, requirements, valid_from, valid_until, created_by,
                   created_at, updated_at
            FROM rewards
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reward)
    }

    /// 列出上架中的奖励（兑换目录）
    pub async fn list_active(&self, limit: i64, offset: i64) -> Result<Vec<Reward>> {
        let rewards = sqlx::query_as::<_, Reward>(
            r#"
            SELECT id, title, description, category, cost_points, monetary_value, image_url,
                   quantity, active, requirements, valid_from, valid_until, created_by,
                   created_at, updated_at
            FROM rewards
            WHERE active = TRUE
            ORDER BY cost_points ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rewards)
    }

    /// 列出全部奖励（运营后台）
    pub async fn list_all(&self, limit: i64, offset: i64) -> Result<Vec<Reward>> {
        let rewards = sqlx::query_as::<_, Reward>(
            r#"
            SELECT id, title, description, category, cost_points, monetary_value, image_url,
                   quantity, active, requirements, valid_from, valid_until, created_by,
                   created_at, updated_at
            FROM rewards
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rewards)
    }

    // ==================== 写入操作 ====================

    /// 创建奖励
    pub async fn create_reward(&self, reward: &Reward) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO rewards (id, title, description, category, cost_points, monetary_value,
                                 image_url, quantity, active, requirements, valid_from, valid_until,
                                 created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(&reward.id)
        .bind(&reward.title)
        .bind(&reward.description)
        .bind(reward.category)
        .bind(reward.cost_points)
        .bind(reward.monetary_value)
        .bind(&reward.image_url)
        .bind(reward.quantity)
        .bind(reward.active)
        .bind(&reward.requirements)
        .bind(reward.valid_from)
        .bind(reward.valid_until)
        .bind(&reward.created_by)
        .bind(reward.created_at)
        .bind(reward.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 更新奖励（仅更新提供的字段）
    pub async fn update_reward(&self, id: &str, update: &RewardUpdate) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE rewards
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                cost_points = COALESCE($5, cost_points),
                monetary_value = COALESCE($6, monetary_value),
                image_url = COALESCE($7, image_url),
                quantity = COALESCE($8, quantity),
                requirements = COALESCE($9, requirements),
                valid_from = COALESCE($10, valid_from),
                valid_until = COALESCE($11, valid_until),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.description)
        .bind(update.category)
        .bind(update.cost_points)
        .bind(update.monetary_value)
        .bind(&update.image_url)
        .bind(update.quantity)
        .bind(&update.requirements)
        .bind(update.valid_from)
        .bind(update.valid_until)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 上架/下架奖励
    pub async fn set_active(&self, id: &str, active: bool) -> Result<()> {
        sqlx::query("UPDATE rewards SET active = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // ==================== 事务操作 ====================

    /// 在事务中获取奖励（带行级锁）
    pub async fn get_reward_for_update(tx: &mut PgConnection, id: &str) -> Result<Option<Reward>> {
        let reward = sqlx::query_as::<_, Reward>(
            r#"
            SELECT id, title, description, category, cost_points, monetary_value, image_url,
                   quantity, active, requirements, valid_from, valid_until, created_by,
                   created_at, updated_at
            FROM rewards
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(tx)
        .await?;

        Ok(reward)
    }

    /// 在事务中预占一件库存
    ///
    /// 条件更新：只有库存为正时才减一，不限量（-1）不修改。
    /// 返回是否成功预占（不限量视为成功）
    pub async fn reserve_one_in_tx(tx: &mut PgConnection, id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE rewards
            SET quantity = CASE WHEN quantity = $2 THEN quantity ELSE quantity - 1 END,
                updated_at = NOW()
            WHERE id = $1 AND (quantity > 0 OR quantity = $2)
            "#,
        )
        .bind(id)
        .bind(UNLIMITED_STOCK)
        .execute(tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// 在事务中释放一件库存（兑换补偿）
    ///
    /// 不限量（-1）不修改
    pub async fn release_one_in_tx(tx: &mut PgConnection, id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE rewards
            SET quantity = quantity + 1, updated_at = NOW()
            WHERE id = $1 AND quantity <> $2
            "#,
        )
        .bind(id)
        .bind(UNLIMITED_STOCK)
        .execute(tx)
        .await?;

        Ok(())
    }
}
