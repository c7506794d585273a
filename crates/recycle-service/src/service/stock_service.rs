//! 奖励库存服务
//!
//! 奖励目录与库存的唯一管理入口，包括：
//! - 奖励创建/更新/上下架（运营操作）
//! - 单件库存预占与释放（独立事务版本，兑换流程走事务内版本）
//! - 兑换目录查询（带缓存）
//!
//! 库存以剩余数量物化在 rewards.quantity，-1 为不限量哨兵，
//! 预占/释放对不限量奖励不修改数量

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use recycle_shared::cache::Cache;

use crate::error::{CoreError, Result};
use crate::models::{Reward, RewardUpdate, UNLIMITED_STOCK, User, UserRole};
use crate::repository::{RewardRepository, UserRepository};
use crate::service::cache_keys;
use crate::service::dto::CreateRewardRequest;

/// 目录缓存有效期
const CATALOG_TTL: Duration = Duration::from_secs(30);

/// 奖励库存服务
pub struct RewardStockService {
    reward_repo: Arc<RewardRepository>,
    user_repo: Arc<UserRepository>,
    cache: Arc<Cache>,
    pool: PgPool,
}

impl RewardStockService {
    pub fn new(
        reward_repo: Arc<RewardRepository>,
        user_repo: Arc<UserRepository>,
        cache: Arc<Cache>,
        pool: PgPool,
    ) -> Self {
        Self {
            reward_repo,
            user_repo,
            cache,
            pool,
        }
    }

    // ==================== 运营操作 ====================

    /// 创建奖励
    #[instrument(skip(self, request), fields(title = %request.title, creator_id = %creator_id))]
    pub async fn create(&self, request: CreateRewardRequest, creator_id: &str) -> Result<Reward> {
        self.require_admin(creator_id).await?;
        Self::validate_reward_fields(request.cost_points, request.quantity)?;

        let now = Utc::now();
        let reward = Reward {
            id: format!("rwd-{}", Uuid::new_v4()),
            title: request.title,
            description: request.description,
            category: request.category,
            cost_points: request.cost_points,
            monetary_value: request.monetary_value,
            image_url: request.image_url,
            quantity: request.quantity,
            active: true,
            requirements: serde_json::to_value(&request.requirements)?,
            valid_from: request.valid_from,
            valid_until: request.valid_until,
            created_by: creator_id.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.reward_repo.create_reward(&reward).await?;
        self.invalidate_catalog().await;

        info!(reward_id = %reward.id, "奖励创建成功");
        Ok(reward)
    }

    /// 更新奖励
    ///
    /// 价格和标题调整只影响后续兑换，已存在的申请持有提交时的快照
    #[instrument(skip(self, update), fields(reward_id = %reward_id, operator_id = %operator_id))]
    pub async fn update(
        &self,
        reward_id: &str,
        update: RewardUpdate,
        operator_id: &str,
    ) -> Result<Reward> {
        self.require_admin(operator_id).await?;

        if let Some(cost) = update.cost_points {
            if cost <= 0 {
                return Err(CoreError::Validation(format!(
                    "兑换积分必须为正: {cost}"
                )));
            }
        }
        if let Some(quantity) = update.quantity {
            if quantity < UNLIMITED_STOCK {
                return Err(CoreError::Validation(format!(
                    "库存数量非法: {quantity}"
                )));
            }
        }

        // 确认存在再更新
        self.get(reward_id).await?;
        self.reward_repo.update_reward(reward_id, &update).await?;
        self.invalidate_catalog().await;

        info!(reward_id, "奖励更新成功");
        self.get(reward_id).await
    }

    /// 上架/下架奖励
    ///
    /// 下架只阻止新申请，不影响已存在申请的审核和发放
    #[instrument(skip(self), fields(reward_id = %reward_id, active = %active, operator_id = %operator_id))]
    pub async fn set_active(&self, reward_id: &str, active: bool, operator_id: &str) -> Result<()> {
        self.require_admin(operator_id).await?;

        self.get(reward_id).await?;
        self.reward_repo.set_active(reward_id, active).await?;
        self.invalidate_catalog().await;

        info!(reward_id, active, "奖励上下架完成");
        Ok(())
    }

    // ==================== 库存操作 ====================

    /// 预占一件库存（独立事务）
    ///
    /// 条件更新保证并发安全：K 件库存收到 N 个并发预占时
    /// 恰好 K 个成功。不限量奖励恒成功且数量不变
    #[instrument(skip(self), fields(reward_id = %reward_id))]
    pub async fn reserve_one(&self, reward_id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        RewardRepository::get_reward_for_update(&mut tx, reward_id)
            .await?
            .ok_or_else(|| CoreError::RewardNotFound(reward_id.to_string()))?;

        if !RewardRepository::reserve_one_in_tx(&mut tx, reward_id).await? {
            return Err(CoreError::RewardExhausted(reward_id.to_string()));
        }

        tx.commit().await?;
        metrics::counter!("stock_reservations_total").increment(1);
        self.invalidate_catalog().await;
        Ok(())
    }

    /// 释放一件库存（独立事务）
    #[instrument(skip(self), fields(reward_id = %reward_id))]
    pub async fn release_one(&self, reward_id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        RewardRepository::get_reward_for_update(&mut tx, reward_id)
            .await?
            .ok_or_else(|| CoreError::RewardNotFound(reward_id.to_string()))?;

        RewardRepository::release_one_in_tx(&mut tx, reward_id).await?;

        tx.commit().await?;
        self.invalidate_catalog().await;
        Ok(())
    }

    // ==================== 查询操作 ====================

    /// 查询奖励详情
    pub async fn get(&self, reward_id: &str) -> Result<Reward> {
        self.reward_repo
            .get_reward(reward_id)
            .await?
            .ok_or_else(|| CoreError::RewardNotFound(reward_id.to_string()))
    }

    /// 兑换目录（上架中的奖励，带缓存）
    pub async fn catalog(&self, limit: i64, offset: i64) -> Result<Vec<Reward>> {
        // 只缓存首页
        let cacheable = offset == 0;
        if cacheable {
            if let Ok(Some(cached)) = self.cache.get::<Vec<Reward>>(&cache_keys::reward_catalog()).await
            {
                return Ok(cached);
            }
        }

        let rewards = self.reward_repo.list_active(limit, offset).await?;
        if cacheable {
            if let Err(e) = self
                .cache
                .set(&cache_keys::reward_catalog(), &rewards, CATALOG_TTL)
                .await
            {
                warn!(error = %e, "写入目录缓存失败");
            }
        }
        Ok(rewards)
    }

    /// 全部奖励（运营后台）
    pub async fn list_all(&self, operator_id: &str, limit: i64, offset: i64) -> Result<Vec<Reward>> {
        self.require_admin(operator_id).await?;
        self.reward_repo.list_all(limit, offset).await
    }

    // ==================== 私有方法 ====================

    fn validate_reward_fields(cost_points: i64, quantity: i64) -> Result<()> {
        if cost_points <= 0 {
            return Err(CoreError::Validation(format!(
                "兑换积分必须为正: {cost_points}"
            )));
        }
        if quantity < UNLIMITED_STOCK {
            return Err(CoreError::Validation(format!("库存数量非法: {quantity}")));
        }
        Ok(())
    }

    async fn require_admin(&self, user_id: &str) -> Result<User> {
        let user = self
            .user_repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(user_id.to_string()))?;

        if !user.active {
            return Err(CoreError::UserInactive(user_id.to_string()));
        }
        if user.role != UserRole::Admin {
            return Err(CoreError::Unauthorized(
                "奖励管理操作需要管理员权限".to_string(),
            ));
        }
        Ok(user)
    }

    async fn invalidate_catalog(&self) {
        if let Err(e) = self.cache.delete(&cache_keys::reward_catalog()).await {
            warn!(error = %e, "清除奖励目录缓存失败");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_reward_fields() {
        assert!(RewardStockService::validate_reward_fields(100, 5).is_ok());
        assert!(RewardStockService::validate_reward_fields(100, UNLIMITED_STOCK).is_ok());
        assert!(RewardStockService::validate_reward_fields(0, 5).is_err());
        assert!(RewardStockService::validate_reward_fields(-10, 5).is_err());
        assert!(RewardStockService::validate_reward_fields(100, -2).is_err());
    }
}
