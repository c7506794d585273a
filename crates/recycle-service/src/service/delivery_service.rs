//! 投递服务
//!
//! 处理材料投递的完整生命周期，包括：
//! - 投递提交（重量校验、积分折算、凭证存储）
//! - 审核判定（批准入账/拒绝，互斥且恰好一次）
//! - 审核前撤回
//!
//! ## 审核流程
//!
//! 1. 审核人权限检查 -> 2. 锁定投递行 -> 3. 终态检查
//!    -> 4. 写入判定 -> 5. 批准时入账 -> 6. 提交事务 -> 7. 缓存失效

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use recycle_shared::cache::Cache;
use recycle_shared::config::DeliveryConfig;

use crate::error::{CoreError, Result};
use crate::models::{ChangeType, Delivery, DeliveryState, DeliveryStats, SourceType, User};
use crate::repository::{DeliveryRepository, UserRepository};
use crate::service::cache_keys;
use crate::service::dto::SubmitDeliveryRequest;
use crate::service::points_service::PointsService;
use crate::storage::PhotoStorage;

/// 统计缓存有效期
const CACHE_TTL: Duration = Duration::from_secs(60);

/// 投递服务
pub struct DeliveryService {
    delivery_repo: Arc<DeliveryRepository>,
    user_repo: Arc<UserRepository>,
    photo_storage: Arc<dyn PhotoStorage>,
    cache: Arc<Cache>,
    config: DeliveryConfig,
    pool: PgPool,
}

impl DeliveryService {
    pub fn new(
        delivery_repo: Arc<DeliveryRepository>,
        user_repo: Arc<UserRepository>,
        photo_storage: Arc<dyn PhotoStorage>,
        cache: Arc<Cache>,
        config: DeliveryConfig,
        pool: PgPool,
    ) -> Self {
        Self {
            delivery_repo,
            user_repo,
            photo_storage,
            cache,
            config,
            pool,
        }
    }

    /// 提交投递
    ///
    /// 积分在提交时按材料率折算并冻结在投递记录上，
    /// 审核通过时按冻结值入账
    #[instrument(skip(self, request), fields(user_id = %request.user_id, material = ?request.material))]
    pub async fn submit(&self, request: SubmitDeliveryRequest) -> Result<Delivery> {
        if !(self.config.min_weight_kg..=self.config.max_weight_kg).contains(&request.weight_kg) {
            return Err(CoreError::WeightOutOfRange {
                weight_kg: request.weight_kg,
                min_kg: self.config.min_weight_kg,
                max_kg: self.config.max_weight_kg,
            });
        }

        let user = self.require_active_user(&request.user_id).await?;

        let delivery_id = format!("dlv-{}", Uuid::new_v4());

        // 凭证照片先落盘，入库失败时尽力清理
        let photo_url = match &request.photo {
            Some(photo) => Some(
                self.photo_storage
                    .store("deliveries", &delivery_id, &photo.extension, &photo.bytes)
                    .await?,
            ),
            None => None,
        };

        let now = Utc::now();
        let delivery = Delivery {
            id: delivery_id,
            user_id: user.id.clone(),
            user_name: user.name.clone(),
            material: request.material,
            weight_kg: request.weight_kg,
            points: request.material.points_for_weight(request.weight_kg),
            photo_url,
            state: DeliveryState::Pending,
            comment: request.comment,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.delivery_repo.create_delivery(&delivery).await {
            if let Some(url) = &delivery.photo_url {
                if let Err(cleanup_err) = self.photo_storage.delete(url).await {
                    warn!(url, error = %cleanup_err, "清理投递照片失败");
                }
            }
            return Err(e);
        }

        metrics::counter!("delivery_submissions_total").increment(1);
        self.invalidate_user_cache(&user.id).await;

        info!(
            delivery_id = %delivery.id,
            points = delivery.points,
            weight_kg = delivery.weight_kg,
            "投递提交成功"
        );

        Ok(delivery)
    }

    /// 审核投递
    ///
    /// 同一投递至多被判定一次：行锁 + 终态检查保证并发审核
    /// 只有一个成功，其余得到 InvalidDeliveryState
    #[instrument(skip(self), fields(delivery_id = %delivery_id, reviewer_id = %reviewer_id, approve = %approve))]
    pub async fn review(
        &self,
        delivery_id: &str,
        reviewer_id: &str,
        approve: bool,
        reason: Option<String>,
    ) -> Result<Delivery> {
        self.require_staff(reviewer_id).await?;

        if !approve && reason.as_deref().map(str::trim).unwrap_or("").is_empty() {
            return Err(CoreError::Validation("拒绝投递必须填写原因".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let delivery = DeliveryRepository::get_delivery_for_update(&mut tx, delivery_id)
            .await?
            .ok_or_else(|| CoreError::DeliveryNotFound(delivery_id.to_string()))?;

        // 运营人员也可能是投递人，禁止审核本人的投递
        if delivery.user_id == reviewer_id {
            return Err(CoreError::Unauthorized(
                "不能审核本人的投递".to_string(),
            ));
        }

        if delivery.state.is_terminal() {
            return Err(CoreError::InvalidDeliveryState {
                delivery_id: delivery_id.to_string(),
                current_state: format!("{:?}", delivery.state),
            });
        }

        let new_state = if approve {
            DeliveryState::Approved
        } else {
            DeliveryState::Rejected
        };

        DeliveryRepository::apply_review_in_tx(
            &mut tx,
            delivery_id,
            new_state,
            reviewer_id,
            reason.as_deref(),
        )
        .await?;

        // 批准时入账：入账与判定同一事务，入账失败则判定一并回滚。
        // 低积分率材料的小重量会折算为 0 分，此时仅做状态迁移，不写账本
        if approve && delivery.points > 0 {
            PointsService::credit_in_tx(
                &mut tx,
                &delivery.user_id,
                delivery.points,
                ChangeType::DeliveryCredit,
                SourceType::Delivery,
                delivery_id,
                Some(format!(
                    "投递入账: {:?} {} kg",
                    delivery.material, delivery.weight_kg
                )),
            )
            .await?;
        }

        tx.commit().await?;

        metrics::counter!("delivery_validations_total", "outcome" => if approve { "approved" } else { "rejected" })
            .increment(1);
        self.invalidate_user_cache(&delivery.user_id).await;

        info!(
            delivery_id,
            user_id = %delivery.user_id,
            new_state = ?new_state,
            points = delivery.points,
            "投递审核完成"
        );

        self.delivery_repo
            .get_delivery(delivery_id)
            .await?
            .ok_or_else(|| CoreError::DeliveryNotFound(delivery_id.to_string()))
    }

    /// 撤回投递
    ///
    /// 仅投递人本人可撤回，且仅限待审核状态
    #[instrument(skip(self), fields(delivery_id = %delivery_id, user_id = %user_id))]
    pub async fn withdraw(&self, delivery_id: &str, user_id: &str) -> Result<()> {
        let delivery = self
            .delivery_repo
            .get_delivery(delivery_id)
            .await?
            .ok_or_else(|| CoreError::DeliveryNotFound(delivery_id.to_string()))?;

        if delivery.user_id != user_id {
            return Err(CoreError::Unauthorized(
                "只能撤回本人的投递".to_string(),
            ));
        }
        if !delivery.is_reviewable() {
            return Err(CoreError::InvalidDeliveryState {
                delivery_id: delivery_id.to_string(),
                current_state: format!("{:?}", delivery.state),
            });
        }

        // DELETE 带状态条件，与并发审核竞争时以数据库判定为准
        let deleted = self.delivery_repo.delete_delivery(delivery_id).await?;
        if deleted == 0 {
            return Err(CoreError::InvalidDeliveryState {
                delivery_id: delivery_id.to_string(),
                current_state: "REVIEWED".to_string(),
            });
        }

        if let Some(url) = &delivery.photo_url {
            if let Err(e) = self.photo_storage.delete(url).await {
                warn!(url, error = %e, "删除投递照片失败");
            }
        }

        self.invalidate_user_cache(user_id).await;
        info!(delivery_id, "投递已撤回");
        Ok(())
    }

    // ==================== 查询操作 ====================

    /// 查询投递详情
    pub async fn get(&self, delivery_id: &str) -> Result<Delivery> {
        self.delivery_repo
            .get_delivery(delivery_id)
            .await?
            .ok_or_else(|| CoreError::DeliveryNotFound(delivery_id.to_string()))
    }

    /// 用户投递历史
    pub async fn list_by_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Delivery>> {
        self.delivery_repo.list_by_user(user_id, limit, offset).await
    }

    /// 待审核队列（按提交时间先后）
    pub async fn pending_queue(&self, limit: i64, offset: i64) -> Result<Vec<Delivery>> {
        self.delivery_repo
            .list_by_state(DeliveryState::Pending, limit, offset)
            .await
    }

    /// 用户投递统计（带缓存）
    pub async fn user_stats(&self, user_id: &str) -> Result<DeliveryStats> {
        let key = cache_keys::user_stats(user_id);
        if let Ok(Some(cached)) = self.cache.get::<DeliveryStats>(&key).await {
            return Ok(cached);
        }

        let stats = self.delivery_repo.user_stats(user_id).await?;
        if let Err(e) = self.cache.set(&key, &stats, CACHE_TTL).await {
            warn!(user_id, error = %e, "写入统计缓存失败");
        }
        Ok(stats)
    }

    // ==================== 私有方法 ====================

    async fn require_active_user(&self, user_id: &str) -> Result<User> {
        let user = self
            .user_repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(user_id.to_string()))?;

        if !user.active {
            return Err(CoreError::UserInactive(user_id.to_string()));
        }
        Ok(user)
    }

    async fn require_staff(&self, user_id: &str) -> Result<User> {
        let user = self.require_active_user(user_id).await?;
        if !user.role.is_staff() {
            return Err(CoreError::Unauthorized(
                "审核操作需要运营人员权限".to_string(),
            ));
        }
        Ok(user)
    }

    async fn invalidate_user_cache(&self, user_id: &str) {
        if let Err(e) = self.cache.delete(&cache_keys::user_stats(user_id)).await {
            warn!(user_id, error = %e, "清除统计缓存失败");
        }
    }
}
