//! 兑换协调服务
//!
//! 处理积分兑换奖励的核心业务逻辑，包括：
//! - 兑换申请（余额扣减 + 库存预占 + 申请创建，单事务）
//! - 审核判定（批准/拒绝，拒绝触发补偿）
//! - 审核前取消（触发补偿）
//! - 发放流转（批准 -> [发放中] -> 已送达，发放中可跳过）
//!
//! ## 并发约定
//!
//! 跨实体事务统一按"用户行先、奖励行后"的顺序加锁，
//! 兑换申请与补偿走同一顺序，避免死锁。
//! 补偿（退积分 + 还库存）只会从 Requested 状态触发一次：
//! Rejected 与 Cancelled 互斥，且都只能从 Requested 进入。

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use recycle_shared::cache::Cache;

use crate::error::{CoreError, Result};
use crate::models::{ChangeType, Redemption, RedemptionState, SourceType, User};
use crate::repository::{RedemptionRepository, RewardRepository, UserRepository};
use crate::service::cache_keys;
use crate::service::dto::RedeemRequest;
use crate::service::points_service::PointsService;

/// 兑换协调服务
pub struct RedemptionService {
    redemption_repo: Arc<RedemptionRepository>,
    user_repo: Arc<UserRepository>,
    cache: Arc<Cache>,
    pool: PgPool,
}

impl RedemptionService {
    pub fn new(
        redemption_repo: Arc<RedemptionRepository>,
        user_repo: Arc<UserRepository>,
        cache: Arc<Cache>,
        pool: PgPool,
    ) -> Self {
        Self {
            redemption_repo,
            user_repo,
            cache,
            pool,
        }
    }

    /// 提交兑换申请
    ///
    /// 单事务内完成：
    /// 1. 锁定用户行，检查启用状态与余额
    /// 2. 锁定奖励行，检查可兑换性
    /// 3. 预占一件库存
    /// 4. 扣减积分并写入账本
    /// 5. 创建申请（Requested 状态）
    ///
    /// 任何一步失败整体回滚，不存在扣了积分没占到库存的中间态
    #[instrument(skip(self, request), fields(user_id = %request.user_id, reward_id = %request.reward_id))]
    pub async fn request(&self, request: RedeemRequest) -> Result<Redemption> {
        let start = Instant::now();
        let redemption_id = format!("rdm-{}", Uuid::new_v4());
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        // 1. 锁定用户行（锁顺序：用户先于奖励）
        let user = UserRepository::get_user_for_update(&mut tx, &request.user_id)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(request.user_id.clone()))?;

        if !user.active {
            return Err(CoreError::UserInactive(user.id));
        }

        // 2. 锁定奖励行并检查可兑换性
        let reward = RewardRepository::get_reward_for_update(&mut tx, &request.reward_id)
            .await?
            .ok_or_else(|| CoreError::RewardNotFound(request.reward_id.clone()))?;

        if !reward.active || !reward.is_within_validity(now) {
            return Err(CoreError::RewardUnavailable(reward.id));
        }
        if user.points < reward.cost_points {
            return Err(CoreError::InsufficientBalance {
                required: reward.cost_points,
                available: user.points,
            });
        }

        // 3. 预占库存（条件更新，售罄时不满足条件）
        if !RewardRepository::reserve_one_in_tx(&mut tx, &reward.id).await? {
            return Err(CoreError::RewardExhausted(reward.id));
        }
        metrics::counter!("stock_reservations_total").increment(1);

        // 4. 扣减积分并写入账本
        PointsService::debit_in_tx(
            &mut tx,
            &user.id,
            reward.cost_points,
            ChangeType::RedemptionDebit,
            SourceType::Redemption,
            &redemption_id,
            Some(format!("兑换奖励: {}", reward.title)),
        )
        .await?;

        // 5. 创建申请
        let redemption = Redemption {
            id: redemption_id,
            user_id: user.id.clone(),
            user_name: user.name.clone(),
            reward_id: reward.id.clone(),
            reward_title: reward.title.clone(),
            points_spent: reward.cost_points,
            state: RedemptionState::Requested,
            user_comment: request.comment,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
            admin_comment: None,
            delivered_at: None,
            receipt_photo_url: None,
            created_at: now,
            updated_at: now,
        };
        RedemptionRepository::create_redemption_in_tx(&mut tx, &redemption).await?;

        tx.commit().await?;

        metrics::counter!("redemptions_total", "outcome" => "requested").increment(1);
        metrics::histogram!("redemption_duration_seconds").record(start.elapsed().as_secs_f64());
        self.invalidate_caches(&redemption.user_id).await;

        info!(
            redemption_id = %redemption.id,
            reward_title = %redemption.reward_title,
            points_spent = redemption.points_spent,
            "兑换申请成功"
        );

        Ok(redemption)
    }

    /// 审核兑换申请
    ///
    /// 只有 Requested 状态可审核；拒绝时在同一事务内退还积分和库存
    #[instrument(skip(self), fields(redemption_id = %redemption_id, reviewer_id = %reviewer_id, approve = %approve))]
    pub async fn review(
        &self,
        redemption_id: &str,
        reviewer_id: &str,
        approve: bool,
        reason: Option<String>,
        admin_comment: Option<String>,
    ) -> Result<Redemption> {
        self.require_staff(reviewer_id).await?;

        if !approve && reason.as_deref().map(str::trim).unwrap_or("").is_empty() {
            return Err(CoreError::Validation("拒绝兑换必须填写原因".to_string()));
        }

        let target = if approve {
            RedemptionState::Approved
        } else {
            RedemptionState::Rejected
        };

        let mut tx = self.pool.begin().await?;

        let redemption = RedemptionRepository::get_redemption_for_update(&mut tx, redemption_id)
            .await?
            .ok_or_else(|| CoreError::RedemptionNotFound(redemption_id.to_string()))?;

        if !redemption.state.can_transition_to(target) {
            return Err(CoreError::InvalidRedemptionState {
                redemption_id: redemption_id.to_string(),
                current_state: format!("{:?}", redemption.state),
            });
        }

        RedemptionRepository::apply_review_in_tx(
            &mut tx,
            redemption_id,
            target,
            reviewer_id,
            reason.as_deref(),
            admin_comment.as_deref(),
        )
        .await?;

        if target.triggers_refund() {
            Self::refund_in_tx(&mut tx, &redemption).await?;
        }

        tx.commit().await?;

        metrics::counter!("redemptions_total", "outcome" => if approve { "approved" } else { "rejected" })
            .increment(1);
        self.invalidate_caches(&redemption.user_id).await;

        info!(
            redemption_id,
            user_id = %redemption.user_id,
            target = ?target,
            "兑换审核完成"
        );

        self.get(redemption_id).await
    }

    /// 用户取消兑换申请
    ///
    /// 仅本人、仅 Requested 状态可取消，取消即退还积分和库存
    #[instrument(skip(self), fields(redemption_id = %redemption_id, user_id = %user_id))]
    pub async fn cancel(&self, redemption_id: &str, user_id: &str) -> Result<Redemption> {
        let mut tx = self.pool.begin().await?;

        let redemption = RedemptionRepository::get_redemption_for_update(&mut tx, redemption_id)
            .await?
            .ok_or_else(|| CoreError::RedemptionNotFound(redemption_id.to_string()))?;

        if redemption.user_id != user_id {
            return Err(CoreError::Unauthorized(
                "只能取消本人的兑换申请".to_string(),
            ));
        }
        if !redemption.is_cancellable() {
            return Err(CoreError::InvalidRedemptionState {
                redemption_id: redemption_id.to_string(),
                current_state: format!("{:?}", redemption.state),
            });
        }

        RedemptionRepository::update_state_in_tx(
            &mut tx,
            redemption_id,
            RedemptionState::Cancelled,
            None,
        )
        .await?;
        Self::refund_in_tx(&mut tx, &redemption).await?;

        tx.commit().await?;

        metrics::counter!("redemptions_total", "outcome" => "cancelled").increment(1);
        self.invalidate_caches(user_id).await;

        info!(redemption_id, "兑换申请已取消");
        self.get(redemption_id).await
    }

    /// 开始发放（Approved -> InProgress）
    #[instrument(skip(self), fields(redemption_id = %redemption_id, operator_id = %operator_id))]
    pub async fn start_delivery(&self, redemption_id: &str, operator_id: &str) -> Result<Redemption> {
        self.require_staff(operator_id).await?;
        self.transition(redemption_id, RedemptionState::InProgress, None)
            .await
    }

    /// 确认送达（Approved/InProgress -> Delivered），可附带送达凭证照片
    #[instrument(skip(self, receipt_photo_url), fields(redemption_id = %redemption_id, operator_id = %operator_id))]
    pub async fn mark_delivered(
        &self,
        redemption_id: &str,
        operator_id: &str,
        receipt_photo_url: Option<String>,
    ) -> Result<Redemption> {
        self.require_staff(operator_id).await?;
        self.transition(
            redemption_id,
            RedemptionState::Delivered,
            receipt_photo_url.as_deref(),
        )
        .await
    }

    // ==================== 查询操作 ====================

    /// 查询兑换详情
    pub async fn get(&self, redemption_id: &str) -> Result<Redemption> {
        self.redemption_repo
            .get_redemption(redemption_id)
            .await?
            .ok_or_else(|| CoreError::RedemptionNotFound(redemption_id.to_string()))
    }

    /// 用户兑换历史
    pub async fn list_by_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Redemption>> {
        self.redemption_repo
            .list_by_user(user_id, limit, offset)
            .await
    }

    /// 按状态列出兑换申请（审核/发放队列）
    pub async fn list_by_state(
        &self,
        state: RedemptionState,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Redemption>> {
        self.redemption_repo
            .list_by_state(state, limit, offset)
            .await
    }

    // ==================== 私有方法 ====================

    /// 在事务中退还积分和库存（兑换补偿）
    ///
    /// 入账走账本幂等路径；加锁顺序与申请路径一致（用户先、奖励后）
    async fn refund_in_tx(tx: &mut PgConnection, redemption: &Redemption) -> Result<()> {
        PointsService::credit_in_tx(
            tx,
            &redemption.user_id,
            redemption.points_spent,
            ChangeType::RedemptionRefund,
            SourceType::Redemption,
            &redemption.id,
            Some(format!("兑换退还: {}", redemption.reward_title)),
        )
        .await?;

        RewardRepository::release_one_in_tx(tx, &redemption.reward_id).await?;
        Ok(())
    }

    /// 发放状态流转（不涉及积分和库存）
    async fn transition(
        &self,
        redemption_id: &str,
        target: RedemptionState,
        receipt_photo_url: Option<&str>,
    ) -> Result<Redemption> {
        let mut tx = self.pool.begin().await?;

        let redemption = RedemptionRepository::get_redemption_for_update(&mut tx, redemption_id)
            .await?
            .ok_or_else(|| CoreError::RedemptionNotFound(redemption_id.to_string()))?;

        if !redemption.state.can_transition_to(target) {
            return Err(CoreError::InvalidRedemptionState {
                redemption_id: redemption_id.to_string(),
                current_state: format!("{:?}", redemption.state),
            });
        }

        RedemptionRepository::update_state_in_tx(&mut tx, redemption_id, target, receipt_photo_url)
            .await?;
        tx.commit().await?;

        info!(redemption_id, target = ?target, "兑换状态流转完成");
        self.get(redemption_id).await
    }

    async fn require_staff(&self, user_id: &str) -> Result<User> {
        let user = self
            .user_repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(user_id.to_string()))?;

        if !user.active {
            return Err(CoreError::UserInactive(user_id.to_string()));
        }
        if !user.role.is_staff() {
            return Err(CoreError::Unauthorized(
                "兑换管理操作需要运营人员权限".to_string(),
            ));
        }
        Ok(user)
    }

    async fn invalidate_caches(&self, user_id: &str) {
        if let Err(e) = self.cache.delete(&cache_keys::reward_catalog()).await {
            warn!(error = %e, "清除奖励目录缓存失败");
        }
        if let Err(e) = self.cache.delete(&cache_keys::user_stats(user_id)).await {
            warn!(user_id, error = %e, "清除统计缓存失败");
        }
    }
}
