//! RedemptionService 集成测试
//!
//! 使用真实 PostgreSQL 和 Redis 验证兑换申请、审核、取消的事务语义：
//! 扣积分 + 占库存 + 建申请要么全部生效要么全不生效，
//! 补偿恰好一次，有限库存在并发下不超卖。
//!
//! ## 运行方式
//!
//! ```bash
//! DATABASE_URL=postgres://... REDIS_URL=redis://... \
//!   cargo test --test redemption_service_test -- --ignored
//! ```

mod common;

use std::sync::Arc;

use recycle_core::error::CoreError;
use recycle_core::models::{RedemptionState, UNLIMITED_STOCK, UserRole};
use recycle_core::repository::{RedemptionRepository, UserRepository};
use recycle_core::service::RedemptionService;
use recycle_core::service::dto::RedeemRequest;
use sqlx::PgPool;

use common::*;

fn build_service(pool: &PgPool) -> RedemptionService {
    RedemptionService::new(
        Arc::new(RedemptionRepository::new(pool.clone())),
        Arc::new(UserRepository::new(pool.clone())),
        build_cache(),
        pool.clone(),
    )
}

fn redeem_request(user_id: &str, reward_id: &str) -> RedeemRequest {
    RedeemRequest {
        user_id: user_id.to_string(),
        reward_id: reward_id.to_string(),
        comment: None,
    }
}

/// 申请成功：扣积分、占库存、建申请一次性生效
#[tokio::test]
#[ignore = "需要 PostgreSQL 和 Redis"]
async fn test_request_debits_and_reserves_atomically() {
    let pool = connect_pool().await;
    let user_id = "integ_redeem_req_001";
    let reward_id = "integ_reward_req_001";
    cleanup(&pool, &[user_id], &[reward_id]).await;
    seed_user(&pool, user_id, 500, UserRole::Citizen).await;
    seed_reward(&pool, reward_id, 200, 3).await;

    let service = build_service(&pool);
    let redemption = service.request(redeem_request(user_id, reward_id)).await.unwrap();

    assert_eq!(redemption.state, RedemptionState::Requested);
    assert_eq!(redemption.points_spent, 200);
    assert_eq!(get_balance(&pool, user_id).await, 300);
    assert_eq!(get_stock(&pool, reward_id).await, 2);
    assert_eq!(count_ledger_entries(&pool, &redemption.id).await, 1);

    cleanup(&pool, &[user_id], &[reward_id]).await;
}

/// 余额不足：整体回滚，库存不动
#[tokio::test]
#[ignore = "需要 PostgreSQL 和 Redis"]
async fn test_request_insufficient_balance_leaves_stock_intact() {
    let pool = connect_pool().await;
    let user_id = "integ_redeem_poor_001";
    let reward_id = "integ_reward_poor_001";
    cleanup(&pool, &[user_id], &[reward_id]).await;
    seed_user(&pool, user_id, 50, UserRole::Citizen).await;
    seed_reward(&pool, reward_id, 200, 3).await;

    let service = build_service(&pool);
    let err = service
        .request(redeem_request(user_id, reward_id))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::InsufficientBalance { .. }));
    assert_eq!(get_balance(&pool, user_id).await, 50);
    assert_eq!(get_stock(&pool, reward_id).await, 3);

    cleanup(&pool, &[user_id], &[reward_id]).await;
}

/// 库存为零：申请失败，积分不动
#[tokio::test]
#[ignore = "需要 PostgreSQL 和 Redis"]
async fn test_request_exhausted_stock() {
    let pool = connect_pool().await;
    let user_id = "integ_redeem_empty_001";
    let reward_id = "integ_reward_empty_001";
    cleanup(&pool, &[user_id], &[reward_id]).await;
    seed_user(&pool, user_id, 500, UserRole::Citizen).await;
    seed_reward(&pool, reward_id, 200, 0).await;

    let service = build_service(&pool);
    let err = service
        .request(redeem_request(user_id, reward_id))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::RewardExhausted(_)));
    assert_eq!(get_balance(&pool, user_id).await, 500);

    cleanup(&pool, &[user_id], &[reward_id]).await;
}

/// 不限量奖励：哨兵值不被预占和释放修改
#[tokio::test]
#[ignore = "需要 PostgreSQL 和 Redis"]
async fn test_unlimited_stock_sentinel_untouched() {
    let pool = connect_pool().await;
    let user_id = "integ_redeem_unlim_001";
    let reward_id = "integ_reward_unlim_001";
    cleanup(&pool, &[user_id], &[reward_id]).await;
    seed_user(&pool, user_id, 1000, UserRole::Citizen).await;
    seed_reward(&pool, reward_id, 100, UNLIMITED_STOCK).await;

    let service = build_service(&pool);

    let redemption = service.request(redeem_request(user_id, reward_id)).await.unwrap();
    assert_eq!(get_stock(&pool, reward_id).await, UNLIMITED_STOCK);

    // 取消触发释放，哨兵值依然不变
    service.cancel(&redemption.id, user_id).await.unwrap();
    assert_eq!(get_stock(&pool, reward_id).await, UNLIMITED_STOCK);

    cleanup(&pool, &[user_id], &[reward_id]).await;
}

/// 取消：积分和库存退还，且只能取消一次
#[tokio::test]
#[ignore = "需要 PostgreSQL 和 Redis"]
async fn test_cancel_refunds_exactly_once() {
    let pool = connect_pool().await;
    let user_id = "integ_redeem_cancel_001";
    let reward_id = "integ_reward_cancel_001";
    cleanup(&pool, &[user_id], &[reward_id]).await;
    seed_user(&pool, user_id, 500, UserRole::Citizen).await;
    seed_reward(&pool, reward_id, 200, 3).await;

    let service = build_service(&pool);
    let redemption = service.request(redeem_request(user_id, reward_id)).await.unwrap();
    assert_eq!(get_balance(&pool, user_id).await, 300);
    assert_eq!(get_stock(&pool, reward_id).await, 2);

    let cancelled = service.cancel(&redemption.id, user_id).await.unwrap();
    assert_eq!(cancelled.state, RedemptionState::Cancelled);
    assert_eq!(get_balance(&pool, user_id).await, 500);
    assert_eq!(get_stock(&pool, reward_id).await, 3);
    // 扣减 + 退还各一条
    assert_eq!(count_ledger_entries(&pool, &redemption.id).await, 2);

    // 终态不可重复取消
    let err = service.cancel(&redemption.id, user_id).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidRedemptionState { .. }));
    assert_eq!(get_balance(&pool, user_id).await, 500);
    assert_eq!(get_stock(&pool, reward_id).await, 3);

    cleanup(&pool, &[user_id], &[reward_id]).await;
}

/// 审核拒绝触发补偿；拒绝后不能再批准
#[tokio::test]
#[ignore = "需要 PostgreSQL 和 Redis"]
async fn test_reject_refunds_and_blocks_further_review() {
    let pool = connect_pool().await;
    let user_id = "integ_redeem_reject_001";
    let operator_id = "integ_redeem_reject_op";
    let reward_id = "integ_reward_reject_001";
    cleanup(&pool, &[user_id, operator_id], &[reward_id]).await;
    seed_user(&pool, user_id, 500, UserRole::Citizen).await;
    seed_user(&pool, operator_id, 0, UserRole::Operator).await;
    seed_reward(&pool, reward_id, 200, 3).await;

    let service = build_service(&pool);
    let redemption = service.request(redeem_request(user_id, reward_id)).await.unwrap();

    let rejected = service
        .review(
            &redemption.id,
            operator_id,
            false,
            Some("不符合条件".to_string()),
            None,
        )
        .await
        .unwrap();

    assert_eq!(rejected.state, RedemptionState::Rejected);
    assert_eq!(get_balance(&pool, user_id).await, 500);
    assert_eq!(get_stock(&pool, reward_id).await, 3);

    let err = service
        .review(&redemption.id, operator_id, true, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidRedemptionState { .. }));

    cleanup(&pool, &[user_id, operator_id], &[reward_id]).await;
}

/// 批准后的发放流转：Approved -> InProgress -> Delivered；
/// 批准后不退积分，取消被拒
#[tokio::test]
#[ignore = "需要 PostgreSQL 和 Redis"]
async fn test_fulfillment_transitions() {
    let pool = connect_pool().await;
    let user_id = "integ_redeem_fulfil_001";
    let operator_id = "integ_redeem_fulfil_op";
    let reward_id = "integ_reward_fulfil_001";
    cleanup(&pool, &[user_id, operator_id], &[reward_id]).await;
    seed_user(&pool, user_id, 500, UserRole::Citizen).await;
    seed_user(&pool, operator_id, 0, UserRole::Operator).await;
    seed_reward(&pool, reward_id, 200, 3).await;

    let service = build_service(&pool);
    let redemption = service.request(redeem_request(user_id, reward_id)).await.unwrap();

    let approved = service
        .review(&redemption.id, operator_id, true, None, None)
        .await
        .unwrap();
    assert_eq!(approved.state, RedemptionState::Approved);
    // 批准不退积分
    assert_eq!(get_balance(&pool, user_id).await, 300);

    // 批准后用户不能取消
    let err = service.cancel(&redemption.id, user_id).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidRedemptionState { .. }));

    let in_progress = service
        .start_delivery(&redemption.id, operator_id)
        .await
        .unwrap();
    assert_eq!(in_progress.state, RedemptionState::InProgress);

    let delivered = service
        .mark_delivered(
            &redemption.id,
            operator_id,
            Some("http://localhost:8080/uploads/receipt-1.jpg".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(delivered.state, RedemptionState::Delivered);
    assert!(delivered.delivered_at.is_some());
    assert_eq!(
        delivered.receipt_photo_url.as_deref(),
        Some("http://localhost:8080/uploads/receipt-1.jpg")
    );

    cleanup(&pool, &[user_id, operator_id], &[reward_id]).await;
}

/// 发放中是可选中间态：批准后可直接确认送达，审核前不行
#[tokio::test]
#[ignore = "需要 PostgreSQL 和 Redis"]
async fn test_mark_delivered_directly_from_approved() {
    let pool = connect_pool().await;
    let user_id = "integ_redeem_direct_001";
    let operator_id = "integ_redeem_direct_op";
    let reward_id = "integ_reward_direct_001";
    cleanup(&pool, &[user_id, operator_id], &[reward_id]).await;
    seed_user(&pool, user_id, 500, UserRole::Citizen).await;
    seed_user(&pool, operator_id, 0, UserRole::Operator).await;
    seed_reward(&pool, reward_id, 200, 3).await;

    let service = build_service(&pool);
    let redemption = service.request(redeem_request(user_id, reward_id)).await.unwrap();

    // 审核前不能确认送达
    let err = service
        .mark_delivered(&redemption.id, operator_id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidRedemptionState { .. }));

    service
        .review(&redemption.id, operator_id, true, None, None)
        .await
        .unwrap();

    let delivered = service
        .mark_delivered(&redemption.id, operator_id, None)
        .await
        .unwrap();
    assert_eq!(delivered.state, RedemptionState::Delivered);
    assert!(delivered.delivered_at.is_some());

    cleanup(&pool, &[user_id, operator_id], &[reward_id]).await;
}

/// K 件库存收到 N 个并发申请时恰好 K 个成功
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[ignore = "需要 PostgreSQL 和 Redis"]
async fn test_concurrent_requests_never_oversell() {
    let pool = connect_pool().await;
    let reward_id = "integ_reward_conc_001";
    let user_ids: Vec<String> = (0..10).map(|i| format!("integ_redeem_conc_{i:03}")).collect();
    let user_refs: Vec<&str> = user_ids.iter().map(String::as_str).collect();

    cleanup(&pool, &user_refs, &[reward_id]).await;
    for uid in &user_ids {
        seed_user(&pool, uid, 500, UserRole::Citizen).await;
    }
    seed_reward(&pool, reward_id, 200, 3).await;

    let service = Arc::new(build_service(&pool));

    let mut handles = Vec::new();
    for uid in &user_ids {
        let service = service.clone();
        let request = redeem_request(uid, reward_id);
        handles.push(tokio::spawn(async move { service.request(request).await }));
    }

    let mut successes = 0;
    let mut exhausted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(CoreError::RewardExhausted(_)) => exhausted += 1,
            Err(other) => panic!("意外错误: {other:?}"),
        }
    }

    assert_eq!(successes, 3);
    assert_eq!(exhausted, 7);
    assert_eq!(get_stock(&pool, reward_id).await, 0);

    // 成功者扣了积分，失败者分文未动
    let mut debited = 0;
    for uid in &user_ids {
        match get_balance(&pool, uid).await {
            300 => debited += 1,
            500 => {}
            other => panic!("意外余额: {other}"),
        }
    }
    assert_eq!(debited, 3);

    cleanup(&pool, &user_refs, &[reward_id]).await;
}
