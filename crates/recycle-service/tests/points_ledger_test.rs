//! PointsService 集成测试
//!
//! 使用真实 PostgreSQL 验证账本入账/扣减的原子性和幂等性。
//!
//! ## 运行方式
//!
//! ```bash
//! DATABASE_URL=postgres://... cargo test --test points_ledger_test -- --ignored
//! ```

mod common;

use std::sync::Arc;

use recycle_core::error::CoreError;
use recycle_core::models::{ChangeType, SourceType, UserRole};
use recycle_core::repository::{LedgerRepository, UserRepository};
use recycle_core::service::PointsService;
use sqlx::PgPool;

use common::*;

fn build_service(pool: &PgPool) -> PointsService {
    PointsService::new(
        Arc::new(UserRepository::new(pool.clone())),
        Arc::new(LedgerRepository::new(pool.clone())),
        pool.clone(),
    )
}

/// 入账后余额与账本一致
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_credit_updates_balance_and_ledger() {
    let pool = connect_pool().await;
    let user_id = "integ_points_credit_001";
    cleanup(&pool, &[user_id], &[]).await;
    seed_user(&pool, user_id, 0, UserRole::Citizen).await;

    let mut tx = pool.begin().await.unwrap();
    let balance = PointsService::credit_in_tx(
        &mut tx,
        user_id,
        25,
        ChangeType::DeliveryCredit,
        SourceType::Delivery,
        "dlv-points-test-1",
        None,
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(balance, 25);
    assert_eq!(get_balance(&pool, user_id).await, 25);
    assert_eq!(count_ledger_entries(&pool, "dlv-points-test-1").await, 1);

    cleanup(&pool, &[user_id], &[]).await;
}

/// 同一来源重复入账只生效一次
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_credit_is_idempotent_per_ref() {
    let pool = connect_pool().await;
    let user_id = "integ_points_idem_001";
    cleanup(&pool, &[user_id], &[]).await;
    seed_user(&pool, user_id, 0, UserRole::Citizen).await;

    for _ in 0..3 {
        let mut tx = pool.begin().await.unwrap();
        let balance = PointsService::credit_in_tx(
            &mut tx,
            user_id,
            40,
            ChangeType::DeliveryCredit,
            SourceType::Delivery,
            "dlv-points-idem-1",
            None,
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();
        assert_eq!(balance, 40);
    }

    assert_eq!(get_balance(&pool, user_id).await, 40);
    assert_eq!(count_ledger_entries(&pool, "dlv-points-idem-1").await, 1);

    cleanup(&pool, &[user_id], &[]).await;
}

/// 余额不足时扣减失败且无任何变动
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_debit_insufficient_balance_rolls_back() {
    let pool = connect_pool().await;
    let user_id = "integ_points_debit_001";
    cleanup(&pool, &[user_id], &[]).await;
    seed_user(&pool, user_id, 30, UserRole::Citizen).await;

    let mut tx = pool.begin().await.unwrap();
    let err = PointsService::debit_in_tx(
        &mut tx,
        user_id,
        100,
        ChangeType::RedemptionDebit,
        SourceType::Redemption,
        "rdm-points-debit-1",
        None,
    )
    .await
    .unwrap_err();
    drop(tx);

    match err {
        CoreError::InsufficientBalance {
            required,
            available,
        } => {
            assert_eq!(required, 100);
            assert_eq!(available, 30);
        }
        other => panic!("期望 InsufficientBalance，得到 {other:?}"),
    }

    assert_eq!(get_balance(&pool, user_id).await, 30);
    assert_eq!(count_ledger_entries(&pool, "rdm-points-debit-1").await, 0);

    cleanup(&pool, &[user_id], &[]).await;
}

/// 扣减与退还往返后余额回到原值，账本留两条流水
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_debit_then_refund_round_trip() {
    let pool = connect_pool().await;
    let user_id = "integ_points_refund_001";
    cleanup(&pool, &[user_id], &[]).await;
    seed_user(&pool, user_id, 500, UserRole::Citizen).await;

    let mut tx = pool.begin().await.unwrap();
    PointsService::debit_in_tx(
        &mut tx,
        user_id,
        200,
        ChangeType::RedemptionDebit,
        SourceType::Redemption,
        "rdm-points-refund-1",
        None,
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();
    assert_eq!(get_balance(&pool, user_id).await, 300);

    let mut tx = pool.begin().await.unwrap();
    PointsService::credit_in_tx(
        &mut tx,
        user_id,
        200,
        ChangeType::RedemptionRefund,
        SourceType::Redemption,
        "rdm-points-refund-1",
        None,
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(get_balance(&pool, user_id).await, 500);
    // 扣减与退还是不同 change_type，各留一条
    assert_eq!(count_ledger_entries(&pool, "rdm-points-refund-1").await, 2);

    cleanup(&pool, &[user_id], &[]).await;
}

/// 运营调整支持正负双向，并生成独立流水
#[tokio::test]
#[ignore = "需要 PostgreSQL"]
async fn test_manual_adjustment() {
    let pool = connect_pool().await;
    let user_id = "integ_points_adjust_001";
    cleanup(&pool, &[user_id], &[]).await;
    seed_user(&pool, user_id, 100, UserRole::Citizen).await;

    let service = build_service(&pool);

    let balance = service
        .adjust(user_id, 50, "test-admin", Some("补偿".to_string()))
        .await
        .unwrap();
    assert_eq!(balance, 150);

    let balance = service.adjust(user_id, -70, "test-admin", None).await.unwrap();
    assert_eq!(balance, 80);

    // 负向调整同样受余额下限约束
    let err = service.adjust(user_id, -500, "test-admin", None).await.unwrap_err();
    assert!(matches!(err, CoreError::InsufficientBalance { .. }));
    assert_eq!(service.balance(user_id).await.unwrap(), 80);

    let history = service.history(user_id, 10, 0).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].balance_after, 80);

    cleanup(&pool, &[user_id], &[]).await;
}
