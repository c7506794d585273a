//! 集成测试共用工具
//!
//! 真实 PostgreSQL + Redis 的连接构建与测试数据准备/清理
#![allow(dead_code)]

use std::sync::Arc;

use sqlx::PgPool;

use recycle_core::models::{RewardCategory, UserRole};
use recycle_shared::cache::Cache;
use recycle_shared::config::RedisConfig;

pub fn database_url() -> String {
    std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests")
}

pub fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
}

pub async fn connect_pool() -> PgPool {
    PgPool::connect(&database_url())
        .await
        .expect("数据库连接失败")
}

pub fn build_cache() -> Arc<Cache> {
    let config = RedisConfig {
        url: redis_url(),
        pool_size: 2,
    };
    Arc::new(Cache::new(&config).expect("Redis connection failed"))
}

/// 插入测试用户（幂等，重复插入时重置余额和状态）
pub async fn seed_user(pool: &PgPool, id: &str, points: i64, role: UserRole) {
    sqlx::query(
        r#"
        INSERT INTO users (id, email, name, points, role, active)
        VALUES ($1, $2, $3, $4, $5, TRUE)
        ON CONFLICT (id) DO UPDATE SET points = $4, role = $5, active = TRUE
        "#,
    )
    .bind(id)
    .bind(format!("{id}@test.local"))
    .bind(format!("Test User {id}"))
    .bind(points)
    .bind(role)
    .execute(pool)
    .await
    .expect("插入测试用户失败");
}

/// 插入测试奖励（幂等，重复插入时重置库存）
pub async fn seed_reward(pool: &PgPool, id: &str, cost_points: i64, quantity: i64) {
    sqlx::query(
        r#"
        INSERT INTO rewards (id, title, description, category, cost_points, monetary_value,
                             quantity, active, requirements, created_by)
        VALUES ($1, $2, 'integration test reward', $3, $4, 10.0, $5, TRUE, '[]', 'test-admin')
        ON CONFLICT (id) DO UPDATE SET
            cost_points = $4, quantity = $5, active = TRUE,
            valid_from = NULL, valid_until = NULL
        "#,
    )
    .bind(id)
    .bind(format!("Test Reward {id}"))
    .bind(RewardCategory::Discount)
    .bind(cost_points)
    .bind(quantity)
    .execute(pool)
    .await
    .expect("插入测试奖励失败");
}

/// 清理测试数据，按外键依赖顺序删除
pub async fn cleanup(pool: &PgPool, user_ids: &[&str], reward_ids: &[&str]) {
    for uid in user_ids {
        sqlx::query("DELETE FROM point_ledger WHERE user_id = $1")
            .bind(uid)
            .execute(pool)
            .await
            .ok();
        sqlx::query("DELETE FROM redemptions WHERE user_id = $1")
            .bind(uid)
            .execute(pool)
            .await
            .ok();
        sqlx::query("DELETE FROM deliveries WHERE user_id = $1")
            .bind(uid)
            .execute(pool)
            .await
            .ok();
    }
    for rid in reward_ids {
        sqlx::query("DELETE FROM rewards WHERE id = $1")
            .bind(rid)
            .execute(pool)
            .await
            .ok();
    }
    for uid in user_ids {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(uid)
            .execute(pool)
            .await
            .ok();
    }
}

/// 查询用户当前余额
pub async fn get_balance(pool: &PgPool, user_id: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT points FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .expect("查询余额失败")
}

/// 查询奖励当前库存
pub async fn get_stock(pool: &PgPool, reward_id: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT quantity FROM rewards WHERE id = $1")
        .bind(reward_id)
        .fetch_one(pool)
        .await
        .expect("查询库存失败")
}

/// 统计某来源的账本条目数
pub async fn count_ledger_entries(pool: &PgPool, ref_id: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM point_ledger WHERE ref_id = $1")
        .bind(ref_id)
        .fetch_one(pool)
        .await
        .expect("查询账本条目失败")
}
