//! 回收积分平台 API 服务入口
//!
//! 提供投递、积分、奖励、兑换的 REST API。

use std::sync::Arc;

use axum::{Json, Router, middleware, routing::get};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use recycle_api::{auth, routes, state::AppState};
use recycle_core::repository::{
    DeliveryRepository, LedgerRepository, RedemptionRepository, RewardRepository, UserRepository,
};
use recycle_core::service::{
    DeliveryService, PointsService, RedemptionService, RewardStockService, UserService,
};
use recycle_core::storage::LocalPhotoStorage;
use recycle_shared::{cache::Cache, config::AppConfig, database::Database, observability};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 统一加载配置：config/default.toml + 环境覆盖 + RECYCLE_ 环境变量
    let config = AppConfig::load("recycle-api").unwrap_or_default();

    let _guard = observability::init(&config.observability).await?;

    info!("Starting recycle-api on {}", config.server_addr());

    // 初始化基础设施
    let db = Database::connect(&config.database).await?;
    db.run_migrations().await?;
    let cache = Arc::new(Cache::new(&config.redis)?);
    let pool = db.pool().clone();

    // 仓储层
    let user_repo = Arc::new(UserRepository::new(pool.clone()));
    let delivery_repo = Arc::new(DeliveryRepository::new(pool.clone()));
    let reward_repo = Arc::new(RewardRepository::new(pool.clone()));
    let redemption_repo = Arc::new(RedemptionRepository::new(pool.clone()));
    let ledger_repo = Arc::new(LedgerRepository::new(pool.clone()));

    // 凭证照片落盘存储
    let photo_storage = Arc::new(LocalPhotoStorage::new(
        config.storage.root_dir.clone(),
        config.storage.base_url.clone(),
    ));

    // 服务层
    let users = Arc::new(UserService::new(user_repo.clone()));
    let points = Arc::new(PointsService::new(
        user_repo.clone(),
        ledger_repo.clone(),
        pool.clone(),
    ));
    let deliveries = Arc::new(DeliveryService::new(
        delivery_repo.clone(),
        user_repo.clone(),
        photo_storage,
        cache.clone(),
        config.delivery.clone(),
        pool.clone(),
    ));
    let rewards = Arc::new(RewardStockService::new(
        reward_repo.clone(),
        user_repo.clone(),
        cache.clone(),
        pool.clone(),
    ));
    let redemptions = Arc::new(RedemptionService::new(
        redemption_repo.clone(),
        user_repo.clone(),
        cache.clone(),
        pool.clone(),
    ));

    let jwt = Arc::new(auth::JwtVerifier::new(&config.auth));

    let state = AppState {
        pool,
        cache: cache.clone(),
        jwt,
        users,
        deliveries,
        redemptions,
        rewards,
        points,
    };

    // CORS 配置：通过 RECYCLE_CORS_ORIGINS 环境变量控制允许的来源
    let allowed_origins = std::env::var("RECYCLE_CORS_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string());

    let cors = if allowed_origins == "*" {
        info!("CORS allowed_origins: * (all origins)");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        info!("CORS allowed_origins: {}", allowed_origins);
        let origins: Vec<_> = allowed_origins
            .split(',')
            .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let app = Router::new()
        .nest("/api/v1", routes::api_routes())
        .route("/health", get(health_check))
        .route(
            "/ready",
            get({
                let db_for_ready = db;
                let cache_for_ready = cache;
                move || readiness_check(db_for_ready.clone(), cache_for_ready.clone())
            }),
        )
        .layer(cors)
        // 认证中间件：验证外部身份提供方签发的 JWT
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ))
        .with_state(state);

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    // 优雅关闭：收到 SIGTERM（K8s 停止 Pod）或 Ctrl+C 时，
    // 停止接收新连接并等待已有请求处理完毕
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");

    Ok(())
}

/// 监听关闭信号
///
/// K8s 通过 SIGTERM 通知 Pod 停止；本地开发通过 Ctrl+C。
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("注册 Ctrl+C 处理器失败");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("注册 SIGTERM 处理器失败")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}

/// 存活探针：服务进程正常即返回 ok
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "recycle-api"
    }))
}

/// 就绪探针：检查数据库和 Redis 连接是否可用
async fn readiness_check(db: Database, cache: Arc<Cache>) -> Json<serde_json::Value> {
    let db_ok = db.health_check().await.is_ok();
    let cache_ok = cache.health_check().await.is_ok();
    let all_ok = db_ok && cache_ok;

    Json(serde_json::json!({
        "status": if all_ok { "ok" } else { "degraded" },
        "service": "recycle-api",
        "checks": {
            "database": if db_ok { "ok" } else { "fail" },
            "redis": if cache_ok { "ok" } else { "fail" }
        }
    }))
}
