//! 路由配置模块
//!
//! 定义所有 REST API 端点的路由映射

use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

use crate::{handlers, state::AppState};

/// 构建业务 API 路由（挂载于 /api/v1，统一经过认证中间件）
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // 会话与用户
        .route("/session", post(handlers::user::ensure_session))
        .route("/users/me", get(handlers::user::get_me))
        .route("/users/me", put(handlers::user::update_me))
        .route("/users", get(handlers::user::list_users))
        .route("/users/{id}/active", patch(handlers::user::set_user_active))
        .route("/users/{id}/role", patch(handlers::user::set_user_role))
        // 积分
        .route("/users/me/points", get(handlers::points::my_balance))
        .route(
            "/users/me/points/history",
            get(handlers::points::my_history),
        )
        .route(
            "/users/{id}/points/adjust",
            post(handlers::points::adjust_points),
        )
        // 投递
        .route("/materials", get(handlers::delivery::material_rates))
        .route("/deliveries", post(handlers::delivery::submit_delivery))
        .route(
            "/deliveries/pending",
            get(handlers::delivery::pending_queue),
        )
        .route("/deliveries/{id}", get(handlers::delivery::get_delivery))
        .route(
            "/deliveries/{id}",
            delete(handlers::delivery::withdraw_delivery),
        )
        .route(
            "/deliveries/{id}/review",
            post(handlers::delivery::review_delivery),
        )
        .route(
            "/users/me/deliveries",
            get(handlers::delivery::list_my_deliveries),
        )
        .route(
            "/users/me/delivery-stats",
            get(handlers::delivery::my_delivery_stats),
        )
        // 奖励
        .route("/rewards", get(handlers::reward::catalog))
        .route("/rewards", post(handlers::reward::create_reward))
        .route("/rewards/all", get(handlers::reward::list_all_rewards))
        .route("/rewards/{id}", get(handlers::reward::get_reward))
        .route("/rewards/{id}", put(handlers::reward::update_reward))
        .route(
            "/rewards/{id}/active",
            patch(handlers::reward::set_reward_active),
        )
        // 兑换
        .route(
            "/redemptions",
            post(handlers::redemption::request_redemption),
        )
        .route("/redemptions", get(handlers::redemption::list_redemptions))
        .route(
            "/redemptions/{id}",
            get(handlers::redemption::get_redemption),
        )
        .route(
            "/redemptions/{id}/review",
            post(handlers::redemption::review_redemption),
        )
        .route(
            "/redemptions/{id}/cancel",
            post(handlers::redemption::cancel_redemption),
        )
        .route(
            "/redemptions/{id}/start-delivery",
            post(handlers::redemption::start_delivery),
        )
        .route(
            "/redemptions/{id}/delivered",
            post(handlers::redemption::mark_delivered),
        )
        .route(
            "/users/me/redemptions",
            get(handlers::redemption::list_my_redemptions),
        )
}
