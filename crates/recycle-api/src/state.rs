//! 应用状态
//!
//! 持有所有处理器共享的服务实例与基础设施句柄

use std::sync::Arc;

use sqlx::PgPool;

use recycle_core::service::{
    DeliveryService, PointsService, RedemptionService, RewardStockService, UserService,
};
use recycle_shared::cache::Cache;

use crate::auth::JwtVerifier;

/// 应用状态
///
/// 所有字段均为可廉价克隆的句柄，Router 按请求克隆整个状态
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub cache: Arc<Cache>,
    pub jwt: Arc<JwtVerifier>,
    pub users: Arc<UserService>,
    pub deliveries: Arc<DeliveryService>,
    pub redemptions: Arc<RedemptionService>,
    pub rewards: Arc<RewardStockService>,
    pub points: Arc<PointsService>,
}
