//! 业务服务层
//!
//! 服务负责业务规则、事务边界和缓存管理，仓储负责 SQL。
//! 跨实体事务的加锁顺序统一为：用户行 -> 奖励行

pub mod delivery_service;
pub mod dto;
pub mod points_service;
pub mod redemption_service;
pub mod stock_service;
pub mod user_service;

pub use delivery_service::DeliveryService;
pub use points_service::PointsService;
pub use redemption_service::RedemptionService;
pub use stock_service::RewardStockService;
pub use user_service::UserService;

/// 缓存键生成
pub(crate) mod cache_keys {
    pub fn user_stats(user_id: &str) -> String {
        format!("recycle:stats:{}", user_id)
    }

    pub fn reward_catalog() -> String {
        "recycle:rewards:catalog".to_string()
    }
}
