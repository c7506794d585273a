//! 数据访问层
//!
//! 仓储模式封装所有 SQL，服务层不直接拼接查询。
//! 涉及余额、库存、状态迁移的写入只提供事务内版本（`*_in_tx`），
//! 由服务层统一开启事务并控制锁顺序

pub mod delivery_repo;
pub mod ledger_repo;
pub mod redemption_repo;
pub mod reward_repo;
pub mod user_repo;

pub use delivery_repo::DeliveryRepository;
pub use ledger_repo::LedgerRepository;
pub use redemption_repo::RedemptionRepository;
pub use reward_repo::RewardRepository;
pub use user_repo::UserRepository;
