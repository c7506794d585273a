//! 领域模型模块
//!
//! 定义回收平台的核心实体和枚举类型

pub mod delivery;
pub mod enums;
pub mod ledger;
pub mod redemption;
pub mod reward;
pub mod user;

pub use delivery::{Delivery, DeliveryStats};
pub use enums::{
    ChangeType, DeliveryState, MaterialKind, RedemptionState, RewardCategory, SourceType, UserRole,
};
pub use ledger::LedgerEntry;
pub use redemption::Redemption;
pub use reward::{Reward, RewardUpdate, UNLIMITED_STOCK};
pub use user::{User, UserProfileUpdate};
