//! 回收积分平台核心库
//!
//! 提供投递、积分、奖励、兑换的完整业务逻辑。
//!
//! ## 核心功能
//!
//! - **投递验证**：公民提交回收投递，运营人员审核，通过即按材料率入账
//! - **积分账本**：余额物化 + 只追加流水，(来源, 变动类型) 唯一索引保证入账幂等
//! - **奖励库存**：有限库存的条件预占/释放，-1 哨兵表示不限量
//! - **兑换协调**：扣积分、占库存、建申请单事务完成，拒绝/取消单事务补偿
//! - **照片存储**：投递凭证的落盘与清理
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `repository`: 数据库仓储层
//! - `service`: 业务服务层
//! - `storage`: 照片存储抽象
//!
//! ## 并发约定
//!
//! 所有涉及余额、库存、状态迁移的写入都在数据库事务内完成，
//! 读-检查-写使用 `SELECT ... FOR UPDATE` 行锁。
//! 跨实体事务统一按"用户行先、奖励行后"的顺序加锁。

pub mod error;
pub mod models;
pub mod repository;
pub mod service;
pub mod storage;

pub use error::{CoreError, Result};
pub use models::*;
pub use repository::{
    DeliveryRepository, LedgerRepository, RedemptionRepository, RewardRepository, UserRepository,
};
pub use service::{
    DeliveryService, PointsService, RedemptionService, RewardStockService, UserService, dto,
};
pub use storage::{LocalPhotoStorage, PhotoStorage};
