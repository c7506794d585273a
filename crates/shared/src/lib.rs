//! 共享库
//!
//! 包含回收积分平台各服务共用的配置、错误处理、数据库连接、
//! 缓存、可观测性等基础设施代码。

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod observability;
pub mod test_utils;
