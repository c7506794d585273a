//! HTTP 请求处理器模块

pub mod delivery;
pub mod points;
pub mod redemption;
pub mod reward;
pub mod user;
