//! 回收积分平台 REST API 服务
//!
//! 面向公民端和运营端的统一 HTTP 入口。
//!
//! ## 核心功能
//!
//! - **投递**：材料投递提交（含凭证照片）、审核、撤回与统计
//! - **积分**：余额与账本流水查询、运营手工调整
//! - **奖励**：兑换目录浏览与管理员侧的奖励维护
//! - **兑换**：兑换申请、审核、取消与发放流转
//! - **用户**：首次登录注册、资料维护、角色与停启用管理
//!
//! ## 模块结构
//!
//! - `auth`: 外部身份提供方 JWT 的校验与注入
//! - `dto`: 请求和响应的数据传输对象
//! - `error`: HTTP 层错误类型与状态码映射
//! - `handlers`: HTTP 请求处理器
//! - `routes`: 路由配置
//! - `state`: 应用状态
//!
//! ## 技术栈
//!
//! - Web 框架：Axum
//! - 数据验证：validator
//! - 序列化：serde (camelCase)

pub mod auth;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use dto::{ApiResponse, PageResponse, PaginationParams};
pub use error::{ApiError, Result};
pub use state::AppState;
