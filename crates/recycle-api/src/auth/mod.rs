//! 认证模块
//!
//! 外部身份提供方 JWT 的校验与请求级身份注入

pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, JwtVerifier};
pub use middleware::auth_middleware;
