//! JWT Token 校验
//!
//! 平台自身不签发令牌，只校验外部身份提供方签发的 JWT（HS256）。
//! 角色与权限以数据库为准，Token 仅提供身份三元组（id/email/name）。

use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use recycle_shared::config::AuthConfig;

use crate::error::ApiError;

/// JWT Claims（Token 载荷）
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// 用户 ID
    pub sub: String,
    /// 邮箱
    pub email: String,
    /// 显示名称
    pub name: String,
    /// 签发时间
    pub iat: i64,
    /// 过期时间
    pub exp: i64,
    /// 签发者
    #[serde(default)]
    pub iss: Option<String>,
}

/// JWT 校验器
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// 根据认证配置创建校验器
    ///
    /// 配置了 issuer 时额外校验 iss 声明
    pub fn new(config: &AuthConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        let mut validation = Validation::default();
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }

        Self {
            decoding_key,
            validation,
        }
    }

    /// 验证并解析 JWT Token
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        ApiError::Unauthorized("Token 已过期".to_string())
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        ApiError::Unauthorized("无效的 Token".to_string())
                    }
                    _ => ApiError::Unauthorized(format!("Token 验证失败: {}", e)),
                }
            })?;

        Ok(token_data.claims)
    }
}
