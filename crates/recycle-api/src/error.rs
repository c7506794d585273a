//! HTTP 层错误类型定义
//!
//! 将核心服务层错误映射到 HTTP 状态码与统一响应体

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use recycle_core::error::CoreError;

/// HTTP 层错误类型
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // 认证错误
    #[error("未授权: {0}")]
    Unauthorized(String),

    // 参数错误
    #[error("参数验证失败: {0}")]
    Validation(String),
    #[error("请求体解析失败: {0}")]
    BadRequest(String),

    // 核心服务层错误
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ApiError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Core(core) => match core {
                CoreError::UserNotFound(_)
                | CoreError::DeliveryNotFound(_)
                | CoreError::RewardNotFound(_)
                | CoreError::RedemptionNotFound(_) => StatusCode::NOT_FOUND,

                CoreError::Unauthorized(_) => StatusCode::FORBIDDEN,
                CoreError::UserInactive(_) => StatusCode::FORBIDDEN,

                CoreError::Validation(_) | CoreError::WeightOutOfRange { .. } => {
                    StatusCode::BAD_REQUEST
                }

                // 请求合法但与当前状态或库存冲突
                CoreError::InsufficientBalance { .. }
                | CoreError::InvalidDeliveryState { .. }
                | CoreError::InvalidRedemptionState { .. }
                | CoreError::RewardUnavailable(_)
                | CoreError::RewardExhausted(_)
                | CoreError::ConcurrencyConflict => StatusCode::CONFLICT,

                CoreError::Storage(_) => StatusCode::UNPROCESSABLE_ENTITY,

                CoreError::Database(_)
                | CoreError::Serialization(_)
                | CoreError::Redis(_)
                | CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// 返回错误码（API 契约的一部分，客户端依赖它做条件分支）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Core(core) => core.error_code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志，防止信息泄露
        let message = match &self {
            Self::Core(core) if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!(error = %core, code = core.error_code(), "服务内部错误");
                "服务内部错误，请稍后重试".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// HTTP 层 Result 类型别名
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    /// 代表性错误变体与期望的 (StatusCode, error_code) 映射
    fn representative_variants() -> Vec<(ApiError, StatusCode, &'static str)> {
        vec![
            (
                ApiError::Unauthorized("缺少 Token".into()),
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
            ),
            (
                ApiError::Validation("weightKg 必须为正".into()),
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (
                ApiError::Core(CoreError::UserNotFound("u1".into())),
                StatusCode::NOT_FOUND,
                "USER_NOT_FOUND",
            ),
            (
                ApiError::Core(CoreError::Unauthorized("需要运营权限".into())),
                StatusCode::FORBIDDEN,
                "UNAUTHORIZED",
            ),
            (
                ApiError::Core(CoreError::WeightOutOfRange {
                    weight_kg: 0.01,
                    min_kg: 0.1,
                    max_kg: 1000.0,
                }),
                StatusCode::BAD_REQUEST,
                "WEIGHT_OUT_OF_RANGE",
            ),
            (
                ApiError::Core(CoreError::InsufficientBalance {
                    required: 200,
                    available: 50,
                }),
                StatusCode::CONFLICT,
                "INSUFFICIENT_BALANCE",
            ),
            (
                ApiError::Core(CoreError::RewardExhausted("rwd-1".into())),
                StatusCode::CONFLICT,
                "REWARD_EXHAUSTED",
            ),
            (
                ApiError::Core(CoreError::InvalidRedemptionState {
                    redemption_id: "rdm-1".into(),
                    current_state: "DELIVERED".into(),
                }),
                StatusCode::CONFLICT,
                "INVALID_REDEMPTION_STATE",
            ),
            (
                ApiError::Core(CoreError::Internal("oops".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ]
    }

    #[test]
    fn test_status_and_code_mapping() {
        for (error, expected_status, expected_code) in representative_variants() {
            assert_eq!(
                error.status_code(),
                expected_status,
                "状态码不匹配: {expected_code}"
            );
            assert_eq!(error.error_code(), expected_code);
        }
    }

    /// 响应体必须包含 success/code/message/data 四字段
    #[tokio::test]
    async fn test_into_response_body_structure() {
        for (error, expected_status, expected_code) in representative_variants() {
            let response = error.into_response();
            assert_eq!(response.status(), expected_status);

            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .expect("读取响应体失败");
            let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

            assert_eq!(body["success"], json!(false));
            assert_eq!(body["code"], json!(expected_code));
            assert!(!body["message"].as_str().unwrap_or("").is_empty());
            assert!(body["data"].is_null());
        }
    }

    /// 系统级错误的响应消息不应泄露内部细节
    #[tokio::test]
    async fn test_system_errors_hide_internal_details() {
        let error = ApiError::Core(CoreError::Redis(
            "redis://10.0.0.1:6379 connection refused".into(),
        ));
        let response = error.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let message = body["message"].as_str().unwrap();

        assert!(!message.contains("10.0.0.1"));
        assert!(message.contains("服务内部错误"));
    }

    /// 业务错误的响应消息保留上下文，帮助用户定位问题
    #[tokio::test]
    async fn test_business_errors_preserve_context() {
        let error = ApiError::Core(CoreError::InsufficientBalance {
            required: 200,
            available: 50,
        });
        let response = error.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let message = body["message"].as_str().unwrap();

        assert!(message.contains("200"));
        assert!(message.contains("50"));
    }

    #[test]
    fn test_from_validation_errors() {
        use validator::{ValidationError, ValidationErrors};

        let mut errors = ValidationErrors::new();
        let mut field_error = ValidationError::new("range");
        field_error.message = Some("每页条数必须在 1-100 之间".into());
        errors.add("pageSize", field_error);

        let api_error: ApiError = errors.into();
        assert_eq!(api_error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(api_error.error_code(), "VALIDATION_ERROR");
        assert!(api_error.to_string().contains("pageSize"));
    }
}
