//! 回收平台核心错误类型
//!
//! 定义服务层的业务错误和系统错误

use thiserror::Error;

/// 回收平台核心错误类型
#[derive(Debug, Error)]
pub enum CoreError {
    // === 用户相关错误 ===
    #[error("用户不存在: {0}")]
    UserNotFound(String),

    #[error("用户已停用: {0}")]
    UserInactive(String),

    #[error("积分余额不足: 需要 {required}, 可用 {available}")]
    InsufficientBalance { required: i64, available: i64 },

    // === 投递相关错误 ===
    #[error("投递记录不存在: {0}")]
    DeliveryNotFound(String),

    #[error("投递状态不允许此操作: delivery_id={delivery_id}, current_state={current_state}")]
    InvalidDeliveryState {
        delivery_id: String,
        current_state: String,
    },

    #[error("投递重量超出范围: {weight_kg} kg (允许 {min_kg} - {max_kg} kg)")]
    WeightOutOfRange {
        weight_kg: f64,
        min_kg: f64,
        max_kg: f64,
    },

    // === 奖励相关错误 ===
    #[error("奖励不存在: {0}")]
    RewardNotFound(String),

    #[error("奖励当前不可兑换: {0}")]
    RewardUnavailable(String),

    #[error("奖励库存不足: reward_id={0}")]
    RewardExhausted(String),

    // === 兑换相关错误 ===
    #[error("兑换记录不存在: {0}")]
    RedemptionNotFound(String),

    #[error("兑换状态不允许此操作: redemption_id={redemption_id}, current_state={current_state}")]
    InvalidRedemptionState {
        redemption_id: String,
        current_state: String,
    },

    // === 权限错误 ===
    #[error("无权执行此操作: {0}")]
    Unauthorized(String),

    // === 系统错误 ===
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON 序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Redis 错误: {0}")]
    Redis(String),

    #[error("文件存储错误: {0}")]
    Storage(String),

    #[error("内部错误: {0}")]
    Internal(String),

    #[error("参数校验失败: {0}")]
    Validation(String),

    #[error("并发冲突，请重试")]
    ConcurrencyConflict,
}

/// 核心服务 Result 类型别名
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// 检查是否为可重试的错误
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Redis(_) | Self::ConcurrencyConflict
        )
    }

    /// 检查是否为业务错误（非系统错误）
    pub fn is_business_error(&self) -> bool {
        !matches!(
            self,
            Self::Database(_)
                | Self::Serialization(_)
                | Self::Redis(_)
                | Self::Storage(_)
                | Self::Internal(_)
                | Self::ConcurrencyConflict
        )
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::UserInactive(_) => "USER_INACTIVE",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::DeliveryNotFound(_) => "DELIVERY_NOT_FOUND",
            Self::InvalidDeliveryState { .. } => "INVALID_DELIVERY_STATE",
            Self::WeightOutOfRange { .. } => "WEIGHT_OUT_OF_RANGE",
            Self::RewardNotFound(_) => "REWARD_NOT_FOUND",
            Self::RewardUnavailable(_) => "REWARD_UNAVAILABLE",
            Self::RewardExhausted(_) => "REWARD_EXHAUSTED",
            Self::RedemptionNotFound(_) => "REDEMPTION_NOT_FOUND",
            Self::InvalidRedemptionState { .. } => "INVALID_REDEMPTION_STATE",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Redis(_) => "REDIS_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::ConcurrencyConflict => "CONCURRENCY_CONFLICT",
        }
    }
}

impl From<recycle_shared::error::SharedError> for CoreError {
    fn from(err: recycle_shared::error::SharedError) -> Self {
        use recycle_shared::error::SharedError;
        match err {
            SharedError::Database(e) => Self::Database(e),
            SharedError::Redis(e) => Self::Redis(e.to_string()),
            SharedError::Validation(msg) => Self::Validation(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_retryable() {
        assert!(CoreError::ConcurrencyConflict.is_retryable());
        assert!(CoreError::Redis("connection failed".to_string()).is_retryable());
        assert!(!CoreError::UserNotFound("u-1".to_string()).is_retryable());
        assert!(
            !CoreError::InsufficientBalance {
                required: 500,
                available: 120
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_error_is_business_error() {
        assert!(CoreError::RewardExhausted("r-1".to_string()).is_business_error());
        assert!(
            CoreError::InsufficientBalance {
                required: 500,
                available: 120
            }
            .is_business_error()
        );
        assert!(!CoreError::Internal("panic".to_string()).is_business_error());
        assert!(!CoreError::ConcurrencyConflict.is_business_error());
    }

    #[test]
    fn test_error_code() {
        assert_eq!(
            CoreError::RewardNotFound("r-1".to_string()).error_code(),
            "REWARD_NOT_FOUND"
        );
        assert_eq!(
            CoreError::InsufficientBalance {
                required: 500,
                available: 120
            }
            .error_code(),
            "INSUFFICIENT_BALANCE"
        );
        assert_eq!(
            CoreError::ConcurrencyConflict.error_code(),
            "CONCURRENCY_CONFLICT"
        );
    }

    #[test]
    fn test_error_display() {
        let err = CoreError::InvalidDeliveryState {
            delivery_id: "d-123".to_string(),
            current_state: "APPROVED".to_string(),
        };
        assert!(err.to_string().contains("d-123"));
        assert!(err.to_string().contains("APPROVED"));

        let err = CoreError::WeightOutOfRange {
            weight_kg: 1500.0,
            min_kg: 0.1,
            max_kg: 1000.0,
        };
        assert!(err.to_string().contains("1500"));
    }
}
