//! 用户实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::UserRole;

/// 平台用户
///
/// `points` 为当前积分余额的物化值，所有变动都通过积分账本
/// 在同一事务内同步更新，余额与账本始终一致
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    /// 登录邮箱（唯一）
    pub email: String,
    /// 显示名称
    pub name: String,
    /// 联系电话
    #[sqlx(default)]
    pub phone: Option<String>,
    /// 居住地址
    #[sqlx(default)]
    pub address: Option<String>,
    /// 头像 URL
    #[sqlx(default)]
    pub photo_url: Option<String>,
    /// 当前积分余额
    pub points: i64,
    /// 用户角色
    pub role: UserRole,
    /// 是否启用（停用后不能投递和兑换）
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// 检查余额是否足以支付指定积分
    pub fn can_afford(&self, cost: i64) -> bool {
        self.points >= cost
    }
}

/// 用户资料更新字段（None 表示不修改）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub photo_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(points: i64) -> User {
        User {
            id: "u-1".to_string(),
            email: "citizen@example.com".to_string(),
            name: "Citizen".to_string(),
            phone: None,
            address: None,
            photo_url: None,
            points,
            role: UserRole::Citizen,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_can_afford() {
        assert!(sample_user(500).can_afford(500));
        assert!(sample_user(500).can_afford(100));
        assert!(!sample_user(99).can_afford(100));
    }
}
