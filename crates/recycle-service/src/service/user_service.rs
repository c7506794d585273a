//! 用户服务
//!
//! 用户档案的注册、查询和运营管理

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use crate::error::{CoreError, Result};
use crate::models::{User, UserProfileUpdate, UserRole};
use crate::repository::UserRepository;

/// 用户服务
pub struct UserService {
    user_repo: Arc<UserRepository>,
}

impl UserService {
    pub fn new(user_repo: Arc<UserRepository>) -> Self {
        Self { user_repo }
    }

    /// 首次登录注册
    ///
    /// 身份认证由外部签发的令牌承载，本服务只在首次见到
    /// 某身份时落库，重复调用幂等返回已有档案
    #[instrument(skip(self), fields(user_id = %id, email = %email))]
    pub async fn ensure_user(&self, id: &str, email: &str, name: &str) -> Result<User> {
        if let Some(existing) = self.user_repo.get_user(id).await? {
            return Ok(existing);
        }

        let now = Utc::now();
        let user = User {
            id: id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            phone: None,
            address: None,
            photo_url: None,
            points: 0,
            role: UserRole::Citizen,
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.user_repo.create_user(&user).await?;

        info!(user_id = %user.id, "新用户注册");
        Ok(user)
    }

    /// 查询用户档案
    pub async fn get(&self, user_id: &str) -> Result<User> {
        self.user_repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(user_id.to_string()))
    }

    /// 更新本人资料
    #[instrument(skip(self, update), fields(user_id = %user_id))]
    pub async fn update_profile(&self, user_id: &str, update: UserProfileUpdate) -> Result<User> {
        self.get(user_id).await?;
        self.user_repo.update_profile(user_id, &update).await?;
        self.get(user_id).await
    }

    /// 启用/停用用户（管理员操作）
    ///
    /// 停用不清余额：用户的积分和历史记录保留，仅禁止新操作
    #[instrument(skip(self), fields(user_id = %user_id, active = %active, operator_id = %operator_id))]
    pub async fn set_active(&self, user_id: &str, active: bool, operator_id: &str) -> Result<()> {
        self.require_admin(operator_id).await?;
        self.get(user_id).await?;
        self.user_repo.set_active(user_id, active).await?;

        info!(user_id, active, "用户启停状态已更新");
        Ok(())
    }

    /// 调整用户角色（管理员操作）
    #[instrument(skip(self), fields(user_id = %user_id, role = ?role, operator_id = %operator_id))]
    pub async fn set_role(&self, user_id: &str, role: UserRole, operator_id: &str) -> Result<()> {
        self.require_admin(operator_id).await?;
        self.get(user_id).await?;
        self.user_repo.set_role(user_id, role).await?;

        info!(user_id, ?role, "用户角色已更新");
        Ok(())
    }

    /// 用户列表（运营后台）
    pub async fn list(&self, operator_id: &str, limit: i64, offset: i64) -> Result<Vec<User>> {
        let operator = self.get(operator_id).await?;
        if !operator.role.is_staff() {
            return Err(CoreError::Unauthorized(
                "用户列表需要运营人员权限".to_string(),
            ));
        }
        self.user_repo.list_users(limit, offset).await
    }

    async fn require_admin(&self, user_id: &str) -> Result<User> {
        let user = self.get(user_id).await?;
        if user.role != UserRole::Admin {
            return Err(CoreError::Unauthorized(
                "用户管理操作需要管理员权限".to_string(),
            ));
        }
        Ok(user)
    }
}
