//! 用户仓储
//!
//! 提供用户数据访问，支持事务和行级锁

use sqlx::{PgConnection, PgPool, Row};

use crate::error::Result;
use crate::models::{User, UserProfileUpdate, UserRole};

/// 用户仓储
///
/// 负责用户的 CRUD 和余额的事务内更新
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 查询操作 ====================

    /// 根据 ID 获取用户
    pub async fn get_user(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, phone, address, photo_url, points, role, active,
                   created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// 根据邮箱获取用户
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, phone, address, photo_url, points, role, active,
                   created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// 分页列出用户
    pub async fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, phone, address, photo_url, points, role, active,
                   created_at, updated_at
            FROM users
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    // ==================== 写入操作 ====================

    /// 创建用户
    pub async fn create_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, phone, address, photo_url, points, role, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(&user.photo_url)
        .bind(user.points)
        .bind(user.role)
        .bind(user.active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 更新用户资料（仅更新提供的字段）
    pub async fn update_profile(&self, id: &str, update: &UserProfileUpdate) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                address = COALESCE($4, address),
                photo_url = COALESCE($5, photo_url),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.phone)
        .bind(&update.address)
        .bind(&update.photo_url)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 启用/停用用户
    pub async fn set_active(&self, id: &str, active: bool) -> Result<()> {
        sqlx::query("UPDATE users SET active = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// 调整用户角色
    pub async fn set_role(&self, id: &str, role: UserRole) -> Result<()> {
        sqlx::query("UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(role)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // ==================== 事务操作 ====================

    /// 在事务中获取用户（带行级锁）
    ///
    /// 使用 FOR UPDATE 锁定行，防止余额的并发读-改-写
    pub async fn get_user_for_update(tx: &mut PgConnection, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, phone, address, photo_url, points, role, active,
                   created_at, updated_at
            FROM users
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(tx)
        .await?;

        Ok(user)
    }

    /// 在事务中增量更新余额，返回更新后的余额
    ///
    /// 使用增量更新而非覆盖，配合行锁保证余额变动的原子性
    pub async fn update_points_in_tx(tx: &mut PgConnection, id: &str, delta: i64) -> Result<i64> {
        let row = sqlx::query(
            r#"
            UPDATE users
            SET points = points + $2, updated_at = NOW()
            WHERE id = $1
            RETURNING points
            "#,
        )
        .bind(id)
        .bind(delta)
        .fetch_one(tx)
        .await?;

        Ok(row.get("points"))
    }
}
