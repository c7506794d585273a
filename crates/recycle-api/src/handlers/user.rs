//! 用户 API 处理器
//!
//! 首次登录注册、个人资料维护与运营侧的用户管理

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use tracing::info;
use validator::Validate;

use recycle_core::models::{User, UserProfileUpdate};

use crate::{
    auth::Claims,
    dto::{ApiResponse, PageResponse, PaginationParams, SetActiveBody, SetRoleBody,
          UpdateProfileBody},
    error::Result,
    state::AppState,
};

/// 登录会话同步
///
/// 首次调用时按 Token 身份注册用户，已存在时返回当前资料。
///
/// POST /api/v1/session
pub async fn ensure_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<User>>> {
    let user = state
        .users
        .ensure_user(&claims.sub, &claims.email, &claims.name)
        .await?;
    Ok(Json(ApiResponse::success(user)))
}

/// 获取当前用户资料
///
/// GET /api/v1/users/me
pub async fn get_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<User>>> {
    let user = state.users.get(&claims.sub).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// 更新当前用户资料
///
/// PUT /api/v1/users/me
pub async fn update_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<UpdateProfileBody>,
) -> Result<Json<ApiResponse<User>>> {
    body.validate()?;

    let update = UserProfileUpdate {
        name: body.name,
        phone: body.phone,
        address: body.address,
        photo_url: body.photo_url,
    };
    let user = state.users.update_profile(&claims.sub, update).await?;

    info!(user_id = %claims.sub, "用户资料已更新");
    Ok(Json(ApiResponse::success(user)))
}

/// 用户列表（运营侧）
///
/// GET /api/v1/users
pub async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<User>>>> {
    params.validate()?;

    let users = state
        .users
        .list(&claims.sub, params.page_size, params.offset())
        .await?;
    Ok(Json(ApiResponse::success(PageResponse::new(
        users,
        params.page,
        params.page_size,
    ))))
}

/// 停用/启用用户（管理员）
///
/// PATCH /api/v1/users/{id}/active
pub async fn set_user_active(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<String>,
    Json(body): Json<SetActiveBody>,
) -> Result<Json<ApiResponse<()>>> {
    state
        .users
        .set_active(&user_id, body.active, &claims.sub)
        .await?;
    Ok(Json(ApiResponse::ok()))
}

/// 调整用户角色（管理员）
///
/// PATCH /api/v1/users/{id}/role
pub async fn set_user_role(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<String>,
    Json(body): Json<SetRoleBody>,
) -> Result<Json<ApiResponse<()>>> {
    state.users.set_role(&user_id, body.role, &claims.sub).await?;
    Ok(Json(ApiResponse::ok()))
}
