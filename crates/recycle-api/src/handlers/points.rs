//! 积分 API 处理器
//!
//! 余额、账本流水查询与运营侧的手工调整

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Serialize;
use validator::Validate;

use recycle_core::models::{LedgerEntry, UserRole};

use crate::{
    auth::Claims,
    dto::{AdjustPointsBody, ApiResponse, PageResponse, PaginationParams},
    error::{ApiError, Result},
    state::AppState,
};

/// 余额响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceDto {
    pub user_id: String,
    pub balance: i64,
}

/// 当前用户积分余额
///
/// GET /api/v1/users/me/points
pub async fn my_balance(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<BalanceDto>>> {
    let balance = state.points.balance(&claims.sub).await?;
    Ok(Json(ApiResponse::success(BalanceDto {
        user_id: claims.sub,
        balance,
    })))
}

/// 当前用户积分流水（按时间倒序）
///
/// GET /api/v1/users/me/points/history
pub async fn my_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<LedgerEntry>>>> {
    params.validate()?;

    let entries = state
        .points
        .history(&claims.sub, params.page_size, params.offset())
        .await?;
    Ok(Json(ApiResponse::success(PageResponse::new(
        entries,
        params.page,
        params.page_size,
    ))))
}

/// 手工调整用户积分（管理员）
///
/// 正数补偿、负数扣减，扣减受余额下限约束
///
/// POST /api/v1/users/{id}/points/adjust
pub async fn adjust_points(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<String>,
    Json(body): Json<AdjustPointsBody>,
) -> Result<Json<ApiResponse<BalanceDto>>> {
    body.validate()?;

    let operator = state.users.get(&claims.sub).await?;
    if operator.role != UserRole::Admin {
        return Err(ApiError::Core(recycle_core::error::CoreError::Unauthorized(
            "积分调整需要管理员权限".to_string(),
        )));
    }

    let balance = state
        .points
        .adjust(&user_id, body.delta, &claims.sub, body.remark)
        .await?;
    Ok(Json(ApiResponse::success(BalanceDto { user_id, balance })))
}
