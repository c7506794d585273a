//! 兑换 API 处理器
//!
//! 兑换申请、审核、取消与发放流转

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use validator::Validate;

use recycle_core::models::Redemption;
use recycle_core::service::dto::RedeemRequest;

use crate::{
    auth::Claims,
    dto::{ApiResponse, DeliveredBody, PageResponse, PaginationParams, RedeemBody,
          RedemptionListParams, ReviewBody},
    error::{ApiError, Result},
    state::AppState,
};

/// 发起兑换申请
///
/// 扣积分、占库存、建申请在同一事务内完成
///
/// POST /api/v1/redemptions
pub async fn request_redemption(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<RedeemBody>,
) -> Result<Json<ApiResponse<Redemption>>> {
    body.validate()?;

    let redemption = state
        .redemptions
        .request(RedeemRequest {
            user_id: claims.sub.clone(),
            reward_id: body.reward_id,
            comment: body.comment,
        })
        .await?;
    Ok(Json(ApiResponse::success(redemption)))
}

/// 兑换详情
///
/// 本人或运营人员可见
///
/// GET /api/v1/redemptions/{id}
pub async fn get_redemption(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(redemption_id): Path<String>,
) -> Result<Json<ApiResponse<Redemption>>> {
    let redemption = state.redemptions.get(&redemption_id).await?;

    if redemption.user_id != claims.sub {
        let viewer = state.users.get(&claims.sub).await?;
        if !viewer.role.is_staff() {
            return Err(ApiError::Core(recycle_core::error::CoreError::Unauthorized(
                "只能查看本人的兑换".to_string(),
            )));
        }
    }

    Ok(Json(ApiResponse::success(redemption)))
}

/// 当前用户的兑换历史
///
/// GET /api/v1/users/me/redemptions
pub async fn list_my_redemptions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<Redemption>>>> {
    params.validate()?;

    let redemptions = state
        .redemptions
        .list_by_user(&claims.sub, params.page_size, params.offset())
        .await?;
    Ok(Json(ApiResponse::success(PageResponse::new(
        redemptions,
        params.page,
        params.page_size,
    ))))
}

/// 按状态查询兑换列表（运营侧）
///
/// GET /api/v1/redemptions?state=REQUESTED
pub async fn list_redemptions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<RedemptionListParams>,
) -> Result<Json<ApiResponse<PageResponse<Redemption>>>> {
    let viewer = state.users.get(&claims.sub).await?;
    if !viewer.role.is_staff() {
        return Err(ApiError::Core(recycle_core::error::CoreError::Unauthorized(
            "查看兑换列表需要运营权限".to_string(),
        )));
    }

    let state_filter = params.state.unwrap_or_default();
    let redemptions = state
        .redemptions
        .list_by_state(state_filter, params.page_size, params.offset())
        .await?;
    Ok(Json(ApiResponse::success(PageResponse::new(
        redemptions,
        params.page,
        params.page_size,
    ))))
}

/// 审核兑换申请
///
/// 拒绝触发恰好一次的积分退还与库存释放
///
/// POST /api/v1/redemptions/{id}/review
pub async fn review_redemption(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(redemption_id): Path<String>,
    Json(body): Json<ReviewBody>,
) -> Result<Json<ApiResponse<Redemption>>> {
    body.validate()?;

    let redemption = state
        .redemptions
        .review(
            &redemption_id,
            &claims.sub,
            body.approve,
            body.reason,
            body.comment,
        )
        .await?;
    Ok(Json(ApiResponse::success(redemption)))
}

/// 取消兑换申请（仅本人，仅待审核）
///
/// POST /api/v1/redemptions/{id}/cancel
pub async fn cancel_redemption(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(redemption_id): Path<String>,
) -> Result<Json<ApiResponse<Redemption>>> {
    let redemption = state
        .redemptions
        .cancel(&redemption_id, &claims.sub)
        .await?;
    Ok(Json(ApiResponse::success(redemption)))
}

/// 开始发放（运营侧）
///
/// POST /api/v1/redemptions/{id}/start-delivery
pub async fn start_delivery(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(redemption_id): Path<String>,
) -> Result<Json<ApiResponse<Redemption>>> {
    let redemption = state
        .redemptions
        .start_delivery(&redemption_id, &claims.sub)
        .await?;
    Ok(Json(ApiResponse::success(redemption)))
}

/// 确认送达（运营侧），请求体可省略
///
/// POST /api/v1/redemptions/{id}/delivered
pub async fn mark_delivered(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(redemption_id): Path<String>,
    body: Option<Json<DeliveredBody>>,
) -> Result<Json<ApiResponse<Redemption>>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    body.validate()?;

    let redemption = state
        .redemptions
        .mark_delivered(&redemption_id, &claims.sub, body.receipt_photo_url)
        .await?;
    Ok(Json(ApiResponse::success(redemption)))
}
