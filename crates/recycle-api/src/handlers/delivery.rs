//! 投递 API 处理器
//!
//! 投递提交（multipart，含凭证照片）、审核、撤回与查询

use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
};
use validator::Validate;

use recycle_core::models::{Delivery, DeliveryStats, MaterialKind};
use recycle_core::service::dto::{MaterialRateDto, PhotoUpload, SubmitDeliveryRequest};

use crate::{
    auth::Claims,
    dto::{ApiResponse, PageResponse, PaginationParams, ReviewBody, SubmitDeliveryBody},
    error::{ApiError, Result},
    state::AppState,
};

/// 单张凭证照片的大小上限（5 MB）
const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// 提交投递
///
/// multipart/form-data，两个部分：
/// - `payload`: JSON（material/weightKg/comment）
/// - `photo`: 凭证照片文件（可选）
///
/// POST /api/v1/deliveries
pub async fn submit_delivery(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<Delivery>>> {
    let mut body: Option<SubmitDeliveryBody> = None;
    let mut photo: Option<PhotoUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("multipart 解析失败: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("payload") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("读取 payload 失败: {e}")))?;
                body = Some(
                    serde_json::from_str(&text)
                        .map_err(|e| ApiError::BadRequest(format!("payload 解析失败: {e}")))?,
                );
            }
            Some("photo") => {
                let extension = field
                    .file_name()
                    .and_then(|file_name| file_name.rsplit('.').next())
                    .map(str::to_ascii_lowercase)
                    .ok_or_else(|| {
                        ApiError::BadRequest("照片文件名缺少扩展名".to_string())
                    })?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("读取照片失败: {e}")))?;
                if bytes.len() > MAX_PHOTO_BYTES {
                    return Err(ApiError::Validation("照片不能超过 5 MB".to_string()));
                }
                photo = Some(PhotoUpload {
                    extension,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    let body = body.ok_or_else(|| ApiError::BadRequest("缺少 payload 部分".to_string()))?;
    body.validate()?;

    let delivery = state
        .deliveries
        .submit(SubmitDeliveryRequest {
            user_id: claims.sub.clone(),
            material: body.material,
            weight_kg: body.weight_kg,
            comment: body.comment,
            photo,
        })
        .await?;

    Ok(Json(ApiResponse::success(delivery)))
}

/// 投递详情
///
/// 本人或运营人员可见
///
/// GET /api/v1/deliveries/{id}
pub async fn get_delivery(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(delivery_id): Path<String>,
) -> Result<Json<ApiResponse<Delivery>>> {
    let delivery = state.deliveries.get(&delivery_id).await?;

    if delivery.user_id != claims.sub {
        // 非本人时要求运营权限，复用角色判定
        let viewer = state.users.get(&claims.sub).await?;
        if !viewer.role.is_staff() {
            return Err(ApiError::Core(recycle_core::error::CoreError::Unauthorized(
                "只能查看本人的投递".to_string(),
            )));
        }
    }

    Ok(Json(ApiResponse::success(delivery)))
}

/// 当前用户的投递历史
///
/// GET /api/v1/users/me/deliveries
pub async fn list_my_deliveries(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<Delivery>>>> {
    params.validate()?;

    let deliveries = state
        .deliveries
        .list_by_user(&claims.sub, params.page_size, params.offset())
        .await?;
    Ok(Json(ApiResponse::success(PageResponse::new(
        deliveries,
        params.page,
        params.page_size,
    ))))
}

/// 待审核队列（运营侧，按提交时间先后）
///
/// GET /api/v1/deliveries/pending
pub async fn pending_queue(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<Delivery>>>> {
    params.validate()?;

    let viewer = state.users.get(&claims.sub).await?;
    if !viewer.role.is_staff() {
        return Err(ApiError::Core(recycle_core::error::CoreError::Unauthorized(
            "查看审核队列需要运营权限".to_string(),
        )));
    }

    let deliveries = state
        .deliveries
        .pending_queue(params.page_size, params.offset())
        .await?;
    Ok(Json(ApiResponse::success(PageResponse::new(
        deliveries,
        params.page,
        params.page_size,
    ))))
}

/// 审核投递
///
/// POST /api/v1/deliveries/{id}/review
pub async fn review_delivery(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(delivery_id): Path<String>,
    Json(body): Json<ReviewBody>,
) -> Result<Json<ApiResponse<Delivery>>> {
    body.validate()?;

    let delivery = state
        .deliveries
        .review(&delivery_id, &claims.sub, body.approve, body.reason)
        .await?;
    Ok(Json(ApiResponse::success(delivery)))
}

/// 撤回待审核的投递
///
/// DELETE /api/v1/deliveries/{id}
pub async fn withdraw_delivery(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(delivery_id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    state.deliveries.withdraw(&delivery_id, &claims.sub).await?;
    Ok(Json(ApiResponse::ok()))
}

/// 当前用户的投递统计
///
/// GET /api/v1/users/me/delivery-stats
pub async fn my_delivery_stats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<DeliveryStats>>> {
    let stats = state.deliveries.user_stats(&claims.sub).await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// 材料积分率表（回收指南，无需查库）
///
/// GET /api/v1/materials
pub async fn material_rates() -> Json<ApiResponse<Vec<MaterialRateDto>>> {
    let rates = MaterialKind::all()
        .iter()
        .map(|&material| MaterialRateDto {
            material,
            points_per_kg: material.points_per_kg(),
        })
        .collect();
    Json(ApiResponse::success(rates))
}
