//! 奖励 API 处理器
//!
//! 面向公民的奖励目录与面向管理员的奖励维护

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use validator::Validate;

use recycle_core::models::{Reward, RewardUpdate};
use recycle_core::service::dto::CreateRewardRequest;

use crate::{
    auth::Claims,
    dto::{ApiResponse, CreateRewardBody, PageResponse, PaginationParams, SetActiveBody,
          UpdateRewardBody},
    error::Result,
    state::AppState,
};

/// 可兑换奖励目录（上架且在有效期内，按兑换积分升序）
///
/// GET /api/v1/rewards
pub async fn catalog(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<Reward>>>> {
    params.validate()?;

    let rewards = state
        .rewards
        .catalog(params.page_size, params.offset())
        .await?;
    Ok(Json(ApiResponse::success(PageResponse::new(
        rewards,
        params.page,
        params.page_size,
    ))))
}

/// 全量奖励列表（管理员，含下架和过期）
///
/// GET /api/v1/rewards/all
pub async fn list_all_rewards(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<Reward>>>> {
    params.validate()?;

    let rewards = state
        .rewards
        .list_all(&claims.sub, params.page_size, params.offset())
        .await?;
    Ok(Json(ApiResponse::success(PageResponse::new(
        rewards,
        params.page,
        params.page_size,
    ))))
}

/// 奖励详情
///
/// GET /api/v1/rewards/{id}
pub async fn get_reward(
    State(state): State<AppState>,
    Path(reward_id): Path<String>,
) -> Result<Json<ApiResponse<Reward>>> {
    let reward = state.rewards.get(&reward_id).await?;
    Ok(Json(ApiResponse::success(reward)))
}

/// 创建奖励（管理员）
///
/// POST /api/v1/rewards
pub async fn create_reward(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<CreateRewardBody>,
) -> Result<Json<ApiResponse<Reward>>> {
    body.validate()?;

    let reward = state
        .rewards
        .create(
            CreateRewardRequest {
                title: body.title,
                description: body.description,
                category: body.category,
                cost_points: body.cost_points,
                monetary_value: body.monetary_value,
                image_url: body.image_url,
                quantity: body.quantity,
                requirements: body.requirements,
                valid_from: body.valid_from,
                valid_until: body.valid_until,
            },
            &claims.sub,
        )
        .await?;
    Ok(Json(ApiResponse::success(reward)))
}

/// 更新奖励（管理员）
///
/// 已存在的兑换申请持有提交时的快照，不受更新影响
///
/// PUT /api/v1/rewards/{id}
pub async fn update_reward(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(reward_id): Path<String>,
    Json(body): Json<UpdateRewardBody>,
) -> Result<Json<ApiResponse<Reward>>> {
    body.validate()?;

    let requirements = match body.requirements {
        Some(list) => Some(serde_json::to_value(list).map_err(recycle_core::error::CoreError::from)?),
        None => None,
    };

    let update = RewardUpdate {
        title: body.title,
        description: body.description,
        category: body.category,
        cost_points: body.cost_points,
        monetary_value: body.monetary_value,
        image_url: body.image_url,
        quantity: body.quantity,
        requirements,
        valid_from: body.valid_from,
        valid_until: body.valid_until,
    };

    let reward = state.rewards.update(&reward_id, update, &claims.sub).await?;
    Ok(Json(ApiResponse::success(reward)))
}

/// 上架/下架奖励（管理员）
///
/// PATCH /api/v1/rewards/{id}/active
pub async fn set_reward_active(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(reward_id): Path<String>,
    Json(body): Json<SetActiveBody>,
) -> Result<Json<ApiResponse<()>>> {
    state
        .rewards
        .set_active(&reward_id, body.active, &claims.sub)
        .await?;
    Ok(Json(ApiResponse::ok()))
}
