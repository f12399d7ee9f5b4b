use axum::extract::{Path, Query, RawQuery, State};
use axum::Json;

use crate::api::dto::{CategoryDto, CategoryRequest};
use crate::app::AppState;
use crate::database::repository::CATEGORY_SORT_FIELDS;
use crate::filter::{Page, PageParams, PageRequest};
use crate::middleware::{ApiResponse, ApiResult, Operator};

pub async fn list(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
    Query(params): Query<PageParams>,
) -> ApiResult<Page<CategoryDto>> {
    let params = params.with_sort_from(raw.as_deref());
    let page = PageRequest::from_params(&params, CATEGORY_SORT_FIELDS, &state.config.api)?;
    let result = state.categories.find_all_paged(&page).await?;
    Ok(ApiResponse::success(result.map(CategoryDto::from_entity)))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<CategoryDto> {
    let category = state.categories.find_by_id(id).await?;
    Ok(ApiResponse::success(CategoryDto::from_entity(category)))
}

pub async fn create(
    _: Operator,
    State(state): State<AppState>,
    Json(body): Json<CategoryRequest>,
) -> ApiResult<CategoryDto> {
    let created = state.categories.insert(&body.into_input()?).await?;
    let location = format!("/categories/{}", created.id);
    Ok(ApiResponse::created(CategoryDto::from_entity(created), location))
}

pub async fn update(
    _: Operator,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<CategoryRequest>,
) -> ApiResult<CategoryDto> {
    let updated = state.categories.update(id, &body.into_input()?).await?;
    Ok(ApiResponse::success(CategoryDto::from_entity(updated)))
}

/// 409 while products still reference the category
pub async fn delete(
    _: Operator,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    state.categories.delete(id).await?;
    Ok(ApiResponse::no_content())
}
