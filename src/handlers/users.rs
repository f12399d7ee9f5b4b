use axum::extract::{Path, Query, RawQuery, State};
use axum::Json;

use crate::api::dto::{UserDto, UserInsertDto, UserUpdateDto};
use crate::app::AppState;
use crate::database::repository::USER_SORT_FIELDS;
use crate::filter::{Page, PageParams, PageRequest};
use crate::middleware::{Admin, ApiResponse, ApiResult};

pub async fn list(
    _: Admin,
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
    Query(params): Query<PageParams>,
) -> ApiResult<Page<UserDto>> {
    let params = params.with_sort_from(raw.as_deref());
    let page = PageRequest::from_params(&params, USER_SORT_FIELDS, &state.config.api)?;
    let result = state.users.find_all_paged(&page).await?;
    Ok(ApiResponse::success(result.map(UserDto::from_entity)))
}

pub async fn get(
    _: Admin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<UserDto> {
    let user = state.users.find_by_id(id).await?;
    Ok(ApiResponse::success(UserDto::from_entity(user)))
}

pub async fn create(
    _: Admin,
    State(state): State<AppState>,
    Json(body): Json<UserInsertDto>,
) -> ApiResult<UserDto> {
    let (profile, password) = body.into_parts()?;
    let created = state.users.insert(&profile, &password).await?;
    let location = format!("/users/{}", created.user.id);
    Ok(ApiResponse::created(UserDto::from_entity(created), location))
}

pub async fn update(
    _: Admin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UserUpdateDto>,
) -> ApiResult<UserDto> {
    let updated = state.users.update(id, &body.into_changes()?).await?;
    Ok(ApiResponse::success(UserDto::from_entity(updated)))
}

pub async fn delete(
    _: Admin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    state.users.delete(id).await?;
    Ok(ApiResponse::no_content())
}
