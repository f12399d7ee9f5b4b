use axum::extract::{Path, Query, RawQuery, State};
use axum::Json;
use serde::Deserialize;

use crate::api::dto::{ProductDto, ProductRequest};
use crate::app::AppState;
use crate::database::repository::{ProductFilter, PRODUCT_SORT_FIELDS};
use crate::filter::types::empty_string_as_none;
use crate::filter::{Page, PageParams, PageRequest};
use crate::middleware::{ApiResponse, ApiResult, Operator};

/// `GET /products` query string. Empty values and `categoryId=0` mean "no filter";
/// `sort` is read from the raw query since it may repeat.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub category_id: Option<i64>,
    /// Matched as given, surrounding spaces included
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub size: Option<u32>,
}

pub async fn list(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
    Query(query): Query<ProductListQuery>,
) -> ApiResult<Page<ProductDto>> {
    let params = PageParams { page: query.page, size: query.size, sort: None }
        .with_sort_from(raw.as_deref());
    let page = PageRequest::from_params(&params, PRODUCT_SORT_FIELDS, &state.config.api)?;
    let filter = ProductFilter::new(query.category_id, query.name.as_deref());

    let result = state.products.find_all_paged(&filter, &page).await?;
    Ok(ApiResponse::success(result.map(ProductDto::from_entity)))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<ProductDto> {
    let product = state.products.find_by_id(id).await?;
    Ok(ApiResponse::success(ProductDto::from_entity(product)))
}

pub async fn create(
    _: Operator,
    State(state): State<AppState>,
    Json(body): Json<ProductRequest>,
) -> ApiResult<ProductDto> {
    let created = state.products.insert(&body.into_input()?).await?;
    let location = format!("/products/{}", created.product.id);
    Ok(ApiResponse::created(ProductDto::from_entity(created), location))
}

pub async fn update(
    _: Operator,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ProductRequest>,
) -> ApiResult<ProductDto> {
    let updated = state.products.update(id, &body.into_input()?).await?;
    Ok(ApiResponse::success(ProductDto::from_entity(updated)))
}

pub async fn delete(
    _: Operator,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    state.products.delete(id).await?;
    Ok(ApiResponse::no_content())
}
