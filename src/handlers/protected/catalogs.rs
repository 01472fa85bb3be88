use axum::extract::State;

use crate::database::models::{Activity, Category, Department, Place, Status, Subcategory};
use crate::middleware::{ApiResponse, ApiResult, QueryParams};
use crate::services::catalog_service::CatalogQuery;
use crate::services::CatalogService;
use crate::state::AppState;

/// GET /api/catalogs/statuses
pub async fn statuses(State(state): State<AppState>) -> ApiResult<Vec<Status>> {
    Ok(ApiResponse::success(CatalogService::new(state.pool).statuses().await?))
}

/// GET /api/catalogs/departments?id_company=
pub async fn departments(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<CatalogQuery>,
) -> ApiResult<Vec<Department>> {
    Ok(ApiResponse::success(CatalogService::new(state.pool).departments(&query).await?))
}

/// GET /api/catalogs/places?id_company=
pub async fn places(State(state): State<AppState>, QueryParams(query): QueryParams<CatalogQuery>) -> ApiResult<Vec<Place>> {
    Ok(ApiResponse::success(CatalogService::new(state.pool).places(&query).await?))
}

/// GET /api/catalogs/categories
pub async fn categories(State(state): State<AppState>) -> ApiResult<Vec<Category>> {
    Ok(ApiResponse::success(CatalogService::new(state.pool).categories().await?))
}

/// GET /api/catalogs/subcategories?id_category=
pub async fn subcategories(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<CatalogQuery>,
) -> ApiResult<Vec<Subcategory>> {
    Ok(ApiResponse::success(CatalogService::new(state.pool).subcategories(&query).await?))
}

/// GET /api/catalogs/activities?id_subcategory=
pub async fn activities(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<CatalogQuery>,
) -> ApiResult<Vec<Activity>> {
    Ok(ApiResponse::success(CatalogService::new(state.pool).activities(&query).await?))
}
