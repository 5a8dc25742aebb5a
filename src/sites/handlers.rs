// HTTP handlers for site administration

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::error::{ApiError, ErrorResponse};
use crate::sites::{CreateSiteRequest, Site, UpdateSiteRequest};
use crate::AppState;

/// Query parameters for the site listing
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SiteListQuery {
    /// Include retired sites
    #[serde(default)]
    pub include_inactive: bool,
}

/// Handler for GET /api/admin/sites
#[utoipa::path(
    get,
    path = "/api/admin/sites",
    params(SiteListQuery),
    responses(
        (status = 200, description = "Sites ordered by number", body = [Site]),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn list_sites_handler(
    State(state): State<AppState>,
    Query(query): Query<SiteListQuery>,
) -> Result<Json<Vec<Site>>, ApiError> {
    Ok(Json(state.sites.list_sites(query.include_inactive).await?))
}

/// Handler for POST /api/admin/sites
#[utoipa::path(
    post,
    path = "/api/admin/sites",
    request_body = CreateSiteRequest,
    responses(
        (status = 201, description = "Site created", body = Site),
        (status = 400, description = "Invalid input data", body = ErrorResponse),
        (status = 409, description = "Active site number already in use", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn create_site_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateSiteRequest>,
) -> Result<(StatusCode, Json<Site>), ApiError> {
    request.validate()?;
    let site = state.sites.create_site(request).await?;
    Ok((StatusCode::CREATED, Json(site)))
}

/// Handler for PUT /api/admin/sites/{id}
#[utoipa::path(
    put,
    path = "/api/admin/sites/{id}",
    params(("id" = i32, Path, description = "Site id")),
    request_body = UpdateSiteRequest,
    responses(
        (status = 200, description = "Site updated", body = Site),
        (status = 404, description = "Site not found", body = ErrorResponse),
        (status = 409, description = "Active site number already in use", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn update_site_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateSiteRequest>,
) -> Result<Json<Site>, ApiError> {
    request.validate()?;
    Ok(Json(state.sites.update_site(id, request).await?))
}

/// Handler for DELETE /api/admin/sites/{id}
/// Retires the site; its reservations keep pointing at it
#[utoipa::path(
    delete,
    path = "/api/admin/sites/{id}",
    params(("id" = i32, Path, description = "Site id")),
    responses(
        (status = 200, description = "Site deactivated", body = Site),
        (status = 404, description = "Site not found", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn deactivate_site_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Site>, ApiError> {
    Ok(Json(state.sites.deactivate_site(id).await?))
}
