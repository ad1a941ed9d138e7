// src/web/license_handlers.rs
use crate::{
    error::AppResult,
    models::license::{License, LicensePatch, NewLicense},
    services::license_service,
    state::AppState,
    web::mw_auth::CurrentUser,
};
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

// POST /api/licenses
pub async fn create_license(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<NewLicense>,
) -> AppResult<impl IntoResponse> {
    let license = license_service::create_license(&state.db_pool, input, user.id).await?;
    Ok((StatusCode::CREATED, Json(license)))
}

// GET /api/licenses/drafts
pub async fn list_drafts(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<License>>> {
    Ok(Json(license_service::list_drafts(&state.db_pool, user.id).await?))
}

// GET /api/licenses/in-progress
pub async fn list_in_progress(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<License>>> {
    Ok(Json(license_service::list_in_progress(&state.db_pool, user.id).await?))
}

// GET /api/licenses/completed
pub async fn list_completed(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<License>>> {
    Ok(Json(license_service::list_completed(&state.db_pool, user.id).await?))
}

// GET /api/licenses/{id}
pub async fn get_license(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<License>> {
    Ok(Json(
        license_service::get_license(&state.db_pool, id, user.id, user.is_admin).await?,
    ))
}

// PUT /api/licenses/{id}
pub async fn update_license(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(patch): Json<LicensePatch>,
) -> AppResult<Json<License>> {
    Ok(Json(
        license_service::update_license(&state.db_pool, id, patch, user.id).await?,
    ))
}

// DELETE /api/licenses/{id}
pub async fn delete_license(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    license_service::delete_license(&state.db_pool, id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
