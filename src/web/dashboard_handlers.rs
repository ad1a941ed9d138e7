// src/web/dashboard_handlers.rs
use crate::{
    error::AppResult,
    models::{activity::Activity, dashboard::UserStats},
    services::{activity_service, dashboard_service},
    state::AppState,
    web::mw_auth::CurrentUser,
};
use axum::{
    extract::{Extension, Query, State},
    Json,
};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct ActivityParams {
    limit: Option<i64>,
}

// GET /api/dashboard/stats
pub async fn user_stats(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<UserStats>> {
    Ok(Json(dashboard_service::user_stats(&state.db_pool, user.id).await?))
}

// GET /api/dashboard/activities?limit=N
pub async fn recent_activities(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<ActivityParams>,
) -> AppResult<Json<Vec<Activity>>> {
    let limit = params.limit.unwrap_or(activity_service::DEFAULT_RECENT_LIMIT);
    Ok(Json(
        activity_service::list_recent(&state.db_pool, user.id, Some(limit)).await?,
    ))
}
