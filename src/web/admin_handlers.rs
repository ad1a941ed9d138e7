// src/web/admin_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        dashboard::AdminStats,
        license::{IssueMetadata, License, LicenseStatus},
        user::User,
    },
    services::{dashboard_service, license_service, upload_service, user_service},
    state::AppState,
    web::{multipart_form::MultipartForm, mw_auth::CurrentUser},
};
use axum::{
    extract::{Extension, Multipart, Path, Query, State},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

const LICENSE_FILE_FIELD: &str = "licenseFile";

#[derive(Deserialize, Debug)]
pub struct LicenseFilter {
    status: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct StatusForm {
    status: String,
}

// Aceita RFC 3339 ou só a data (meia-noite UTC)
fn parse_date(field: &str, raw: &str) -> AppResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| AppError::InvalidInput(format!("Data inválida em {}: '{}'", field, raw)))
}

// GET /api/admin/licenses?status=
pub async fn list_licenses(
    State(state): State<AppState>,
    Query(filter): Query<LicenseFilter>,
) -> AppResult<Json<Vec<License>>> {
    let status = match filter.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<LicenseStatus>()?),
    };
    Ok(Json(license_service::list_all(&state.db_pool, status).await?))
}

// GET /api/admin/status-options
pub async fn status_options() -> Json<Vec<&'static str>> {
    Json(LicenseStatus::ALL.iter().map(LicenseStatus::as_str).collect())
}

// PUT /api/admin/licenses/{id}/status
pub async fn set_license_status(
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(form): Json<StatusForm>,
) -> AppResult<Json<License>> {
    Ok(Json(
        license_service::set_status(&state.db_pool, id, &form.status, admin.id).await?,
    ))
}

// PUT /api/admin/licenses/{id}/file (multipart)
pub async fn issue_license_file(
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentUser>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> AppResult<Json<License>> {
    let form = MultipartForm::read(multipart, LICENSE_FILE_FIELD).await?;
    let file = form
        .file
        .as_ref()
        .ok_or_else(|| AppError::InvalidInput("Nenhum arquivo enviado".to_string()))?;

    let metadata = IssueMetadata {
        license_number: form.text("licenseNumber").map(str::to_string),
        issue_date: form
            .text("issueDate")
            .map(|raw| parse_date("issueDate", raw))
            .transpose()?,
        expiration_date: form
            .text("expirationDate")
            .map(|raw| parse_date("expirationDate", raw))
            .transpose()?,
    };

    let upload_dir = &state.config.upload_dir;
    let file_path = upload_service::store_upload(upload_dir, file).await?;
    match license_service::issue_file(&state.db_pool, id, file_path.clone(), metadata, admin.id)
        .await
    {
        Ok(license) => Ok(Json(license)),
        Err(e) => {
            // Emissão recusada: o ficheiro não pode ficar publicado
            upload_service::discard_upload(upload_dir, &file_path).await;
            Err(e)
        }
    }
}

// GET /api/admin/stats
pub async fn admin_stats(State(state): State<AppState>) -> AppResult<Json<AdminStats>> {
    Ok(Json(dashboard_service::admin_stats(&state.db_pool).await?))
}

// GET /api/admin/users
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(user_service::find_all_users(&state.db_pool).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn dates_accept_rfc3339_and_plain_days() {
        assert_eq!(
            parse_date("issueDate", "2025-03-01").unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_date("issueDate", "2025-03-01T12:30:00-03:00").unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 1, 15, 30, 0).unwrap()
        );
        assert!(matches!(
            parse_date("issueDate", "01/03/2025"),
            Err(AppError::InvalidInput(_))
        ));
    }
}
