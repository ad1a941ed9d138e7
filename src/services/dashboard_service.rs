// src/services/dashboard_service.rs
use crate::{
    error::AppResult,
    models::{
        dashboard::{AdminStats, StatusCount, UserStats},
        license::{License, LicenseStatus},
    },
    repositories::{license_repository, vehicle_repository},
};
use sqlx::SqlitePool;

/// Contadores do painel do utilizador.
pub async fn user_stats(db_pool: &SqlitePool, user_id: i64) -> AppResult<UserStats> {
    let mut conn = db_pool.acquire().await?;
    let licenses = license_repository::list_by_owner(&mut conn, user_id).await?;
    let vehicles = vehicle_repository::list_by_owner(&mut conn, user_id).await?;

    let stats = UserStats {
        license_count: licenses.iter().filter(|l| l.is_issued()).count(),
        pending_licenses: licenses
            .iter()
            .filter(|l| !l.is_draft() && !l.is_issued())
            .count(),
        vehicle_count: vehicles.len(),
    };
    tracing::debug!("Estatísticas do user {}: {:?}", user_id, stats);
    Ok(stats)
}

// Uma entrada por status, pela ordem canónica, mesmo com contagem zero
fn count_by_status(licenses: &[License]) -> Vec<StatusCount> {
    LicenseStatus::ALL
        .iter()
        .map(|status| StatusCount {
            status: *status,
            count: licenses.iter().filter(|l| l.status() == *status).count(),
        })
        .collect()
}

/// Contadores globais do admin sobre as licenças enviadas.
pub async fn admin_stats(db_pool: &SqlitePool) -> AppResult<AdminStats> {
    let mut conn = db_pool.acquire().await?;
    let licenses = license_repository::list_submitted(&mut conn, None).await?;
    Ok(AdminStats {
        total_licenses: licenses.len(),
        by_status: count_by_status(&licenses),
    })
}
