// src/services/activity_service.rs
use crate::{
    error::AppResult,
    models::activity::{Activity, NewActivity},
    repositories::activity_repository,
};
use sqlx::{SqliteConnection, SqlitePool};

/// Número de atividades devolvidas ao painel quando o pedido não indica limite.
pub const DEFAULT_RECENT_LIMIT: i64 = 5;

/// Acrescenta uma entrada ao registo. Corre na conexão/transação do chamador
/// para que a atividade e a alteração que a originou fiquem juntas.
pub async fn record(conn: &mut SqliteConnection, entry: NewActivity) -> AppResult<Activity> {
    let activity = activity_repository::create(conn, &entry).await?;
    tracing::info!(
        "📝 Atividade {} (user {}): {}",
        activity.id,
        activity.user_id,
        activity.description
    );
    Ok(activity)
}

/// Atividades mais recentes do utilizador. Sem limite (ou com `0`) devolve todas.
pub async fn list_recent(
    db_pool: &SqlitePool,
    user_id: i64,
    limit: Option<i64>,
) -> AppResult<Vec<Activity>> {
    let mut conn = db_pool.acquire().await?;
    let activities = activity_repository::list_by_user(&mut conn, user_id, limit).await?;
    tracing::debug!(
        "Encontradas {} atividades para user {} (limite {:?}).",
        activities.len(),
        user_id,
        limit
    );
    Ok(activities)
}
