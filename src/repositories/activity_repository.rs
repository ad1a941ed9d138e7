// src/repositories/activity_repository.rs
use crate::{
    error::AppResult,
    models::activity::{Activity, NewActivity},
};
use chrono::Utc;
use sqlx::SqliteConnection;

pub async fn create(conn: &mut SqliteConnection, data: &NewActivity) -> AppResult<Activity> {
    let activity = sqlx::query_as::<_, Activity>(
        r#"
        INSERT INTO activities (description, license_id, vehicle_id, user_id, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        RETURNING *
        "#,
    )
    .bind(&data.description)
    .bind(data.license_id)
    .bind(data.vehicle_id)
    .bind(data.user_id)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    Ok(activity)
}

/// Atividades do utilizador, mais recentes primeiro. `limit` ausente ou
/// `<= 0` devolve todas.
pub async fn list_by_user(
    conn: &mut SqliteConnection,
    user_id: i64,
    limit: Option<i64>,
) -> AppResult<Vec<Activity>> {
    // LIMIT -1 no SQLite significa "sem limite"
    let activities = sqlx::query_as::<_, Activity>(
        r#"
        SELECT * FROM activities
        WHERE user_id = ?1
        ORDER BY created_at DESC, id DESC
        LIMIT ?2
        "#,
    )
    .bind(user_id)
    .bind(limit.filter(|n| *n > 0).unwrap_or(-1))
    .fetch_all(conn)
    .await?;
    Ok(activities)
}
