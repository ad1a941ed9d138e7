// src/models/activity.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

// Entrada do registo de atividades (só acrescenta, nunca altera)
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: i64,
    pub description: String,
    pub license_id: Option<i64>,
    pub vehicle_id: Option<i64>,
    pub user_id: i64, // Quem executou a ação
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewActivity {
    pub description: String,
    pub license_id: Option<i64>,
    pub vehicle_id: Option<i64>,
    pub user_id: i64,
}

impl NewActivity {
    pub fn for_license(license_id: i64, user_id: i64, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            license_id: Some(license_id),
            vehicle_id: None,
            user_id,
        }
    }

    pub fn for_vehicle(vehicle_id: i64, user_id: i64, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            license_id: None,
            vehicle_id: Some(vehicle_id),
            user_id,
        }
    }
}
