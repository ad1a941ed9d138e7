// src/repositories/license_repository.rs
use crate::{
    error::AppResult,
    models::license::{Jurisdiction, License, LicenseRow, LicenseSetType, LicenseStatus},
};
use chrono::Utc;
use sqlx::{types::Json, SqliteConnection};

/// Campos gravados na criação. A licença nasce sempre como rascunho;
/// o envio é uma atualização posterior na mesma transação.
#[derive(Debug, Clone)]
pub struct LicenseInsert {
    pub set_type: LicenseSetType,
    pub primary_vehicle_id: i64,
    pub first_trailer_id: Option<i64>,
    pub dolly_id: Option<i64>,
    pub second_trailer_id: Option<i64>,
    pub set_length: String,
    pub states: Vec<Jurisdiction>,
    pub status: LicenseStatus,
}

fn into_licenses(rows: Vec<LicenseRow>) -> AppResult<Vec<License>> {
    rows.into_iter().map(License::try_from).collect()
}

pub async fn get(conn: &mut SqliteConnection, id: i64) -> AppResult<Option<License>> {
    let row = sqlx::query_as::<_, LicenseRow>("SELECT * FROM licenses WHERE id = ?1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    row.map(License::try_from).transpose()
}

pub async fn list_by_owner(conn: &mut SqliteConnection, user_id: i64) -> AppResult<Vec<License>> {
    let rows = sqlx::query_as::<_, LicenseRow>(
        "SELECT * FROM licenses WHERE user_id = ?1 ORDER BY id ASC",
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    into_licenses(rows)
}

/// Todas as licenças enviadas (nunca rascunhos), opcionalmente filtradas por status.
pub async fn list_submitted(
    conn: &mut SqliteConnection,
    status: Option<LicenseStatus>,
) -> AppResult<Vec<License>> {
    let rows = match status {
        Some(status) => {
            sqlx::query_as::<_, LicenseRow>(
                r#"
                SELECT * FROM licenses
                WHERE is_draft = 0 AND status = ?1
                ORDER BY updated_at DESC, id DESC
                "#,
            )
            .bind(status)
            .fetch_all(conn)
            .await?
        }
        None => {
            sqlx::query_as::<_, LicenseRow>(
                "SELECT * FROM licenses WHERE is_draft = 0 ORDER BY updated_at DESC, id DESC",
            )
            .fetch_all(conn)
            .await?
        }
    };
    into_licenses(rows)
}

/// `true` se alguma licença (de qualquer utilizador) usa o veículo em qualquer papel.
pub async fn any_references_vehicle(
    conn: &mut SqliteConnection,
    vehicle_id: i64,
) -> AppResult<bool> {
    let found: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT id FROM licenses
        WHERE primary_vehicle_id = ?1
           OR first_trailer_id = ?1
           OR dolly_id = ?1
           OR second_trailer_id = ?1
        LIMIT 1
        "#,
    )
    .bind(vehicle_id)
    .fetch_optional(conn)
    .await?;
    Ok(found.is_some())
}

pub async fn create(
    conn: &mut SqliteConnection,
    user_id: i64,
    data: &LicenseInsert,
) -> AppResult<License> {
    let now = Utc::now();
    let row = sqlx::query_as::<_, LicenseRow>(
        r#"
        INSERT INTO licenses (
            is_draft, set_type, primary_vehicle_id, first_trailer_id, dolly_id, second_trailer_id,
            set_length, states, status, user_id, created_at, updated_at
        )
        VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
        RETURNING *
        "#,
    )
    .bind(data.set_type)
    .bind(data.primary_vehicle_id)
    .bind(data.first_trailer_id)
    .bind(data.dolly_id)
    .bind(data.second_trailer_id)
    .bind(&data.set_length)
    .bind(Json(&data.states))
    .bind(data.status)
    .bind(user_id)
    .bind(now)
    .fetch_one(conn)
    .await?;
    License::try_from(row)
}

/// Grava o estado completo da licença (já fundido pelo serviço) e atualiza `updated_at`.
/// `None` se o id não existir.
pub async fn update(conn: &mut SqliteConnection, license: &License) -> AppResult<Option<License>> {
    let row = sqlx::query_as::<_, LicenseRow>(
        r#"
        UPDATE licenses
        SET license_number = ?1,
            is_draft = ?2,
            set_type = ?3,
            primary_vehicle_id = ?4,
            first_trailer_id = ?5,
            dolly_id = ?6,
            second_trailer_id = ?7,
            set_length = ?8,
            states = ?9,
            status = ?10,
            license_file_url = ?11,
            issue_date = ?12,
            expiration_date = ?13,
            updated_at = ?14
        WHERE id = ?15
        RETURNING *
        "#,
    )
    .bind(license.license_number())
    .bind(license.is_draft())
    .bind(license.set_type)
    .bind(license.primary_vehicle_id)
    .bind(license.first_trailer_id)
    .bind(license.dolly_id)
    .bind(license.second_trailer_id)
    .bind(&license.set_length)
    .bind(Json(&license.states))
    .bind(license.status())
    .bind(license.license_file_url())
    .bind(license.issue_date())
    .bind(license.expiration_date())
    .bind(Utc::now())
    .bind(license.id)
    .fetch_optional(conn)
    .await?;
    row.map(License::try_from).transpose()
}

/// `true` se algum registo foi apagado.
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> AppResult<bool> {
    let rows_affected = sqlx::query("DELETE FROM licenses WHERE id = ?1")
        .bind(id)
        .execute(conn)
        .await?
        .rows_affected();
    Ok(rows_affected > 0)
}
