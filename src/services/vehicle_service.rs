// src/services/vehicle_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        activity::NewActivity,
        vehicle::{normalize_plate, NewVehicle, Vehicle, VehiclePatch, VehicleType},
    },
    repositories::{license_repository, vehicle_repository},
    services::activity_service,
};
use chrono::{Datelike, Utc};
use sqlx::{SqliteConnection, SqlitePool};

fn validate_weight(weight: i64) -> AppResult<()> {
    if weight <= 0 {
        return Err(AppError::InvalidInput("A tara deve ser maior que zero".to_string()));
    }
    Ok(())
}

// Ano do CRLV entre 1900 e o próximo ano
fn validate_document_year(year: i64) -> AppResult<()> {
    let max_year = i64::from(Utc::now().year()) + 1;
    if !(1900..=max_year).contains(&year) {
        return Err(AppError::InvalidInput(format!("Ano do documento inválido: {}", year)));
    }
    Ok(())
}

fn validate_plate(plate: &str) -> AppResult<()> {
    let valid_chars = plate.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if plate.is_empty() || plate.len() > 10 || !valid_chars {
        return Err(AppError::InvalidInput(format!("Placa inválida: '{}'", plate)));
    }
    Ok(())
}

// A placa não pode existir noutro veículo (comparação sem maiúsculas)
async fn ensure_plate_free(
    conn: &mut SqliteConnection,
    plate: &str,
    except_id: Option<i64>,
) -> AppResult<()> {
    if let Some(existing) = vehicle_repository::get_by_plate(conn, plate).await? {
        if Some(existing.id) != except_id {
            tracing::warn!("Placa '{}' já cadastrada no veículo {}.", plate, existing.id);
            return Err(AppError::InvalidInput(
                "Veículo com esta placa já cadastrado".to_string(),
            ));
        }
    }
    Ok(())
}

// Carrega o veículo e confirma que pertence ao utilizador
async fn load_owned(conn: &mut SqliteConnection, id: i64, user_id: i64) -> AppResult<Vehicle> {
    let vehicle = vehicle_repository::get(conn, id).await?.ok_or(AppError::NotFound)?;
    if vehicle.user_id != user_id {
        tracing::warn!("User {} tentou aceder ao veículo {} de outro dono.", user_id, id);
        return Err(AppError::Forbidden);
    }
    Ok(vehicle)
}

pub async fn get_vehicle(db_pool: &SqlitePool, id: i64, user_id: i64) -> AppResult<Vehicle> {
    let mut conn = db_pool.acquire().await?;
    load_owned(&mut conn, id, user_id).await
}

pub async fn list_vehicles(db_pool: &SqlitePool, user_id: i64) -> AppResult<Vec<Vehicle>> {
    let mut conn = db_pool.acquire().await?;
    vehicle_repository::list_by_owner(&mut conn, user_id).await
}

pub async fn list_vehicles_by_type(
    db_pool: &SqlitePool,
    user_id: i64,
    vehicle_type: VehicleType,
) -> AppResult<Vec<Vehicle>> {
    let mut conn = db_pool.acquire().await?;
    vehicle_repository::list_by_type(&mut conn, user_id, vehicle_type).await
}

/// Cadastra um veículo e regista a atividade correspondente.
pub async fn create_vehicle(
    db_pool: &SqlitePool,
    owner_id: i64,
    mut data: NewVehicle,
) -> AppResult<Vehicle> {
    data.license_plate = normalize_plate(&data.license_plate);
    validate_plate(&data.license_plate)?;
    validate_weight(data.weight)?;
    validate_document_year(data.document_year)?;

    let mut tx = db_pool.begin().await?;
    ensure_plate_free(&mut tx, &data.license_plate, None).await?;

    let vehicle = vehicle_repository::create(&mut tx, owner_id, &data).await?;
    activity_service::record(
        &mut tx,
        NewActivity::for_vehicle(
            vehicle.id,
            owner_id,
            format!(
                "Novo veículo cadastrado - {} {}",
                vehicle.vehicle_type.as_str(),
                vehicle.license_plate
            ),
        ),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        "🚛 Veículo {} ({}) cadastrado por user {}.",
        vehicle.id,
        vehicle.license_plate,
        owner_id
    );
    Ok(vehicle)
}

/// Atualiza os campos enviados de um veículo do próprio utilizador.
pub async fn update_vehicle(
    db_pool: &SqlitePool,
    id: i64,
    mut patch: VehiclePatch,
    user_id: i64,
) -> AppResult<Vehicle> {
    if let Some(plate) = patch.license_plate.as_deref() {
        let plate = normalize_plate(plate);
        validate_plate(&plate)?;
        patch.license_plate = Some(plate);
    }
    if let Some(weight) = patch.weight {
        validate_weight(weight)?;
    }
    if let Some(year) = patch.document_year {
        validate_document_year(year)?;
    }

    let mut tx = db_pool.begin().await?;
    let existing = load_owned(&mut tx, id, user_id).await?;
    if patch.is_empty() {
        return Ok(existing);
    }
    if let Some(plate) = patch.license_plate.as_deref() {
        ensure_plate_free(&mut tx, plate, Some(id)).await?;
    }

    let vehicle = vehicle_repository::update(&mut tx, id, patch)
        .await?
        .ok_or(AppError::NotFound)?;
    tx.commit().await?;
    tracing::info!("Veículo {} atualizado por user {}.", id, user_id);
    Ok(vehicle)
}

/// Apaga um veículo que nenhuma licença referencia.
pub async fn delete_vehicle(db_pool: &SqlitePool, id: i64, user_id: i64) -> AppResult<()> {
    let mut tx = db_pool.begin().await?;
    load_owned(&mut tx, id, user_id).await?;

    if license_repository::any_references_vehicle(&mut tx, id).await? {
        tracing::warn!("Veículo {} em uso, exclusão recusada.", id);
        return Err(AppError::InvalidState(
            "Veículo está em uso em uma ou mais licenças e não pode ser excluído".to_string(),
        ));
    }

    if !vehicle_repository::delete(&mut tx, id).await? {
        return Err(AppError::NotFound);
    }
    tx.commit().await?;
    tracing::info!("🗑️ Veículo {} excluído por user {}.", id, user_id);
    Ok(())
}
