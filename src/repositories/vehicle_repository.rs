// src/repositories/vehicle_repository.rs
use crate::{
    error::{unique_violation_as, AppResult},
    models::vehicle::{NewVehicle, Vehicle, VehiclePatch, VehicleType},
};
use chrono::Utc;
use sqlx::SqliteConnection;

const DUPLICATE_PLATE: &str = "Veículo com esta placa já cadastrado";

pub async fn get(conn: &mut SqliteConnection, id: i64) -> AppResult<Option<Vehicle>> {
    let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = ?1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(vehicle)
}

/// Procura pela placa sem distinguir maiúsculas/minúsculas.
pub async fn get_by_plate(conn: &mut SqliteConnection, plate: &str) -> AppResult<Option<Vehicle>> {
    let vehicle = sqlx::query_as::<_, Vehicle>(
        "SELECT * FROM vehicles WHERE license_plate = ?1 COLLATE NOCASE",
    )
    .bind(plate.trim())
    .fetch_optional(conn)
    .await?;
    Ok(vehicle)
}

pub async fn list_by_owner(conn: &mut SqliteConnection, user_id: i64) -> AppResult<Vec<Vehicle>> {
    let vehicles =
        sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE user_id = ?1 ORDER BY id ASC")
            .bind(user_id)
            .fetch_all(conn)
            .await?;
    Ok(vehicles)
}

pub async fn list_by_type(
    conn: &mut SqliteConnection,
    user_id: i64,
    vehicle_type: VehicleType,
) -> AppResult<Vec<Vehicle>> {
    let vehicles = sqlx::query_as::<_, Vehicle>(
        "SELECT * FROM vehicles WHERE user_id = ?1 AND vehicle_type = ?2 ORDER BY id ASC",
    )
    .bind(user_id)
    .bind(vehicle_type)
    .fetch_all(conn)
    .await?;
    Ok(vehicles)
}

/// Placa repetida (mesmo em corrida com outro cadastro) é `InvalidInput`.
pub async fn create(
    conn: &mut SqliteConnection,
    user_id: i64,
    data: &NewVehicle,
) -> AppResult<Vehicle> {
    let vehicle = sqlx::query_as::<_, Vehicle>(
        r#"
        INSERT INTO vehicles
            (license_plate, vehicle_type, weight, document_year, document_url, user_id, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        RETURNING *
        "#,
    )
    .bind(&data.license_plate)
    .bind(data.vehicle_type)
    .bind(data.weight)
    .bind(data.document_year)
    .bind(&data.document_url)
    .bind(user_id)
    .bind(Utc::now())
    .fetch_one(conn)
    .await
    .map_err(unique_violation_as(DUPLICATE_PLATE))?;
    Ok(vehicle)
}

/// Junta o patch ao registo. `None` se o id não existir.
pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    patch: VehiclePatch,
) -> AppResult<Option<Vehicle>> {
    let Some(existing) = get(&mut *conn, id).await? else {
        return Ok(None);
    };
    let merged = patch.apply(existing);

    let vehicle = sqlx::query_as::<_, Vehicle>(
        r#"
        UPDATE vehicles
        SET license_plate = ?1, vehicle_type = ?2, weight = ?3,
            document_year = ?4, document_url = ?5
        WHERE id = ?6
        RETURNING *
        "#,
    )
    .bind(&merged.license_plate)
    .bind(merged.vehicle_type)
    .bind(merged.weight)
    .bind(merged.document_year)
    .bind(&merged.document_url)
    .bind(id)
    .fetch_optional(conn)
    .await
    .map_err(unique_violation_as(DUPLICATE_PLATE))?;
    Ok(vehicle)
}

/// `true` se algum registo foi apagado.
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> AppResult<bool> {
    let rows_affected = sqlx::query("DELETE FROM vehicles WHERE id = ?1")
        .bind(id)
        .execute(conn)
        .await?
        .rows_affected();
    Ok(rows_affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db,
        error::AppError,
        test_support::{seed_user, seed_vehicle},
    };

    // Sem a verificação prévia do serviço, quem perde a corrida vê a constraint
    #[tokio::test]
    async fn duplicate_plate_at_insert_or_update_is_invalid_input() {
        let pool = db::test_pool().await;
        let owner = seed_user(&pool, "dono@frota.com", false).await;
        seed_vehicle(&pool, owner.id, "ABC1D23", VehicleType::UnidadeTratora).await;
        let other = seed_vehicle(&pool, owner.id, "XYZ9K87", VehicleType::Semirreboque).await;
        let mut conn = pool.acquire().await.unwrap();

        let duplicate = NewVehicle {
            license_plate: "abc1d23".into(),
            vehicle_type: VehicleType::Dolly,
            weight: 3000,
            document_year: 2022,
            document_url: None,
        };
        assert!(matches!(
            create(&mut conn, owner.id, &duplicate).await,
            Err(AppError::InvalidInput(_))
        ));

        let patch = VehiclePatch {
            license_plate: Some("ABC1D23".into()),
            ..Default::default()
        };
        assert!(matches!(
            update(&mut conn, other.id, patch).await,
            Err(AppError::InvalidInput(_))
        ));
        assert_eq!(list_by_owner(&mut conn, owner.id).await.unwrap().len(), 2);
    }
}
