// src/test_support.rs
// Dados de apoio partilhados pelos testes.
use crate::{
    models::{
        user::{NewUser, User},
        vehicle::{NewVehicle, Vehicle, VehicleType},
    },
    repositories::{user_repository, vehicle_repository},
};
use sqlx::SqlitePool;

pub async fn seed_user(pool: &SqlitePool, email: &str, is_admin: bool) -> User {
    let mut conn = pool.acquire().await.unwrap();
    user_repository::create(
        &mut conn,
        &NewUser {
            email: email.into(),
            password_hash: "hash".into(),
            full_name: "Teste".into(),
            phone: "11900000000".into(),
            is_admin,
        },
    )
    .await
    .unwrap()
}

pub async fn seed_vehicle(
    pool: &SqlitePool,
    owner_id: i64,
    plate: &str,
    vehicle_type: VehicleType,
) -> Vehicle {
    let mut conn = pool.acquire().await.unwrap();
    vehicle_repository::create(
        &mut conn,
        owner_id,
        &NewVehicle {
            license_plate: plate.into(),
            vehicle_type,
            weight: 8500,
            document_year: 2024,
            document_url: None,
        },
    )
    .await
    .unwrap()
}
