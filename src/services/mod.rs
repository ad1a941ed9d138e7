// src/services/mod.rs
pub mod activity_service;
pub mod auth_service;
pub mod dashboard_service;
pub mod license_service;
pub mod upload_service;
pub mod user_service;
pub mod vehicle_service;
