// src/web/mod.rs
pub mod admin_handlers;
pub mod auth_handlers;
pub mod dashboard_handlers;
pub mod license_handlers;
pub mod multipart_form;
pub mod mw_admin;
pub mod mw_auth;
pub mod routes;
pub mod vehicle_handlers;
