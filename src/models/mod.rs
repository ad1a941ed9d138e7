// src/models/mod.rs
pub mod activity;
pub mod dashboard;
pub mod license;
pub mod user;
pub mod vehicle;
