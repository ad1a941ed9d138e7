// src/repositories/mod.rs
//! Acesso aos dados. Funções sobre uma conexão SQLite, para poderem correr
//! tanto numa conexão do pool como dentro de uma transação.
//! Unicidade e regras de negócio ficam com os serviços.
pub mod activity_repository;
pub mod license_repository;
pub mod user_repository;
pub mod vehicle_repository;
