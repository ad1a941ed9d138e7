// src/models/user.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// Representa um utilizador lido da tabela 'users'
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    // Nunca sai na resposta JSON
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub phone: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Dados para criar um utilizador. A senha já vem em hash.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: String,
    pub is_admin: bool,
}

// Corpo JSON do registo
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: String,
}

// Corpo JSON do login
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

// Corpo JSON de /api/setup-admin
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupAdminForm {
    pub setup_password: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
}
