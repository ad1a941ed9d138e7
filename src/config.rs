// src/config.rs
use crate::error::{AppError, AppResult};
use std::{env, net::SocketAddr, path::PathBuf};

/// Configuração lida das variáveis de ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub upload_dir: PathBuf,
    // Senha exigida por /api/setup-admin; sem ela a rota fica desligada
    pub setup_password: Option<String>,
    // Admin criado no arranque se ainda não existir nenhum
    pub bootstrap_admin: Option<AdminCredentials>,
}

#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")?;

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::InvalidInput(format!("BIND_ADDR inválido: {}", e)))?;

        let upload_dir = PathBuf::from(env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()));

        let setup_password = non_empty_var("SETUP_PASSWORD");

        let admin_vars = (non_empty_var("ADMIN_EMAIL"), non_empty_var("ADMIN_PASSWORD"));
        let bootstrap_admin = match admin_vars {
            (Some(email), Some(password)) => Some(AdminCredentials { email, password }),
            (None, None) => None,
            _ => {
                tracing::warn!(
                    "⚠️ ADMIN_EMAIL e ADMIN_PASSWORD devem ser definidos juntos. Ignorando."
                );
                None
            }
        };

        Ok(Self {
            database_url,
            bind_addr,
            upload_dir,
            setup_password,
            bootstrap_admin,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
