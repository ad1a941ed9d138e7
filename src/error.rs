// src/error.rs
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // --- Falhas de domínio (o chamador traduz para mensagem ao utilizador) ---
    #[error("Registo não encontrado")]
    NotFound,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Dados inválidos: {0}")]
    InvalidInput(String),

    #[error("Operação inválida no estado atual: {0}")]
    InvalidState(String),

    // --- Falhas de infraestrutura ---
    #[error("Erro na base de dados: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Erro de migração da base de dados: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Erro de variável de ambiente: {0}")]
    EnvVarError(#[from] std::env::VarError),

    #[error("Erro de ficheiro: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Erro ao processar password")]
    PasswordHashingError,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Erro na sessão: {0}")]
    SessionError(String),

    // Linha da base de dados que viola as regras do ciclo de vida
    #[error("Registo corrompido: {0}")]
    CorruptRecord(String),

    #[error("Erro interno inesperado")]
    InternalServerError,

    #[error("Não autorizado")]
    Unauthorized,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::InvalidInput(_) | AppError::InvalidState(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Como converter AppError numa resposta HTTP
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Erro processado: {:?}", self);
        } else {
            tracing::warn!("Pedido recusado ({}): {}", status.as_u16(), self);
        }

        let user_message = match self {
            // Mensagens de domínio já são seguras para mostrar
            AppError::InvalidInput(msg) | AppError::InvalidState(msg) => msg,
            AppError::NotFound => "Registo não encontrado".to_string(),
            AppError::Forbidden => "Acesso negado".to_string(),
            AppError::InvalidCredentials => "Email ou senha inválidos.".to_string(),
            AppError::Unauthorized => "Não autenticado".to_string(),
            AppError::SqlxError(_) | AppError::SqlxMigrateError(_) | AppError::CorruptRecord(_) => {
                "Erro ao aceder aos dados.".to_string()
            }
            AppError::EnvVarError(_) => "Erro de configuração.".to_string(),
            AppError::IoError(_) => "Erro ao guardar o ficheiro.".to_string(),
            AppError::PasswordHashingError => "Erro ao processar credenciais.".to_string(),
            AppError::SessionError(_) => "Erro na gestão da sua sessão.".to_string(),
            AppError::InternalServerError => "Ocorreu um erro inesperado.".to_string(),
        };

        (status, Json(json!({ "message": user_message }))).into_response()
    }
}

// Tipo Result padrão para a aplicação
pub type AppResult<T = ()> = Result<T, AppError>;

/// Violação de UNIQUE vira `InvalidInput` com a mensagem dada; o resto
/// continua a ser erro de base de dados.
pub fn unique_violation_as(message: &str) -> impl Fn(sqlx::Error) -> AppError + '_ {
    move |e| match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            tracing::warn!("Chave única repetida: {}", db);
            AppError::InvalidInput(message.to_string())
        }
        other => AppError::SqlxError(other),
    }
}
