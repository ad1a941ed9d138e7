// src/web/mw_auth.rs
use crate::{error::AppError, services::user_service, state::AppState};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tower_sessions::Session;

/// Chave da sessão onde fica o id do utilizador autenticado.
pub const SESSION_USER_KEY: &str = "user_id";

/// Utilizador autenticado, posto nas extensões do pedido por `require_auth`.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub is_admin: bool,
}

// Middleware que verifica se o utilizador está logado
pub async fn require_auth(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = session
        .get::<i64>(SESSION_USER_KEY)
        .await
        .map_err(|e| {
            tracing::error!("Autenticação MW: Erro ao ler sessão: {:?}", e);
            AppError::SessionError(format!("Erro ao verificar sessão: {}", e))
        })?;

    let Some(user_id) = user_id else {
        tracing::debug!("Autenticação MW: Não autenticado (sem user_id).");
        return Err(AppError::Unauthorized);
    };

    // A sessão pode sobreviver ao utilizador
    let Some(user) = user_service::find_user_by_id(&state.db_pool, user_id).await? else {
        tracing::warn!("Autenticação MW: sessão aponta para user {} inexistente.", user_id);
        return Err(AppError::Unauthorized);
    };

    tracing::debug!("Autenticação MW: Utilizador {} autenticado.", user.id);
    request.extensions_mut().insert(CurrentUser {
        id: user.id,
        email: user.email,
        is_admin: user.is_admin,
    });

    Ok(next.run(request).await)
}
