// src/web/mw_admin.rs
use crate::{error::AppError, web::mw_auth::CurrentUser};
use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::Response,
};

/// Middleware que só deixa passar administradores.
/// Deve ser executado *depois* do middleware `require_auth`.
pub async fn require_admin(
    Extension(user): Extension<CurrentUser>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !user.is_admin {
        tracing::warn!("Admin MW: Acesso negado para {} (não é admin).", user.id);
        return Err(AppError::Forbidden);
    }
    tracing::debug!("Admin MW: Acesso admin concedido para {}", user.id);
    Ok(next.run(request).await)
}
