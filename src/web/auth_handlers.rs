// src/web/auth_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{LoginForm, RegisterForm, SetupAdminForm, User},
    services::{auth_service, user_service},
    state::AppState,
    web::mw_auth::{CurrentUser, SESSION_USER_KEY},
};
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tower_sessions::Session;

// Autentica a sessão para o utilizador
async fn start_session(session: &Session, user: &User) -> AppResult<()> {
    // Gera novo ID de sessão (segurança)
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao rodar ID: {}", e)))?;
    session
        .insert(SESSION_USER_KEY, user.id)
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao inserir na sessão: {}", e)))?;
    Ok(())
}

// POST /api/register
pub async fn handle_register(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<RegisterForm>,
) -> AppResult<impl IntoResponse> {
    let user = user_service::register_user(&state.db_pool, form).await?;
    start_session(&session, &user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

// POST /api/login
pub async fn handle_login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> AppResult<Json<User>> {
    tracing::info!("Tentativa de login para: {}", form.email);
    let user = auth_service::authenticate(&state.db_pool, &form.email, &form.password).await?;
    start_session(&session, &user).await?;
    tracing::info!("✅ Login bem-sucedido para: {}", user.id);
    Ok(Json(user))
}

// POST /api/logout
pub async fn handle_logout(session: Session) -> AppResult<StatusCode> {
    let user_id: Option<i64> = session.get(SESSION_USER_KEY).await.ok().flatten();

    // Apaga todos os dados da sessão atual
    session
        .delete()
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao apagar sessão: {}", e)))?;

    match user_id {
        Some(id) => tracing::info!("🚪 Utilizador '{}' desligado.", id),
        None => tracing::info!("🚪 Sessão anónima desligada."),
    }
    Ok(StatusCode::OK)
}

// GET /api/user
pub async fn current_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<Json<User>> {
    let user = user_service::find_user_by_id(&state.db_pool, current.id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(Json(user))
}

// POST /api/setup-admin
pub async fn handle_setup_admin(
    State(state): State<AppState>,
    Json(form): Json<SetupAdminForm>,
) -> AppResult<impl IntoResponse> {
    let admin = user_service::setup_admin(
        &state.db_pool,
        state.config.setup_password.as_deref(),
        form,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Administrador configurado com sucesso",
            "user": admin,
        })),
    ))
}
