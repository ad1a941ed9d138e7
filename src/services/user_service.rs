// src/services/user_service.rs
use crate::{
    config::AdminCredentials,
    error::{AppError, AppResult},
    models::user::{NewUser, RegisterForm, SetupAdminForm, User},
    repositories::user_repository,
    services::auth_service,
};
use sqlx::SqlitePool;

const MIN_PASSWORD_LEN: usize = 6;

/// Busca um utilizador pelo seu ID.
pub async fn find_user_by_id(db_pool: &SqlitePool, user_id: i64) -> AppResult<Option<User>> {
    tracing::debug!("Buscando utilizador por ID: {}", user_id);
    let mut conn = db_pool.acquire().await?;
    user_repository::get(&mut conn, user_id).await
}

/// Lista todos os utilizadores (o hash da senha não é serializado).
pub async fn find_all_users(db_pool: &SqlitePool) -> AppResult<Vec<User>> {
    let mut conn = db_pool.acquire().await?;
    let users = user_repository::list_all(&mut conn).await?;
    tracing::debug!("Encontrados {} utilizadores.", users.len());
    Ok(users)
}

fn validate_credentials(email: &str, password: &str) -> AppResult<()> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::InvalidInput("Email inválido".to_string()));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidInput(format!(
            "A senha deve ter pelo menos {} caracteres",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

// Cria o utilizador depois de verificar que o email está livre
async fn create_user(db_pool: &SqlitePool, data: NewUser) -> AppResult<User> {
    let mut tx = db_pool.begin().await?;

    if user_repository::get_by_email(&mut *tx, &data.email).await?.is_some() {
        tracing::warn!("Criação falhou: email '{}' já existe.", data.email);
        return Err(AppError::InvalidInput("Email já cadastrado".to_string()));
    }

    let user = user_repository::create(&mut *tx, &data).await?;
    tx.commit().await?;
    tracing::info!("✅ Utilizador '{}' criado com id {}.", user.email, user.id);
    Ok(user)
}

/// Registo público de um novo utilizador (nunca admin).
pub async fn register_user(db_pool: &SqlitePool, form: RegisterForm) -> AppResult<User> {
    tracing::info!("Tentando registar utilizador: {}", form.email);
    validate_credentials(&form.email, &form.password)?;
    if form.full_name.trim().is_empty() || form.phone.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Nome completo e telefone são obrigatórios".to_string(),
        ));
    }

    let password_hash = auth_service::hash_password(&form.password).await?;
    create_user(
        db_pool,
        NewUser {
            email: form.email.trim().to_string(),
            password_hash,
            full_name: form.full_name.trim().to_string(),
            phone: form.phone.trim().to_string(),
            is_admin: false,
        },
    )
    .await
}

async fn create_admin(
    db_pool: &SqlitePool,
    email: &str,
    password: &str,
    phone: &str,
) -> AppResult<User> {
    validate_credentials(email, password)?;
    let password_hash = auth_service::hash_password(password).await?;
    create_user(
        db_pool,
        NewUser {
            email: email.trim().to_string(),
            password_hash,
            full_name: "Administrador".to_string(),
            phone: phone.to_string(),
            is_admin: true,
        },
    )
    .await
}

async fn admin_exists(db_pool: &SqlitePool) -> AppResult<bool> {
    let mut conn = db_pool.acquire().await?;
    Ok(!user_repository::list_admins(&mut conn).await?.is_empty())
}

/// Configuração inicial do primeiro admin via /api/setup-admin.
/// `expected_password` vem da configuração; sem ela a operação está desligada.
pub async fn setup_admin(
    db_pool: &SqlitePool,
    expected_password: Option<&str>,
    form: SetupAdminForm,
) -> AppResult<User> {
    let Some(expected) = expected_password else {
        tracing::warn!("Setup de admin pedido mas SETUP_PASSWORD não está definida.");
        return Err(AppError::Forbidden);
    };
    if form.setup_password != expected {
        tracing::warn!("Setup de admin com senha de instalação inválida.");
        return Err(AppError::Unauthorized);
    }
    if admin_exists(db_pool).await? {
        return Err(AppError::InvalidState(
            "Conta de administrador já configurada".to_string(),
        ));
    }

    let phone = form.phone.unwrap_or_else(|| "0000000000".to_string());
    create_admin(db_pool, &form.email, &form.password, &phone).await
}

/// Cria o admin de arranque se ainda não existir nenhum admin.
pub async fn ensure_bootstrap_admin(
    db_pool: &SqlitePool,
    credentials: &AdminCredentials,
) -> AppResult<Option<User>> {
    if admin_exists(db_pool).await? {
        tracing::debug!("Admin já existe, arranque sem seed.");
        return Ok(None);
    }
    let admin =
        create_admin(db_pool, &credentials.email, &credentials.password, "0000000000").await?;
    tracing::info!("👤 Admin de arranque '{}' criado com id {}.", admin.email, admin.id);
    Ok(Some(admin))
}
