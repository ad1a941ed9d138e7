// src/services/auth_service.rs
use crate::{
    error::{AppError, AppResult},
    models::user::User,
    repositories::user_repository,
};
use sqlx::SqlitePool;

// Custo baixo nos testes para não os tornar lentos
const BCRYPT_COST: u32 = if cfg!(test) { 4 } else { bcrypt::DEFAULT_COST };

/// Verifica se a senha fornecida corresponde ao hash guardado.
pub async fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(&password, &stored_hash))
        .await
        .map_err(|e| {
            tracing::error!("Erro na task spawn_blocking (verify_password): {:?}", e);
            AppError::InternalServerError
        })?
        .map_err(|e| {
            tracing::error!("Erro bcrypt ao verificar senha: {:?}", e);
            AppError::PasswordHashingError
        })
}

/// Gera um hash bcrypt para uma senha.
pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(&password, BCRYPT_COST))
        .await
        .map_err(|e| {
            tracing::error!("Erro na task spawn_blocking (hash_password): {:?}", e);
            AppError::InternalServerError
        })?
        .map_err(|e| {
            tracing::error!("Erro bcrypt ao gerar hash: {:?}", e);
            AppError::PasswordHashingError
        })
}

/// Confirma email e senha. Falha sempre com a mesma mensagem genérica,
/// exista ou não o email.
pub async fn authenticate(db_pool: &SqlitePool, email: &str, password: &str) -> AppResult<User> {
    let user = {
        let mut conn = db_pool.acquire().await?;
        user_repository::get_by_email(&mut conn, email).await?
    };

    let Some(user) = user else {
        tracing::warn!("Login falhou: email '{}' não encontrado.", email);
        return Err(AppError::InvalidCredentials);
    };

    if verify_password(password, &user.password_hash).await? {
        tracing::info!("Utilizador {} autenticado.", user.id);
        Ok(user)
    } else {
        tracing::warn!("Login falhou: senha incorreta para '{}'.", email);
        Err(AppError::InvalidCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, models::user::NewUser};

    #[tokio::test]
    async fn hash_then_verify() {
        let hash = hash_password("segredo123").await.unwrap();
        assert!(verify_password("segredo123", &hash).await.unwrap());
        assert!(!verify_password("outra", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn authenticate_rejects_wrong_password_and_unknown_email() {
        let pool = db::test_pool().await;
        let hash = hash_password("segredo123").await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        user_repository::create(
            &mut conn,
            &NewUser {
                email: "ana@transportes.com".into(),
                password_hash: hash,
                full_name: "Ana".into(),
                phone: "11999990000".into(),
                is_admin: false,
            },
        )
        .await
        .unwrap();
        drop(conn);

        let user = authenticate(&pool, "ANA@transportes.com", "segredo123").await.unwrap();
        assert_eq!(user.full_name, "Ana");
        assert!(matches!(
            authenticate(&pool, "ana@transportes.com", "errada").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            authenticate(&pool, "ninguem@transportes.com", "segredo123").await,
            Err(AppError::InvalidCredentials)
        ));
    }
}
