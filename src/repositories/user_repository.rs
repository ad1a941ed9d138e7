// src/repositories/user_repository.rs
use crate::{
    error::{unique_violation_as, AppResult},
    models::user::{NewUser, User},
};
use chrono::Utc;
use sqlx::SqliteConnection;

pub async fn get(conn: &mut SqliteConnection, id: i64) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

/// Procura pelo email (a coluna é `COLLATE NOCASE`).
pub async fn get_by_email(conn: &mut SqliteConnection, email: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?1")
        .bind(email.trim())
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

pub async fn list_all(conn: &mut SqliteConnection) -> AppResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id ASC")
        .fetch_all(conn)
        .await?;
    Ok(users)
}

pub async fn list_admins(conn: &mut SqliteConnection) -> AppResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users WHERE is_admin = 1 ORDER BY id ASC")
        .fetch_all(conn)
        .await?;
    Ok(users)
}

/// Email repetido (mesmo em corrida com outro registo) é `InvalidInput`.
pub async fn create(conn: &mut SqliteConnection, data: &NewUser) -> AppResult<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, password_hash, full_name, phone, is_admin, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        RETURNING *
        "#,
    )
    .bind(data.email.trim())
    .bind(&data.password_hash)
    .bind(&data.full_name)
    .bind(&data.phone)
    .bind(data.is_admin)
    .bind(Utc::now())
    .fetch_one(conn)
    .await
    .map_err(unique_violation_as("Email já cadastrado"))?;
    tracing::debug!("Utilizador {} gravado com id {}", user.email, user.id);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, error::AppError, test_support::seed_user};

    #[tokio::test]
    async fn duplicate_email_at_insert_is_invalid_input() {
        let pool = db::test_pool().await;
        seed_user(&pool, "ana@frota.com", false).await;
        let mut conn = pool.acquire().await.unwrap();

        let result = create(
            &mut conn,
            &NewUser {
                email: "ANA@frota.com".into(),
                password_hash: "hash".into(),
                full_name: "Outra Ana".into(),
                phone: "11911112222".into(),
                is_admin: false,
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert_eq!(list_all(&mut conn).await.unwrap().len(), 1);
    }
}
