use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use sqlx::FromRow;
use tracing::info;
use uuid::Uuid;

use super::types::AuthProvider;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::utils::time::current_timestamp_seconds;

#[derive(Debug, FromRow)]
struct AuthRow {
    id: String,
    password: String,
    active: bool,
}

/// Email/password accounts in the local database. The signed-in user is kept
/// in the single-row `session` table so it survives restarts.
pub struct SqlAuthProvider {
    db: Database,
}

impl SqlAuthProvider {
    pub fn new(db: Database) -> Self {
        SqlAuthProvider { db }
    }

    async fn get_auth_by_email(&self, email: &str) -> AppResult<Option<AuthRow>> {
        let result = sqlx::query_as::<_, AuthRow>(
            r#"
            SELECT id, password, active
            FROM auth
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(result)
    }
}

#[async_trait]
impl AuthProvider for SqlAuthProvider {
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<String> {
        let email = normalize_email(email);
        if self.get_auth_by_email(&email).await?.is_some() {
            return Err(AppError::UserAlreadyExists);
        }

        let id = Uuid::new_v4().to_string();
        let password_hash = hash_password(password)?;
        let now = current_timestamp_seconds();

        sqlx::query(
            r#"
            INSERT INTO auth (id, email, password, active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&email)
        .bind(password_hash)
        .bind(true)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        info!("User with email '{}' is registered with id '{}'", email, id);
        Ok(id)
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<String> {
        let email = normalize_email(email);
        let auth = self
            .get_auth_by_email(&email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !auth.active {
            return Err(AppError::Unauthorized("Account is not active".to_string()));
        }
        if !verify_password(password, &auth.password)? {
            return Err(AppError::InvalidCredentials);
        }

        sqlx::query(
            r#"
            INSERT INTO session (slot, user_id, created_at)
            VALUES (1, ?, ?)
            ON CONFLICT (slot) DO UPDATE SET user_id = excluded.user_id, created_at = excluded.created_at
            "#,
        )
        .bind(&auth.id)
        .bind(current_timestamp_seconds())
        .execute(self.db.pool())
        .await?;

        info!("User with email '{}' is logged in with id '{}'", email, auth.id);
        Ok(auth.id)
    }

    async fn sign_out(&self) -> AppResult<()> {
        sqlx::query("DELETE FROM session")
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    async fn current_user_id(&self) -> AppResult<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT user_id FROM session WHERE slot = 1")
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.map(|(user_id,)| user_id))
    }

    async fn delete_user(&self, user_id: &str) -> AppResult<()> {
        let mut tx = self.db.pool().begin().await?;

        sqlx::query("DELETE FROM session WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM auth WHERE id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user {}", user_id)));
        }

        info!("Deleted account {}", user_id);
        Ok(())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
