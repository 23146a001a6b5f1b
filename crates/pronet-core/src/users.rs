use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use pronet_db::Database;
use pronet_db::models::UserRow;
use pronet_types::models::{NewProfile, ProfileField, User};
use tracing::info;
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::{parse_db_time, parse_db_uuid};

/// Account registration and profile maintenance. Profile fields are only
/// ever written for the acting user's own id.
#[derive(Clone)]
pub struct UserService {
    db: Arc<Database>,
}

impl UserService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn register(&self, username: &str, password: &str, profile: NewProfile) -> Result<User> {
        if username.len() < 3 || username.len() > 32 {
            return Err(CoreError::InvalidArgument(
                "username must be 3-32 characters".into(),
            ));
        }
        if password.len() < 8 {
            return Err(CoreError::InvalidArgument(
                "password must be at least 8 characters".into(),
            ));
        }

        if self.db.get_user_by_username(username)?.is_some() {
            return Err(CoreError::UsernameTaken);
        }

        let password_hash = hash_password(password)?;
        let user_id = Uuid::new_v4();

        self.db.create_user(
            &user_id.to_string(),
            username,
            &password_hash,
            profile.email.as_deref(),
            profile.name.as_deref(),
            profile.date_of_birth.as_deref(),
        )?;

        info!(%user_id, username, "user registered");
        self.get(user_id)
    }

    pub fn get(&self, user_id: Uuid) -> Result<User> {
        let row = self
            .db
            .get_user_by_id(&user_id.to_string())?
            .ok_or(CoreError::NotFound)?;
        Ok(user_from_row(row))
    }

    /// Updates one profile field on the caller's own row.
    pub fn update_profile(&self, user_id: Uuid, field: ProfileField, value: Option<&str>) -> Result<()> {
        let column = match field {
            ProfileField::Email => "email",
            ProfileField::Name => "name",
            ProfileField::DateOfBirth => "date_of_birth",
        };

        let updated = self.db.update_user_field(&user_id.to_string(), column, value)?;
        if !updated {
            return Err(CoreError::NotFound);
        }
        Ok(())
    }

    /// Re-verifies the current password before storing the new hash.
    pub fn change_password(&self, user_id: Uuid, current: &str, new: &str) -> Result<()> {
        let row = self
            .db
            .get_user_by_id(&user_id.to_string())?
            .ok_or(CoreError::NotFound)?;

        verify_password(current, &row.password)?;

        if new.len() < 8 {
            return Err(CoreError::InvalidArgument(
                "password must be at least 8 characters".into(),
            ));
        }

        let password_hash = hash_password(new)?;
        self.db.update_user_password(&user_id.to_string(), &password_hash)?;
        info!(%user_id, "password changed");
        Ok(())
    }

    pub fn verify_credentials(&self, username: &str, password: &str) -> Result<User> {
        let row = self
            .db
            .get_user_by_username(username)?
            .ok_or(CoreError::InvalidCredentials)?;

        verify_password(password, &row.password)?;
        Ok(user_from_row(row))
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CoreError::Store(anyhow::anyhow!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, stored_hash: &str) -> Result<()> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| CoreError::Store(anyhow::anyhow!("stored password hash unreadable: {e}")))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| CoreError::InvalidCredentials)
}

fn user_from_row(row: UserRow) -> User {
    User {
        id: parse_db_uuid(&row.id, "user"),
        username: row.username,
        email: row.email,
        name: row.name,
        date_of_birth: row.date_of_birth,
        created_at: parse_db_time(&row.created_at, "user"),
    }
}
