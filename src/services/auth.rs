//! Login and password hashing

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{User, UserClaims},
    repository::UserStore,
};

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, config: AuthConfig) -> Self {
        Self { users, config }
    }

    /// Check credentials and issue a JWT for the user
    pub async fn login(&self, username: &str, password: &str) -> AppResult<(String, UserClaims)> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid credentials".to_string()))?;

        if !verify_password(&user, password)? {
            tracing::info!("Rejected login for {}", username);
            return Err(AppError::Authentication("Invalid credentials".to_string()));
        }

        let claims = UserClaims::for_user(&user, self.config.jwt_expiration_hours);
        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        tracing::info!("User {} logged in", user.username);
        Ok((token, claims))
    }

    pub fn expires_in_seconds(&self) -> u64 {
        self.config.jwt_expiration_hours * 3600
    }
}

fn verify_password(user: &User, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::CAN_MARK_RETURNED, repository::MockUserStore};

    fn service(store: MockUserStore) -> AuthService {
        AuthService::new(Arc::new(store), AuthConfig::default())
    }

    fn librarian() -> User {
        User {
            id: 4,
            username: "librarian".to_string(),
            password_hash: hash_password("s3cret").unwrap(),
            is_superuser: false,
            permissions: vec![CAN_MARK_RETURNED.to_string()],
        }
    }

    #[tokio::test]
    async fn login_issues_verifiable_token() {
        let mut store = MockUserStore::new();
        store
            .expect_find_by_username()
            .withf(|username| username == "librarian")
            .returning(|_| Ok(Some(librarian())));

        let auth = service(store);
        let (token, claims) = auth.login("librarian", "s3cret").await.unwrap();

        let parsed = UserClaims::from_token(&token, &AuthConfig::default().jwt_secret).unwrap();
        assert_eq!(parsed, claims);
        assert_eq!(parsed.user_id, 4);
        assert!(parsed.has_capability(CAN_MARK_RETURNED));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_rejected() {
        let mut store = MockUserStore::new();
        store
            .expect_find_by_username()
            .withf(|username| username == "librarian")
            .returning(|_| Ok(Some(librarian())));
        store
            .expect_find_by_username()
            .withf(|username| username == "nobody")
            .returning(|_| Ok(None));

        let auth = service(store);
        assert!(matches!(
            auth.login("librarian", "guess").await,
            Err(AppError::Authentication(_))
        ));
        assert!(matches!(
            auth.login("nobody", "s3cret").await,
            Err(AppError::Authentication(_))
        ));
    }
}
