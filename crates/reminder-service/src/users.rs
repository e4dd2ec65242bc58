//! User account service
//!
//! Registration, login, and device token management. Raw passwords stop
//! here: only the argon2 hash ever reaches the store.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use reminder_common::{hash_password, verify_password};
use reminder_core::{
    decode_push_tokens, encode_push_tokens, DomainError, EntityKind, FieldValue, RawFields, User,
};
use reminder_db::EntityStore;

use crate::error::{ServiceError, ServiceResult};

const MIN_PASSWORD_LENGTH: usize = 8;

/// User account service
pub struct UserService {
    store: Arc<EntityStore>,
}

impl UserService {
    /// Create a new UserService
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self { store }
    }

    /// Register a new user.
    ///
    /// Expects a `password` key in the raw data; it is swapped for the
    /// `password_hash` field before anything is persisted.
    #[instrument(skip(self, raw))]
    pub async fn register(&self, raw: &RawFields) -> ServiceResult<User> {
        let password = raw
            .get("password")
            .and_then(FieldValue::as_text)
            .unwrap_or_default();
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(ServiceError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
            )));
        }

        let email = raw
            .get("email")
            .and_then(FieldValue::as_text)
            .unwrap_or_default();
        let taken = self
            .store
            .find_by_field(EntityKind::User, "email", email.into(), None, None)
            .await?
            .is_some();
        if taken {
            return Err(ServiceError::validation("Email already registered"));
        }

        let password_hash =
            hash_password(password).map_err(|e| ServiceError::internal(e.to_string()))?;

        let mut data = raw.clone();
        data.remove("password");
        data.insert("password_hash".to_string(), password_hash.into());

        let record = self.store.create(EntityKind::User, &data, None).await?;
        let user = User::from_record(&record);

        info!(user_id = user.id, "user registered");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// Every failure mode collapses into [`ServiceError::InvalidCredentials`].
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<User> {
        let record = self
            .store
            .find_by_field(EntityKind::User, "email", email.into(), None, None)
            .await?
            .ok_or_else(|| {
                warn!(email, "login failed: user not found");
                ServiceError::InvalidCredentials
            })?;

        let mut user = User::from_record(&record);

        let is_valid = verify_password(password, &user.password_hash).unwrap_or(false);
        if !is_valid {
            warn!(user_id = user.id, "login failed: invalid password");
            return Err(ServiceError::InvalidCredentials);
        }

        info!(user_id = user.id, "user logged in");

        // The hash never leaves the service layer
        user.password_hash.clear();
        Ok(user)
    }

    /// Register a device token for push delivery. Adding a token the
    /// user already has is a no-op.
    #[instrument(skip(self, token))]
    pub async fn add_push_token(&self, user_id: i64, token: &str) -> ServiceResult<User> {
        self.modify_push_tokens(user_id, |tokens| {
            if !tokens.iter().any(|t| t == token) {
                tokens.push(token.to_string());
            }
        })
        .await
    }

    /// Drop a device token. Removing a token the user never had is a no-op.
    #[instrument(skip(self, token))]
    pub async fn remove_push_token(&self, user_id: i64, token: &str) -> ServiceResult<User> {
        self.modify_push_tokens(user_id, |tokens| {
            tokens.retain(|t| t != token);
        })
        .await
    }

    async fn modify_push_tokens(
        &self,
        user_id: i64,
        apply: impl FnOnce(&mut Vec<String>),
    ) -> ServiceResult<User> {
        let record = self
            .store
            .find_by_field(
                EntityKind::User,
                "id",
                FieldValue::Int(user_id),
                Some(self.store.statuses().active()),
                None,
            )
            .await?
            .ok_or(DomainError::EntityNotFound {
                kind: EntityKind::User.as_str(),
                id: user_id,
            })?;

        let mut tokens = decode_push_tokens(record.text("push_tokens"));
        apply(&mut tokens);

        let mut data = RawFields::new();
        data.insert("push_tokens".to_string(), encode_push_tokens(&tokens));

        let record = self
            .store
            .update(EntityKind::User, user_id, &data, None, false)
            .await?;

        Ok(User::from_record(&record))
    }
}
