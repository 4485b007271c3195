//! Login, registration and logout.
//!
//! Input is validated here, before the data provider is called. A successful
//! login is written to the injected [`SessionStore`].

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::error::{FetchError, ValidationError};
use crate::model::{AuthResponse, User};
use crate::provider::DataProvider;
use crate::session::SessionStore;

/// Minimum accepted password length at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Why a login or registration did not go through.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The backend refused the credentials or the registration.
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Fields of the registration form.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationForm {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegistrationForm {
    /// Check required fields and password length.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("full_name", &self.full_name)?;
        require("username", &self.username)?;
        require("email", &self.email)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort {
                min: MIN_PASSWORD_LEN,
            });
        }
        Ok(())
    }
}

pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    Ok(())
}

/// Authentication front door.
#[derive(Clone)]
pub struct AuthService {
    provider: Arc<dyn DataProvider>,
    sessions: Arc<dyn SessionStore>,
}

impl AuthService {
    pub fn new(provider: Arc<dyn DataProvider>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { provider, sessions }
    }

    /// Sign in and remember the user in the session store.
    ///
    /// # Errors
    ///
    /// [`AuthError::Validation`] for empty fields (no provider call is made),
    /// [`AuthError::Rejected`] for bad credentials, [`AuthError::Fetch`] if the
    /// provider could not be reached.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        require("username", username)?;
        require("password", password)?;

        let response = self.provider.authenticate(username, password).await?;
        let user = accepted_user(response, "Login failed")?;

        self.sessions.set(user.clone());
        info!(user_id = %user.user_id, "User signed in");
        Ok(user)
    }

    /// Create an account. Does not sign the new user in.
    ///
    /// # Errors
    ///
    /// As for [`AuthService::login`].
    #[instrument(skip(self, form), fields(username = %form.username))]
    pub async fn register(&self, form: &RegistrationForm) -> Result<User, AuthError> {
        form.validate()?;

        let response = self
            .provider
            .register(&form.full_name, &form.username, &form.email)
            .await?;
        let user = accepted_user(response, "Registration failed")?;

        info!(user_id = %user.user_id, "Account registered");
        Ok(user)
    }

    /// Forget the signed-in user.
    pub fn logout(&self) {
        if let Some(user) = self.sessions.get() {
            info!(user_id = %user.user_id, "User signed out");
        }
        self.sessions.clear();
    }

    /// The signed-in user, if any.
    pub fn current_user(&self) -> Option<User> {
        self.sessions.get()
    }
}

fn accepted_user(response: AuthResponse, default_error: &str) -> Result<User, AuthError> {
    match response {
        AuthResponse {
            success: true,
            user: Some(user),
            ..
        } => Ok(user),
        AuthResponse { error, .. } => {
            let message = error.unwrap_or_else(|| default_error.to_string());
            warn!(reason = %message, "Authentication rejected");
            Err(AuthError::Rejected(message))
        }
    }
}
