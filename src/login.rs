//! Login
//!
//! Local email/password login and provider login through the credential
//! normalizer, with the user-facing error messages for each failure.

use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::identity::{
    AuthProvider, CredentialError, CredentialNormalizer, PeopleApiDirectory, PhoneDirectory,
    ProviderResponse, UserIdentity,
};

pub mod client_id;

pub use client_id::{ClientIdStatus, OAuthClientId};

/// Default simulated authentication round trip.
pub const DEFAULT_LOGIN_DELAY: Duration = Duration::from_millis(500);

/// Where to send people whose OAuth client is misconfigured.
pub const CLIENT_ID_SETUP_URL: &str =
    "https://developers.google.com/identity/gsi/web/guides/get-google-api-clientid";

/// Provider error code for an origin or redirect URI the client does not allow.
const REDIRECT_MISMATCH: &str = "redirect_uri_mismatch";

/// Errors returned from a login attempt.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoginError {
    /// A required form field was blank.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The provider response could not be turned into a user.
    #[error("authentication failed")]
    Authentication(#[source] CredentialError),

    /// The provider rejected the app's redirect configuration.
    #[error("OAuth redirect is misconfigured: {0}")]
    RedirectMisconfigured(String),
}

impl LoginError {
    /// The message shown to the user for this error.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingField(_) => "Please fill in all fields".to_string(),
            Self::Authentication(_) => "Authentication failed. Please try again.".to_string(),
            Self::RedirectMisconfigured(_) => format!(
                "Google sign-in is not configured for this site. See {CLIENT_ID_SETUP_URL}"
            ),
        }
    }
}

impl From<CredentialError> for LoginError {
    fn from(error: CredentialError) -> Self {
        match error {
            CredentialError::Provider(message) if message.contains(REDIRECT_MISMATCH) => {
                Self::RedirectMisconfigured(message)
            }
            other => Self::Authentication(other),
        }
    }
}

/// Handles login attempts.
#[derive(Debug, Clone)]
pub struct LoginService<D = PeopleApiDirectory> {
    normalizer: CredentialNormalizer<D>,
    delay: Duration,
}

impl<D: PhoneDirectory> LoginService<D> {
    /// Create a login service with the default round-trip delay.
    pub fn new(normalizer: CredentialNormalizer<D>) -> Self {
        Self {
            normalizer,
            delay: DEFAULT_LOGIN_DELAY,
        }
    }

    /// Override the simulated round-trip delay (zero disables it).
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Log in with an email address and password.
    ///
    /// There is no credential store: any non-blank pair is accepted after the
    /// simulated round trip.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError::MissingField`] if either field is blank.
    pub async fn login_local(&self, email: &str, password: &str) -> Result<UserIdentity, LoginError> {
        let email = email.trim();

        if email.is_empty() {
            return Err(LoginError::MissingField("email"));
        }

        if password.is_empty() {
            return Err(LoginError::MissingField("password"));
        }

        self.round_trip().await;

        let local_part = email.split_once('@').map_or(email, |(local, _domain)| local);

        info!(email, "local login");

        Ok(UserIdentity {
            id: format!("local:{}", email.to_lowercase()),
            email: email.to_string(),
            first_name: local_part.to_string(),
            last_name: String::new(),
            phone: None,
            avatar_url: None,
            provider: AuthProvider::Local,
        })
    }

    /// Log in with a provider response.
    ///
    /// # Errors
    ///
    /// - [`LoginError::RedirectMisconfigured`]: the provider reported a redirect mismatch.
    /// - [`LoginError::Authentication`]: any other normalization failure.
    pub async fn login_with_provider(
        &self,
        response: ProviderResponse,
    ) -> Result<UserIdentity, LoginError> {
        let identity = self
            .normalizer
            .normalize(response)
            .await
            .inspect_err(|error| warn!(%error, "provider login failed"))?;

        info!(email = %identity.email, "provider login");

        Ok(identity)
    }

    async fn round_trip(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}
