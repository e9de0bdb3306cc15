//! Credential normalisation.
//!
//! Turns either shape of provider login response into a [`UserIdentity`].

use tracing::{debug, warn};

use crate::identity::{
    AuthProvider, CredentialError, IdentityClaims, PeopleApiDirectory, PhoneDirectory,
    ProviderResponse, UserIdentity,
    claims::decode_token_claims,
    phone::{format_phone, select_phone, synthetic_phone},
};

/// Builds canonical user records from Google login responses.
#[derive(Debug, Clone, Default)]
pub struct CredentialNormalizer<D = PeopleApiDirectory> {
    directory: D,
}

impl<D: PhoneDirectory> CredentialNormalizer<D> {
    /// Create a normalizer that looks phone numbers up in `directory`.
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    /// Normalize a login response into a user identity.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::MalformedToken`] if a signed token cannot be
    /// decoded. Phone lookup failures are logged and never returned.
    pub async fn normalize(
        &self,
        response: ProviderResponse,
    ) -> Result<UserIdentity, CredentialError> {
        let (claims, access_token) = match response {
            ProviderResponse::SignedToken {
                credential,
                access_token,
            } => (decode_token_claims(&credential)?, access_token),
            ProviderResponse::DirectProfile {
                access_token,
                profile,
            } => (profile, Some(access_token)),
        };

        let phone = self
            .resolve_phone(access_token.as_deref(), claims.subject())
            .await;

        Ok(identity_from_claims(claims, phone))
    }

    /// Resolve a phone number: contacts lookup first, then a synthetic number.
    async fn resolve_phone(&self, access_token: Option<&str>, subject: Option<&str>) -> String {
        if let Some(access_token) = access_token {
            match self.directory.phone_numbers(access_token).await {
                Ok(numbers) => {
                    if let Some(phone) = select_phone(&numbers) {
                        return format_phone(&phone);
                    }

                    debug!("contacts lookup returned no usable phone numbers");
                }
                Err(error) => warn!(%error, "phone lookup failed, using synthetic number"),
            }
        }

        format_phone(&synthetic_phone(subject))
    }
}

fn identity_from_claims(claims: IdentityClaims, phone: String) -> UserIdentity {
    let (first_name, last_name) = claims.split_name();

    UserIdentity {
        id: claims.subject().unwrap_or_default().to_string(),
        email: claims.email.unwrap_or_default(),
        first_name,
        last_name,
        phone: Some(phone),
        avatar_url: claims.picture,
        provider: AuthProvider::Google,
    }
}
