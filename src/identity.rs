//! Identity
//!
//! Canonical user records and the normalisation of OAuth provider login
//! responses into them.

use serde::Serialize;

pub mod claims;
pub mod directory;
mod errors;
pub mod normalizer;
pub mod phone;

pub use claims::{IdentityClaims, ProviderResponse};
pub use directory::{PeopleApiDirectory, PhoneDirectory, PhoneLookupError, PhoneNumber};
pub use errors::CredentialError;
pub use normalizer::CredentialNormalizer;

/// Where an identity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    /// Email and password login
    Local,

    /// Google sign-in
    Google,
}

/// A logged-in user, built once per login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    /// Provider subject id, or a local id
    pub id: String,

    /// Email address
    pub email: String,

    /// Given name
    pub first_name: String,

    /// Family name
    pub last_name: String,

    /// Display-formatted phone number
    pub phone: Option<String>,

    /// Profile picture URL
    pub avatar_url: Option<String>,

    /// Login provider
    pub provider: AuthProvider,
}
