//! Credential errors.

use thiserror::Error;

/// Errors raised while normalizing a provider login response.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    /// The login response is neither a signed token nor a profile payload.
    #[error("unrecognized credential format")]
    UnrecognizedFormat,

    /// The signed token could not be decoded.
    #[error("malformed identity token: {0}")]
    MalformedToken(String),

    /// The provider reported an error instead of a credential.
    #[error("provider error: {0}")]
    Provider(String),
}
