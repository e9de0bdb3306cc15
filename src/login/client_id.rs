//! OAuth client id checks.

use std::fmt;

/// Domain every Google web client id carries.
const CLIENT_ID_SUFFIX: &str = ".apps.googleusercontent.com";

/// The value shipped in sample `.env` files.
const PLACEHOLDER_CLIENT_ID: &str = "your-google-client-id";

/// Shortest length a real client id exceeds.
const MIN_CLIENT_ID_LEN: usize = 40;

/// Outcome of inspecting a configured client id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientIdStatus {
    /// Looks like a real client id.
    Usable,

    /// Nothing configured.
    Missing,

    /// The sample placeholder was left in place.
    Placeholder,

    /// Configured, but not shaped like a client id.
    Malformed,
}

impl ClientIdStatus {
    /// Whether provider login should be offered.
    #[must_use]
    pub fn is_usable(self) -> bool {
        self == Self::Usable
    }
}

impl fmt::Display for ClientIdStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Usable => "usable",
            Self::Missing => "missing",
            Self::Placeholder => "placeholder value",
            Self::Malformed => "malformed",
        };

        f.write_str(text)
    }
}

/// An OAuth client id as configured.
///
/// The check is a shape sniff to catch setup mistakes early; it says nothing
/// about whether the provider will accept the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthClientId(String);

impl OAuthClientId {
    /// Wrap a configured client id.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    /// The client id text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Classify an optional configured value.
    #[must_use]
    pub fn inspect(raw: Option<&str>) -> ClientIdStatus {
        raw.map_or(ClientIdStatus::Missing, |raw| Self::new(raw).status())
    }

    /// Classify this client id.
    #[must_use]
    pub fn status(&self) -> ClientIdStatus {
        let id = self.as_str();

        if id.is_empty() {
            ClientIdStatus::Missing
        } else if id == PLACEHOLDER_CLIENT_ID {
            ClientIdStatus::Placeholder
        } else if id.contains(CLIENT_ID_SUFFIX) && id.len() > MIN_CLIENT_ID_LEN {
            ClientIdStatus::Usable
        } else {
            ClientIdStatus::Malformed
        }
    }
}
