//! Provider login responses and the identity claims they carry.

use base64::{
    Engine as _, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use serde::Deserialize;
use serde_json::Value;

use crate::identity::CredentialError;

/// Base64url as used by JWT segments; accepts padded and unpadded input.
const TOKEN_SEGMENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Identity claims, as found in an ID token payload or a user-info response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IdentityClaims {
    /// Subject (stable provider user id)
    pub sub: Option<String>,

    /// User id as older user-info endpoints name it; used when `sub` is absent
    pub id: Option<String>,

    /// Email address
    pub email: Option<String>,

    /// First name
    pub given_name: Option<String>,

    /// Last name
    pub family_name: Option<String>,

    /// Full name
    pub name: Option<String>,

    /// Profile picture URL
    pub picture: Option<String>,

    /// Preferred locale
    pub locale: Option<String>,
}

impl IdentityClaims {
    /// Subject id, if present and not blank, falling back to `id`.
    pub fn subject(&self) -> Option<&str> {
        let non_blank: fn(&Option<String>) -> Option<&str> = |value| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        non_blank(&self.sub).or_else(|| non_blank(&self.id))
    }

    /// Given and family name, falling back to splitting the full name.
    pub fn split_name(&self) -> (String, String) {
        let (fallback_first, fallback_last) = self
            .name
            .as_deref()
            .map(str::trim)
            .and_then(|name| name.split_once(' '))
            .map_or_else(
                || (self.name.as_deref().unwrap_or_default().trim(), ""),
                |(first, last)| (first, last.trim()),
            );

        let first = self
            .given_name
            .as_deref()
            .unwrap_or(fallback_first)
            .to_string();

        let last = self
            .family_name
            .as_deref()
            .unwrap_or(fallback_last)
            .to_string();

        (first, last)
    }
}

/// The two shapes an OAuth login response can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderResponse {
    /// A signed identity token, possibly with an access token alongside it.
    SignedToken {
        /// Dot-delimited signed token
        credential: String,

        /// Access token for further API calls
        access_token: Option<String>,
    },

    /// A user-info object fetched with an access token, without a signed token.
    DirectProfile {
        /// Access token used for the profile fetch
        access_token: String,

        /// The fetched profile
        profile: IdentityClaims,
    },
}

impl ProviderResponse {
    /// Classify a raw JSON login response.
    ///
    /// An object with a string `credential` is a signed token. An object with
    /// an `access_token` and a `profile` (or `user_info`) object is a direct
    /// profile. An object with a string `error` is a provider failure.
    ///
    /// # Errors
    ///
    /// - [`CredentialError::Provider`]: the provider returned an error.
    /// - [`CredentialError::UnrecognizedFormat`]: the shape matches neither variant.
    pub fn from_json(value: &Value) -> Result<Self, CredentialError> {
        let Some(object) = value.as_object() else {
            return Err(CredentialError::UnrecognizedFormat);
        };

        let access_token = object
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string);

        if let Some(credential) = object.get("credential").and_then(Value::as_str) {
            return Ok(Self::SignedToken {
                credential: credential.to_string(),
                access_token,
            });
        }

        let profile = object
            .get("profile")
            .or_else(|| object.get("user_info"))
            .filter(|profile| profile.is_object());

        if let (Some(access_token), Some(profile)) = (access_token, profile) {
            let profile = IdentityClaims::deserialize(profile)
                .map_err(|_err| CredentialError::UnrecognizedFormat)?;

            return Ok(Self::DirectProfile {
                access_token,
                profile,
            });
        }

        if let Some(error) = object.get("error").and_then(Value::as_str) {
            let description = object
                .get("error_description")
                .and_then(Value::as_str)
                .map_or_else(String::new, |description| format!(": {description}"));

            return Err(CredentialError::Provider(format!("{error}{description}")));
        }

        Err(CredentialError::UnrecognizedFormat)
    }

    /// Access token carried by the response, if any.
    pub fn access_token(&self) -> Option<&str> {
        match self {
            Self::SignedToken { access_token, .. } => access_token.as_deref(),
            Self::DirectProfile { access_token, .. } => Some(access_token),
        }
    }
}

/// Decode the claims from the payload segment of a signed token.
///
/// The signature is not verified; the token is only read.
///
/// # Errors
///
/// Returns [`CredentialError::MalformedToken`] if the token does not have
/// three segments, or if the payload is not base64url-encoded JSON.
pub fn decode_token_claims(token: &str) -> Result<IdentityClaims, CredentialError> {
    let mut segments = token.trim().split('.');

    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(CredentialError::MalformedToken(
            "expected three dot-separated segments".to_string(),
        ));
    };

    if payload.is_empty() {
        return Err(CredentialError::MalformedToken(
            "payload segment is empty".to_string(),
        ));
    }

    let bytes = TOKEN_SEGMENT
        .decode(payload)
        .map_err(|err| CredentialError::MalformedToken(err.to_string()))?;

    serde_json::from_slice(&bytes).map_err(|err| CredentialError::MalformedToken(err.to_string()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    fn token_with(payload: &Value) -> String {
        let header = TOKEN_SEGMENT.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let body = TOKEN_SEGMENT.encode(payload.to_string());

        format!("{header}.{body}.c2lnbmF0dXJl")
    }

    #[test]
    fn decodes_token_payload() -> TestResult {
        let token = token_with(&json!({
            "sub": "110169484474386276334",
            "email": "ada@example.com",
            "given_name": "Ada",
            "family_name": "Lovelace",
            "picture": "https://example.com/ada.png",
            "locale": "en-GB",
        }));

        let claims = decode_token_claims(&token)?;

        assert_eq!(claims.subject(), Some("110169484474386276334"));
        assert_eq!(claims.email.as_deref(), Some("ada@example.com"));
        assert_eq!(claims.picture.as_deref(), Some("https://example.com/ada.png"));
        assert_eq!(claims.locale.as_deref(), Some("en-GB"));

        Ok(())
    }

    #[test]
    fn decodes_padded_payload() -> TestResult {
        let padded = base64::engine::general_purpose::URL_SAFE.encode(r#"{"sub":"7"}"#);
        let token = format!("e30.{padded}.sig");

        assert_eq!(decode_token_claims(&token)?.subject(), Some("7"));

        Ok(())
    }

    #[test]
    fn rejects_wrong_segment_count() {
        assert!(matches!(
            decode_token_claims("only.two"),
            Err(CredentialError::MalformedToken(_))
        ));
        assert!(matches!(
            decode_token_claims("a.b.c.d"),
            Err(CredentialError::MalformedToken(_))
        ));
    }

    #[test]
    fn rejects_non_json_payload() {
        let payload = TOKEN_SEGMENT.encode("not json");

        assert!(matches!(
            decode_token_claims(&format!("e30.{payload}.sig")),
            Err(CredentialError::MalformedToken(_))
        ));
    }

    #[test]
    fn split_name_prefers_explicit_names() {
        let claims = IdentityClaims {
            given_name: Some("Ada".to_string()),
            family_name: Some("Lovelace".to_string()),
            name: Some("Augusta Ada King".to_string()),
            ..IdentityClaims::default()
        };

        assert_eq!(
            claims.split_name(),
            ("Ada".to_string(), "Lovelace".to_string())
        );
    }

    #[test]
    fn split_name_falls_back_to_full_name() {
        let claims = IdentityClaims {
            name: Some("Grace Brewster Hopper".to_string()),
            ..IdentityClaims::default()
        };

        assert_eq!(
            claims.split_name(),
            ("Grace".to_string(), "Brewster Hopper".to_string())
        );
    }

    #[test]
    fn from_json_classifies_signed_token() -> TestResult {
        let response = ProviderResponse::from_json(&json!({
            "credential": "a.b.c",
            "clientId": "abc.apps.googleusercontent.com",
        }))?;

        assert_eq!(
            response,
            ProviderResponse::SignedToken {
                credential: "a.b.c".to_string(),
                access_token: None,
            }
        );

        Ok(())
    }

    #[test]
    fn from_json_classifies_direct_profile() -> TestResult {
        let response = ProviderResponse::from_json(&json!({
            "access_token": "ya29.token",
            "user_info": { "id": "42", "email": "grace@example.com" },
        }))?;

        let ProviderResponse::DirectProfile {
            access_token,
            profile,
        } = response
        else {
            panic!("expected a direct profile");
        };

        assert_eq!(access_token, "ya29.token");
        assert_eq!(profile.subject(), Some("42"));

        Ok(())
    }

    #[test]
    fn from_json_accepts_profile_with_sub_and_id() -> TestResult {
        let response = ProviderResponse::from_json(&json!({
            "access_token": "ya29.token",
            "profile": { "sub": "42", "id": "legacy-7", "email": "grace@example.com" },
        }))?;

        let ProviderResponse::DirectProfile { profile, .. } = response else {
            panic!("expected a direct profile");
        };

        assert_eq!(profile.subject(), Some("42"));
        assert_eq!(profile.id.as_deref(), Some("legacy-7"));

        Ok(())
    }

    #[test]
    fn decodes_token_payload_with_sub_and_id() -> TestResult {
        let token = token_with(&json!({ "sub": "42", "id": "42" }));

        assert_eq!(decode_token_claims(&token)?.subject(), Some("42"));

        Ok(())
    }

    #[test]
    fn subject_falls_back_to_id() {
        let claims = IdentityClaims {
            sub: Some("  ".to_string()),
            id: Some("7".to_string()),
            ..IdentityClaims::default()
        };

        assert_eq!(claims.subject(), Some("7"));
    }

    #[test]
    fn access_token_is_read_from_either_shape() -> TestResult {
        let token = ProviderResponse::from_json(&json!({
            "credential": "a.b.c",
            "access_token": "ya29.token",
        }))?;
        let bare = ProviderResponse::from_json(&json!({ "credential": "a.b.c" }))?;

        assert_eq!(token.access_token(), Some("ya29.token"));
        assert_eq!(bare.access_token(), None);

        Ok(())
    }

    #[test]
    fn from_json_rejects_unknown_shapes() {
        for value in [
            json!("a.b.c"),
            json!({}),
            json!({ "access_token": "ya29.token" }),
            json!({ "profile": { "sub": "1" } }),
        ] {
            assert_eq!(
                ProviderResponse::from_json(&value),
                Err(CredentialError::UnrecognizedFormat),
                "{value} should not be recognized"
            );
        }
    }

    #[test]
    fn from_json_surfaces_provider_errors() {
        let result = ProviderResponse::from_json(&json!({
            "error": "redirect_uri_mismatch",
            "error_description": "origin not allowed",
        }));

        assert_eq!(
            result,
            Err(CredentialError::Provider(
                "redirect_uri_mismatch: origin not allowed".to_string()
            ))
        );
    }
}
