//! Contacts lookup for phone numbers.

use async_trait::async_trait;
use mockall::automock;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

/// Default base URL of the People API.
pub const DEFAULT_PEOPLE_API_URL: &str = "https://people.googleapis.com";

/// A phone number entry from the contacts service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PhoneNumber {
    /// Number type, e.g. `mobile` or `home`
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    /// The number as entered by the user
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersonResponse {
    #[serde(default)]
    phone_numbers: Vec<PhoneNumber>,
}

/// Errors that can occur when looking up phone numbers.
#[derive(Debug, Error)]
pub enum PhoneLookupError {
    /// An HTTP transport or deserialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The contacts service returned a non-2xx response.
    #[error("phone lookup failed with status {0}")]
    UnexpectedStatus(StatusCode),
}

/// Source of a signed-in user's phone numbers.
#[automock]
#[async_trait]
pub trait PhoneDirectory: Send + Sync {
    /// Fetch the phone numbers of the user the access token belongs to.
    async fn phone_numbers(&self, access_token: &str) -> Result<Vec<PhoneNumber>, PhoneLookupError>;
}

/// HTTP client for the People API `people/me` endpoint.
#[derive(Debug, Clone)]
pub struct PeopleApiDirectory {
    base_url: String,
    http: Client,
}

impl PeopleApiDirectory {
    /// Create a client against the given base URL, e.g. [`DEFAULT_PEOPLE_API_URL`].
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    fn person_url(&self) -> String {
        format!("{}/v1/people/me", self.base_url)
    }
}

impl Default for PeopleApiDirectory {
    fn default() -> Self {
        Self::new(DEFAULT_PEOPLE_API_URL)
    }
}

#[async_trait]
impl PhoneDirectory for PeopleApiDirectory {
    async fn phone_numbers(&self, access_token: &str) -> Result<Vec<PhoneNumber>, PhoneLookupError> {
        let response = self
            .http
            .get(self.person_url())
            .query(&[("personFields", "phoneNumbers")])
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PhoneLookupError::UnexpectedStatus(response.status()));
        }

        let person: PersonResponse = response.json().await?;

        Ok(person.phone_numbers)
    }
}
