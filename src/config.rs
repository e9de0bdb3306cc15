//! Command-line and environment configuration

use std::{path::PathBuf, time::Duration};

use clap::{ArgGroup, Args, Parser, Subcommand};

use crate::{
    catalog::{Catalog, CatalogError},
    identity::{CredentialNormalizer, PeopleApiDirectory, directory::DEFAULT_PEOPLE_API_URL},
    login::{ClientIdStatus, LoginService, OAuthClientId},
    promotions::{PromoLedger, PromoTable, PromoTableError},
};

/// Ticket desk configuration
#[derive(Debug, Parser)]
#[command(name = "ticketdesk", about = "Event ticket cart and login desk", long_about = None)]
pub struct Config {
    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// OAuth and login settings.
    #[command(flatten)]
    pub auth: AuthConfig,

    /// Promo code settings.
    #[command(flatten)]
    pub promo: PromoConfig,

    /// Event catalog settings.
    #[command(flatten)]
    pub catalog: CatalogConfig,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

impl Config {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// OAuth and login settings.
#[derive(Debug, Args)]
pub struct AuthConfig {
    /// Google OAuth web client id
    #[arg(long, env = "GOOGLE_CLIENT_ID", hide_env_values = true)]
    pub google_client_id: Option<String>,

    /// Base URL of the People API used for phone lookups
    #[arg(long, env = "PEOPLE_API_URL", default_value = DEFAULT_PEOPLE_API_URL)]
    pub people_api_url: String,

    /// Simulated login round trip in milliseconds
    #[arg(long, env = "LOGIN_DELAY_MS", default_value_t = 500)]
    pub login_delay_ms: u64,
}

impl AuthConfig {
    /// Shape check of the configured client id.
    #[must_use]
    pub fn client_id_status(&self) -> ClientIdStatus {
        OAuthClientId::inspect(self.google_client_id.as_deref())
    }

    /// Login service backed by the configured People API.
    #[must_use]
    pub fn login_service(&self) -> LoginService {
        let directory = PeopleApiDirectory::new(self.people_api_url.clone());

        LoginService::new(CredentialNormalizer::new(directory))
            .with_delay(Duration::from_millis(self.login_delay_ms))
    }
}

/// Promo code settings.
#[derive(Debug, Args)]
pub struct PromoConfig {
    /// Promo validation delay in milliseconds
    #[arg(long, env = "PROMO_DELAY_MS", default_value_t = 800)]
    pub promo_delay_ms: u64,

    /// YAML promo table to use instead of the built-in codes
    #[arg(long, env = "PROMO_TABLE_PATH")]
    pub promo_table_path: Option<PathBuf>,
}

impl PromoConfig {
    /// Build the promo ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the promo table file cannot be loaded.
    pub fn ledger(&self) -> Result<PromoLedger, PromoTableError> {
        let table = match &self.promo_table_path {
            Some(path) => PromoTable::from_path(path)?,
            None => PromoTable::default(),
        };

        Ok(PromoLedger::new(table).with_delay(Duration::from_millis(self.promo_delay_ms)))
    }
}

/// Event catalog settings.
#[derive(Debug, Args)]
pub struct CatalogConfig {
    /// YAML event catalog to use instead of the bundled listing
    #[arg(long, env = "CATALOG_PATH")]
    pub catalog_path: Option<PathBuf>,
}

impl CatalogConfig {
    /// Load the event catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    pub fn catalog(&self) -> Result<Catalog, CatalogError> {
        match &self.catalog_path {
            Some(path) => Catalog::from_path(path),
            None => Catalog::builtin(),
        }
    }
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List events and their ticket types
    Events,

    /// Build a cart, apply a promo code and hand it to checkout
    Checkout(CheckoutArgs),

    /// Log in locally or with a Google response
    Login(LoginArgs),
}

/// Arguments for `checkout`.
#[derive(Debug, Args)]
pub struct CheckoutArgs {
    /// Event id
    #[arg(long)]
    pub event: String,

    /// Ticket selection as TICKET_ID=QTY; repeatable
    #[arg(long = "ticket", value_parser = parse_selection, required = true)]
    pub tickets: Vec<(String, i64)>,

    /// Promo code to apply
    #[arg(long)]
    pub promo: Option<String>,
}

/// Arguments for `login`.
#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("method")
        .required(true)
        .multiple(false)
        .args(["email", "credential", "profile_json", "response_json"])
))]
pub struct LoginArgs {
    /// Email for local login
    #[arg(long, requires = "password")]
    pub email: Option<String>,

    /// Password for local login
    #[arg(long, requires = "email")]
    pub password: Option<String>,

    /// Signed identity token from Google sign-in
    #[arg(long)]
    pub credential: Option<String>,

    /// User-info JSON fetched with an access token
    #[arg(long, requires = "access_token")]
    pub profile_json: Option<String>,

    /// Raw Google login response JSON
    #[arg(long)]
    pub response_json: Option<String>,

    /// OAuth access token for contacts lookups
    #[arg(long)]
    pub access_token: Option<String>,
}

/// Parse a `TICKET_ID=QTY` selection.
///
/// # Errors
///
/// Returns a message if there is no `=`, the id is blank, or the quantity is
/// not an integer.
pub fn parse_selection(raw: &str) -> Result<(String, i64), String> {
    let (ticket_id, quantity) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected TICKET_ID=QTY, got `{raw}`"))?;

    let ticket_id = ticket_id.trim();

    if ticket_id.is_empty() {
        return Err(format!("missing ticket id in `{raw}`"));
    }

    let quantity = quantity
        .trim()
        .parse::<i64>()
        .map_err(|err| format!("invalid quantity in `{raw}`: {err}"))?;

    Ok((ticket_id.to_string(), quantity))
}
