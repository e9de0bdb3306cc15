//! Command handlers for the `ticketdesk` binary.

use std::io;

use serde_json::Value;

use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    cart::{Cart, CartError, CheckoutError, CheckoutHandoff, CheckoutRequest},
    catalog::{Catalog, CatalogError},
    config::{CheckoutArgs, Command, Config, LoginArgs},
    identity::{IdentityClaims, ProviderResponse, UserIdentity},
    login::{ClientIdStatus, LoginError},
    promotions::{PromoLedger, PromoTableError},
    receipt::{Receipt, ReceiptError},
};

/// Errors surfaced by a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Catalog loading or lookup failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The promo table could not be loaded.
    #[error(transparent)]
    PromoTable(#[from] PromoTableError),

    /// Cart update or checkout failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// The receipt could not be written.
    #[error(transparent)]
    Receipt(#[from] ReceiptError),

    /// Login failed.
    #[error("{}", .0.user_message())]
    Login(#[from] LoginError),

    /// Provider login is unavailable because the client id is unusable.
    #[error("Google sign-in is unavailable: client id is {0}")]
    ProviderDisabled(ClientIdStatus),

    /// The event has no ticket types to sell.
    #[error("Event {0} has no tickets on sale")]
    NoTickets(String),

    /// Invalid JSON input.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error")]
    IO,
}

/// Checkout hand-off that accepts every request and records it in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggedCheckout;

impl CheckoutHandoff for LoggedCheckout {
    fn proceed_to_checkout(&self, request: CheckoutRequest) -> Result<(), CheckoutError> {
        info!(total = %request.total, tickets = request.total_tickets, "checkout started");

        Ok(())
    }
}

/// Run the configured command, writing its output to `out`.
///
/// # Errors
///
/// Returns a [`CliError`] if the command fails.
pub async fn run(config: &Config, mut out: impl io::Write) -> Result<(), CliError> {
    match &config.command {
        Command::Events => {
            let catalog = config.catalog.catalog()?;

            write_events(&mut out, &catalog)
        }
        Command::Checkout(args) => {
            let catalog = config.catalog.catalog()?;
            let ledger = config.promo.ledger()?;

            checkout(&mut out, &catalog, &ledger, args, &LoggedCheckout).await
        }
        Command::Login(args) => login(&mut out, config, args).await,
    }
}

fn write_events(out: &mut impl io::Write, catalog: &Catalog) -> Result<(), CliError> {
    let mut builder = Builder::default();

    builder.push_record(["Event", "Venue", "Date", "Ticket", "Price"]);

    for event in catalog.events() {
        for (idx, ticket) in event.ticket_types.iter().enumerate() {
            let (name, venue, date) = if idx == 0 {
                (
                    format!("{}\n{}", event.name, event.id),
                    event.venue.clone(),
                    event.date.clone(),
                )
            } else {
                (String::new(), String::new(), String::new())
            };

            builder.push_record([
                name,
                venue,
                date,
                format!("{} ({})", ticket.name, ticket.id),
                ticket.price.to_string(),
            ]);
        }
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::new(4..5), Alignment::right());

    writeln!(out, "{table}").map_err(|_err| CliError::IO)
}

/// Build a cart from ticket selections, apply an optional promo code, print
/// the receipt and hand the total to `handoff`.
///
/// A rejected promo code is reported and checkout continues without it.
///
/// # Errors
///
/// Returns an error if the event or a ticket is unknown, the cart cannot be
/// priced, or the hand-off fails.
pub async fn checkout<H>(
    out: &mut impl io::Write,
    catalog: &Catalog,
    ledger: &PromoLedger,
    args: &CheckoutArgs,
    handoff: &H,
) -> Result<(), CliError>
where
    H: CheckoutHandoff + ?Sized,
{
    let event = catalog.event(&args.event)?;
    let currency = event
        .currency()
        .ok_or_else(|| CliError::NoTickets(event.id.clone()))?;

    let mut cart = Cart::new(currency);

    for (ticket_id, quantity) in &args.tickets {
        let ticket = catalog.ticket(&event.id, ticket_id)?;

        cart.add_or_update(ticket.id.clone(), ticket.price, *quantity)?;
    }

    if let Some(code) = &args.promo {
        let written = match cart.apply_promo(ledger, code).await {
            Ok(_) => writeln!(out, "Promo code {} applied", code.trim().to_uppercase()),
            Err(error) => writeln!(out, "Promo code not applied: {error}"),
        };

        written.map_err(|_err| CliError::IO)?;
    }

    let receipt = Receipt::from_cart(&cart, |ticket_id| {
        event.ticket(ticket_id).map(|ticket| ticket.name.clone())
    })?;

    writeln!(out, "{} at {}, {}", event.name, event.venue, event.date)
        .map_err(|_err| CliError::IO)?;

    receipt.write_to(&mut *out)?;

    let request = cart.proceed_to_checkout(handoff)?;

    writeln!(
        out,
        "Proceeding to checkout: {} for {} ticket(s)",
        request.total, request.total_tickets
    )
    .map_err(|_err| CliError::IO)
}

async fn login(
    out: &mut impl io::Write,
    config: &Config,
    args: &LoginArgs,
) -> Result<(), CliError> {
    let service = config.auth.login_service();

    let identity = if let (Some(email), Some(password)) = (&args.email, &args.password) {
        service.login_local(email, password).await?
    } else {
        let status = config.auth.client_id_status();

        if !status.is_usable() {
            warn!(%status, "Google client id is not usable, provider login disabled");

            return Err(CliError::ProviderDisabled(status));
        }

        service.login_with_provider(provider_response(args)?).await?
    };

    write_identity(out, &identity)
}

/// Build the provider response described by the login arguments.
///
/// # Errors
///
/// Returns an error if the profile JSON cannot be parsed, or the arguments
/// describe neither provider shape.
pub fn provider_response(args: &LoginArgs) -> Result<ProviderResponse, CliError> {
    if let Some(raw) = &args.response_json {
        let value: Value = serde_json::from_str(raw)?;

        return Ok(ProviderResponse::from_json(&value).map_err(LoginError::from)?);
    }

    if let Some(credential) = &args.credential {
        return Ok(ProviderResponse::SignedToken {
            credential: credential.clone(),
            access_token: args.access_token.clone(),
        });
    }

    match (&args.profile_json, &args.access_token) {
        (Some(profile), Some(access_token)) => {
            let profile: IdentityClaims = serde_json::from_str(profile)?;

            Ok(ProviderResponse::DirectProfile {
                access_token: access_token.clone(),
                profile,
            })
        }
        _ => Err(LoginError::MissingField("credential").into()),
    }
}

fn write_identity(out: &mut impl io::Write, identity: &UserIdentity) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(identity)?;

    writeln!(out, "Welcome, {} {}", identity.first_name, identity.last_name)
        .and_then(|()| writeln!(out, "{json}"))
        .map_err(|_err| CliError::IO)
}
