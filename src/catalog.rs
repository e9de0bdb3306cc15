//! Catalog
//!
//! Event listings and their ticket types, loaded from YAML. A default
//! catalog is compiled in and used when no file is configured.

use std::{fs, path::Path};

use rusty_money::{Money, iso::Currency};
use serde::Deserialize;
use thiserror::Error;

use crate::prices::{PriceParseError, parse_price};

/// Fallback event listings bundled with the crate.
pub const DEFAULT_CATALOG: &str = include_str!("../fixtures/events.yml");

/// Catalog loading and lookup errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading the catalog file
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid ticket price
    #[error(transparent)]
    Price(#[from] PriceParseError),

    /// Two events share an id
    #[error("Duplicate event: {0}")]
    DuplicateEvent(String),

    /// An event has no ticket types, or they are priced in different currencies
    #[error("Event {0} must sell tickets in exactly one currency")]
    MixedCurrencies(String),

    /// Event not found
    #[error("Event not found: {0}")]
    EventNotFound(String),

    /// Ticket type not found
    #[error("Ticket type {ticket} not found for event {event}")]
    TicketNotFound {
        /// Event id
        event: String,

        /// Ticket type id
        ticket: String,
    },
}

#[derive(Debug, Deserialize)]
struct CatalogFixture {
    events: Vec<EventFixture>,
}

#[derive(Debug, Deserialize)]
struct EventFixture {
    id: String,
    name: String,
    venue: String,
    date: String,
    ticket_types: Vec<TicketTypeFixture>,
}

#[derive(Debug, Deserialize)]
struct TicketTypeFixture {
    id: String,
    name: String,

    /// Price string (e.g., "50.00 USD")
    price: String,
}

impl TryFrom<TicketTypeFixture> for TicketType {
    type Error = CatalogError;

    fn try_from(fixture: TicketTypeFixture) -> Result<Self, Self::Error> {
        let (minor_units, currency) = parse_price(&fixture.price)?;

        Ok(TicketType {
            id: fixture.id,
            name: fixture.name,
            price: Money::from_minor(minor_units, currency),
        })
    }
}

impl TryFrom<EventFixture> for Event {
    type Error = CatalogError;

    fn try_from(fixture: EventFixture) -> Result<Self, Self::Error> {
        let ticket_types = fixture
            .ticket_types
            .into_iter()
            .map(TicketType::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let Some(first) = ticket_types.first() else {
            return Err(CatalogError::MixedCurrencies(fixture.id));
        };

        let currency = first.price.currency();

        if ticket_types
            .iter()
            .any(|ticket| ticket.price.currency() != currency)
        {
            return Err(CatalogError::MixedCurrencies(fixture.id));
        }

        Ok(Event {
            id: fixture.id,
            name: fixture.name,
            venue: fixture.venue,
            date: fixture.date,
            ticket_types,
        })
    }
}

/// A sellable ticket type
#[derive(Debug, Clone, PartialEq)]
pub struct TicketType {
    /// Ticket type id, unique within its event
    pub id: String,

    /// Display name
    pub name: String,

    /// Unit price
    pub price: Money<'static, Currency>,
}

/// An event with its ticket types
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Event id
    pub id: String,

    /// Display name
    pub name: String,

    /// Venue name
    pub venue: String,

    /// Start time as written in the listing
    pub date: String,

    /// Ticket types on sale, in display order
    pub ticket_types: Vec<TicketType>,
}

impl Event {
    /// Currency all of this event's tickets are priced in.
    pub fn currency(&self) -> Option<&'static Currency> {
        self.ticket_types
            .first()
            .map(|ticket| ticket.price.currency())
    }

    /// Find a ticket type by id.
    pub fn ticket(&self, ticket_id: &str) -> Option<&TicketType> {
        self.ticket_types
            .iter()
            .find(|ticket| ticket.id == ticket_id)
    }
}

/// Event catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    events: Vec<Event>,
}

impl Catalog {
    /// Load the bundled fallback catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled data fails to parse.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml(DEFAULT_CATALOG)
    }

    /// Parse a catalog from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be parsed, a price is invalid,
    /// or event ids are not unique.
    pub fn from_yaml(contents: &str) -> Result<Self, CatalogError> {
        let fixture: CatalogFixture = serde_norway::from_str(contents)?;

        let mut events: Vec<Event> = Vec::with_capacity(fixture.events.len());

        for event in fixture.events {
            let event = Event::try_from(event)?;

            if events.iter().any(|existing| existing.id == event.id) {
                return Err(CatalogError::DuplicateEvent(event.id));
            }

            events.push(event);
        }

        Ok(Self { events })
    }

    /// Load a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml(&contents)
    }

    /// Iterate over events in listing order.
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Find an event by id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::EventNotFound`] if there is no such event.
    pub fn event(&self, event_id: &str) -> Result<&Event, CatalogError> {
        self.events
            .iter()
            .find(|event| event.id == event_id)
            .ok_or_else(|| CatalogError::EventNotFound(event_id.to_string()))
    }

    /// Resolve a ticket type of an event.
    ///
    /// # Errors
    ///
    /// Returns an error if the event or ticket type does not exist.
    pub fn ticket(&self, event_id: &str, ticket_id: &str) -> Result<&TicketType, CatalogError> {
        self.event(event_id)?
            .ticket(ticket_id)
            .ok_or_else(|| CatalogError::TicketNotFound {
                event: event_id.to_string(),
                ticket: ticket_id.to_string(),
            })
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the catalog has no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{GBP, USD};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn builtin_catalog_loads() -> TestResult {
        let catalog = Catalog::builtin()?;

        assert_eq!(catalog.len(), 3);
        assert!(!catalog.is_empty());

        Ok(())
    }

    #[test]
    fn ticket_resolves_price() -> TestResult {
        let catalog = Catalog::builtin()?;

        let general = catalog.ticket("neon-nights-2026", "general")?;
        let balcony = catalog.ticket("jazz-by-the-bay", "balcony")?;

        assert_eq!(general.price, Money::from_minor(5_000, USD));
        assert_eq!(balcony.price, Money::from_minor(2_850, GBP));

        Ok(())
    }

    #[test]
    fn unknown_event_errors() -> TestResult {
        let catalog = Catalog::builtin()?;

        assert!(matches!(
            catalog.event("nope"),
            Err(CatalogError::EventNotFound(id)) if id == "nope"
        ));

        Ok(())
    }

    #[test]
    fn unknown_ticket_errors() -> TestResult {
        let catalog = Catalog::builtin()?;

        assert!(matches!(
            catalog.ticket("neon-nights-2026", "backstage"),
            Err(CatalogError::TicketNotFound { ticket, .. }) if ticket == "backstage"
        ));

        Ok(())
    }

    #[test]
    fn mixed_currencies_are_rejected() {
        let yaml = r#"
events:
  - id: mixed
    name: Mixed
    venue: Somewhere
    date: "2026-01-01"
    ticket_types:
      - { id: a, name: A, price: "10.00 USD" }
      - { id: b, name: B, price: "10.00 GBP" }
"#;

        assert!(matches!(
            Catalog::from_yaml(yaml),
            Err(CatalogError::MixedCurrencies(id)) if id == "mixed"
        ));
    }

    #[test]
    fn duplicate_events_are_rejected() {
        let yaml = r#"
events:
  - { id: twice, name: One, venue: V, date: d, ticket_types: [{ id: a, name: A, price: "1.00 USD" }] }
  - { id: twice, name: Two, venue: V, date: d, ticket_types: [{ id: a, name: A, price: "1.00 USD" }] }
"#;

        assert!(matches!(
            Catalog::from_yaml(yaml),
            Err(CatalogError::DuplicateEvent(id)) if id == "twice"
        ));
    }
}
