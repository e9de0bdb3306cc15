//! Ticketdesk prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartError, CartSnapshot, CheckoutError, CheckoutHandoff, CheckoutRequest},
    catalog::{Catalog, CatalogError, Event, TicketType},
    discounts::DiscountError,
    identity::{
        AuthProvider, CredentialError, CredentialNormalizer, IdentityClaims, PeopleApiDirectory,
        PhoneDirectory, PhoneLookupError, PhoneNumber, ProviderResponse, UserIdentity,
    },
    login::{ClientIdStatus, LoginError, LoginService, OAuthClientId},
    promotions::{PromoError, PromoLedger, PromoTable, PromoTableError},
    receipt::{Receipt, ReceiptError},
};
