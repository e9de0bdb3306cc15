//! Ticketdesk
//!
//! Ticketdesk prices event ticket carts, validates promo codes and turns OAuth login responses into user records.

pub mod cart;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod discounts;
pub mod identity;
pub mod login;
pub mod observability;
pub mod prelude;
pub mod prices;
pub mod promotions;
pub mod receipt;
