//! Receipt

use std::io;

use rust_decimal::Decimal;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    cart::{Cart, CartError, CartSnapshot, TicketSelection},
    discounts::fraction,
};

/// Errors that can occur when building or writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Error deriving totals from the cart.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// One table row per ticket selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptLine {
    /// Ticket display name
    pub ticket: String,

    /// Formatted unit price
    pub unit_price: String,

    /// Number of tickets
    pub quantity: u32,

    /// Formatted unit price × quantity
    pub line_total: String,
}

/// A printable summary of a cart.
#[derive(Debug, Clone)]
pub struct Receipt {
    lines: Vec<ReceiptLine>,
    snapshot: CartSnapshot,
}

impl Receipt {
    /// Build a receipt, labelling each line with `name_of(ticket_id)`.
    ///
    /// # Errors
    ///
    /// Returns a [`ReceiptError`] if the cart totals cannot be derived.
    pub fn from_cart<F>(cart: &Cart, name_of: F) -> Result<Self, ReceiptError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lines = cart
            .iter()
            .map(|selection| receipt_line(selection, &name_of))
            .collect::<Result<Vec<_>, CartError>>()?;

        Ok(Self {
            lines,
            snapshot: cart.snapshot()?,
        })
    }

    /// Lines in cart order.
    #[must_use]
    pub fn lines(&self) -> &[ReceiptLine] {
        &self.lines
    }

    /// Totals the receipt was built from.
    #[must_use]
    pub fn snapshot(&self) -> &CartSnapshot {
        &self.snapshot
    }

    /// Writes the receipt table and summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the receipt cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        write_receipt_table(&mut out, &self.lines)?;
        write_receipt_summary(&mut out, &self.snapshot)
    }
}

fn receipt_line<F>(selection: &TicketSelection, name_of: &F) -> Result<ReceiptLine, CartError>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(ReceiptLine {
        ticket: name_of(selection.ticket_id()).unwrap_or_else(|| selection.ticket_id().to_string()),
        unit_price: selection.unit_price().to_string(),
        quantity: selection.quantity(),
        line_total: selection.line_total()?.to_string(),
    })
}

fn write_receipt_table(out: &mut impl io::Write, lines: &[ReceiptLine]) -> Result<(), ReceiptError> {
    let mut builder = Builder::default();

    builder.push_record(["Ticket", "Unit Price", "Qty", "Line Total"]);

    for line in lines {
        builder.push_record([
            line.ticket.clone(),
            line.unit_price.clone(),
            line.quantity.to_string(),
            line.line_total.clone(),
        ]);
    }

    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(
        1,
        HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
    );

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(1..4), Alignment::right());

    writeln!(out, "\n{table}").map_err(|_err| ReceiptError::IO)
}

fn write_receipt_summary(
    out: &mut impl io::Write,
    snapshot: &CartSnapshot,
) -> Result<(), ReceiptError> {
    let discount_points = (fraction(&snapshot.discount) * Decimal::ONE_HUNDRED).normalize();

    let rows = [
        (" Tickets:".to_string(), snapshot.total_tickets.to_string()),
        (" Subtotal:".to_string(), snapshot.subtotal.to_string()),
        (
            format!(" Discount ({discount_points}%):"),
            format!("-{}", snapshot.discount_amount),
        ),
        (" Total:".to_string(), snapshot.total.to_string()),
    ];

    let label_width = rows.iter().map(|(label, _)| label.chars().count()).max().unwrap_or(0);
    let value_width = rows.iter().map(|(_, value)| value.chars().count()).max().unwrap_or(0);

    for (label, value) in &rows {
        writeln!(out, "{label:<label_width$} {value:>value_width$}")
            .map_err(|_err| ReceiptError::IO)?;
    }

    writeln!(out).map_err(|_err| ReceiptError::IO)
}
