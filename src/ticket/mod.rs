mod repository;
mod service;

pub use repository::*;
pub use service::*;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Ticket as saved on database.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ticket {
    pub id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub purchase_date: NaiveDateTime,
}

/// Ticket joined with its event title and holder, for listings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TicketSummary {
    pub id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub purchase_date: NaiveDateTime,
    pub event_title: String,
    pub email: Option<String>,
    pub nostr_key: Option<String>,
}

impl TicketSummary {
    /// Holder identifier, email first.
    pub fn holder(&self) -> &str {
        self.email
            .as_deref()
            .or(self.nostr_key.as_deref())
            .unwrap_or("anonymous")
    }
}

/// Text encoded in the payment QR code of `ticket`.
pub fn payment_request(ticket: &Ticket, lightning_address: &str) -> String {
    format!("Payment for ticket ID {} to {}", ticket.id, lightning_address)
}
