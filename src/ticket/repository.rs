//! Handle database requests.

use chrono::Utc;
use sqlx::{Pool, Sqlite, SqliteConnection};

use crate::error::Result;
use crate::ticket::{Ticket, TicketSummary};

const COLUMNS: &str = "id, user_id, event_id, purchase_date";

#[derive(Clone, Debug)]
pub struct TicketRepository {
    pool: Pool<Sqlite>,
}

impl TicketRepository {
    /// Create a new [`TicketRepository`].
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Issue a ticket for `event_id` to `user_id`, dated now.
    ///
    /// `tickets_available` is not checked.
    pub async fn insert(
        conn: &mut SqliteConnection,
        user_id: i64,
        event_id: i64,
    ) -> Result<Ticket> {
        Ok(sqlx::query_as::<_, Ticket>(&format!(
            "INSERT INTO tickets (user_id, event_id, purchase_date) VALUES (?, ?, ?) RETURNING {COLUMNS}"
        ))
        .bind(user_id)
        .bind(event_id)
        .bind(Utc::now().naive_utc())
        .fetch_one(&mut *conn)
        .await?)
    }

    /// Every ticket in the system, oldest first.
    pub async fn find_all(&self) -> Result<Vec<TicketSummary>> {
        Ok(sqlx::query_as::<_, TicketSummary>(
            r#"SELECT t.id, t.user_id, t.event_id, t.purchase_date,
                    e.title AS event_title, u.email, u.nostr_key
                FROM tickets t
                JOIN events e ON e.id = t.event_id
                JOIN users u ON u.id = t.user_id
                ORDER BY t.id"#,
        )
        .fetch_all(&self.pool)
        .await?)
    }

    /// Tickets held by `user_id`.
    pub async fn tickets_for_user(&self, user_id: i64) -> Result<Vec<Ticket>> {
        Ok(sqlx::query_as::<_, Ticket>(&format!(
            "SELECT {COLUMNS} FROM tickets WHERE user_id = ? ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Tickets issued for `event_id`.
    pub async fn tickets_for_event(&self, event_id: i64) -> Result<Vec<Ticket>> {
        Ok(sqlx::query_as::<_, Ticket>(&format!(
            "SELECT {COLUMNS} FROM tickets WHERE event_id = ? ORDER BY id"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
