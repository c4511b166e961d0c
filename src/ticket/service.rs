use sqlx::{Pool, Sqlite};

use crate::error::Result;
use crate::event::Event;
use crate::ticket::{Ticket, TicketRepository};
use crate::user::{self, Identity, User};

/// Outcome of a ticket purchase.
#[derive(Clone, Debug, PartialEq)]
pub struct Purchase {
    pub ticket: Ticket,
    pub user: User,
    /// `user` did not exist before this purchase.
    pub new_user: bool,
}

/// Ticket purchases.
#[derive(Clone, Debug)]
pub struct TicketService {
    pool: Pool<Sqlite>,
    pub repo: TicketRepository,
}

impl TicketService {
    /// Create a new [`TicketService`].
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self {
            repo: TicketRepository::new(pool.clone()),
            pool,
        }
    }

    /// Resolve the buyer from `identity`, creating it if needed, then issue
    /// one ticket for `event`.
    ///
    /// Both writes are committed together or not at all.
    pub async fn purchase(&self, event: &Event, identity: &Identity) -> Result<Purchase> {
        let mut tx = self.pool.begin().await?;

        let (user, new_user) = user::find_or_create(&mut tx, identity).await?;
        let ticket = TicketRepository::insert(&mut tx, user.id, event.id).await?;

        tx.commit().await?;

        crate::telemetry::ticket_issued(event.id);
        tracing::info!(
            ticket_id = ticket.id,
            event_id = event.id,
            user_id = user.id,
            new_user,
            "ticket issued"
        );

        Ok(Purchase {
            ticket,
            user,
            new_user,
        })
    }
}
