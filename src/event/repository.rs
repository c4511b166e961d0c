//! Handle database requests.

use sqlx::{Pool, Sqlite};

use crate::error::{Result, ServerError};
use crate::event::{Event, NewEvent};

const COLUMNS: &str =
    "id, title, description, date, location, tickets_available, lightning_address";

#[derive(Clone, Debug)]
pub struct EventRepository {
    pool: Pool<Sqlite>,
}

impl EventRepository {
    /// Create a new [`EventRepository`].
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Insert [`NewEvent`] into database.
    ///
    /// Nothing is kept if the insertion fails.
    pub async fn insert(&self, event: &NewEvent) -> Result<Event> {
        let mut tx = self.pool.begin().await?;

        let event = sqlx::query_as::<_, Event>(&format!(
            r#"INSERT INTO events (title, description, date, location, tickets_available, lightning_address)
                VALUES (?, ?, ?, ?, ?, ?)
                RETURNING {COLUMNS}"#
        ))
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(&event.location)
        .bind(event.tickets_available)
        .bind(&event.lightning_address)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(event_id = event.id, title = %event.title, "event created");
        Ok(event)
    }

    /// Find an event using `id` field.
    pub async fn find_by_id(&self, id: i64) -> Result<Event> {
        sqlx::query_as::<_, Event>(&format!("SELECT {COLUMNS} FROM events WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServerError::event_not_found(id))
    }

    /// Every event, oldest first.
    pub async fn find_all(&self) -> Result<Vec<Event>> {
        Ok(
            sqlx::query_as::<_, Event>(&format!("SELECT {COLUMNS} FROM events ORDER BY id"))
                .fetch_all(&self.pool)
                .await?,
        )
    }
}
