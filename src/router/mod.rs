//! HTML pages and their handlers.
pub mod create;
pub mod dashboard;
pub mod events;
pub mod purchase;
pub mod qr;

use askama::Template;
use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use axum::response::{Html, IntoResponse, Response};

use crate::error::{Result, ServerError};
use crate::flash::IncomingFlash;

/// Render `template`, consuming the incoming flash message.
pub fn render<T: Template>(template: T, incoming: &IncomingFlash) -> Result<Response> {
    let html = template.render()?;
    Ok(incoming.consume(Html(html).into_response()))
}

/// Event identifier taken from the path.
///
/// Anything that is not an integer cannot name an event and is reported as
/// not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventId(pub i64);

impl<S> FromRequestParts<S> for EventId
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let raw = Path::<String>::from_request_parts(parts, state)
            .await
            .map(|Path(raw)| raw)
            .unwrap_or_else(|_| parts.uri.path().to_owned());

        raw.parse::<i64>()
            .map(EventId)
            .map_err(|_| ServerError::event_not_found(raw))
    }
}

/// Application state backed by an in-memory database, writing QR codes into
/// `storage`.
#[cfg(test)]
pub async fn state(storage: &std::path::Path) -> crate::AppState {
    use std::sync::Arc;

    let mut config = crate::config::Configuration::default();
    config.storage.directory = storage.to_path_buf();
    let db = crate::database::memory().await;

    crate::AppState::new(Arc::new(config), db, None)
}
