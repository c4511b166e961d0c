//! Every ticket in the system.

use askama::Template;
use axum::extract::State;
use axum::response::Response;

use crate::AppState;
use crate::error::Result;
use crate::flash::{Flash, IncomingFlash};
use crate::router::render;
use crate::ticket::TicketSummary;

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    flash: Option<Flash>,
    tickets: Vec<TicketSummary>,
}

/// `GET /dashboard`. Not scoped to any user.
pub async fn handler(State(state): State<AppState>, incoming: IncomingFlash) -> Result<Response> {
    let tickets = state.tickets.repo.find_all().await?;

    render(
        DashboardTemplate {
            flash: incoming.flash.clone(),
            tickets,
        },
        &incoming,
    )
}
