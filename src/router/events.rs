//! Event listing and details.

use askama::Template;
use axum::extract::State;
use axum::response::Response;

use crate::AppState;
use crate::error::Result;
use crate::event::Event;
use crate::flash::{Flash, IncomingFlash};
use crate::router::{EventId, render};

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    flash: Option<Flash>,
    events: Vec<Event>,
}

#[derive(Template)]
#[template(path = "event_details.html")]
pub struct DetailsTemplate {
    flash: Option<Flash>,
    event: Event,
    tickets_issued: usize,
}

/// `GET /`.
pub async fn index(State(state): State<AppState>, incoming: IncomingFlash) -> Result<Response> {
    let events = state.events.find_all().await?;

    render(
        IndexTemplate {
            flash: incoming.flash.clone(),
            events,
        },
        &incoming,
    )
}

/// `GET /event/{id}`.
pub async fn detail(
    State(state): State<AppState>,
    EventId(id): EventId,
    incoming: IncomingFlash,
) -> Result<Response> {
    let event = state.events.find_by_id(id).await?;
    let tickets_issued = state.tickets.repo.tickets_for_event(id).await?.len();

    render(
        DetailsTemplate {
            flash: incoming.flash.clone(),
            event,
            tickets_issued,
        },
        &incoming,
    )
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::event::EventForm;
    use crate::*;

    #[tokio::test]
    async fn test_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let state = router::state(dir.path()).await;

        let response = make_request(app(state), Method::GET, "/", String::default(), None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_body(response).await;
        assert!(body.contains("No events yet"));
    }

    #[tokio::test]
    async fn test_detail_shows_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let state = router::state(dir.path()).await;
        let event = state
            .events
            .insert(
                &EventForm {
                    title: Some("Conf".into()),
                    description: Some("Talks & <workshops>".into()),
                    date: Some("2025-03-01".into()),
                    location: Some("Lisbon".into()),
                    tickets_available: Some("100".into()),
                    lightning_address: Some("pay@example.com".into()),
                }
                .parse()
                .unwrap(),
            )
            .await
            .unwrap();

        let path = format!("/event/{}", event.id);
        let response = make_request(app(state), Method::GET, &path, String::default(), None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_body(response).await;
        assert!(body.contains("Conf"));
        assert!(body.contains("Talks &amp; &lt;workshops&gt;"));
        assert!(body.contains("2025-03-01"));
        assert!(body.contains("Lisbon"));
        assert!(body.contains("100"));
        assert!(body.contains("pay@example.com"));
        assert!(body.contains("0 issued"));
    }

    #[tokio::test]
    async fn test_unknown_event_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = router::state(dir.path()).await;
        let app = app(state);

        for path in ["/event/42", "/event/not-a-number"] {
            let response =
                make_request(app.clone(), Method::GET, path, String::default(), None).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
        }
    }
}
