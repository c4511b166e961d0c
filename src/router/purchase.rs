//! Ticket purchase.

use askama::Template;
use axum::Form;
use axum::extract::State;
use axum::response::Response;
use serde::{Deserialize, Serialize};
use validator::{ValidationError, ValidationErrors};

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::event::Event;
use crate::flash::{Flash, IncomingFlash};
use crate::router::{EventId, render};
use crate::ticket::payment_request;
use crate::user::Identity;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Body {
    pub nostr_key: Option<String>,
    pub email: Option<String>,
}

/// Shown once a ticket is issued.
pub struct Confirmation {
    pub ticket_id: i64,
    pub holder: String,
    pub tickets_held: usize,
    pub payment_request: String,
    /// Where the QR image was written.
    pub qr_img_path: String,
    /// Where the browser fetches it.
    pub qr_url: String,
}

#[derive(Template)]
#[template(path = "purchase_ticket.html")]
pub struct PurchaseTemplate {
    flash: Option<Flash>,
    event: Event,
    confirmation: Option<Confirmation>,
}

fn missing_identity() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        "email",
        ValidationError::new("identity")
            .with_message("Provide an email or a nostr key.".into()),
    );
    errors
}

/// `GET /purchase_ticket/{event_id}`.
pub async fn form(
    State(state): State<AppState>,
    EventId(id): EventId,
    incoming: IncomingFlash,
) -> Result<Response> {
    let event = state.events.find_by_id(id).await?;

    render(
        PurchaseTemplate {
            flash: incoming.flash.clone(),
            event,
            confirmation: None,
        },
        &incoming,
    )
}

/// `POST /purchase_ticket/{event_id}`.
///
/// Issues the ticket, then writes the payment QR code.
pub async fn submit(
    State(state): State<AppState>,
    EventId(id): EventId,
    incoming: IncomingFlash,
    Form(body): Form<Body>,
) -> Result<Response> {
    let event = state.events.find_by_id(id).await?;

    let identity = Identity::new(body.email, body.nostr_key);
    if identity.is_empty() {
        return Err(ServerError::Validation(missing_identity()));
    }

    let purchase = state.tickets.purchase(&event, &identity).await?;
    let payment_request = payment_request(&purchase.ticket, &event.lightning_address);
    let qr_img_path = state.qr.generate(&payment_request).await?.display().to_string();
    let tickets_held = state
        .tickets
        .repo
        .tickets_for_user(purchase.user.id)
        .await?
        .len();

    render(
        PurchaseTemplate {
            flash: incoming.flash.clone(),
            confirmation: Some(Confirmation {
                ticket_id: purchase.ticket.id,
                holder: purchase.user.label().to_owned(),
                tickets_held,
                payment_request,
                qr_img_path,
                qr_url: state.qr_url(purchase.ticket.id),
            }),
            event,
        },
        &incoming,
    )
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::event::{Event, EventForm};
    use crate::*;

    async fn create_event(state: &AppState) -> Event {
        state
            .events
            .insert(
                &EventForm {
                    title: Some("Conf".into()),
                    date: Some("2025-03-01".into()),
                    tickets_available: Some("100".into()),
                    lightning_address: Some("pay@example.com".into()),
                    ..Default::default()
                }
                .parse()
                .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn count(state: &AppState, table: &str) -> i64 {
        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&state.db.pool)
            .await
            .unwrap();
        count
    }

    #[tokio::test]
    async fn test_form_is_rendered() {
        let dir = tempfile::tempdir().unwrap();
        let state = router::state(dir.path()).await;
        let event = create_event(&state).await;

        let path = format!("/purchase_ticket/{}", event.id);
        let response = make_request(app(state), Method::GET, &path, String::default(), None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_body(response).await;
        assert!(body.contains("Conf"));
        assert!(body.contains(r#"name="nostr_key""#));
        assert!(body.contains(r#"name="email""#));
    }

    #[tokio::test]
    async fn test_same_email_twice() {
        let dir = tempfile::tempdir().unwrap();
        let state = router::state(dir.path()).await;
        let event = create_event(&state).await;
        let app = app(state.clone());
        let path = format!("/purchase_ticket/{}", event.id);

        for held in 1..=2 {
            let response = make_request(
                app.clone(),
                Method::POST,
                &path,
                "nostr_key=&email=a%40b.com".into(),
                None,
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);

            let body = read_body(response).await;
            assert!(body.contains("/static/payment_qr.png"));
            assert!(body.contains(&format!("holds {held} ticket")));
        }

        assert_eq!(count(&state, "users").await, 1);
        assert_eq!(count(&state, "tickets").await, 2);

        let (distinct,): (i64,) =
            sqlx::query_as("SELECT COUNT(DISTINCT user_id) FROM tickets")
                .fetch_one(&state.db.pool)
                .await
                .unwrap();
        assert_eq!(distinct, 1);
    }

    #[tokio::test]
    async fn test_key_or_email_matches() {
        let dir = tempfile::tempdir().unwrap();
        let state = router::state(dir.path()).await;
        let event = create_event(&state).await;
        let app = app(state.clone());
        let path = format!("/purchase_ticket/{}", event.id);

        for body in [
            "nostr_key=npub1&email=a%40b.com",
            // Known key, new email.
            "nostr_key=npub1&email=other%40b.com",
            // Known email only.
            "email=a%40b.com",
        ] {
            let response = make_request(app.clone(), Method::POST, &path, body.into(), None).await;
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert_eq!(count(&state, "users").await, 1);
        assert_eq!(count(&state, "tickets").await, 3);

        // Neither identifier known.
        let response = make_request(
            app,
            Method::POST,
            &path,
            "nostr_key=npub2&email=c%40d.com".into(),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(count(&state, "users").await, 2);
        assert_eq!(count(&state, "tickets").await, 4);
    }

    #[tokio::test]
    async fn test_qr_encodes_payment_request() {
        let dir = tempfile::tempdir().unwrap();
        let state = router::state(dir.path()).await;
        let event = create_event(&state).await;

        let path = format!("/purchase_ticket/{}", event.id);
        let response = make_request(
            app(state.clone()),
            Method::POST,
            &path,
            "email=a%40b.com".into(),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let ticket_id = state.tickets.repo.find_all().await.unwrap()[0].id;
        let png = std::fs::read(state.qr.path()).unwrap();
        assert_eq!(
            crate::qr::tests::decode(&png),
            format!("Payment for ticket ID {ticket_id} to pay@example.com")
        );
    }

    #[tokio::test]
    async fn test_missing_identity() {
        let dir = tempfile::tempdir().unwrap();
        let state = router::state(dir.path()).await;
        let event = create_event(&state).await;

        let path = format!("/purchase_ticket/{}", event.id);
        let response = make_request(
            app(state.clone()),
            Method::POST,
            &path,
            "nostr_key=&email=".into(),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(count(&state, "tickets").await, 0);
    }

    #[tokio::test]
    async fn test_unknown_event_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = router::state(dir.path()).await;
        let app = app(state.clone());

        let response =
            make_request(app.clone(), Method::GET, "/purchase_ticket/7", String::default(), None)
                .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = make_request(
            app,
            Method::POST,
            "/purchase_ticket/7",
            "email=a%40b.com".into(),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(count(&state, "users").await, 0);
    }
}
