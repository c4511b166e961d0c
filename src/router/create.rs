//! Event creation form.

use askama::Template;
use axum::Form;
use axum::extract::State;
use axum::extract::rejection::FormRejection;
use axum::response::Response;

use crate::AppState;
use crate::error::{Result, ServerError, parse_validation_errors};
use crate::event::EventForm;
use crate::flash::{self, Flash, IncomingFlash};
use crate::router::render;

#[derive(Template)]
#[template(path = "create_event.html")]
pub struct CreateTemplate {
    flash: Option<Flash>,
}

/// `GET /create_event`.
pub async fn form(incoming: IncomingFlash) -> Result<Response> {
    render(
        CreateTemplate {
            flash: incoming.flash.clone(),
        },
        &incoming,
    )
}

fn describe(err: &ServerError) -> String {
    match err {
        ServerError::Validation(errors) => parse_validation_errors(errors)
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join(" "),
        err => err.to_string(),
    }
}

/// `POST /create_event`.
///
/// Always redirects: to the list on success, back to the form otherwise.
/// An undecodable body is reported like any other invalid field.
pub async fn submit(
    State(state): State<AppState>,
    body: std::result::Result<Form<EventForm>, FormRejection>,
) -> Response {
    let result = match body {
        Ok(Form(body)) => match body.parse() {
            Ok(event) => state.events.insert(&event).await.map_err(|err| describe(&err)),
            Err(errors) => Err(describe(&errors.into())),
        },
        Err(rejection) => Err(rejection.body_text()),
    };

    match result {
        Ok(_) => flash::redirect(
            &state.flash,
            Flash::success("Event created successfully!"),
            "/",
        ),
        Err(reason) => {
            tracing::error!(%reason, "event not created");

            flash::redirect(
                &state.flash,
                Flash::error(format!("Error creating event: {reason}")),
                "/create_event",
            )
        },
    }
}
