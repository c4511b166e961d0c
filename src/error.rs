//! Error handler for ticketeer.

use askama::Template;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use sqlx::Error as SQLxError;
use thiserror::Error;
use validator::ValidationErrors;

use crate::qr::QrError;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Enum representing server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("validation error occurred")]
    Validation(#[from] ValidationErrors),

    #[error("{entity} {id} does not exist")]
    NotFound { entity: &'static str, id: String },

    #[error("SQL request failed: {0}")]
    Sql(#[from] SQLxError),

    #[error("QR code generation failed: {0}")]
    Qr(#[from] QrError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),
}

impl ServerError {
    /// Shortcut for a missing event.
    pub fn event_not_found(id: impl ToString) -> Self {
        ServerError::NotFound {
            entity: "event",
            id: id.to_string(),
        }
    }
}

/// HTML error page.
#[derive(Debug, Template)]
#[template(path = "error.html")]
pub struct ErrorPage {
    status: u16,
    title: String,
    detail: String,
    errors: Vec<FieldError>,
}

impl ErrorPage {
    /// Update error status code.
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code.as_u16();
        self
    }

    /// Update `title` field.
    pub fn title(mut self, title: &str) -> Self {
        self.title = title.into();
        self
    }

    /// Add detailed error.
    pub fn details(mut self, description: &str) -> Self {
        self.detail = description.into();
        self
    }

    /// Automatically add errors field.
    pub fn errors(mut self, errors: &ValidationErrors) -> Self {
        self.errors = parse_validation_errors(errors);
        self
    }

    /// Transform [`ErrorPage`] into axum [`Response`].
    fn into_page(self) -> Response {
        let status = StatusCode::from_u16(self.status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match self.render() {
            Ok(body) => (status, Html(body)).into_response(),
            Err(err) => {
                tracing::error!(error = %err, "cannot render error page");
                internal_server_error()
            },
        }
    }
}

impl Default for ErrorPage {
    fn default() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            title: "Internal server error.".to_owned(),
            detail: String::default(),
            errors: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Flatten [`ValidationErrors`] into one entry per failing field.
pub fn parse_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields = errors
        .field_errors()
        .iter()
        .flat_map(|(field, issues)| {
            issues.iter().map(move |issue| FieldError {
                field: field.to_string(),
                message: issue
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| issue.code.to_string()),
            })
        })
        .collect::<Vec<_>>();
    fields.sort_by(|a, b| a.field.cmp(&b.field));
    fields
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let page = match &self {
            ServerError::Validation(validation_errors) => ErrorPage::default()
                .status(StatusCode::BAD_REQUEST)
                .title("There were validation errors with your request.")
                .details(&self.to_string())
                .errors(validation_errors),

            ServerError::NotFound { .. } => ErrorPage::default()
                .status(StatusCode::NOT_FOUND)
                .title("Not found.")
                .details(&self.to_string()),

            _ => {
                tracing::error!(error = %self, "server returned 500 status");

                ErrorPage::default()
            },
        };

        page.into_page()
    }
}

/// Fallback for unknown routes.
pub async fn not_found() -> Response {
    ErrorPage::default()
        .status(StatusCode::NOT_FOUND)
        .title("Not found.")
        .details("The requested page does not exist.")
        .into_page()
}

fn internal_server_error() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body("Internal server error".into())
        .unwrap_or_else(|_| Response::new("Internal server error".into()))
}
