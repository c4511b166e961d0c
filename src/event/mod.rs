mod repository;

pub use repository::*;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use validator::{ValidationError, ValidationErrors};

/// Accepted format of the `date` form field.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Event as saved on database.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDateTime,
    pub location: Option<String>,
    pub tickets_available: i64,
    pub lightning_address: String,
}

/// Event ready to be inserted.
#[derive(Clone, Debug, PartialEq)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDateTime,
    pub location: Option<String>,
    pub tickets_available: i64,
    pub lightning_address: String,
}

/// Raw `POST /create_event` form. Every field is kept as text so that a bad
/// value becomes a field error instead of a rejected request.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EventForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub location: Option<String>,
    pub tickets_available: Option<String>,
    pub lightning_address: Option<String>,
}

fn field_error(code: &'static str, message: String) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

/// Missing from the submitted form. Empty text is a value.
fn required(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<String>,
) -> Option<String> {
    match value {
        Some(value) => Some(value),
        None => {
            errors.add(field, field_error("required", format!("'{field}' is required.")));
            None
        },
    }
}

impl EventForm {
    /// Coerce every field to its type.
    ///
    /// All failing fields are reported at once.
    pub fn parse(self) -> Result<NewEvent, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = required(&mut errors, "title", self.title);
        let lightning_address =
            required(&mut errors, "lightning_address", self.lightning_address);

        let date = required(&mut errors, "date", self.date).and_then(|date| {
            match NaiveDate::parse_from_str(date.trim(), DATE_FORMAT) {
                Ok(date) => Some(date.and_time(NaiveTime::MIN)),
                Err(err) => {
                    errors.add(
                        "date",
                        field_error("date", format!("'{date}' does not match YYYY-MM-DD: {err}.")),
                    );
                    None
                },
            }
        });

        let tickets_available = required(&mut errors, "tickets_available", self.tickets_available)
            .and_then(|count| match count.trim().parse::<i64>() {
                Ok(count) => Some(count),
                Err(_) => {
                    errors.add(
                        "tickets_available",
                        field_error("integer", format!("'{count}' is not a whole number.")),
                    );
                    None
                },
            });

        match (title, date, tickets_available, lightning_address) {
            (Some(title), Some(date), Some(tickets_available), Some(lightning_address))
                if errors.is_empty() =>
            {
                Ok(NewEvent {
                    title,
                    description: self.description,
                    date,
                    location: self.location,
                    tickets_available,
                    lightning_address,
                })
            },
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> EventForm {
        EventForm {
            title: Some("Conf".into()),
            description: Some("Two days of talks".into()),
            date: Some("2025-03-01".into()),
            location: Some("Lisbon".into()),
            tickets_available: Some("100".into()),
            lightning_address: Some("pay@example.com".into()),
        }
    }

    #[test]
    fn test_parse_valid_form() {
        let event = form().parse().unwrap();

        assert_eq!(event.title, "Conf");
        assert_eq!(event.description.as_deref(), Some("Two days of talks"));
        assert_eq!(
            event.date,
            NaiveDate::from_ymd_opt(2025, 3, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
        assert_eq!(event.location.as_deref(), Some("Lisbon"));
        assert_eq!(event.tickets_available, 100);
        assert_eq!(event.lightning_address, "pay@example.com");
    }

    #[test]
    fn test_optional_fields_may_be_missing() {
        let event = EventForm {
            description: None,
            location: None,
            ..form()
        }
        .parse()
        .unwrap();

        assert_eq!(event.description, None);
        assert_eq!(event.location, None);
    }

    #[test]
    fn test_every_bad_field_is_reported() {
        let errors = EventForm {
            title: None,
            date: Some("01/03/2025".into()),
            tickets_available: Some("a hundred".into()),
            ..form()
        }
        .parse()
        .unwrap_err();

        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("date"));
        assert!(fields.contains_key("tickets_available"));
        assert!(!fields.contains_key("lightning_address"));
    }

    #[test]
    fn test_blank_text_is_kept() {
        let event = EventForm {
            title: Some(String::new()),
            lightning_address: Some("  ".into()),
            ..form()
        }
        .parse()
        .unwrap();

        assert_eq!(event.title, "");
        assert_eq!(event.lightning_address, "  ");
    }

    #[test]
    fn test_blank_typed_fields_are_rejected() {
        let errors = EventForm {
            date: Some(String::new()),
            tickets_available: Some(" ".into()),
            ..form()
        }
        .parse()
        .unwrap_err();

        let fields = errors.field_errors();
        assert_eq!(fields.len(), 2);
        assert!(fields.contains_key("date"));
        assert!(fields.contains_key("tickets_available"));
    }
}
