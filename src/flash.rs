//! One-shot status messages carried by a signed cookie.
//!
//! A handler redirects with [`redirect`]; the next rendered page extracts the
//! message through [`IncomingFlash`], shows it and clears the cookie.

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Redirect, Response};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use url::form_urlencoded;

use crate::AppState;

pub const COOKIE_NAME: &str = "flash";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Error => "error",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "success" => Some(Level::Success),
            "error" => Some(Level::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status message shown once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }
}

/// Signs and verifies flash cookies.
#[derive(Clone)]
pub struct FlashKey(Arc<Vec<u8>>);

impl FlashKey {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self(Arc::new(secret.as_ref().to_vec()))
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.0).expect("HMAC can take key of any size")
    }

    /// Serialize `flash` into a signed cookie value.
    pub fn encode(&self, flash: &Flash) -> String {
        let message: String =
            form_urlencoded::byte_serialize(flash.message.as_bytes()).collect();
        let payload = format!("{}:{}", flash.level, message);

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        format!("{payload}.{signature}")
    }

    /// Read a cookie value back, `None` if it was tampered with.
    pub fn decode(&self, value: &str) -> Option<Flash> {
        let (payload, signature) = value.rsplit_once('.')?;
        let signature = hex::decode(signature).ok()?;

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).ok()?;

        let (level, message) = payload.split_once(':')?;
        let message = form_urlencoded::parse(format!("m={message}").as_bytes())
            .next()
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();

        Some(Flash {
            level: Level::parse(level)?,
            message,
        })
    }
}

impl fmt::Debug for FlashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FlashKey(..)")
    }
}

impl FromRef<AppState> for FlashKey {
    fn from_ref(state: &AppState) -> FlashKey {
        state.flash.clone()
    }
}

/// Redirect to `to`, attaching `flash` for the next page.
pub fn redirect(key: &FlashKey, flash: Flash, to: &str) -> Response {
    let cookie = format!(
        "{COOKIE_NAME}={}; Path=/; HttpOnly; SameSite=Lax",
        key.encode(&flash)
    );

    match HeaderValue::from_str(&cookie) {
        Ok(cookie) => ([(SET_COOKIE, cookie)], Redirect::to(to)).into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "flash cookie is not a valid header");
            Redirect::to(to).into_response()
        },
    }
}

/// Message received with the current request, if any.
///
/// Also remembers whether a flash cookie was sent at all so the response can
/// clear it.
#[derive(Debug, Default)]
pub struct IncomingFlash {
    pub flash: Option<Flash>,
    present: bool,
}

impl IncomingFlash {
    /// Attach the cookie removal to `response` when needed.
    pub fn consume(&self, mut response: Response) -> Response {
        if self.present {
            response.headers_mut().append(
                SET_COOKIE,
                HeaderValue::from_static("flash=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax"),
            );
        }
        response
    }
}

impl<S> FromRequestParts<S> for IncomingFlash
where
    FlashKey: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let key = FlashKey::from_ref(state);

        let value = parts
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|header| header.to_str().ok())
            .flat_map(|header| header.split(';'))
            .filter_map(|cookie| cookie.trim().split_once('='))
            .find(|(name, _)| *name == COOKIE_NAME)
            .map(|(_, value)| value.to_owned());

        Ok(match value {
            Some(value) => IncomingFlash {
                flash: key.decode(&value),
                present: true,
            },
            None => IncomingFlash::default(),
        })
    }
}
