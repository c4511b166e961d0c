//! Standalone QR code rendering.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;

use crate::AppState;
use crate::error::Result;

/// `GET /generate_qr/{payment_request}`.
///
/// Any text is accepted; nothing ties it to a ticket.
pub async fn handler(
    State(state): State<AppState>,
    Path(payment_request): Path<String>,
) -> Result<impl IntoResponse> {
    let path = state.qr.generate(&payment_request).await?;
    let image = tokio::fs::read(path).await?;

    Ok(([(header::CONTENT_TYPE, "image/png")], image))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode, header};
    use http_body_util::BodyExt;

    use crate::*;

    #[tokio::test]
    async fn test_generate_hello() {
        let dir = tempfile::tempdir().unwrap();
        let state = router::state(dir.path()).await;

        let response = make_request(
            app(state.clone()),
            Method::GET,
            "/generate_qr/hello",
            String::default(),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.starts_with(b"\x89PNG\r\n\x1a\n"));
        assert_eq!(crate::qr::tests::decode(&body), "hello");

        // The shared file holds the same image.
        assert_eq!(std::fs::read(state.qr.path()).unwrap(), body.to_vec());
    }

    #[tokio::test]
    async fn test_path_is_percent_decoded() {
        let dir = tempfile::tempdir().unwrap();
        let state = router::state(dir.path()).await;

        let response = make_request(
            app(state),
            Method::GET,
            "/generate_qr/Payment%20for%20ticket%20ID%201%20to%20pay@example.com",
            String::default(),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(
            crate::qr::tests::decode(&body),
            "Payment for ticket ID 1 to pay@example.com"
        );
    }

    #[tokio::test]
    async fn test_oversized_payload_fails() {
        let dir = tempfile::tempdir().unwrap();
        let state = router::state(dir.path()).await;

        let path = format!("/generate_qr/{}", "x".repeat(3_000));
        let response = make_request(app(state), Method::GET, &path, String::default(), None).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
