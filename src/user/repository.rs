//! Handle database requests.

use sqlx::SqliteConnection;

use crate::error::Result;
use crate::user::{Identity, User};

/// First user whose key OR email matches `identity`.
///
/// Absent identifiers are bound as `NULL` and never match.
pub async fn find_by_identity(
    conn: &mut SqliteConnection,
    identity: &Identity,
) -> Result<Option<User>> {
    Ok(sqlx::query_as::<_, User>(
        "SELECT id, email, nostr_key FROM users WHERE nostr_key = ? OR email = ? ORDER BY id LIMIT 1",
    )
    .bind(&identity.nostr_key)
    .bind(&identity.email)
    .fetch_optional(&mut *conn)
    .await?)
}

/// Insert a user holding `identity`.
///
/// Fails when the email or key already belongs to someone else.
pub async fn insert(conn: &mut SqliteConnection, identity: &Identity) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (email, nostr_key) VALUES (?, ?) RETURNING id, email, nostr_key",
    )
    .bind(&identity.email)
    .bind(&identity.nostr_key)
    .fetch_one(&mut *conn)
    .await?;

    tracing::info!(user_id = user.id, "user created");
    Ok(user)
}

/// Find the user matching `identity`, or create it.
///
/// The boolean is `true` when the user was just created.
pub async fn find_or_create(
    conn: &mut SqliteConnection,
    identity: &Identity,
) -> Result<(User, bool)> {
    match find_by_identity(conn, identity).await? {
        Some(user) => Ok((user, false)),
        None => Ok((insert(conn, identity).await?, true)),
    }
}
