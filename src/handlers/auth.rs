use axum::http::HeaderMap;
use rusqlite::Connection;

use crate::errors::AppError;
use crate::models::{Admin, User};
use crate::services::identity;

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() {
        return Err(AppError::Unauthorized);
    }
    Ok(token)
}

pub fn require_user(conn: &Connection, headers: &HeaderMap) -> Result<User, AppError> {
    identity::resolve_user(conn, bearer_token(headers)?)
}

pub fn require_admin(conn: &Connection, headers: &HeaderMap) -> Result<Admin, AppError> {
    identity::resolve_admin(conn, bearer_token(headers)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::services::identity;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers).unwrap(), "abc123");
    }

    #[test]
    fn test_missing_or_malformed_header_rejected() {
        let headers = HeaderMap::new();
        assert!(matches!(
            bearer_token(&headers),
            Err(AppError::Unauthorized)
        ));

        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Basic abc123".parse().unwrap());
        assert!(matches!(
            bearer_token(&headers),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_require_user_resolves_token() {
        let conn = db::init_db(":memory:").unwrap();
        let user = identity::signup(&conn, "maya", "Maya Iyer", "pw").unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            format!("Bearer {}", user.token).parse().unwrap(),
        );
        assert_eq!(require_user(&conn, &headers).unwrap().id, user.id);

        // A user token is not an admin token.
        assert!(matches!(
            require_admin(&conn, &headers),
            Err(AppError::Unauthorized)
        ));
    }
}
