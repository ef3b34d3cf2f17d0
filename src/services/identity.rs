use chrono::Utc;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Admin, User};

/// Who a set of credentials resolved to.
#[derive(Debug)]
pub enum Principal {
    User(User),
    Admin(Admin),
}

impl Principal {
    pub fn token(&self) -> &str {
        match self {
            Principal::User(u) => &u.token,
            Principal::Admin(a) => &a.token,
        }
    }

    pub fn role(&self) -> &str {
        match self {
            Principal::User(u) => &u.role,
            Principal::Admin(a) => &a.role,
        }
    }
}

pub fn signup(
    conn: &Connection,
    user_name: &str,
    full_name: &str,
    password: &str,
) -> Result<User, AppError> {
    let user_name = user_name.trim();
    let full_name = full_name.trim();

    if user_name.is_empty() || password.is_empty() {
        return Err(AppError::InvalidInput(
            "username and password are required".to_string(),
        ));
    }

    if queries::get_user_by_username(conn, user_name)?.is_some() {
        return Err(AppError::Conflict(format!(
            "username '{user_name}' is already taken"
        )));
    }

    let token = fresh_token(conn)?;
    let created_time = Utc::now().naive_utc();
    let id = queries::create_user(conn, user_name, full_name, password, &token, &created_time)?;

    tracing::info!(user_id = id, user_name, "registered new user");

    Ok(User {
        id,
        user_name: user_name.to_string(),
        full_name: full_name.to_string(),
        password: password.to_string(),
        role: "user".to_string(),
        token,
        created_time,
    })
}

/// Users are checked before admins; a miss in one table falls through to
/// the other, so a user and an admin may share a username.
pub fn login(conn: &Connection, username: &str, password: &str) -> Result<Principal, AppError> {
    if let Some(user) = queries::get_user_by_username(conn, username)? {
        if user.password == password {
            return Ok(Principal::User(user));
        }
    }

    if let Some(admin) = queries::get_admin_by_username(conn, username)? {
        if admin.password == password {
            return Ok(Principal::Admin(admin));
        }
    }

    Err(AppError::Unauthorized)
}

pub fn resolve_user(conn: &Connection, token: &str) -> Result<User, AppError> {
    queries::get_user_by_token(conn, token)?.ok_or(AppError::Unauthorized)
}

pub fn resolve_admin(conn: &Connection, token: &str) -> Result<Admin, AppError> {
    queries::get_admin_by_token(conn, token)?.ok_or(AppError::Unauthorized)
}

// The token column is UNIQUE, so retry on the off chance a fresh UUID
// collides rather than failing the insert.
fn fresh_token(conn: &Connection) -> Result<String, AppError> {
    loop {
        let token = Uuid::new_v4().simple().to_string();
        if !queries::user_token_exists(conn, &token)? {
            return Ok(token);
        }
    }
}
