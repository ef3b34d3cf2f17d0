use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub user_name: String,
    pub full_name: String,
    // Plaintext credential; login does an exact string match.
    pub password: String,
    pub role: String,
    pub token: String,
    pub created_time: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub role: String,
    pub token: String,
}
