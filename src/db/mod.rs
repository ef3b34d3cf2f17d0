pub mod migrations;
pub mod queries;

use anyhow::Context;
use rusqlite::{params, Connection};

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}

/// Inserts the default admin account if the given username is absent.
/// There is no admin signup path; this is the only way an admin row
/// comes into existence.
pub fn seed_default_admin(conn: &Connection, username: &str, password: &str) -> anyhow::Result<()> {
    let exists: bool = conn
        .query_row(
            "SELECT COUNT(*) > 0 FROM admins WHERE username = ?1",
            params![username],
            |row| row.get(0),
        )
        .context("failed to check for existing admin")?;

    if exists {
        return Ok(());
    }

    let token = uuid::Uuid::new_v4().simple().to_string();
    conn.execute(
        "INSERT INTO admins (username, password, role, token) VALUES (?1, ?2, 'admin', ?3)",
        params![username, password, token],
    )
    .context("failed to seed default admin")?;

    tracing::info!(username, "seeded default admin account");
    Ok(())
}
