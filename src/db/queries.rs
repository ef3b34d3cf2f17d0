use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{Admin, ParkingLot, ParkingSpot, Reservation, SpotStatus, User};

// ── Users & Admins ──

pub fn create_user(
    conn: &Connection,
    user_name: &str,
    full_name: &str,
    password: &str,
    token: &str,
    created_time: &NaiveDateTime,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO users (user_name, full_name, password, role, token, created_time)
         VALUES (?1, ?2, ?3, 'user', ?4, ?5)",
        params![
            user_name,
            full_name,
            password,
            token,
            created_time.format("%Y-%m-%d %H:%M:%S").to_string(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_user_by_username(conn: &Connection, user_name: &str) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        "SELECT id, user_name, full_name, password, role, token, created_time
         FROM users WHERE user_name = ?1",
        params![user_name],
        |row| Ok(parse_user_row(row)),
    );

    match result {
        Ok(user) => Ok(Some(user?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_user_by_token(conn: &Connection, token: &str) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        "SELECT id, user_name, full_name, password, role, token, created_time
         FROM users WHERE token = ?1",
        params![token],
        |row| Ok(parse_user_row(row)),
    );

    match result {
        Ok(user) => Ok(Some(user?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn user_token_exists(conn: &Connection, token: &str) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE token = ?1",
        params![token],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn list_users(conn: &Connection) -> anyhow::Result<Vec<User>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_name, full_name, password, role, token, created_time
         FROM users ORDER BY id ASC",
    )?;

    let rows = stmt.query_map([], |row| Ok(parse_user_row(row)))?;

    let mut users = vec![];
    for row in rows {
        users.push(row??);
    }
    Ok(users)
}

pub fn get_admin_by_username(conn: &Connection, username: &str) -> anyhow::Result<Option<Admin>> {
    let result = conn.query_row(
        "SELECT id, username, password, role, token FROM admins WHERE username = ?1",
        params![username],
        |row| {
            Ok(Admin {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                role: row.get(3)?,
                token: row.get(4)?,
            })
        },
    );

    match result {
        Ok(admin) => Ok(Some(admin)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_admin_by_token(conn: &Connection, token: &str) -> anyhow::Result<Option<Admin>> {
    let result = conn.query_row(
        "SELECT id, username, password, role, token FROM admins WHERE token = ?1",
        params![token],
        |row| {
            Ok(Admin {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                role: row.get(3)?,
                token: row.get(4)?,
            })
        },
    );

    match result {
        Ok(admin) => Ok(Some(admin)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn parse_user_row(row: &rusqlite::Row) -> anyhow::Result<User> {
    let created_time_str: String = row.get(6)?;
    let created_time = NaiveDateTime::parse_from_str(&created_time_str, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|_| Utc::now().naive_utc());

    Ok(User {
        id: row.get(0)?,
        user_name: row.get(1)?,
        full_name: row.get(2)?,
        password: row.get(3)?,
        role: row.get(4)?,
        token: row.get(5)?,
        created_time,
    })
}

// ── Parking Lots ──

pub fn create_lot(
    conn: &Connection,
    location_name: &str,
    price: f64,
    address: &str,
    pin_code: &str,
    max_number_of_spots: i64,
    created_at: &NaiveDateTime,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO parking_lots (location_name, price, address, pin_code, max_number_of_spots, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            location_name,
            price,
            address,
            pin_code,
            max_number_of_spots,
            created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_lot(conn: &Connection, lot_id: i64) -> anyhow::Result<Option<ParkingLot>> {
    let result = conn.query_row(
        "SELECT id, location_name, price, address, pin_code, max_number_of_spots, created_at
         FROM parking_lots WHERE id = ?1",
        params![lot_id],
        |row| Ok(parse_lot_row(row)),
    );

    match result {
        Ok(lot) => Ok(Some(lot?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_lots(conn: &Connection) -> anyhow::Result<Vec<ParkingLot>> {
    let mut stmt = conn.prepare(
        "SELECT id, location_name, price, address, pin_code, max_number_of_spots, created_at
         FROM parking_lots ORDER BY id ASC",
    )?;

    let rows = stmt.query_map([], |row| Ok(parse_lot_row(row)))?;

    let mut lots = vec![];
    for row in rows {
        lots.push(row??);
    }
    Ok(lots)
}

pub fn update_lot(
    conn: &Connection,
    lot_id: i64,
    location_name: &str,
    price: f64,
    max_number_of_spots: i64,
) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE parking_lots SET location_name = ?1, price = ?2, max_number_of_spots = ?3
         WHERE id = ?4",
        params![location_name, price, max_number_of_spots, lot_id],
    )?;
    Ok(())
}

pub fn delete_lot(conn: &Connection, lot_id: i64) -> anyhow::Result<()> {
    conn.execute("DELETE FROM parking_lots WHERE id = ?1", params![lot_id])?;
    Ok(())
}

fn parse_lot_row(row: &rusqlite::Row) -> anyhow::Result<ParkingLot> {
    let created_at_str: String = row.get(6)?;
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|_| Utc::now().naive_utc());

    Ok(ParkingLot {
        id: row.get(0)?,
        location_name: row.get(1)?,
        price: row.get(2)?,
        address: row.get(3)?,
        pin_code: row.get(4)?,
        max_number_of_spots: row.get(5)?,
        created_at,
    })
}

// ── Parking Spots ──

pub fn create_spot(
    conn: &Connection,
    lot_id: i64,
    spot_number: i64,
    status: SpotStatus,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO parking_spots (spot_number, lot_id, status) VALUES (?1, ?2, ?3)",
        params![spot_number, lot_id, status.as_str()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_spot(conn: &Connection, spot_id: i64) -> anyhow::Result<Option<ParkingSpot>> {
    let result = conn.query_row(
        "SELECT id, spot_number, lot_id, status FROM parking_spots WHERE id = ?1",
        params![spot_id],
        |row| Ok(parse_spot_row(row)),
    );

    match result {
        Ok(spot) => Ok(Some(spot?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn count_spots(conn: &Connection, lot_id: i64) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM parking_spots WHERE lot_id = ?1",
        params![lot_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn count_spots_with_status(
    conn: &Connection,
    lot_id: i64,
    status: SpotStatus,
) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM parking_spots WHERE lot_id = ?1 AND UPPER(status) = ?2",
        params![lot_id, status.as_str()],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn list_spots_for_lot(conn: &Connection, lot_id: i64) -> anyhow::Result<Vec<ParkingSpot>> {
    let mut stmt = conn.prepare(
        "SELECT id, spot_number, lot_id, status FROM parking_spots
         WHERE lot_id = ?1 ORDER BY id ASC",
    )?;

    let rows = stmt.query_map(params![lot_id], |row| Ok(parse_spot_row(row)))?;

    let mut spots = vec![];
    for row in rows {
        spots.push(row??);
    }
    Ok(spots)
}

/// AVAILABLE spots of a lot in listing order, lowest id first.
pub fn list_available_spots(conn: &Connection, lot_id: i64) -> anyhow::Result<Vec<ParkingSpot>> {
    let mut stmt = conn.prepare(
        "SELECT id, spot_number, lot_id, status FROM parking_spots
         WHERE lot_id = ?1 AND UPPER(status) = 'AVAILABLE' ORDER BY id ASC",
    )?;

    let rows = stmt.query_map(params![lot_id], |row| Ok(parse_spot_row(row)))?;

    let mut spots = vec![];
    for row in rows {
        spots.push(row??);
    }
    Ok(spots)
}

pub fn find_available_spot(conn: &Connection, lot_id: i64) -> anyhow::Result<Option<ParkingSpot>> {
    let result = conn.query_row(
        "SELECT id, spot_number, lot_id, status FROM parking_spots
         WHERE lot_id = ?1 AND UPPER(status) = 'AVAILABLE' ORDER BY id ASC LIMIT 1",
        params![lot_id],
        |row| Ok(parse_spot_row(row)),
    );

    match result {
        Ok(spot) => Ok(Some(spot?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn has_occupied_spot(conn: &Connection, lot_id: i64) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM parking_spots WHERE lot_id = ?1 AND UPPER(status) = 'OCCUPIED'",
        params![lot_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Guarded AVAILABLE→OCCUPIED flip. Returns false when the spot was not
/// available anymore, so a lost booking race surfaces instead of
/// double-occupying the spot.
pub fn occupy_spot(conn: &Connection, spot_id: i64) -> anyhow::Result<bool> {
    let changed = conn.execute(
        "UPDATE parking_spots SET status = 'OCCUPIED'
         WHERE id = ?1 AND UPPER(status) = 'AVAILABLE'",
        params![spot_id],
    )?;
    Ok(changed > 0)
}

pub fn set_spot_status(conn: &Connection, spot_id: i64, status: SpotStatus) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE parking_spots SET status = ?1 WHERE id = ?2",
        params![status.as_str(), spot_id],
    )?;
    Ok(())
}

pub fn delete_spot(conn: &Connection, spot_id: i64) -> anyhow::Result<()> {
    conn.execute("DELETE FROM parking_spots WHERE id = ?1", params![spot_id])?;
    Ok(())
}

pub fn delete_spots_for_lot(conn: &Connection, lot_id: i64) -> anyhow::Result<()> {
    conn.execute(
        "DELETE FROM parking_spots WHERE lot_id = ?1",
        params![lot_id],
    )?;
    Ok(())
}

fn parse_spot_row(row: &rusqlite::Row) -> anyhow::Result<ParkingSpot> {
    let status_str: String = row.get(3)?;

    Ok(ParkingSpot {
        id: row.get(0)?,
        spot_number: row.get(1)?,
        lot_id: row.get(2)?,
        status: SpotStatus::parse(&status_str),
    })
}

// ── Reservations ──

pub fn create_reservation(
    conn: &Connection,
    spot_id: i64,
    user_id: i64,
    vehicle_number: &str,
    start_time: &NaiveDateTime,
    cost_per_hour: f64,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO reservations (spot_id, user_id, vehicle_number, start_time, cost_per_hour)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            spot_id,
            user_id,
            vehicle_number,
            start_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            cost_per_hour,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_reservation(conn: &Connection, reservation_id: i64) -> anyhow::Result<Option<Reservation>> {
    let result = conn.query_row(
        "SELECT id, spot_id, user_id, vehicle_number, start_time, end_time, cost_per_hour, total_cost
         FROM reservations WHERE id = ?1",
        params![reservation_id],
        |row| Ok(parse_reservation_row(row)),
    );

    match result {
        Ok(reservation) => Ok(Some(reservation?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn close_reservation(
    conn: &Connection,
    reservation_id: i64,
    end_time: &NaiveDateTime,
    total_cost: f64,
) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE reservations SET end_time = ?1, total_cost = ?2 WHERE id = ?3",
        params![
            end_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            total_cost,
            reservation_id,
        ],
    )?;
    Ok(())
}

/// A reservation joined with its spot number and lot name, the shape the
/// dashboards and summaries render.
pub struct ReservationDetail {
    pub id: i64,
    pub spot_id: i64,
    pub user_id: i64,
    pub spot_number: i64,
    pub location_name: String,
    pub vehicle_number: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    pub cost_per_hour: f64,
    pub total_cost: Option<f64>,
}

pub fn active_reservations_for_user(
    conn: &Connection,
    user_id: i64,
) -> anyhow::Result<Vec<ReservationDetail>> {
    let mut stmt = conn.prepare(
        "SELECT r.id, r.spot_id, r.user_id, s.spot_number, l.location_name,
                r.vehicle_number, r.start_time, r.end_time, r.cost_per_hour, r.total_cost
         FROM reservations r
         JOIN parking_spots s ON s.id = r.spot_id
         JOIN parking_lots l ON l.id = s.lot_id
         WHERE r.user_id = ?1 AND r.end_time IS NULL
         ORDER BY r.start_time ASC",
    )?;

    let rows = stmt.query_map(params![user_id], |row| Ok(parse_reservation_detail_row(row)))?;

    let mut reservations = vec![];
    for row in rows {
        reservations.push(row??);
    }
    Ok(reservations)
}

pub fn closed_reservations_for_user(
    conn: &Connection,
    user_id: i64,
) -> anyhow::Result<Vec<ReservationDetail>> {
    let mut stmt = conn.prepare(
        "SELECT r.id, r.spot_id, r.user_id, s.spot_number, l.location_name,
                r.vehicle_number, r.start_time, r.end_time, r.cost_per_hour, r.total_cost
         FROM reservations r
         JOIN parking_spots s ON s.id = r.spot_id
         JOIN parking_lots l ON l.id = s.lot_id
         WHERE r.user_id = ?1 AND r.end_time IS NOT NULL
         ORDER BY r.start_time ASC",
    )?;

    let rows = stmt.query_map(params![user_id], |row| Ok(parse_reservation_detail_row(row)))?;

    let mut reservations = vec![];
    for row in rows {
        reservations.push(row??);
    }
    Ok(reservations)
}

/// The reservation a user currently has open with the latest start time,
/// if any.
pub fn latest_active_reservation_for_user(
    conn: &Connection,
    user_id: i64,
) -> anyhow::Result<Option<ReservationDetail>> {
    let result = conn.query_row(
        "SELECT r.id, r.spot_id, r.user_id, s.spot_number, l.location_name,
                r.vehicle_number, r.start_time, r.end_time, r.cost_per_hour, r.total_cost
         FROM reservations r
         JOIN parking_spots s ON s.id = r.spot_id
         JOIN parking_lots l ON l.id = s.lot_id
         WHERE r.user_id = ?1 AND r.end_time IS NULL
         ORDER BY r.start_time DESC, r.id ASC
         LIMIT 1",
        params![user_id],
        |row| Ok(parse_reservation_detail_row(row)),
    );

    match result {
        Ok(detail) => Ok(Some(detail?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn parse_reservation_row(row: &rusqlite::Row) -> anyhow::Result<Reservation> {
    let start_time_str: String = row.get(4)?;
    let end_time_str: Option<String> = row.get(5)?;

    let start_time = NaiveDateTime::parse_from_str(&start_time_str, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|_| Utc::now().naive_utc());
    let end_time = end_time_str
        .and_then(|s| NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S").ok());

    Ok(Reservation {
        id: row.get(0)?,
        spot_id: row.get(1)?,
        user_id: row.get(2)?,
        vehicle_number: row.get(3)?,
        start_time,
        end_time,
        cost_per_hour: row.get(6)?,
        total_cost: row.get(7)?,
    })
}

fn parse_reservation_detail_row(row: &rusqlite::Row) -> anyhow::Result<ReservationDetail> {
    let start_time_str: String = row.get(6)?;
    let end_time_str: Option<String> = row.get(7)?;

    let start_time = NaiveDateTime::parse_from_str(&start_time_str, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|_| Utc::now().naive_utc());
    let end_time = end_time_str
        .and_then(|s| NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S").ok());

    Ok(ReservationDetail {
        id: row.get(0)?,
        spot_id: row.get(1)?,
        user_id: row.get(2)?,
        spot_number: row.get(3)?,
        location_name: row.get(4)?,
        vehicle_number: row.get(5)?,
        start_time,
        end_time,
        cost_per_hour: row.get(8)?,
        total_cost: row.get(9)?,
    })
}
