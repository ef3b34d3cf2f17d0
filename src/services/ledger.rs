use chrono::{NaiveDateTime, Utc};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{ParkingSpot, Reservation, SpotStatus};

/// Book the first free spot in a lot. The lot's current price is copied
/// onto the reservation, so later repricing never touches an open stay.
pub fn book_spot(
    conn: &Connection,
    user_id: i64,
    lot_id: i64,
    vehicle_number: &str,
) -> Result<(Reservation, ParkingSpot), AppError> {
    let vehicle_number = vehicle_number.trim();
    if vehicle_number.is_empty() {
        return Err(AppError::InvalidInput(
            "vehicle number is required".to_string(),
        ));
    }

    let lot = queries::get_lot(conn, lot_id)?
        .ok_or_else(|| AppError::NotFound(format!("parking lot {lot_id} not found")))?;

    let spot = queries::find_available_spot(conn, lot_id)?
        .ok_or_else(|| AppError::Conflict("no spots available in this lot".to_string()))?;

    // Guarded flip: if another booking grabbed the spot between the
    // lookup and the update, treat it as the lot being full.
    if !queries::occupy_spot(conn, spot.id)? {
        return Err(AppError::Conflict("no spots available in this lot".to_string()));
    }

    let start_time = Utc::now().naive_utc();
    let reservation_id = queries::create_reservation(
        conn,
        spot.id,
        user_id,
        vehicle_number,
        &start_time,
        lot.price,
    )?;

    tracing::info!(
        reservation_id,
        user_id,
        lot_id,
        spot_id = spot.id,
        "booked parking spot"
    );

    Ok((
        Reservation {
            id: reservation_id,
            spot_id: spot.id,
            user_id,
            vehicle_number: Some(vehicle_number.to_string()),
            start_time,
            end_time: None,
            cost_per_hour: lot.price,
            total_cost: None,
        },
        ParkingSpot {
            status: SpotStatus::Occupied,
            ..spot
        },
    ))
}

/// Close a reservation, bill the stay, and free the spot. Reservations
/// belonging to other users are reported as missing rather than refused.
pub fn vacate_spot(
    conn: &Connection,
    user_id: i64,
    reservation_id: i64,
) -> Result<Reservation, AppError> {
    let reservation = queries::get_reservation(conn, reservation_id)?
        .ok_or_else(|| AppError::NotFound(format!("reservation {reservation_id} not found")))?;

    if reservation.user_id != user_id {
        return Err(AppError::NotFound(format!(
            "reservation {reservation_id} not found"
        )));
    }

    if !reservation.is_active() {
        return Err(AppError::Conflict(
            "reservation is already closed".to_string(),
        ));
    }

    let end_time = Utc::now().naive_utc();
    let total_cost = compute_total_cost(
        &reservation.start_time,
        &end_time,
        reservation.cost_per_hour,
    );

    queries::close_reservation(conn, reservation_id, &end_time, total_cost)?;
    queries::set_spot_status(conn, reservation.spot_id, SpotStatus::Available)?;

    tracing::info!(
        reservation_id,
        user_id,
        spot_id = reservation.spot_id,
        total_cost,
        "vacated parking spot"
    );

    Ok(Reservation {
        end_time: Some(end_time),
        total_cost: Some(total_cost),
        ..reservation
    })
}

/// Charge for a stay: elapsed hours times the rate captured at booking,
/// rounded to cents. Sub-hour stays bill fractionally.
pub fn compute_total_cost(
    start: &NaiveDateTime,
    end: &NaiveDateTime,
    cost_per_hour: f64,
) -> f64 {
    let hours = (*end - *start).num_seconds() as f64 / 3600.0;
    round2(hours * cost_per_hour)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
