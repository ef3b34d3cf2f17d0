use chrono::Utc;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{ParkingLot, SpotStatus};

/// Create a lot and materialize one row per spot, numbered 1..=N.
pub fn create_lot(
    conn: &Connection,
    location_name: &str,
    price: f64,
    address: &str,
    pin_code: &str,
    max_number_of_spots: i64,
) -> Result<ParkingLot, AppError> {
    let location_name = location_name.trim();
    validate_lot_fields(location_name, price, max_number_of_spots)?;

    let created_at = Utc::now().naive_utc();
    let lot_id = queries::create_lot(
        conn,
        location_name,
        price,
        address,
        pin_code,
        max_number_of_spots,
        &created_at,
    )?;

    for spot_number in 1..=max_number_of_spots {
        queries::create_spot(conn, lot_id, spot_number, SpotStatus::Available)?;
    }

    tracing::info!(lot_id, spots = max_number_of_spots, "created parking lot");

    Ok(ParkingLot {
        id: lot_id,
        location_name: location_name.to_string(),
        price,
        address: address.to_string(),
        pin_code: pin_code.to_string(),
        max_number_of_spots,
        created_at,
    })
}

/// Rename/reprice a lot and resize its spot pool. The resize is
/// all-or-nothing: a shrink that would have to remove an occupied spot
/// fails the whole edit, name and price included.
pub fn edit_lot(
    conn: &Connection,
    lot_id: i64,
    location_name: &str,
    price: f64,
    max_number_of_spots: i64,
) -> Result<ParkingLot, AppError> {
    let lot = queries::get_lot(conn, lot_id)?
        .ok_or_else(|| AppError::NotFound(format!("parking lot {lot_id} not found")))?;

    let location_name = location_name.trim();
    validate_lot_fields(location_name, price, max_number_of_spots)?;

    let current = queries::count_spots(conn, lot_id)?;

    if max_number_of_spots > current {
        // New spots continue the numbering from the current pool size.
        for spot_number in (current + 1)..=max_number_of_spots {
            queries::create_spot(conn, lot_id, spot_number, SpotStatus::Available)?;
        }
    } else if max_number_of_spots < current {
        let to_remove = (current - max_number_of_spots) as usize;
        let available = queries::list_available_spots(conn, lot_id)?;
        if available.len() < to_remove {
            return Err(AppError::Conflict(format!(
                "cannot shrink lot to {max_number_of_spots} spots: only {} free",
                available.len()
            )));
        }
        for spot in available.iter().take(to_remove) {
            queries::delete_spot(conn, spot.id)?;
        }
    }

    queries::update_lot(conn, lot_id, location_name, price, max_number_of_spots)?;

    Ok(ParkingLot {
        id: lot_id,
        location_name: location_name.to_string(),
        price,
        address: lot.address,
        pin_code: lot.pin_code,
        max_number_of_spots,
        created_at: lot.created_at,
    })
}

/// A lot can only be removed once every spot in it is free.
pub fn delete_lot(conn: &Connection, lot_id: i64) -> Result<(), AppError> {
    if queries::get_lot(conn, lot_id)?.is_none() {
        return Err(AppError::NotFound(format!("parking lot {lot_id} not found")));
    }

    if queries::has_occupied_spot(conn, lot_id)? {
        return Err(AppError::Conflict(
            "lot has occupied spots and cannot be deleted".to_string(),
        ));
    }

    queries::delete_spots_for_lot(conn, lot_id)?;
    queries::delete_lot(conn, lot_id)?;

    tracing::info!(lot_id, "deleted parking lot");
    Ok(())
}

fn validate_lot_fields(
    location_name: &str,
    price: f64,
    max_number_of_spots: i64,
) -> Result<(), AppError> {
    if location_name.is_empty() {
        return Err(AppError::InvalidInput(
            "location name is required".to_string(),
        ));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::InvalidInput(
            "price must be a non-negative number".to_string(),
        ));
    }
    if max_number_of_spots < 0 {
        return Err(AppError::InvalidInput(
            "spot count cannot be negative".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn make_lot(conn: &Connection, spots: i64) -> ParkingLot {
        create_lot(conn, "Central Garage", 10.0, "1 Main St", "560001", spots).unwrap()
    }

    #[test]
    fn test_create_lot_materializes_spots() {
        let conn = setup_db();
        let lot = make_lot(&conn, 3);

        let spots = queries::list_spots_for_lot(&conn, lot.id).unwrap();
        assert_eq!(spots.len(), 3);
        let numbers: Vec<i64> = spots.iter().map(|s| s.spot_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(spots.iter().all(|s| s.status == SpotStatus::Available));
    }

    #[test]
    fn test_create_lot_zero_spots() {
        let conn = setup_db();
        let lot = make_lot(&conn, 0);
        assert_eq!(queries::count_spots(&conn, lot.id).unwrap(), 0);
    }

    #[test]
    fn test_create_lot_rejects_bad_input() {
        let conn = setup_db();
        assert!(matches!(
            create_lot(&conn, "", 10.0, "addr", "pin", 2),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            create_lot(&conn, "Lot", -1.0, "addr", "pin", 2),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            create_lot(&conn, "Lot", 10.0, "addr", "pin", -2),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_edit_lot_grows_spot_pool() {
        let conn = setup_db();
        let lot = make_lot(&conn, 2);

        let updated = edit_lot(&conn, lot.id, "Central Garage", 12.5, 5).unwrap();
        assert_eq!(updated.price, 12.5);
        assert_eq!(updated.max_number_of_spots, 5);

        let spots = queries::list_spots_for_lot(&conn, lot.id).unwrap();
        assert_eq!(spots.len(), 5);
        let numbers: Vec<i64> = spots.iter().map(|s| s.spot_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_edit_lot_shrinks_free_spots_first() {
        let conn = setup_db();
        let lot = make_lot(&conn, 4);

        edit_lot(&conn, lot.id, "Central Garage", 10.0, 2).unwrap();

        let spots = queries::list_spots_for_lot(&conn, lot.id).unwrap();
        assert_eq!(spots.len(), 2);
        // Lowest-id spots go first, so the survivors are the later ones.
        let numbers: Vec<i64> = spots.iter().map(|s| s.spot_number).collect();
        assert_eq!(numbers, vec![3, 4]);
    }

    #[test]
    fn test_edit_lot_shrink_blocked_by_occupied_spot() {
        let conn = setup_db();
        let lot = make_lot(&conn, 2);

        let spots = queries::list_spots_for_lot(&conn, lot.id).unwrap();
        queries::occupy_spot(&conn, spots[0].id).unwrap();
        queries::occupy_spot(&conn, spots[1].id).unwrap();

        let result = edit_lot(&conn, lot.id, "Renamed", 99.0, 1);
        assert!(matches!(result, Err(AppError::Conflict(_))));

        // The rejected edit must not leave the rename or reprice behind.
        let unchanged = queries::get_lot(&conn, lot.id).unwrap().unwrap();
        assert_eq!(unchanged.location_name, "Central Garage");
        assert_eq!(unchanged.price, 10.0);
        assert_eq!(queries::count_spots(&conn, lot.id).unwrap(), 2);
    }

    #[test]
    fn test_edit_lot_missing() {
        let conn = setup_db();
        let result = edit_lot(&conn, 42, "Ghost Lot", 1.0, 1);
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_delete_lot_removes_spots() {
        let conn = setup_db();
        let lot = make_lot(&conn, 3);

        delete_lot(&conn, lot.id).unwrap();

        assert!(queries::get_lot(&conn, lot.id).unwrap().is_none());
        assert_eq!(queries::count_spots(&conn, lot.id).unwrap(), 0);
    }

    #[test]
    fn test_delete_lot_blocked_by_occupied_spot() {
        let conn = setup_db();
        let lot = make_lot(&conn, 2);

        let spots = queries::list_spots_for_lot(&conn, lot.id).unwrap();
        queries::occupy_spot(&conn, spots[0].id).unwrap();

        let result = delete_lot(&conn, lot.id);
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert!(queries::get_lot(&conn, lot.id).unwrap().is_some());
    }

    #[test]
    fn test_delete_lot_missing() {
        let conn = setup_db();
        assert!(matches!(
            delete_lot(&conn, 42),
            Err(AppError::NotFound(_))
        ));
    }
}
