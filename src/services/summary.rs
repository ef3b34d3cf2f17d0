use rusqlite::Connection;

use crate::db::queries::{self, ReservationDetail};
use crate::errors::AppError;
use crate::models::{ParkingLot, ParkingSpot, SpotStatus, User};
use crate::services::ledger;

/// A lot with its live spot counts.
pub struct LotAvailability {
    pub lot: ParkingLot,
    pub total_spots: i64,
    pub available_spots: i64,
    pub occupied_spots: i64,
}

/// A lot with the full spot grid, for the admin dashboard.
pub struct LotOverview {
    pub lot: ParkingLot,
    pub spots: Vec<ParkingSpot>,
    pub available_spots: i64,
    pub occupied_spots: i64,
}

/// A user row plus the reservation they currently have open, if any.
pub struct UserActivity {
    pub user: User,
    pub active_reservation: Option<ReservationDetail>,
}

pub struct AdminDashboard {
    pub lots: Vec<LotOverview>,
    pub users: Vec<UserActivity>,
}

pub struct UserDashboard {
    pub lots: Vec<LotAvailability>,
    pub active: Vec<ReservationDetail>,
    pub history: Vec<ReservationDetail>,
}

/// One user's spend in one lot, keyed by the lot's display name.
pub struct UserLotSpend {
    pub location_name: String,
    pub total_cost: f64,
}

pub fn lot_availability(conn: &Connection) -> Result<Vec<LotAvailability>, AppError> {
    let lots = queries::list_lots(conn)?;

    let mut out = Vec::with_capacity(lots.len());
    for lot in lots {
        let total = queries::count_spots(conn, lot.id)?;
        let available = queries::count_spots_with_status(conn, lot.id, SpotStatus::Available)?;
        let occupied = queries::count_spots_with_status(conn, lot.id, SpotStatus::Occupied)?;
        out.push(LotAvailability {
            lot,
            total_spots: total,
            available_spots: available,
            occupied_spots: occupied,
        });
    }
    Ok(out)
}

pub fn admin_dashboard(conn: &Connection) -> Result<AdminDashboard, AppError> {
    let lots = queries::list_lots(conn)?;

    let mut overviews = Vec::with_capacity(lots.len());
    for lot in lots {
        let spots = queries::list_spots_for_lot(conn, lot.id)?;
        let available = spots
            .iter()
            .filter(|s| s.status == SpotStatus::Available)
            .count() as i64;
        let occupied = spots.len() as i64 - available;
        overviews.push(LotOverview {
            lot,
            spots,
            available_spots: available,
            occupied_spots: occupied,
        });
    }

    let mut users = vec![];
    for user in queries::list_users(conn)? {
        let active_reservation = queries::latest_active_reservation_for_user(conn, user.id)?;
        users.push(UserActivity {
            user,
            active_reservation,
        });
    }

    Ok(AdminDashboard {
        lots: overviews,
        users,
    })
}

pub fn user_dashboard(conn: &Connection, user_id: i64) -> Result<UserDashboard, AppError> {
    Ok(UserDashboard {
        lots: lot_availability(conn)?,
        active: queries::active_reservations_for_user(conn, user_id)?,
        history: queries::closed_reservations_for_user(conn, user_id)?,
    })
}

/// Per-lot spend over the user's closed reservations, in the order the
/// lots were first parked in. Per-stay charges are already rounded, and
/// the rollup rounds the sum once more.
pub fn user_summary(conn: &Connection, user_id: i64) -> Result<Vec<UserLotSpend>, AppError> {
    let closed = queries::closed_reservations_for_user(conn, user_id)?;

    let mut spends: Vec<UserLotSpend> = vec![];
    for detail in closed {
        let amount = detail.total_cost.unwrap_or(0.0);
        match spends
            .iter()
            .position(|s| s.location_name == detail.location_name)
        {
            Some(i) => spends[i].total_cost += amount,
            None => spends.push(UserLotSpend {
                location_name: detail.location_name,
                total_cost: amount,
            }),
        }
    }

    for entry in &mut spends {
        entry.total_cost = ledger::round2(entry.total_cost);
    }

    Ok(spends)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::services::{identity, ledger, registry};
    use chrono::NaiveDateTime;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    // Insert a closed reservation directly so start time and charge are exact.
    fn closed_stay(
        conn: &Connection,
        spot_id: i64,
        user_id: i64,
        start: &str,
        end: &str,
        total: f64,
    ) {
        let id = crate::db::queries::create_reservation(
            conn,
            spot_id,
            user_id,
            "KA-01-1234",
            &dt(start),
            10.0,
        )
        .unwrap();
        crate::db::queries::close_reservation(conn, id, &dt(end), total).unwrap();
    }

    // Insert a still-open reservation directly so the start time is exact.
    fn open_stay(conn: &Connection, spot_id: i64, user_id: i64, start: &str) -> i64 {
        let id = crate::db::queries::create_reservation(
            conn,
            spot_id,
            user_id,
            "KA-01-1234",
            &dt(start),
            10.0,
        )
        .unwrap();
        crate::db::queries::set_spot_status(conn, spot_id, SpotStatus::Occupied).unwrap();
        id
    }

    #[test]
    fn test_lot_availability_counts() {
        let conn = setup_db();
        let user = identity::signup(&conn, "maya", "Maya Iyer", "pw").unwrap();
        let lot = registry::create_lot(&conn, "Central", 10.0, "a", "p", 3).unwrap();

        ledger::book_spot(&conn, user.id, lot.id, "KA-01-1234").unwrap();

        let availability = lot_availability(&conn).unwrap();
        assert_eq!(availability.len(), 1);
        assert_eq!(availability[0].total_spots, 3);
        assert_eq!(availability[0].available_spots, 2);
        assert_eq!(availability[0].occupied_spots, 1);
    }

    #[test]
    fn test_summary_is_stable_without_new_bookings() {
        let conn = setup_db();
        let user = identity::signup(&conn, "maya", "Maya Iyer", "pw").unwrap();
        let lot = registry::create_lot(&conn, "Central", 10.0, "a", "p", 2).unwrap();
        let (reservation, _) = ledger::book_spot(&conn, user.id, lot.id, "KA-01-1234").unwrap();
        ledger::vacate_spot(&conn, user.id, reservation.id).unwrap();

        let first = lot_availability(&conn).unwrap();
        let second = lot_availability(&conn).unwrap();

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.available_spots, b.available_spots);
            assert_eq!(a.occupied_spots, b.occupied_spots);
        }

        let first_spends = user_summary(&conn, user.id).unwrap();
        let second_spends = user_summary(&conn, user.id).unwrap();
        assert_eq!(first_spends.len(), second_spends.len());
        assert_eq!(first_spends[0].total_cost, second_spends[0].total_cost);
    }

    #[test]
    fn test_user_dashboard_splits_active_and_history() {
        let conn = setup_db();
        let user = identity::signup(&conn, "maya", "Maya Iyer", "pw").unwrap();
        let lot = registry::create_lot(&conn, "Central", 10.0, "a", "p", 2).unwrap();

        let (closed, _) = ledger::book_spot(&conn, user.id, lot.id, "KA-01-0001").unwrap();
        ledger::vacate_spot(&conn, user.id, closed.id).unwrap();
        let (open, _) = ledger::book_spot(&conn, user.id, lot.id, "KA-01-0002").unwrap();

        let dashboard = user_dashboard(&conn, user.id).unwrap();
        assert_eq!(dashboard.active.len(), 1);
        assert_eq!(dashboard.active[0].id, open.id);
        assert_eq!(dashboard.history.len(), 1);
        assert_eq!(dashboard.history[0].id, closed.id);
        assert_eq!(dashboard.lots.len(), 1);
    }

    #[test]
    fn test_user_dashboard_only_shows_own_reservations() {
        let conn = setup_db();
        let maya = identity::signup(&conn, "maya", "Maya Iyer", "pw").unwrap();
        let ravi = identity::signup(&conn, "ravi", "Ravi Rao", "pw").unwrap();
        let lot = registry::create_lot(&conn, "Central", 10.0, "a", "p", 2).unwrap();

        ledger::book_spot(&conn, maya.id, lot.id, "KA-01-0001").unwrap();

        let dashboard = user_dashboard(&conn, ravi.id).unwrap();
        assert!(dashboard.active.is_empty());
        assert!(dashboard.history.is_empty());
    }

    #[test]
    fn test_user_summary_groups_by_lot_name_in_first_seen_order() {
        let conn = setup_db();
        let user = identity::signup(&conn, "maya", "Maya Iyer", "pw").unwrap();
        let west = registry::create_lot(&conn, "West End", 10.0, "a", "p", 2).unwrap();
        let airport = registry::create_lot(&conn, "Airport", 10.0, "a", "p", 2).unwrap();

        let west_spots = crate::db::queries::list_spots_for_lot(&conn, west.id).unwrap();
        let airport_spots = crate::db::queries::list_spots_for_lot(&conn, airport.id).unwrap();

        // First stay is in West End, so it leads despite sorting after
        // Airport alphabetically.
        closed_stay(&conn, west_spots[0].id, user.id, "2025-06-16 08:00:00", "2025-06-16 09:00:00", 10.0);
        closed_stay(&conn, airport_spots[0].id, user.id, "2025-06-16 10:00:00", "2025-06-16 11:00:00", 10.0);
        closed_stay(&conn, west_spots[1].id, user.id, "2025-06-16 12:00:00", "2025-06-16 13:00:00", 10.0);

        let spends = user_summary(&conn, user.id).unwrap();
        assert_eq!(spends.len(), 2);
        assert_eq!(spends[0].location_name, "West End");
        assert_eq!(spends[0].total_cost, 20.0);
        assert_eq!(spends[1].location_name, "Airport");
        assert_eq!(spends[1].total_cost, 10.0);
    }

    #[test]
    fn test_user_summary_rounds_the_rollup() {
        let conn = setup_db();
        let user = identity::signup(&conn, "maya", "Maya Iyer", "pw").unwrap();
        let lot = registry::create_lot(&conn, "Central", 10.0, "a", "p", 2).unwrap();
        let spots = crate::db::queries::list_spots_for_lot(&conn, lot.id).unwrap();

        closed_stay(&conn, spots[0].id, user.id, "2025-06-16 08:00:00", "2025-06-16 08:20:00", 3.33);
        closed_stay(&conn, spots[1].id, user.id, "2025-06-16 09:00:00", "2025-06-16 09:20:00", 3.33);

        let spends = user_summary(&conn, user.id).unwrap();
        assert_eq!(spends.len(), 1);
        assert_eq!(spends[0].total_cost, 6.66);
    }

    #[test]
    fn test_user_summary_ignores_open_reservations() {
        let conn = setup_db();
        let user = identity::signup(&conn, "maya", "Maya Iyer", "pw").unwrap();
        let lot = registry::create_lot(&conn, "Central", 10.0, "a", "p", 1).unwrap();

        ledger::book_spot(&conn, user.id, lot.id, "KA-01-1234").unwrap();

        let spends = user_summary(&conn, user.id).unwrap();
        assert!(spends.is_empty());
    }

    #[test]
    fn test_admin_dashboard_lists_lots_spots_and_users() {
        let conn = setup_db();
        let user = identity::signup(&conn, "maya", "Maya Iyer", "pw").unwrap();
        let lot = registry::create_lot(&conn, "Central", 10.0, "a", "p", 2).unwrap();
        ledger::book_spot(&conn, user.id, lot.id, "KA-01-1234").unwrap();

        let dashboard = admin_dashboard(&conn).unwrap();
        assert_eq!(dashboard.lots.len(), 1);
        assert_eq!(dashboard.lots[0].spots.len(), 2);
        assert_eq!(dashboard.lots[0].occupied_spots, 1);
        assert_eq!(dashboard.lots[0].available_spots, 1);
        assert_eq!(dashboard.users.len(), 1);
        assert_eq!(dashboard.users[0].user.user_name, "maya");

        let active = dashboard.users[0].active_reservation.as_ref().unwrap();
        assert_eq!(active.location_name, "Central");
        assert!(active.end_time.is_none());
    }

    #[test]
    fn test_admin_dashboard_attaches_latest_active_reservation() {
        let conn = setup_db();
        let user = identity::signup(&conn, "maya", "Maya Iyer", "pw").unwrap();
        let lot = registry::create_lot(&conn, "Central", 10.0, "a", "p", 3).unwrap();
        let spots = crate::db::queries::list_spots_for_lot(&conn, lot.id).unwrap();

        open_stay(&conn, spots[0].id, user.id, "2025-06-16 08:00:00");
        let latest = open_stay(&conn, spots[1].id, user.id, "2025-06-16 10:00:00");

        let dashboard = admin_dashboard(&conn).unwrap();
        let active = dashboard.users[0].active_reservation.as_ref().unwrap();
        assert_eq!(active.id, latest);
        assert_eq!(active.spot_number, spots[1].spot_number);
    }

    #[test]
    fn test_admin_dashboard_user_without_active_reservation() {
        let conn = setup_db();
        let user = identity::signup(&conn, "maya", "Maya Iyer", "pw").unwrap();
        let lot = registry::create_lot(&conn, "Central", 10.0, "a", "p", 1).unwrap();
        let (reservation, _) = ledger::book_spot(&conn, user.id, lot.id, "KA-01-1234").unwrap();
        ledger::vacate_spot(&conn, user.id, reservation.id).unwrap();

        let dashboard = admin_dashboard(&conn).unwrap();
        assert!(dashboard.users[0].active_reservation.is_none());
    }
}
