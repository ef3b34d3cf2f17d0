use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries::ReservationDetail;
use crate::errors::AppError;
use crate::handlers::auth;
use crate::services::{identity, ledger, summary};
use crate::state::AppState;

// POST /api/signup
#[derive(Deserialize)]
pub struct SignupRequest {
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SignupResponse {
    id: i64,
    user_name: String,
    full_name: String,
    role: String,
    token: String,
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    let mut db = state.db.lock().unwrap();
    let tx = db.transaction()?;
    let user = identity::signup(&tx, &body.username, &body.full_name, &body.password)?;
    tx.commit()?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            id: user.id,
            user_name: user.user_name,
            full_name: user.full_name,
            role: user.role,
            token: user.token,
        }),
    ))
}

// POST /api/login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    token: String,
    role: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let db = state.db.lock().unwrap();
    let principal = identity::login(&db, &body.username, &body.password)?;

    Ok(Json(LoginResponse {
        token: principal.token().to_string(),
        role: principal.role().to_string(),
    }))
}

// GET /api/user/dashboard
#[derive(Serialize)]
pub struct LotAvailabilityResponse {
    id: i64,
    location_name: String,
    address: String,
    pin_code: String,
    price: f64,
    total_spots: i64,
    available_spots: i64,
    occupied_spots: i64,
}

#[derive(Serialize)]
pub struct ReservationEntry {
    id: i64,
    spot_id: i64,
    spot_number: i64,
    location_name: String,
    vehicle_number: Option<String>,
    start_time: String,
    end_time: Option<String>,
    cost_per_hour: f64,
    total_cost: Option<f64>,
}

#[derive(Serialize)]
pub struct UserDashboardResponse {
    lots: Vec<LotAvailabilityResponse>,
    active_reservations: Vec<ReservationEntry>,
    history: Vec<ReservationEntry>,
}

fn reservation_entry(detail: ReservationDetail) -> ReservationEntry {
    ReservationEntry {
        id: detail.id,
        spot_id: detail.spot_id,
        spot_number: detail.spot_number,
        location_name: detail.location_name,
        vehicle_number: detail.vehicle_number,
        start_time: detail.start_time.format("%Y-%m-%d %H:%M:%S").to_string(),
        end_time: detail
            .end_time
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
        cost_per_hour: detail.cost_per_hour,
        total_cost: detail.total_cost,
    }
}

pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<UserDashboardResponse>, AppError> {
    let db = state.db.lock().unwrap();
    let user = auth::require_user(&db, &headers)?;

    let dashboard = summary::user_dashboard(&db, user.id)?;

    let lots = dashboard
        .lots
        .into_iter()
        .map(|entry| LotAvailabilityResponse {
            id: entry.lot.id,
            location_name: entry.lot.location_name,
            address: entry.lot.address,
            pin_code: entry.lot.pin_code,
            price: entry.lot.price,
            total_spots: entry.total_spots,
            available_spots: entry.available_spots,
            occupied_spots: entry.occupied_spots,
        })
        .collect();

    Ok(Json(UserDashboardResponse {
        lots,
        active_reservations: dashboard.active.into_iter().map(reservation_entry).collect(),
        history: dashboard.history.into_iter().map(reservation_entry).collect(),
    }))
}

// POST /api/user/reservations
#[derive(Deserialize)]
pub struct BookRequest {
    pub lot_id: i64,
    #[serde(default)]
    pub vehicle_number: String,
}

#[derive(Serialize)]
pub struct BookResponse {
    id: i64,
    spot_id: i64,
    spot_number: i64,
    lot_id: i64,
    vehicle_number: Option<String>,
    start_time: String,
    cost_per_hour: f64,
}

pub async fn book_spot(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<BookRequest>,
) -> Result<(StatusCode, Json<BookResponse>), AppError> {
    let mut db = state.db.lock().unwrap();
    let user = auth::require_user(&db, &headers)?;

    let tx = db.transaction()?;
    let (reservation, spot) = ledger::book_spot(&tx, user.id, body.lot_id, &body.vehicle_number)?;
    tx.commit()?;

    Ok((
        StatusCode::CREATED,
        Json(BookResponse {
            id: reservation.id,
            spot_id: spot.id,
            spot_number: spot.spot_number,
            lot_id: spot.lot_id,
            vehicle_number: reservation.vehicle_number,
            start_time: reservation
                .start_time
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            cost_per_hour: reservation.cost_per_hour,
        }),
    ))
}

// POST /api/user/reservations/:id/vacate
#[derive(Serialize)]
pub struct VacateResponse {
    id: i64,
    spot_id: i64,
    start_time: String,
    end_time: String,
    cost_per_hour: f64,
    total_cost: f64,
}

pub async fn vacate_spot(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(reservation_id): Path<i64>,
) -> Result<Json<VacateResponse>, AppError> {
    let mut db = state.db.lock().unwrap();
    let user = auth::require_user(&db, &headers)?;

    let tx = db.transaction()?;
    let reservation = ledger::vacate_spot(&tx, user.id, reservation_id)?;
    tx.commit()?;

    Ok(Json(VacateResponse {
        id: reservation.id,
        spot_id: reservation.spot_id,
        start_time: reservation
            .start_time
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        end_time: reservation
            .end_time
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        cost_per_hour: reservation.cost_per_hour,
        total_cost: reservation.total_cost.unwrap_or(0.0),
    }))
}

// GET /api/user/summary
#[derive(Serialize)]
pub struct LotSpendResponse {
    location_name: String,
    total_cost: f64,
}

pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<LotSpendResponse>>, AppError> {
    let db = state.db.lock().unwrap();
    let user = auth::require_user(&db, &headers)?;

    let spends = summary::user_summary(&db, user.id)?;

    let response = spends
        .into_iter()
        .map(|s| LotSpendResponse {
            location_name: s.location_name,
            total_cost: s.total_cost,
        })
        .collect();

    Ok(Json(response))
}
