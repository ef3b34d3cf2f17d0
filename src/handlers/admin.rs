use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::auth;
use crate::models::ParkingLot;
use crate::services::{registry, summary};
use crate::state::AppState;

#[derive(Serialize)]
pub struct LotResponse {
    id: i64,
    location_name: String,
    price: f64,
    address: String,
    pin_code: String,
    max_number_of_spots: i64,
    created_at: String,
}

fn lot_response(lot: ParkingLot) -> LotResponse {
    LotResponse {
        id: lot.id,
        location_name: lot.location_name,
        price: lot.price,
        address: lot.address,
        pin_code: lot.pin_code,
        max_number_of_spots: lot.max_number_of_spots,
        created_at: lot.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

// POST /api/admin/lots
#[derive(Deserialize)]
pub struct CreateLotRequest {
    pub location_name: String,
    pub price: f64,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub pin_code: String,
    pub max_number_of_spots: i64,
}

pub async fn create_lot(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateLotRequest>,
) -> Result<(StatusCode, Json<LotResponse>), AppError> {
    let mut db = state.db.lock().unwrap();
    auth::require_admin(&db, &headers)?;

    let tx = db.transaction()?;
    let lot = registry::create_lot(
        &tx,
        &body.location_name,
        body.price,
        &body.address,
        &body.pin_code,
        body.max_number_of_spots,
    )?;
    tx.commit()?;

    Ok((StatusCode::CREATED, Json(lot_response(lot))))
}

// GET /api/admin/lots
#[derive(Serialize)]
pub struct LotWithCountsResponse {
    id: i64,
    location_name: String,
    price: f64,
    address: String,
    pin_code: String,
    max_number_of_spots: i64,
    available_spots: i64,
    occupied_spots: i64,
}

pub async fn list_lots(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<LotWithCountsResponse>>, AppError> {
    let db = state.db.lock().unwrap();
    auth::require_admin(&db, &headers)?;

    let availability = summary::lot_availability(&db)?;

    let response = availability
        .into_iter()
        .map(|entry| LotWithCountsResponse {
            id: entry.lot.id,
            location_name: entry.lot.location_name,
            price: entry.lot.price,
            address: entry.lot.address,
            pin_code: entry.lot.pin_code,
            max_number_of_spots: entry.lot.max_number_of_spots,
            available_spots: entry.available_spots,
            occupied_spots: entry.occupied_spots,
        })
        .collect();

    Ok(Json(response))
}

// PUT /api/admin/lots/:id
#[derive(Deserialize)]
pub struct UpdateLotRequest {
    pub location_name: String,
    pub price: f64,
    pub max_number_of_spots: i64,
}

pub async fn update_lot(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(lot_id): Path<i64>,
    Json(body): Json<UpdateLotRequest>,
) -> Result<Json<LotResponse>, AppError> {
    let mut db = state.db.lock().unwrap();
    auth::require_admin(&db, &headers)?;

    let tx = db.transaction()?;
    let lot = registry::edit_lot(
        &tx,
        lot_id,
        &body.location_name,
        body.price,
        body.max_number_of_spots,
    )?;
    tx.commit()?;

    Ok(Json(lot_response(lot)))
}

// DELETE /api/admin/lots/:id
pub async fn delete_lot(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(lot_id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut db = state.db.lock().unwrap();
    auth::require_admin(&db, &headers)?;

    let tx = db.transaction()?;
    registry::delete_lot(&tx, lot_id)?;
    tx.commit()?;

    Ok(Json(serde_json::json!({"ok": true})))
}

// GET /api/admin/dashboard
#[derive(Serialize)]
pub struct SpotResponse {
    id: i64,
    spot_number: i64,
    status: String,
}

#[derive(Serialize)]
pub struct LotOverviewResponse {
    id: i64,
    location_name: String,
    price: f64,
    max_number_of_spots: i64,
    available_spots: i64,
    occupied_spots: i64,
    spots: Vec<SpotResponse>,
}

#[derive(Serialize)]
pub struct UserResponse {
    id: i64,
    user_name: String,
    full_name: String,
    created_time: String,
}

#[derive(Serialize)]
pub struct ActiveReservationResponse {
    id: i64,
    spot_id: i64,
    spot_number: i64,
    location_name: String,
    vehicle_number: Option<String>,
    start_time: String,
    cost_per_hour: f64,
}

#[derive(Serialize)]
pub struct DashboardUserResponse {
    id: i64,
    user_name: String,
    full_name: String,
    created_time: String,
    active_reservation: Option<ActiveReservationResponse>,
}

#[derive(Serialize)]
pub struct AdminDashboardResponse {
    lots: Vec<LotOverviewResponse>,
    users: Vec<DashboardUserResponse>,
}

pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AdminDashboardResponse>, AppError> {
    let db = state.db.lock().unwrap();
    auth::require_admin(&db, &headers)?;

    let dashboard = summary::admin_dashboard(&db)?;

    let lots = dashboard
        .lots
        .into_iter()
        .map(|overview| LotOverviewResponse {
            id: overview.lot.id,
            location_name: overview.lot.location_name,
            price: overview.lot.price,
            max_number_of_spots: overview.lot.max_number_of_spots,
            available_spots: overview.available_spots,
            occupied_spots: overview.occupied_spots,
            spots: overview
                .spots
                .into_iter()
                .map(|s| SpotResponse {
                    id: s.id,
                    spot_number: s.spot_number,
                    status: s.status.as_str().to_string(),
                })
                .collect(),
        })
        .collect();

    let users = dashboard
        .users
        .into_iter()
        .map(|activity| DashboardUserResponse {
            id: activity.user.id,
            user_name: activity.user.user_name,
            full_name: activity.user.full_name,
            created_time: activity
                .user
                .created_time
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            active_reservation: activity.active_reservation.map(|detail| {
                ActiveReservationResponse {
                    id: detail.id,
                    spot_id: detail.spot_id,
                    spot_number: detail.spot_number,
                    location_name: detail.location_name,
                    vehicle_number: detail.vehicle_number,
                    start_time: detail.start_time.format("%Y-%m-%d %H:%M:%S").to_string(),
                    cost_per_hour: detail.cost_per_hour,
                }
            }),
        })
        .collect();

    Ok(Json(AdminDashboardResponse { lots, users }))
}

// GET /api/admin/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let db = state.db.lock().unwrap();
    auth::require_admin(&db, &headers)?;

    let users = queries::list_users(&db)?;

    let response = users
        .into_iter()
        .map(|u| UserResponse {
            id: u.id,
            user_name: u.user_name,
            full_name: u.full_name,
            created_time: u.created_time.format("%Y-%m-%d %H:%M:%S").to_string(),
        })
        .collect();

    Ok(Json(response))
}

// GET /api/admin/summary
#[derive(Serialize)]
pub struct OccupancyResponse {
    lot_id: i64,
    location_name: String,
    available_spots: i64,
    occupied_spots: i64,
}

pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<OccupancyResponse>>, AppError> {
    let db = state.db.lock().unwrap();
    auth::require_admin(&db, &headers)?;

    let availability = summary::lot_availability(&db)?;

    let response = availability
        .into_iter()
        .map(|entry| OccupancyResponse {
            lot_id: entry.lot.id,
            location_name: entry.lot.location_name,
            available_spots: entry.available_spots,
            occupied_spots: entry.occupied_spots,
        })
        .collect();

    Ok(Json(response))
}
