use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i64,
    pub spot_id: i64,
    pub user_id: i64,
    pub vehicle_number: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    /// Lot price at booking time; later price edits do not touch it.
    pub cost_per_hour: f64,
    pub total_cost: Option<f64>,
}

impl Reservation {
    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }
}
