use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkingLot {
    pub id: i64,
    pub location_name: String,
    pub price: f64,
    pub address: String,
    pub pin_code: String,
    pub max_number_of_spots: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkingSpot {
    pub id: i64,
    pub spot_number: i64,
    pub lot_id: i64,
    pub status: SpotStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpotStatus {
    Available,
    Occupied,
}

impl SpotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpotStatus::Available => "AVAILABLE",
            SpotStatus::Occupied => "OCCUPIED",
        }
    }

    /// Accepts any casing plus the legacy single-letter codes ("A"/"O").
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "OCCUPIED" | "O" => SpotStatus::Occupied,
            _ => SpotStatus::Available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_words_any_case() {
        assert_eq!(SpotStatus::parse("AVAILABLE"), SpotStatus::Available);
        assert_eq!(SpotStatus::parse("available"), SpotStatus::Available);
        assert_eq!(SpotStatus::parse("Occupied"), SpotStatus::Occupied);
        assert_eq!(SpotStatus::parse("OCCUPIED"), SpotStatus::Occupied);
    }

    #[test]
    fn test_parse_legacy_codes() {
        assert_eq!(SpotStatus::parse("A"), SpotStatus::Available);
        assert_eq!(SpotStatus::parse("O"), SpotStatus::Occupied);
        assert_eq!(SpotStatus::parse("o"), SpotStatus::Occupied);
    }

    #[test]
    fn test_round_trip() {
        assert_eq!(SpotStatus::parse(SpotStatus::Available.as_str()), SpotStatus::Available);
        assert_eq!(SpotStatus::parse(SpotStatus::Occupied.as_str()), SpotStatus::Occupied);
    }
}
