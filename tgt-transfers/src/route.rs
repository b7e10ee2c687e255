use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::service::ServiceType;

/// Daily pickup window. `start == end` means the route runs around the
/// clock; `end < start` wraps past midnight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperatingHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl OperatingHours {
    pub fn all_day() -> Self {
        let midnight = NaiveTime::MIN;
        Self { start: midnight, end: midnight }
    }

    pub fn between(start: (u32, u32), end: (u32, u32)) -> Self {
        Self {
            start: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap_or(NaiveTime::MIN),
        }
    }

    pub fn is_all_day(&self) -> bool {
        self.start == self.end
    }

    pub fn is_operating(&self, time: NaiveTime) -> bool {
        if self.is_all_day() {
            true
        } else if self.start < self.end {
            time >= self.start && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }
}

impl std::fmt::Display for OperatingHours {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_all_day() {
            write!(f, "24h")
        } else {
            write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ServiceEligibility {
    pub private: bool,
    pub shared: bool,
    pub premium: bool,
    pub accessible: bool,
}

impl ServiceEligibility {
    pub fn allows(&self, service_type: ServiceType) -> bool {
        match service_type {
            ServiceType::Private => self.private,
            ServiceType::Shared => self.shared,
            ServiceType::Premium => self.premium,
        }
    }
}

/// Zone-to-zone corridor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRoute {
    pub id: String,
    pub origin_zone_id: String,
    pub destination_zone_id: String,
    pub distance_km: f64,
    pub duration_minutes: u32,
    pub active: bool,
    pub eligibility: ServiceEligibility,
    pub operating_hours: OperatingHours,
}

impl TransferRoute {
    pub fn connects(&self, origin: &str, destination: &str) -> bool {
        self.origin_zone_id == origin && self.destination_zone_id == destination
    }
}
