use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Private,
    Shared,
    Premium,
}

impl ServiceType {
    pub const ALL: [ServiceType; 3] = [ServiceType::Private, ServiceType::Shared, ServiceType::Premium];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Private => "private",
            ServiceType::Shared => "shared",
            ServiceType::Premium => "premium",
        }
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "private" => Ok(ServiceType::Private),
            "shared" => Ok(ServiceType::Shared),
            "premium" => Ok(ServiceType::Premium),
            other => Err(format!("unknown service type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Amenities {
    pub wifi: bool,
    pub bottled_water: bool,
    pub child_seats: bool,
    pub meet_and_greet: bool,
}

/// Service tier offered on eligible routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferService {
    pub service_type: ServiceType,
    pub name: String,
    pub vehicle_type: String,
    pub amenities: Amenities,
    pub languages: Vec<String>,
    pub cancellation_policy: String,
    pub min_booking_hours: u32,
    pub max_passengers: u32,
    pub max_luggage: u32,
}
