use crate::service::ServiceType;

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("Route is not currently operated: {0}")]
    RouteInactive(String),

    #[error("Service {service} is not offered on route {route}")]
    ServiceNotOffered { route: String, service: ServiceType },

    #[error("No pricing for service {service} on route {route}")]
    PricingNotFound { route: String, service: ServiceType },

    #[error("Passenger count {requested} outside allowed range {min}-{max}")]
    PassengerCount { requested: u32, min: u32, max: u32 },

    #[error("Invalid party: {0}")]
    InvalidParty(String),

    #[error("Service {0} does not provide child seats")]
    ChildSeatsUnavailable(ServiceType),

    #[error("Too many child seats: requested {requested}, at most {allowed}")]
    TooManyChildSeats { requested: u32, allowed: u32 },

    #[error("Too much luggage: requested {requested}, maximum {max}")]
    LuggageLimit { requested: u32, max: u32 },

    #[error("Pickup at {time} is outside operating hours {window} for route {route}")]
    OutsideOperatingHours { route: String, time: String, window: String },

    #[error("Pickup must be booked at least {hours} hours in advance")]
    LeadTime { hours: u32 },
}

pub type TransferResult<T> = Result<T, TransferError>;
