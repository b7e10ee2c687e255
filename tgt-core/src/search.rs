use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CabinClass {
    #[default]
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl CabinClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            CabinClass::Economy => "economy",
            CabinClass::PremiumEconomy => "premium_economy",
            CabinClass::Business => "business",
            CabinClass::First => "first",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightSearchRequest {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    #[serde(default)]
    pub return_date: Option<NaiveDate>,
    #[serde(default = "default_adults")]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub infants: u32,
    #[serde(default)]
    pub cabin_class: CabinClass,
    #[serde(default)]
    pub currency: Option<String>,
}

fn default_adults() -> u32 {
    1
}

pub const MAX_PASSENGERS: u32 = 9;

fn is_iata_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase())
}

impl FlightSearchRequest {
    /// Uppercases airport and currency codes in place.
    pub fn normalize(mut self) -> Self {
        self.origin = self.origin.trim().to_ascii_uppercase();
        self.destination = self.destination.trim().to_ascii_uppercase();
        self.currency = self.currency.map(|c| c.trim().to_ascii_uppercase());
        self
    }

    pub fn validate(&self, today: NaiveDate) -> CoreResult<()> {
        if !is_iata_code(&self.origin) {
            return Err(CoreError::ValidationError(format!("Invalid origin airport code: {}", self.origin)));
        }
        if !is_iata_code(&self.destination) {
            return Err(CoreError::ValidationError(format!("Invalid destination airport code: {}", self.destination)));
        }
        if self.origin == self.destination {
            return Err(CoreError::ValidationError("Origin and destination must differ".to_string()));
        }
        if self.departure_date < today {
            return Err(CoreError::ValidationError("Departure date is in the past".to_string()));
        }
        if let Some(return_date) = self.return_date {
            if return_date < self.departure_date {
                return Err(CoreError::ValidationError("Return date precedes departure".to_string()));
            }
        }
        if self.adults == 0 {
            return Err(CoreError::ValidationError("At least one adult is required".to_string()));
        }
        if self.adults.saturating_add(self.children) > MAX_PASSENGERS {
            return Err(CoreError::ValidationError(format!("At most {} seated passengers per search", MAX_PASSENGERS)));
        }
        if self.infants > self.adults {
            return Err(CoreError::ValidationError("Each infant must travel with an adult".to_string()));
        }
        if let Some(currency) = &self.currency {
            if !is_iata_code(currency) {
                return Err(CoreError::ValidationError(format!("Invalid currency code: {}", currency)));
            }
        }
        Ok(())
    }

    pub fn passenger_count(&self) -> u32 {
        self.adults.saturating_add(self.children).saturating_add(self.infants)
    }

    /// Stable key for result caching; the request must be normalized first.
    pub fn cache_key(&self, provider: &str) -> String {
        format!(
            "flights:{}:{}:{}:{}:{}:{}-{}-{}:{}:{}",
            provider,
            self.origin,
            self.destination,
            self.departure_date,
            self.return_date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
            self.adults,
            self.children,
            self.infants,
            self.cabin_class.as_str(),
            self.currency.as_deref().unwrap_or("-"),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlightOffer {
    pub id: String,
    pub provider: String,
    pub airline: String,
    pub flight_number: Option<String>,
    pub origin: String,
    pub destination: String,
    pub departure_at: DateTime<Utc>,
    pub arrival_at: Option<DateTime<Utc>>,
    pub return_at: Option<DateTime<Utc>>,
    pub stops: u32,
    pub duration_minutes: Option<u32>,
    pub total_cents: i64,
    pub currency: String,
    pub deep_link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightSearchResponse {
    pub provider: String,
    pub cached: bool,
    pub offers: Vec<FlightOffer>,
}

/// Parses a decimal amount such as `"123.4"` into minor units.
pub fn parse_amount_cents(amount: &str) -> Option<i64> {
    let amount = amount.trim();
    let (negative, digits) = match amount.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, amount),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    if whole.is_empty() || fraction.len() > 2 {
        return None;
    }
    let whole: i64 = whole.parse().ok()?;
    let fraction: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().ok()? * 10,
        _ => fraction.parse().ok()?,
    };
    let cents = whole.checked_mul(100)?.checked_add(fraction)?;
    Some(if negative { -cents } else { cents })
}
