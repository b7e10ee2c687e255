use async_trait::async_trait;
use chrono::{Duration, NaiveTime};
use tgt_core::provider::{FlightProvider, ProviderError};
use tgt_core::search::{CabinClass, FlightOffer, FlightSearchRequest};

const CARRIERS: &[(&str, &str)] = &[
    ("JU", "Air Serbia"),
    ("W6", "Wizz Air"),
    ("OS", "Austrian Airlines"),
    ("LH", "Lufthansa"),
    ("TK", "Turkish Airlines"),
];

/// Offline provider: offers are derived from the request, so the same
/// search always returns the same results.
#[derive(Debug, Clone)]
pub struct MockFlightProvider {
    offers_per_search: usize,
}

impl MockFlightProvider {
    pub fn new(offers_per_search: usize) -> Self {
        Self { offers_per_search: offers_per_search.max(1) }
    }

    fn seed(request: &FlightSearchRequest) -> u64 {
        request
            .origin
            .bytes()
            .chain(request.destination.bytes())
            .fold(17u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64))
    }

    fn cabin_multiplier_percent(cabin: CabinClass) -> i64 {
        match cabin {
            CabinClass::Economy => 100,
            CabinClass::PremiumEconomy => 160,
            CabinClass::Business => 300,
            CabinClass::First => 500,
        }
    }

    pub fn generate(&self, request: &FlightSearchRequest) -> Vec<FlightOffer> {
        let seed = Self::seed(request);
        let seated = request.adults as i64 + request.children as i64;
        let currency = request.currency.clone().unwrap_or_else(|| "EUR".to_string());
        let first_departure = NaiveTime::from_hms_opt(6, 15, 0).unwrap_or(NaiveTime::MIN);

        let mut offers: Vec<FlightOffer> = (0..self.offers_per_search)
            .map(|i| {
                let (code, name) = CARRIERS[(seed as usize + i) % CARRIERS.len()];
                let stops = ((seed as usize + i) % 3).min(1) as u32;
                let duration = 95 + (seed % 90) as u32 + stops * 70 + (i as u32 * 5);

                let departure_at = request.departure_date.and_time(first_departure).and_utc()
                    + Duration::minutes(i as i64 * 195);
                let arrival_at = departure_at + Duration::minutes(duration as i64);
                let return_at = request
                    .return_date
                    .map(|d| d.and_time(first_departure).and_utc() + Duration::minutes(i as i64 * 150));

                let fare = 8900 + (seed % 50) as i64 * 100 + i as i64 * 2500 - stops as i64 * 1500;
                let fare = fare * Self::cabin_multiplier_percent(request.cabin_class) / 100;
                let legs = if request.return_date.is_some() { 2 } else { 1 };
                // Lap infants pay a tenth of the fare.
                let total = fare * legs * seated + fare * legs * request.infants as i64 / 10;

                FlightOffer {
                    id: format!("mock_{:x}_{}", seed, i),
                    provider: "mock".to_string(),
                    airline: name.to_string(),
                    flight_number: Some(format!("{}{}", code, 100 + (seed % 800) as usize + i)),
                    origin: request.origin.clone(),
                    destination: request.destination.clone(),
                    departure_at,
                    arrival_at: Some(arrival_at),
                    return_at,
                    stops,
                    duration_minutes: Some(duration),
                    total_cents: total,
                    currency: currency.clone(),
                    deep_link: None,
                }
            })
            .collect();

        offers.sort_by_key(|o| o.total_cents);
        offers
    }
}

impl Default for MockFlightProvider {
    fn default() -> Self {
        Self::new(5)
    }
}

#[async_trait]
impl FlightProvider for MockFlightProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn is_live(&self) -> bool {
        false
    }

    async fn search(&self, request: &FlightSearchRequest) -> Result<Vec<FlightOffer>, ProviderError> {
        Ok(self.generate(request))
    }
}
