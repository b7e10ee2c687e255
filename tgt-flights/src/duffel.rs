use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tgt_core::provider::{FlightProvider, ProviderError};
use tgt_core::search::{parse_amount_cents, FlightOffer, FlightSearchRequest};
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.duffel.com";
const API_VERSION: &str = "v2";

/// Duffel offer-request client.
#[derive(Debug, Clone)]
pub struct DuffelProvider {
    client: Client,
    base_url: String,
    api_key: String,
    max_offers: usize,
}

impl DuffelProvider {
    pub fn new(api_key: &str, base_url: Option<&str>, timeout: Duration, max_offers: usize) -> Result<Self, ProviderError> {
        if api_key.trim().is_empty() {
            return Err(ProviderError::NotConfigured {
                provider: "duffel".to_string(),
                reason: "missing API key".to_string(),
            });
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            max_offers,
        })
    }

    fn build_request(request: &FlightSearchRequest) -> OfferRequestEnvelope {
        let mut slices = vec![SliceRequest {
            origin: request.origin.clone(),
            destination: request.destination.clone(),
            departure_date: request.departure_date.to_string(),
        }];
        if let Some(return_date) = request.return_date {
            slices.push(SliceRequest {
                origin: request.destination.clone(),
                destination: request.origin.clone(),
                departure_date: return_date.to_string(),
            });
        }

        let passengers = std::iter::repeat("adult")
            .take(request.adults as usize)
            .chain(std::iter::repeat("child").take(request.children as usize))
            .chain(std::iter::repeat("infant_without_seat").take(request.infants as usize))
            .map(|kind| PassengerRequest { kind: kind.to_string() })
            .collect();

        OfferRequestEnvelope {
            data: OfferRequestBody {
                slices,
                passengers,
                cabin_class: request.cabin_class.as_str().to_string(),
            },
        }
    }

    fn map_offer(&self, offer: DuffelOffer) -> Option<FlightOffer> {
        let outbound = offer.slices.first()?;
        let first_segment = outbound.segments.first()?;
        let last_segment = outbound.segments.last()?;

        let total_cents = match parse_amount_cents(&offer.total_amount) {
            Some(cents) => cents,
            None => {
                warn!("Skipping Duffel offer {} with unparseable amount {}", offer.id, offer.total_amount);
                return None;
            }
        };

        let return_at = offer
            .slices
            .get(1)
            .and_then(|s| s.segments.first())
            .and_then(|s| parse_local_timestamp(&s.departing_at));

        Some(FlightOffer {
            id: offer.id,
            provider: "duffel".to_string(),
            airline: offer.owner.name,
            flight_number: first_segment
                .marketing_carrier
                .as_ref()
                .zip(first_segment.marketing_carrier_flight_number.as_ref())
                .map(|(carrier, number)| format!("{}{}", carrier.iata_code, number)),
            origin: first_segment.origin.iata_code.clone(),
            destination: last_segment.destination.iata_code.clone(),
            departure_at: parse_local_timestamp(&first_segment.departing_at)?,
            arrival_at: parse_local_timestamp(&last_segment.arriving_at),
            return_at,
            stops: outbound.segments.len().saturating_sub(1) as u32,
            duration_minutes: outbound.duration.as_deref().and_then(parse_iso_duration_minutes),
            total_cents,
            currency: offer.total_currency,
            deep_link: None,
        })
    }
}

#[async_trait]
impl FlightProvider for DuffelProvider {
    fn name(&self) -> &'static str {
        "duffel"
    }

    async fn search(&self, request: &FlightSearchRequest) -> Result<Vec<FlightOffer>, ProviderError> {
        let url = format!("{}/air/offer_requests?return_offers=true", self.base_url);
        debug!("Duffel offer request {} -> {}", request.origin, request.destination);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Duffel-Version", API_VERSION)
            .header("Accept", "application/json")
            .json(&Self::build_request(request))
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Upstream { status: status.as_u16(), body });
        }

        let envelope: OfferResponseEnvelope = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        let mut offers: Vec<FlightOffer> = envelope
            .data
            .offers
            .into_iter()
            .filter_map(|o| self.map_offer(o))
            .collect();
        offers.sort_by_key(|o| o.total_cents);
        offers.truncate(self.max_offers);
        Ok(offers)
    }
}

/// Duffel timestamps are airport-local without an offset; they are kept
/// as-is and labelled UTC.
fn parse_local_timestamp(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc())
}

/// `PT2H35M` -> 155. Day components (`P1DT2H`) are supported.
pub fn parse_iso_duration_minutes(value: &str) -> Option<u32> {
    let rest = value.strip_prefix('P')?;
    let (days_part, time_part) = match rest.split_once('T') {
        Some((d, t)) => (d, t),
        None => (rest, ""),
    };

    let mut minutes = 0u32;
    if !days_part.is_empty() {
        let days: u32 = days_part.strip_suffix('D')?.parse().ok()?;
        minutes += days * 24 * 60;
    }

    let mut number = String::new();
    for c in time_part.chars() {
        match c {
            '0'..='9' => number.push(c),
            'H' => minutes += number.parse::<u32>().ok()? * 60,
            'M' => minutes += number.parse::<u32>().ok()?,
            'S' => {}
            _ => return None,
        }
        if c.is_ascii_alphabetic() {
            number.clear();
        }
    }
    Some(minutes)
}

#[derive(Debug, Serialize)]
struct OfferRequestEnvelope {
    data: OfferRequestBody,
}

#[derive(Debug, Serialize)]
struct OfferRequestBody {
    slices: Vec<SliceRequest>,
    passengers: Vec<PassengerRequest>,
    cabin_class: String,
}

#[derive(Debug, Serialize)]
struct SliceRequest {
    origin: String,
    destination: String,
    departure_date: String,
}

#[derive(Debug, Serialize)]
struct PassengerRequest {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct OfferResponseEnvelope {
    data: OfferResponseData,
}

#[derive(Debug, Deserialize)]
struct OfferResponseData {
    #[serde(default)]
    offers: Vec<DuffelOffer>,
}

#[derive(Debug, Deserialize)]
struct DuffelOffer {
    id: String,
    total_amount: String,
    total_currency: String,
    owner: DuffelCarrier,
    #[serde(default)]
    slices: Vec<DuffelSlice>,
}

#[derive(Debug, Deserialize)]
struct DuffelCarrier {
    name: String,
    #[serde(default)]
    iata_code: String,
}

#[derive(Debug, Deserialize)]
struct DuffelSlice {
    #[serde(default)]
    duration: Option<String>,
    #[serde(default)]
    segments: Vec<DuffelSegment>,
}

#[derive(Debug, Deserialize)]
struct DuffelSegment {
    departing_at: String,
    arriving_at: String,
    origin: DuffelPlace,
    destination: DuffelPlace,
    #[serde(default)]
    marketing_carrier: Option<DuffelCarrier>,
    #[serde(default)]
    marketing_carrier_flight_number: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DuffelPlace {
    iata_code: String,
}
