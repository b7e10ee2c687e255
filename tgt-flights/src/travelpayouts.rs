use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tgt_core::provider::{FlightProvider, ProviderError};
use tgt_core::search::{FlightOffer, FlightSearchRequest};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.travelpayouts.com";
const DEEP_LINK_HOST: &str = "https://www.aviasales.com";

/// Aviasales cached-price API. Prices are per adult in whole currency
/// units; totals are scaled by the number of seated passengers.
#[derive(Debug, Clone)]
pub struct TravelpayoutsProvider {
    client: Client,
    base_url: String,
    token: String,
    max_offers: usize,
}

impl TravelpayoutsProvider {
    pub fn new(token: &str, base_url: Option<&str>, timeout: Duration, max_offers: usize) -> Result<Self, ProviderError> {
        if token.trim().is_empty() {
            return Err(ProviderError::NotConfigured {
                provider: "travelpayouts".to_string(),
                reason: "missing API token".to_string(),
            });
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/').to_string(),
            token: token.to_string(),
            max_offers,
        })
    }

    fn query(&self, request: &FlightSearchRequest) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("origin", request.origin.clone()),
            ("destination", request.destination.clone()),
            ("departure_at", request.departure_date.to_string()),
            ("currency", request.currency.as_deref().unwrap_or("EUR").to_ascii_lowercase()),
            ("sorting", "price".to_string()),
            ("limit", self.max_offers.to_string()),
        ];
        match request.return_date {
            Some(return_date) => {
                query.push(("return_at", return_date.to_string()));
                query.push(("one_way", "false".to_string()));
            }
            None => query.push(("one_way", "true".to_string())),
        }
        query
    }

    fn map_offer(request: &FlightSearchRequest, currency: &str, index: usize, ticket: TicketPrice) -> Option<FlightOffer> {
        let departure_at = DateTime::parse_from_rfc3339(&ticket.departure_at).ok()?.with_timezone(&Utc);
        let seated = request.adults as i64 + request.children as i64;
        let unit_cents = (ticket.price * 100.0).round() as i64;

        Some(FlightOffer {
            id: format!("tp_{}_{}_{}", ticket.origin, ticket.destination, index),
            provider: "travelpayouts".to_string(),
            flight_number: ticket.flight_number.as_ref().map(|n| format!("{}{}", ticket.airline, n)),
            airline: ticket.airline,
            origin: ticket.origin_airport.unwrap_or(ticket.origin),
            destination: ticket.destination_airport.unwrap_or(ticket.destination),
            departure_at,
            arrival_at: ticket
                .duration_to
                .map(|minutes| departure_at + chrono::Duration::minutes(minutes as i64)),
            return_at: ticket
                .return_at
                .as_deref()
                .and_then(|r| DateTime::parse_from_rfc3339(r).ok())
                .map(|r| r.with_timezone(&Utc)),
            stops: ticket.transfers,
            duration_minutes: ticket.duration_to.or(ticket.duration),
            total_cents: unit_cents * seated,
            currency: currency.to_ascii_uppercase(),
            deep_link: ticket.link.map(|l| format!("{}{}", DEEP_LINK_HOST, l)),
        })
    }
}

#[async_trait]
impl FlightProvider for TravelpayoutsProvider {
    fn name(&self) -> &'static str {
        "travelpayouts"
    }

    async fn search(&self, request: &FlightSearchRequest) -> Result<Vec<FlightOffer>, ProviderError> {
        let url = format!("{}/aviasales/v3/prices_for_dates", self.base_url);
        debug!("Travelpayouts price lookup {} -> {}", request.origin, request.destination);

        let response = self
            .client
            .get(&url)
            .header("X-Access-Token", &self.token)
            .query(&self.query(request))
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Upstream { status: status.as_u16(), body });
        }

        let payload: PricesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        Self::collect_offers(request, payload, self.max_offers)
    }
}

impl TravelpayoutsProvider {
    fn collect_offers(request: &FlightSearchRequest, payload: PricesResponse, max_offers: usize) -> Result<Vec<FlightOffer>, ProviderError> {
        if !payload.success {
            return Err(ProviderError::Decode(
                payload.error.unwrap_or_else(|| "request was not successful".to_string()),
            ));
        }

        let currency = payload.currency.unwrap_or_else(|| "eur".to_string());
        let mut offers: Vec<FlightOffer> = payload
            .data
            .into_iter()
            .enumerate()
            .filter_map(|(i, ticket)| Self::map_offer(request, &currency, i, ticket))
            .collect();
        offers.sort_by_key(|o| o.total_cents);
        offers.truncate(max_offers);
        Ok(offers)
    }
}

#[derive(Debug, Deserialize)]
struct PricesResponse {
    success: bool,
    #[serde(default)]
    data: Vec<TicketPrice>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TicketPrice {
    origin: String,
    destination: String,
    #[serde(default)]
    origin_airport: Option<String>,
    #[serde(default)]
    destination_airport: Option<String>,
    price: f64,
    airline: String,
    #[serde(default)]
    flight_number: Option<String>,
    departure_at: String,
    #[serde(default)]
    return_at: Option<String>,
    #[serde(default)]
    transfers: u32,
    #[serde(default)]
    duration: Option<u32>,
    #[serde(default)]
    duration_to: Option<u32>,
    #[serde(default)]
    link: Option<String>,
}
