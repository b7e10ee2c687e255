use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tgt_shared::models::events::{BookingCreatedEvent, BookingPaidEvent, PaymentFailedEvent};
use tracing::{error, info, warn};

/// Operator notifications. Delivery is best-effort and never fails a request.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn booking_created(&self, event: &BookingCreatedEvent);
    async fn booking_paid(&self, event: &BookingPaidEvent);
    async fn payment_failed(&self, event: &PaymentFailedEvent);
}

pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn booking_created(&self, event: &BookingCreatedEvent) {
        info!(
            "Booking {} created: {} {} at {} for {} ({} {})",
            event.booking_id,
            event.service_type,
            event.route_id,
            event.pickup_at,
            event.customer_name,
            event.total_cents,
            event.currency
        );
    }

    async fn booking_paid(&self, event: &BookingPaidEvent) {
        info!("Booking {} paid ({})", event.booking_id, event.payment_reference);
    }

    async fn payment_failed(&self, event: &PaymentFailedEvent) {
        warn!(
            "Payment failed for booking {} ({}): {}",
            event.booking_id,
            event.payment_reference,
            event.reason.as_deref().unwrap_or("no reason given")
        );
    }
}

/// Posts to a Slack incoming webhook.
pub struct SlackNotifier {
    client: Client,
    webhook_url: String,
}

impl SlackNotifier {
    pub fn new(webhook_url: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;
        Ok(Self {
            client,
            webhook_url: webhook_url.to_string(),
        })
    }

    async fn post(&self, text: String) {
        let result = self
            .client
            .post(&self.webhook_url)
            .json(&json!({ "text": text }))
            .send()
            .await
            .and_then(|r| r.error_for_status());
        if let Err(e) = result {
            error!("Slack notification failed: {}", e);
        }
    }
}

fn format_amount(cents: i64, currency: &str) -> String {
    format!("{}.{:02} {}", cents / 100, (cents % 100).abs(), currency)
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn booking_created(&self, event: &BookingCreatedEvent) {
        self.post(format!(
            ":oncoming_automobile: New {} transfer `{}` on {} for {} ({})",
            event.service_type,
            event.route_id,
            event.pickup_at,
            event.customer_name,
            format_amount(event.total_cents as i64, &event.currency)
        ))
        .await;
    }

    async fn booking_paid(&self, event: &BookingPaidEvent) {
        let amount = match (event.amount_cents, event.currency.as_deref()) {
            (Some(cents), Some(currency)) => format_amount(cents, currency),
            _ => "amount unknown".to_string(),
        };
        self.post(format!(
            ":white_check_mark: Booking `{}` paid, {} ({})",
            event.booking_id, amount, event.payment_reference
        ))
        .await;
    }

    async fn payment_failed(&self, event: &PaymentFailedEvent) {
        self.post(format!(
            ":x: Payment failed for booking `{}`: {}",
            event.booking_id,
            event.reason.as_deref().unwrap_or("no reason given")
        ))
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(6660, "EUR"), "66.60 EUR");
        assert_eq!(format_amount(5, "EUR"), "0.05 EUR");
    }
}
