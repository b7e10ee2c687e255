use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "stripe-signature";
pub const DEFAULT_TOLERANCE_SECONDS: i64 = 300;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    PendingPayment,
    Paid,
    PaymentFailed,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Missing signature header")]
    MissingHeader,

    #[error("Malformed signature header: {0}")]
    Malformed(String),

    #[error("No v1 signatures in header")]
    NoSignatures,

    #[error("Signature does not match payload")]
    Mismatch,

    #[error("Timestamp outside tolerance ({age}s old)")]
    Expired { age: i64 },

    #[error("Invalid signing secret")]
    InvalidSecret,
}

/// Parsed `Stripe-Signature` header: `t=<unix>,v1=<hex>[,v1=<hex>...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self, SignatureError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for part in header.split(',') {
            let (key, value) = part
                .trim()
                .split_once('=')
                .ok_or_else(|| SignatureError::Malformed(part.to_string()))?;
            match key {
                "t" => {
                    let t = value
                        .parse::<i64>()
                        .map_err(|_| SignatureError::Malformed(format!("bad timestamp {}", value)))?;
                    timestamp = Some(t);
                }
                // Undecodable entries are skipped the same way unknown schemes (v0) are.
                "v1" => {
                    if let Ok(bytes) = hex::decode(value) {
                        signatures.push(bytes);
                    }
                }
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or_else(|| SignatureError::Malformed("missing timestamp".to_string()))?;
        if signatures.is_empty() {
            return Err(SignatureError::NoSignatures);
        }

        Ok(Self { timestamp, signatures })
    }
}

/// HMAC-SHA256 verification of webhook payloads.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
    tolerance_seconds: i64,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secret", &"********")
            .field("tolerance_seconds", &self.tolerance_seconds)
            .finish()
    }
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>, tolerance_seconds: i64) -> Self {
        Self {
            secret: secret.into(),
            tolerance_seconds,
        }
    }

    fn mac(&self, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, SignatureError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes()).map_err(|_| SignatureError::InvalidSecret)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac)
    }

    /// Builds a header value for `payload`; used by tests and local tooling.
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> Result<String, SignatureError> {
        let digest = self.mac(timestamp, payload)?.finalize().into_bytes();
        Ok(format!("t={},v1={}", timestamp, hex::encode(digest)))
    }

    /// Checks every `v1` entry in constant time, then the timestamp window.
    pub fn verify(&self, payload: &[u8], header: &str, now: i64) -> Result<(), SignatureError> {
        let parsed = SignatureHeader::parse(header)?;
        let mac = self.mac(parsed.timestamp, payload)?;

        let matched = parsed
            .signatures
            .iter()
            .any(|sig| mac.clone().verify_slice(sig).is_ok());
        if !matched {
            return Err(SignatureError::Mismatch);
        }

        let age = now - parsed.timestamp;
        if self.tolerance_seconds > 0 && age > self.tolerance_seconds {
            return Err(SignatureError::Expired { age });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: Option<i64>,
    pub data: StripeEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentEventKind {
    Succeeded,
    Failed,
    Ignored,
}

impl StripeEvent {
    pub fn kind(&self) -> PaymentEventKind {
        match self.event_type.as_str() {
            "checkout.session.completed" | "payment_intent.succeeded" => PaymentEventKind::Succeeded,
            "payment_intent.payment_failed" | "checkout.session.async_payment_failed" => PaymentEventKind::Failed,
            _ => PaymentEventKind::Ignored,
        }
    }

    /// Booking id from `metadata.booking_id`, falling back to the checkout
    /// session's `client_reference_id`.
    pub fn booking_id(&self) -> Option<Uuid> {
        let object = &self.data.object;
        object["metadata"]["booking_id"]
            .as_str()
            .or_else(|| object["client_reference_id"].as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
    }

    pub fn payment_reference(&self) -> String {
        self.data.object["payment_intent"]
            .as_str()
            .or_else(|| self.data.object["id"].as_str())
            .unwrap_or(self.id.as_str())
            .to_string()
    }

    pub fn amount_cents(&self) -> Option<i64> {
        let object = &self.data.object;
        object["amount_total"]
            .as_i64()
            .or_else(|| object["amount_received"].as_i64())
            .or_else(|| object["amount"].as_i64())
    }

    pub fn currency(&self) -> Option<String> {
        self.data.object["currency"].as_str().map(|c| c.to_ascii_uppercase())
    }

    pub fn failure_reason(&self) -> Option<String> {
        self.data.object["last_payment_error"]["message"]
            .as_str()
            .map(|s| s.to_string())
    }
}
