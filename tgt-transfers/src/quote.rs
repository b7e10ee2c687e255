use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pricing::TransferPricing;
use crate::service::ServiceType;

pub const QUOTE_VALIDITY_MINUTES: i64 = 30;

/// After-hours window: [22:00, 24:00) and [00:00, 05:00).
pub fn is_after_hours(time: NaiveTime) -> bool {
    let hour = time.hour();
    hour >= 22 || hour < 5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub route_id: String,
    pub service_type: ServiceType,
    pub passengers: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub infants: u32,
    #[serde(default)]
    pub luggage: u32,
    #[serde(default)]
    pub child_seats: u32,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(default)]
    pub is_public_holiday: bool,
}

impl QuoteRequest {
    pub fn pickup_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentKind {
    AfterHours,
    Holiday,
    ChildSeat,
    ExcessLuggage,
    GroupDiscount,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceAdjustment {
    pub kind: AdjustmentKind,
    pub label: String,
    pub quantity: u32,
    /// Always positive; discounts are subtracted by the caller.
    pub amount_cents: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BreakdownLine {
    pub label: String,
    /// Signed: discounts are negative.
    pub amount_cents: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferQuote {
    pub id: Uuid,
    pub route_id: String,
    pub service_type: ServiceType,
    pub currency: String,
    pub passengers: u32,
    pub children: u32,
    pub infants: u32,
    pub luggage: u32,
    pub child_seats: u32,
    pub pickup_date: NaiveDate,
    pub pickup_time: NaiveTime,
    pub base_price_cents: i32,
    pub surcharges: Vec<PriceAdjustment>,
    pub discounts: Vec<PriceAdjustment>,
    pub total_cents: i32,
    pub breakdown: Vec<BreakdownLine>,
    pub created_at: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

impl TransferQuote {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.valid_until
    }

    pub fn surcharge_total(&self) -> i32 {
        self.surcharges.iter().map(|s| s.amount_cents).sum()
    }

    pub fn discount_total(&self) -> i32 {
        self.discounts.iter().map(|d| d.amount_cents).sum()
    }

    pub fn breakdown_total(&self) -> i32 {
        self.breakdown.iter().map(|l| l.amount_cents).sum()
    }
}

/// `unit × quantity` in cents, `None` past `i32`.
fn line_amount(unit_cents: i32, quantity: u32) -> Option<i32> {
    (unit_cents as i64)
        .checked_mul(quantity as i64)
        .and_then(|cents| i32::try_from(cents).ok())
}

/// Prices a request against the pricing table. `None` when no row matches
/// the route and service type, or when an amount does not fit in `i32` cents.
pub fn calculate_quote(pricing_table: &[TransferPricing], req: &QuoteRequest, now: DateTime<Utc>) -> Option<TransferQuote> {
    let pricing = pricing_table
        .iter()
        .find(|p| p.matches(&req.route_id, req.service_type))?;

    let mut surcharges = Vec::new();

    if is_after_hours(req.time) && pricing.after_hours_surcharge_cents > 0 {
        surcharges.push(PriceAdjustment {
            kind: AdjustmentKind::AfterHours,
            label: "After-hours pickup (22:00-05:00)".to_string(),
            quantity: 1,
            amount_cents: pricing.after_hours_surcharge_cents,
        });
    }

    if req.is_public_holiday && pricing.holiday_surcharge_cents > 0 {
        surcharges.push(PriceAdjustment {
            kind: AdjustmentKind::Holiday,
            label: "Public holiday".to_string(),
            quantity: 1,
            amount_cents: pricing.holiday_surcharge_cents,
        });
    }

    if req.child_seats > 0 && pricing.child_seat_cents > 0 {
        surcharges.push(PriceAdjustment {
            kind: AdjustmentKind::ChildSeat,
            label: format!("Child seat x{}", req.child_seats),
            quantity: req.child_seats,
            amount_cents: line_amount(pricing.child_seat_cents, req.child_seats)?,
        });
    }

    let excess = pricing.excess_luggage(req.passengers, req.luggage);
    if excess > 0 && pricing.excess_luggage_cents > 0 {
        surcharges.push(PriceAdjustment {
            kind: AdjustmentKind::ExcessLuggage,
            label: format!("Extra luggage x{}", excess),
            quantity: excess,
            amount_cents: line_amount(pricing.excess_luggage_cents, excess)?,
        });
    }

    let subtotal = surcharges
        .iter()
        .try_fold(pricing.base_price_cents, |acc, s| acc.checked_add(s.amount_cents))?;

    let mut discounts = Vec::new();
    if pricing.group_discount_applies(req.passengers) {
        // Half-up rounding to the cent.
        let amount = (subtotal as i64 * pricing.group_discount_percent as i64 + 50) / 100;
        if amount > 0 {
            discounts.push(PriceAdjustment {
                kind: AdjustmentKind::GroupDiscount,
                label: format!("Group discount {}%", pricing.group_discount_percent),
                quantity: 1,
                amount_cents: i32::try_from(amount).ok()?,
            });
        }
    }

    let total_cents = discounts
        .iter()
        .try_fold(subtotal, |acc, d| acc.checked_sub(d.amount_cents))?;

    let mut breakdown = Vec::with_capacity(1 + surcharges.len() + discounts.len());
    breakdown.push(BreakdownLine {
        label: format!("Base fare ({})", req.service_type),
        amount_cents: pricing.base_price_cents,
    });
    breakdown.extend(surcharges.iter().map(|s| BreakdownLine {
        label: s.label.clone(),
        amount_cents: s.amount_cents,
    }));
    breakdown.extend(discounts.iter().map(|d| BreakdownLine {
        label: d.label.clone(),
        amount_cents: -d.amount_cents,
    }));

    Some(TransferQuote {
        id: Uuid::new_v4(),
        route_id: req.route_id.clone(),
        service_type: req.service_type,
        currency: pricing.currency.clone(),
        passengers: req.passengers,
        children: req.children,
        infants: req.infants,
        luggage: req.luggage,
        child_seats: req.child_seats,
        pickup_date: req.date,
        pickup_time: req.time,
        base_price_cents: pricing.base_price_cents,
        surcharges,
        discounts,
        total_cents,
        breakdown,
        created_at: now,
        valid_until: now + Duration::minutes(QUOTE_VALIDITY_MINUTES),
    })
}
