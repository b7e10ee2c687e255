use serde::{Deserialize, Serialize};

use crate::service::ServiceType;

/// Price row keyed by (route, service type). Amounts are in minor units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferPricing {
    pub route_id: String,
    pub service_type: ServiceType,
    pub currency: String,
    pub base_price_cents: i32,
    pub after_hours_surcharge_cents: i32,
    pub holiday_surcharge_cents: i32,
    pub child_seat_cents: i32,
    pub excess_luggage_cents: i32,
    /// Bags carried free per passenger.
    pub included_luggage_per_passenger: u32,
    /// Percentage off the subtotal; 0 disables the discount.
    pub group_discount_percent: u32,
    /// Passenger count at which the group discount kicks in; 0 disables it.
    pub group_discount_threshold: u32,
    pub min_passengers: u32,
    pub max_passengers: u32,
    pub max_luggage: u32,
}

impl TransferPricing {
    pub fn matches(&self, route_id: &str, service_type: ServiceType) -> bool {
        self.route_id == route_id && self.service_type == service_type
    }

    pub fn group_discount_applies(&self, passengers: u32) -> bool {
        self.group_discount_percent > 0
            && self.group_discount_threshold > 0
            && passengers >= self.group_discount_threshold
    }

    pub fn excess_luggage(&self, passengers: u32, luggage: u32) -> u32 {
        luggage.saturating_sub(self.included_luggage_per_passenger.saturating_mul(passengers))
    }
}

/// Surcharge schedule shared by every route of one service tier.
#[derive(Debug, Clone, Copy)]
pub struct TierRates {
    pub after_hours_surcharge_cents: i32,
    pub holiday_surcharge_cents: i32,
    pub child_seat_cents: i32,
    pub excess_luggage_cents: i32,
    pub included_luggage_per_passenger: u32,
    pub group_discount_percent: u32,
    pub group_discount_threshold: u32,
    pub min_passengers: u32,
    pub max_passengers: u32,
    pub max_luggage: u32,
}

impl TierRates {
    pub fn for_service(service_type: ServiceType) -> Self {
        match service_type {
            ServiceType::Private => Self {
                after_hours_surcharge_cents: 1500,
                holiday_surcharge_cents: 1000,
                child_seat_cents: 500,
                excess_luggage_cents: 300,
                included_luggage_per_passenger: 1,
                group_discount_percent: 10,
                group_discount_threshold: 6,
                min_passengers: 1,
                max_passengers: 8,
                max_luggage: 10,
            },
            ServiceType::Shared => Self {
                after_hours_surcharge_cents: 500,
                holiday_surcharge_cents: 500,
                child_seat_cents: 500,
                excess_luggage_cents: 300,
                included_luggage_per_passenger: 1,
                group_discount_percent: 15,
                group_discount_threshold: 8,
                min_passengers: 1,
                max_passengers: 16,
                max_luggage: 16,
            },
            ServiceType::Premium => Self {
                after_hours_surcharge_cents: 2500,
                holiday_surcharge_cents: 2000,
                child_seat_cents: 0,
                excess_luggage_cents: 0,
                included_luggage_per_passenger: 2,
                group_discount_percent: 0,
                group_discount_threshold: 0,
                min_passengers: 1,
                max_passengers: 7,
                max_luggage: 10,
            },
        }
    }

    pub fn into_pricing(self, route_id: &str, service_type: ServiceType, currency: &str, base_price_cents: i32) -> TransferPricing {
        TransferPricing {
            route_id: route_id.to_string(),
            service_type,
            currency: currency.to_string(),
            base_price_cents,
            after_hours_surcharge_cents: self.after_hours_surcharge_cents,
            holiday_surcharge_cents: self.holiday_surcharge_cents,
            child_seat_cents: self.child_seat_cents,
            excess_luggage_cents: self.excess_luggage_cents,
            included_luggage_per_passenger: self.included_luggage_per_passenger,
            group_discount_percent: self.group_discount_percent,
            group_discount_threshold: self.group_discount_threshold,
            min_passengers: self.min_passengers,
            max_passengers: self.max_passengers,
            max_luggage: self.max_luggage,
        }
    }
}
