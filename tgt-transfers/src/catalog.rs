use std::sync::LazyLock;

use chrono::{DateTime, Utc};

use crate::pricing::{TierRates, TransferPricing};
use crate::quote::{calculate_quote, QuoteRequest, TransferQuote};
use crate::route::{OperatingHours, ServiceEligibility, TransferRoute};
use crate::service::{Amenities, ServiceType, TransferService};
use crate::zone::{Coordinates, TransferZone, ZoneKind};

pub const DEFAULT_CURRENCY: &str = "EUR";

/// Read-only transfer tables: zones, routes, services and prices.
#[derive(Debug, Clone)]
pub struct TransferCatalog {
    pub zones: Vec<TransferZone>,
    pub routes: Vec<TransferRoute>,
    pub services: Vec<TransferService>,
    pub pricing: Vec<TransferPricing>,
}

static STANDARD: LazyLock<TransferCatalog> = LazyLock::new(TransferCatalog::build_standard);

impl TransferCatalog {
    /// The process-wide catalog.
    pub fn standard() -> &'static TransferCatalog {
        &STANDARD
    }

    pub fn list_zones(&self) -> &[TransferZone] {
        &self.zones
    }

    pub fn find_zone(&self, zone_id: &str) -> Option<&TransferZone> {
        self.zones.iter().find(|z| z.id == zone_id)
    }

    /// Closest zone whose catchment contains the point.
    pub fn find_nearest_zone(&self, lat: f64, lng: f64) -> Option<&TransferZone> {
        let point = Coordinates::new(lat, lng);
        self.zones
            .iter()
            .map(|z| (z, z.center.distance_km(&point)))
            .filter(|(z, d)| *d <= z.radius_km)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(z, _)| z)
    }

    pub fn find_route(&self, route_id: &str) -> Option<&TransferRoute> {
        self.routes.iter().find(|r| r.id == route_id)
    }

    pub fn routes_between(&self, origin: &str, destination: &str) -> Vec<&TransferRoute> {
        self.routes
            .iter()
            .filter(|r| r.active && r.connects(origin, destination))
            .collect()
    }

    pub fn routes_from(&self, origin: &str) -> Vec<&TransferRoute> {
        self.routes
            .iter()
            .filter(|r| r.active && r.origin_zone_id == origin)
            .collect()
    }

    pub fn active_routes(&self) -> Vec<&TransferRoute> {
        self.routes.iter().filter(|r| r.active).collect()
    }

    pub fn find_service(&self, service_type: ServiceType) -> Option<&TransferService> {
        self.services.iter().find(|s| s.service_type == service_type)
    }

    pub fn find_pricing(&self, route_id: &str, service_type: ServiceType) -> Option<&TransferPricing> {
        self.pricing.iter().find(|p| p.matches(route_id, service_type))
    }

    /// Services a route is eligible for and that carry a price row.
    pub fn available_services(&self, route: &TransferRoute) -> Vec<(&TransferService, &TransferPricing)> {
        self.services
            .iter()
            .filter(|s| route.eligibility.allows(s.service_type))
            .filter_map(|s| self.find_pricing(&route.id, s.service_type).map(|p| (s, p)))
            .collect()
    }

    pub fn quote(&self, req: &QuoteRequest, now: DateTime<Utc>) -> Option<TransferQuote> {
        calculate_quote(&self.pricing, req, now)
    }

    fn build_standard() -> Self {
        let zones = standard_zones();
        let services = standard_services();

        let mut routes = Vec::new();
        let mut pricing = Vec::new();
        for corridor in CORRIDORS {
            for (from, to) in [(corridor.a, corridor.b), (corridor.b, corridor.a)] {
                let route_id = format!("{}-{}", from, to);
                let prices = [
                    (ServiceType::Private, corridor.private),
                    (ServiceType::Shared, corridor.shared),
                    (ServiceType::Premium, corridor.premium),
                ];
                for (service_type, base) in prices {
                    if let Some(base) = base {
                        pricing.push(TierRates::for_service(service_type).into_pricing(
                            &route_id,
                            service_type,
                            DEFAULT_CURRENCY,
                            base,
                        ));
                    }
                }
                routes.push(TransferRoute {
                    id: route_id,
                    origin_zone_id: from.to_string(),
                    destination_zone_id: to.to_string(),
                    distance_km: corridor.distance_km,
                    duration_minutes: corridor.duration_minutes,
                    active: corridor.active,
                    eligibility: ServiceEligibility {
                        private: corridor.private.is_some(),
                        shared: corridor.shared.is_some(),
                        premium: corridor.premium.is_some(),
                        accessible: corridor.accessible,
                    },
                    operating_hours: corridor.hours.map_or_else(OperatingHours::all_day, |(s, e)| OperatingHours::between(s, e)),
                });
            }
        }

        Self { zones, routes, services, pricing }
    }
}

struct Corridor {
    a: &'static str,
    b: &'static str,
    distance_km: f64,
    duration_minutes: u32,
    active: bool,
    accessible: bool,
    hours: Option<((u32, u32), (u32, u32))>,
    private: Option<i32>,
    shared: Option<i32>,
    premium: Option<i32>,
}

// Both directions are generated from each corridor.
const CORRIDORS: &[Corridor] = &[
    Corridor { a: "tiv-airport", b: "kotor", distance_km: 8.0, duration_minutes: 15, active: true, accessible: true, hours: None, private: Some(3000), shared: Some(1500), premium: Some(6000) },
    Corridor { a: "tiv-airport", b: "budva", distance_km: 20.0, duration_minutes: 30, active: true, accessible: true, hours: None, private: Some(3500), shared: Some(1800), premium: Some(7000) },
    Corridor { a: "tiv-airport", b: "tivat", distance_km: 4.0, duration_minutes: 10, active: true, accessible: false, hours: None, private: Some(1500), shared: Some(800), premium: None },
    Corridor { a: "tiv-airport", b: "herceg-novi", distance_km: 27.0, duration_minutes: 40, active: true, accessible: false, hours: None, private: Some(4500), shared: None, premium: Some(8500) },
    Corridor { a: "tiv-airport", b: "sveti-stefan", distance_km: 27.0, duration_minutes: 40, active: true, accessible: true, hours: None, private: Some(4000), shared: None, premium: Some(8000) },
    Corridor { a: "tgd-airport", b: "podgorica", distance_km: 12.0, duration_minutes: 20, active: true, accessible: true, hours: None, private: Some(2000), shared: Some(1000), premium: Some(4500) },
    Corridor { a: "tgd-airport", b: "budva", distance_km: 65.0, duration_minutes: 75, active: true, accessible: false, hours: None, private: Some(6000), shared: Some(2500), premium: Some(11000) },
    Corridor { a: "tgd-airport", b: "ulcinj", distance_km: 80.0, duration_minutes: 90, active: true, accessible: false, hours: Some(((5, 0), (1, 0))), private: Some(7500), shared: Some(3000), premium: None },
    Corridor { a: "tgd-airport", b: "herceg-novi", distance_km: 110.0, duration_minutes: 130, active: false, accessible: false, hours: None, private: Some(9500), shared: None, premium: None },
    Corridor { a: "dbv-airport", b: "herceg-novi", distance_km: 25.0, duration_minutes: 40, active: true, accessible: false, hours: Some(((6, 0), (23, 0))), private: Some(6000), shared: None, premium: Some(11000) },
    Corridor { a: "dbv-airport", b: "kotor", distance_km: 65.0, duration_minutes: 90, active: true, accessible: false, hours: Some(((6, 0), (23, 0))), private: Some(9000), shared: None, premium: Some(15000) },
    Corridor { a: "budva", b: "kotor", distance_km: 23.0, duration_minutes: 30, active: true, accessible: true, hours: None, private: Some(3000), shared: Some(1200), premium: None },
];

fn zone(id: &str, name: &str, kind: ZoneKind, lat: f64, lng: f64, radius_km: f64) -> TransferZone {
    TransferZone {
        id: id.to_string(),
        name: name.to_string(),
        kind,
        center: Coordinates::new(lat, lng),
        radius_km,
    }
}

fn standard_zones() -> Vec<TransferZone> {
    vec![
        zone("tiv-airport", "Tivat Airport (TIV)", ZoneKind::Airport, 42.4047, 18.7233, 2.0),
        zone("tgd-airport", "Podgorica Airport (TGD)", ZoneKind::Airport, 42.3594, 19.2519, 3.0),
        zone("dbv-airport", "Dubrovnik Airport (DBV)", ZoneKind::Airport, 42.5614, 18.2682, 3.0),
        zone("kotor", "Kotor", ZoneKind::City, 42.4247, 18.7712, 4.0),
        zone("tivat", "Tivat & Porto Montenegro", ZoneKind::City, 42.4350, 18.6960, 2.0),
        zone("budva", "Budva Riviera", ZoneKind::Resort, 42.2864, 18.8400, 5.0),
        zone("sveti-stefan", "Sveti Stefan & Milocer", ZoneKind::Resort, 42.2560, 18.8910, 2.5),
        zone("herceg-novi", "Herceg Novi", ZoneKind::City, 42.4531, 18.5375, 5.0),
        zone("podgorica", "Podgorica", ZoneKind::City, 42.4304, 19.2594, 7.0),
        zone("ulcinj", "Ulcinj & Velika Plaza", ZoneKind::Resort, 41.9294, 19.2244, 8.0),
    ]
}

fn standard_services() -> Vec<TransferService> {
    let langs = |codes: &[&str]| codes.iter().map(|c| c.to_string()).collect::<Vec<_>>();
    vec![
        TransferService {
            service_type: ServiceType::Private,
            name: "Private transfer".to_string(),
            vehicle_type: "Sedan or minivan".to_string(),
            amenities: Amenities { wifi: false, bottled_water: true, child_seats: true, meet_and_greet: true },
            languages: langs(&["en", "me", "ru"]),
            cancellation_policy: "Free cancellation up to 24 hours before pickup".to_string(),
            min_booking_hours: 12,
            max_passengers: 8,
            max_luggage: 10,
        },
        TransferService {
            service_type: ServiceType::Shared,
            name: "Shared shuttle".to_string(),
            vehicle_type: "Minibus".to_string(),
            amenities: Amenities { wifi: false, bottled_water: false, child_seats: false, meet_and_greet: false },
            languages: langs(&["en", "me"]),
            cancellation_policy: "Non-refundable within 48 hours of pickup".to_string(),
            min_booking_hours: 24,
            max_passengers: 16,
            max_luggage: 16,
        },
        TransferService {
            service_type: ServiceType::Premium,
            name: "Premium chauffeur".to_string(),
            vehicle_type: "Mercedes V-Class".to_string(),
            amenities: Amenities { wifi: true, bottled_water: true, child_seats: true, meet_and_greet: true },
            languages: langs(&["en", "me", "ru", "de"]),
            cancellation_policy: "Free cancellation up to 12 hours before pickup".to_string(),
            min_booking_hours: 6,
            max_passengers: 7,
            max_luggage: 10,
        },
    ]
}
