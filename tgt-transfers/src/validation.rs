use chrono::{Duration, NaiveDateTime};

use crate::catalog::TransferCatalog;
use crate::error::{TransferError, TransferResult};
use crate::quote::QuoteRequest;

impl TransferCatalog {
    /// Checks a request against route, service and pricing constraints.
    /// `now` is local wall-clock time at the pickup location.
    pub fn validate_request(&self, req: &QuoteRequest, now: NaiveDateTime) -> TransferResult<()> {
        let route = self
            .find_route(&req.route_id)
            .ok_or_else(|| TransferError::RouteNotFound(req.route_id.clone()))?;

        if !route.active {
            return Err(TransferError::RouteInactive(route.id.clone()));
        }

        if !route.eligibility.allows(req.service_type) {
            return Err(TransferError::ServiceNotOffered {
                route: route.id.clone(),
                service: req.service_type,
            });
        }

        let service = self.find_service(req.service_type).ok_or_else(|| TransferError::ServiceNotOffered {
            route: route.id.clone(),
            service: req.service_type,
        })?;

        let pricing = self
            .find_pricing(&route.id, req.service_type)
            .ok_or_else(|| TransferError::PricingNotFound {
                route: route.id.clone(),
                service: req.service_type,
            })?;

        let max_passengers = pricing.max_passengers.min(service.max_passengers);
        if req.passengers < pricing.min_passengers || req.passengers > max_passengers {
            return Err(TransferError::PassengerCount {
                requested: req.passengers,
                min: pricing.min_passengers,
                max: max_passengers,
            });
        }

        if req.children.saturating_add(req.infants) > req.passengers {
            return Err(TransferError::InvalidParty(format!(
                "{} children and {} infants in a party of {}",
                req.children, req.infants, req.passengers
            )));
        }

        if req.child_seats > 0 {
            if !service.amenities.child_seats {
                return Err(TransferError::ChildSeatsUnavailable(req.service_type));
            }
            let allowed = req.children.saturating_add(req.infants);
            if req.child_seats > allowed {
                return Err(TransferError::TooManyChildSeats {
                    requested: req.child_seats,
                    allowed,
                });
            }
        }

        let max_luggage = pricing.max_luggage.min(service.max_luggage);
        if req.luggage > max_luggage {
            return Err(TransferError::LuggageLimit {
                requested: req.luggage,
                max: max_luggage,
            });
        }

        if !route.operating_hours.is_operating(req.time) {
            return Err(TransferError::OutsideOperatingHours {
                route: route.id.clone(),
                time: req.time.format("%H:%M").to_string(),
                window: route.operating_hours.to_string(),
            });
        }

        if req.pickup_at() < now + Duration::hours(service.min_booking_hours as i64) {
            return Err(TransferError::LeadTime {
                hours: service.min_booking_hours,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceType;
    use chrono::{NaiveDate, NaiveTime};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 1).unwrap().and_hms_opt(9, 0, 0).unwrap()
    }

    fn request(route_id: &str, service_type: ServiceType) -> QuoteRequest {
        QuoteRequest {
            route_id: route_id.to_string(),
            service_type,
            passengers: 2,
            children: 0,
            infants: 0,
            luggage: 2,
            child_seats: 0,
            date: NaiveDate::from_ymd_opt(2026, 8, 10).unwrap(),
            time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            is_public_holiday: false,
        }
    }

    #[test]
    fn test_valid_request() {
        let catalog = TransferCatalog::standard();
        catalog
            .validate_request(&request("tiv-airport-kotor", ServiceType::Private), now())
            .unwrap();
    }

    #[test]
    fn test_unknown_and_inactive_routes() {
        let catalog = TransferCatalog::standard();
        assert!(matches!(
            catalog.validate_request(&request("mars-kotor", ServiceType::Private), now()),
            Err(TransferError::RouteNotFound(_))
        ));
        assert!(matches!(
            catalog.validate_request(&request("tgd-airport-herceg-novi", ServiceType::Private), now()),
            Err(TransferError::RouteInactive(_))
        ));
    }

    #[test]
    fn test_ineligible_service() {
        let catalog = TransferCatalog::standard();
        assert!(matches!(
            catalog.validate_request(&request("tiv-airport-tivat", ServiceType::Premium), now()),
            Err(TransferError::ServiceNotOffered { .. })
        ));
    }

    #[test]
    fn test_party_limits() {
        let catalog = TransferCatalog::standard();

        let mut req = request("tiv-airport-kotor", ServiceType::Premium);
        req.passengers = 8;
        assert!(matches!(
            catalog.validate_request(&req, now()),
            Err(TransferError::PassengerCount { max: 7, .. })
        ));

        let mut req = request("tiv-airport-kotor", ServiceType::Private);
        req.passengers = 0;
        assert!(matches!(catalog.validate_request(&req, now()), Err(TransferError::PassengerCount { .. })));

        let mut req = request("tiv-airport-kotor", ServiceType::Private);
        req.children = 2;
        req.infants = 1;
        assert!(matches!(catalog.validate_request(&req, now()), Err(TransferError::InvalidParty(_))));

        let mut req = request("tiv-airport-kotor", ServiceType::Private);
        req.luggage = 11;
        assert!(matches!(catalog.validate_request(&req, now()), Err(TransferError::LuggageLimit { max: 10, .. })));
    }

    #[test]
    fn test_party_counts_near_u32_max() {
        let catalog = TransferCatalog::standard();

        let mut req = request("tiv-airport-kotor", ServiceType::Private);
        req.children = u32::MAX;
        req.infants = 1;
        assert!(matches!(catalog.validate_request(&req, now()), Err(TransferError::InvalidParty(_))));

        let mut req = request("tiv-airport-kotor", ServiceType::Private);
        req.children = 1;
        req.child_seats = u32::MAX;
        assert!(matches!(
            catalog.validate_request(&req, now()),
            Err(TransferError::TooManyChildSeats { allowed: 1, .. })
        ));
    }

    #[test]
    fn test_child_seats() {
        let catalog = TransferCatalog::standard();

        let mut req = request("tiv-airport-kotor", ServiceType::Shared);
        req.children = 1;
        req.child_seats = 1;
        assert!(matches!(
            catalog.validate_request(&req, now()),
            Err(TransferError::ChildSeatsUnavailable(ServiceType::Shared))
        ));

        let mut req = request("tiv-airport-kotor", ServiceType::Private);
        req.children = 1;
        req.child_seats = 2;
        assert!(matches!(
            catalog.validate_request(&req, now()),
            Err(TransferError::TooManyChildSeats { requested: 2, allowed: 1 })
        ));
    }

    #[test]
    fn test_operating_hours() {
        let catalog = TransferCatalog::standard();
        let mut req = request("dbv-airport-kotor", ServiceType::Private);
        req.time = NaiveTime::from_hms_opt(23, 30, 0).unwrap();
        assert!(matches!(
            catalog.validate_request(&req, now()),
            Err(TransferError::OutsideOperatingHours { .. })
        ));

        // Wraps past midnight
        let mut req = request("tgd-airport-ulcinj", ServiceType::Private);
        req.time = NaiveTime::from_hms_opt(0, 30, 0).unwrap();
        catalog.validate_request(&req, now()).unwrap();
    }

    #[test]
    fn test_lead_time() {
        let catalog = TransferCatalog::standard();
        let mut req = request("tiv-airport-kotor", ServiceType::Shared);
        req.date = NaiveDate::from_ymd_opt(2026, 8, 2).unwrap();
        req.time = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        // 23 hours ahead, shared needs 24
        assert!(matches!(catalog.validate_request(&req, now()), Err(TransferError::LeadTime { hours: 24 })));

        req.service_type = ServiceType::Private;
        catalog.validate_request(&req, now()).unwrap();
    }
}
