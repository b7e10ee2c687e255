pub mod catalog;
pub mod error;
pub mod holidays;
pub mod pricing;
pub mod quote;
pub mod route;
pub mod service;
pub mod validation;
pub mod zone;

pub use catalog::TransferCatalog;
pub use error::{TransferError, TransferResult};
pub use holidays::is_public_holiday;
pub use pricing::TransferPricing;
pub use quote::{calculate_quote, BreakdownLine, PriceAdjustment, QuoteRequest, TransferQuote};
pub use route::{OperatingHours, TransferRoute};
pub use service::{ServiceType, TransferService};
pub use zone::{Coordinates, TransferZone, ZoneKind};
