pub mod idempotency;
pub mod resiliency;

pub use idempotency::idempotency_middleware;
pub use resiliency::{CircuitBreaker, CircuitState};
