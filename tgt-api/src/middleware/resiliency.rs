use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,   // Normal operation
    Open,     // Failing fast
    HalfOpen, // Trying the provider again
}

/// Guards calls to a live upstream. Trips after `failure_threshold`
/// consecutive failures and lets one trial call through after `reset_timeout`.
pub struct CircuitBreaker {
    pub name: String,
    state: RwLock<CircuitState>,
    failure_count: AtomicUsize,
    failure_threshold: usize,
    reset_timeout: Duration,
    last_failure: RwLock<Option<Instant>>,
    trial_started: RwLock<Option<Instant>>,
}

impl CircuitBreaker {
    pub fn new(name: &str, threshold: usize, timeout: Duration) -> Self {
        Self {
            name: name.to_string(),
            state: RwLock::new(CircuitState::Closed),
            failure_count: AtomicUsize::new(0),
            failure_threshold: threshold.max(1),
            reset_timeout: timeout,
            last_failure: RwLock::new(None),
            trial_started: RwLock::new(None),
        }
    }

    pub async fn state(&self) -> CircuitState {
        *self.state.read().await
    }

    /// Whether a call may proceed. A half-open trial that never reports
    /// back is replaced by a new one once `reset_timeout` has passed.
    pub async fn check(&self) -> bool {
        let state = *self.state.read().await;
        match state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => {
                let s = self.state.write().await;
                if *s != CircuitState::HalfOpen {
                    return *s == CircuitState::Closed;
                }
                let mut started = self.trial_started.write().await;
                let stale = started.map_or(true, |instant| instant.elapsed() >= self.reset_timeout);
                if stale {
                    *started = Some(Instant::now());
                    tracing::warn!("Circuit Breaker [{}] retrying stalled Half-Open trial", self.name);
                }
                stale
            }
            CircuitState::Open => {
                let last_fail = *self.last_failure.read().await;
                let cooled_down = last_fail.is_some_and(|instant| instant.elapsed() >= self.reset_timeout);
                if !cooled_down {
                    return false;
                }
                let mut s = self.state.write().await;
                // Only the caller that flips Open -> HalfOpen gets the trial call.
                if *s == CircuitState::Open {
                    *s = CircuitState::HalfOpen;
                    *self.trial_started.write().await = Some(Instant::now());
                    tracing::info!("Circuit Breaker [{}] moving to Half-Open", self.name);
                    true
                } else {
                    false
                }
            }
        }
    }

    pub async fn record_success(&self) {
        let mut state = self.state.write().await;
        if *state == CircuitState::HalfOpen {
            tracing::info!("Circuit Breaker [{}] recovered to Closed", self.name);
        }
        *state = CircuitState::Closed;
        self.failure_count.store(0, Ordering::SeqCst);
    }

    pub async fn record_failure(&self) {
        let count = self.failure_count.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.state.write().await;

        if count >= self.failure_threshold || *state == CircuitState::HalfOpen {
            *state = CircuitState::Open;
            *self.last_failure.write().await = Some(Instant::now());
            tracing::error!("Circuit Breaker [{}] TRIPPED to Open. Failures: {}", self.name, count);
        }
    }
}
