//! Circuit breaker pattern, ported from the resilience module.
//!
//! Wraps each driver's remote endpoint so a run of transport failures stops
//! hammering a dead service: CLOSED (normal) -> OPEN (reject fast) ->
//! HALF_OPEN (probe) -> CLOSED. This is additive to the retry policy in
//! [`crate::retry`]: retry handles a single call's transient failure,
//! the breaker handles sustained failure across many calls.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    pub name: String,
    pub failure_threshold: u64,
    pub success_threshold: u64,
    pub reset_timeout_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            name: "unnamed".to_string(),
            failure_threshold: 5,
            success_threshold: 2,
            reset_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerStats {
    pub state: CircuitState,
    pub failure_count: u64,
    pub success_count: u64,
    pub total_requests: u64,
}

#[derive(Debug, Error)]
#[error("circuit breaker '{name}' is open")]
pub struct CircuitOpenError {
    pub name: String,
}

pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: AtomicU8,
    failure_count: AtomicU64,
    success_count: AtomicU64,
    total_requests: AtomicU64,
    next_attempt: Arc<RwLock<Instant>>,
}

const CLOSED: u8 = 0;
const OPEN: u8 = 1;
const HALF_OPEN: u8 = 2;

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: AtomicU8::new(CLOSED),
            failure_count: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
            total_requests: AtomicU64::new(0),
            next_attempt: Arc::new(RwLock::new(Instant::now())),
        }
    }

    fn state(&self) -> CircuitState {
        match self.state.load(Ordering::Relaxed) {
            CLOSED => CircuitState::Closed,
            OPEN => CircuitState::Open,
            _ => CircuitState::HalfOpen,
        }
    }

    pub async fn stats(&self) -> CircuitBreakerStats {
        CircuitBreakerStats {
            state: self.state(),
            failure_count: self.failure_count.load(Ordering::Relaxed),
            success_count: self.success_count.load(Ordering::Relaxed),
            total_requests: self.total_requests.load(Ordering::Relaxed),
        }
    }

    /// Runs `operation` if the circuit allows it. Returns
    /// `Err(CircuitOpenError)` without running `operation` at all when the
    /// circuit is open and the reset timeout has not elapsed.
    pub async fn call<F, Fut, T, E>(&self, operation: F) -> Result<T, CircuitCallError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        self.total_requests.fetch_add(1, Ordering::Relaxed);

        if self.state() == CircuitState::Open {
            let next_attempt = *self.next_attempt.read().await;
            if Instant::now() < next_attempt {
                return Err(CircuitCallError::Open(CircuitOpenError {
                    name: self.config.name.clone(),
                }));
            }
            self.state.store(HALF_OPEN, Ordering::Relaxed);
            self.success_count.store(0, Ordering::Relaxed);
        }

        match operation().await {
            Ok(value) => {
                self.on_success().await;
                Ok(value)
            }
            Err(err) => {
                self.on_failure().await;
                Err(CircuitCallError::Inner(err))
            }
        }
    }

    async fn on_success(&self) {
        self.failure_count.store(0, Ordering::Relaxed);
        if self.state() == CircuitState::HalfOpen {
            let successes = self.success_count.fetch_add(1, Ordering::Relaxed) + 1;
            if successes >= self.config.success_threshold {
                self.state.store(CLOSED, Ordering::Relaxed);
                self.success_count.store(0, Ordering::Relaxed);
                info!(circuit = %self.config.name, "circuit closed after recovery probes");
            }
        }
    }

    async fn on_failure(&self) {
        let failures = self.failure_count.fetch_add(1, Ordering::Relaxed) + 1;
        if self.state() == CircuitState::HalfOpen || failures >= self.config.failure_threshold {
            self.state.store(OPEN, Ordering::Relaxed);
            *self.next_attempt.write().await =
                Instant::now() + Duration::from_millis(self.config.reset_timeout_ms);
            self.success_count.store(0, Ordering::Relaxed);
            warn!(circuit = %self.config.name, failures, "circuit opened");
        }
    }
}

#[derive(Debug, Error)]
pub enum CircuitCallError<E> {
    #[error(transparent)]
    Open(#[from] CircuitOpenError),
    #[error("{0}")]
    Inner(E),
}
