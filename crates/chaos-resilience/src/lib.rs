//! Cancellation, retry, and circuit-breaker primitives shared across the
//! chaos execution engine.

pub mod cancellation;
pub mod circuit_breaker;
pub mod retry;

pub use cancellation::CancellationToken;
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitCallError, CircuitOpenError, CircuitState};
pub use retry::{retry_transport, TransportOutcome, TRANSPORT_BACKOFF_MS};
