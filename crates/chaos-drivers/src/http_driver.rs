//! Generic HTTP-backed [`ActionDriver`], implementing the wire contract
//! from `spec.md §6`: POST to a configured chaos endpoint with a JSON body
//! per action kind; 2xx = success, 4xx = non-retryable failure, 5xx =
//! retryable failure. The correlation id travels in the
//! `X-Chaos-Correlation-Id` header so a later `clear` call can target the
//! same remote effect.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::time::Instant;
use tracing::{info, warn};

use chaos_model::Action;
use chaos_resilience::{retry_transport, CancellationToken, CircuitBreaker, CircuitCallError, TransportOutcome};

use crate::driver::{run_with_deadline, ActionDriver};
use crate::error::{ActionFailure, InvalidParameter};
use crate::schema::{validate_parameters, ParamSpec};

pub struct HttpServiceDriver {
    service: String,
    base_url: String,
    client: reqwest::Client,
    circuit: CircuitBreaker,
    /// Per-action-kind parameter schema; a kind with no entry accepts any
    /// parameters (used for test/demo kinds like `"noop"`).
    schemas: BTreeMap<String, Vec<ParamSpec>>,
}

impl HttpServiceDriver {
    pub fn new(
        service: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
        schemas: BTreeMap<String, Vec<ParamSpec>>,
    ) -> Self {
        let service = service.into();
        Self {
            circuit: CircuitBreaker::new(chaos_resilience::CircuitBreakerConfig {
                name: service.clone(),
                ..Default::default()
            }),
            service,
            base_url: base_url.into(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("building the chaos driver HTTP client"),
            schemas,
        }
    }

    fn endpoint(&self, kind: &str) -> String {
        format!("{}/chaos/{kind}", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ActionDriver for HttpServiceDriver {
    fn validate(&self, action: &Action) -> Result<(), InvalidParameter> {
        if action.service != self.service {
            return Err(InvalidParameter {
                reason: format!(
                    "driver for service {:?} cannot validate action targeting {:?}",
                    self.service, action.service
                ),
            });
        }
        match self.schemas.get(&action.kind) {
            Some(spec) => validate_parameters(spec, &action.parameters),
            None => Ok(()),
        }
    }

    async fn execute(
        &self,
        action: &Action,
        deadline: Instant,
        correlation_id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ActionFailure> {
        self.validate(action)
            .map_err(|e| ActionFailure::non_retryable(e.reason))?;

        let url = self.endpoint(&action.kind);
        let body = serde_json::to_value(&action.parameters)
            .map_err(|e| ActionFailure::non_retryable(format!("unserializable parameters: {e}")))?;

        let call = || async {
            let send = self
                .client
                .post(&url)
                .header("X-Chaos-Correlation-Id", correlation_id)
                .json(&body)
                .send();

            match send.await {
                Ok(response) => classify_response(response.status()).await,
                Err(err) if err.is_timeout() || err.is_connect() => {
                    TransportOutcome::Transport(ActionFailure::retryable(format!(
                        "transport error: {err}"
                    )))
                }
                Err(err) => TransportOutcome::Application(ActionFailure::non_retryable(format!(
                    "request error: {err}"
                ))),
            }
        };

        run_with_deadline(deadline, cancel, async {
            let outcome = self
                .circuit
                .call(|| retry_transport(cancel, call))
                .await
                .map_err(|err| match err {
                    CircuitCallError::Open(_) => {
                        ActionFailure::retryable(format!("circuit open for service {}", self.service))
                    }
                    CircuitCallError::Inner(failure) => failure,
                });
            match &outcome {
                Ok(()) => info!(service = %self.service, kind = %action.kind, correlation_id, "action executed"),
                Err(failure) => warn!(service = %self.service, kind = %action.kind, correlation_id, %failure, "action failed"),
            }
            outcome
        })
        .await
    }

    async fn clear(&self, correlation_id: &str) -> Result<(), ActionFailure> {
        let url = format!("{}/chaos/clear", self.base_url.trim_end_matches('/'));
        match self
            .client
            .post(&url)
            .header("X-Chaos-Correlation-Id", correlation_id)
            .send()
            .await
        {
            Ok(response) if response.status() == StatusCode::NOT_FOUND => Ok(()),
            Ok(response) => match classify_response(response.status()).await {
                TransportOutcome::Ok(()) => Ok(()),
                TransportOutcome::Transport(f) | TransportOutcome::Application(f) => Err(f),
            },
            Err(err) => Err(ActionFailure::retryable(format!("clear transport error: {err}"))),
        }
    }
}

async fn classify_response(status: StatusCode) -> TransportOutcome<(), ActionFailure> {
    if status.is_success() {
        TransportOutcome::Ok(())
    } else if status.is_client_error() {
        TransportOutcome::Application(ActionFailure::non_retryable(format!(
            "remote rejected action: {status}"
        )))
    } else {
        TransportOutcome::Transport(ActionFailure::retryable(format!(
            "remote server error: {status}"
        )))
    }
}
