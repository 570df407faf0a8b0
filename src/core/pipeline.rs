use std::{sync::Arc, time::Duration};

use tokio::time::timeout;
use tracing::{error, info, warn};

use super::{context::PlanningContext, rules::RulesEngine};
use crate::{
    error::{ConstraintViolation, VegaError},
    services::{
        gateway::GenerationGateway,
        prompt::assemble_prompt,
        response_parser::{parse_reply, sanitize_suggestions, ParsedReply},
    },
    types::{DegradeReason, Generation, SuggestResponse, TripRequest},
};

/// Runs normalize → rules → prompt → generate → parse for one request at a time.
///
/// Holds only shared, read-only collaborators; concurrent calls need no coordination.
#[derive(Debug, Clone)]
pub struct VegaPipeline {
    gateway: Arc<dyn GenerationGateway>,
    rules: RulesEngine,
    timeout: Duration,
}

impl VegaPipeline {
    pub fn new(gateway: Arc<dyn GenerationGateway>) -> Self {
        Self {
            gateway,
            rules: RulesEngine::default(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_rules(mut self, rules: RulesEngine) -> Self {
        self.rules = rules;
        self
    }

    /// Upper bound on one gateway call, on top of the gateway's own deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn gateway_name(&self) -> &'static str {
        self.gateway.name()
    }

    /// Run the pipeline and shape the outward response.
    ///
    /// Constraint violations become a failure response with their cause; every other problem
    /// has already degraded to an empty suggestion list.
    pub async fn suggest(&self, request: &TripRequest) -> SuggestResponse {
        info!(
            target: "vega::pipeline",
            trip_id = %request.trip_id,
            city = %request.city,
            country = %request.country,
            "received suggestion request"
        );

        match self.run(request).await {
            Ok(generation) => {
                info!(
                    target: "vega::pipeline",
                    trip_id = %request.trip_id,
                    count = generation.suggestions.len(),
                    degraded = ?generation.degraded,
                    "generated suggestions"
                );
                SuggestResponse::success(request, generation.suggestions)
            }
            Err(violation) => {
                info!(
                    target: "vega::pipeline",
                    trip_id = %request.trip_id,
                    cause = %violation,
                    "request rejected"
                );
                SuggestResponse::failure(request, violation.to_string())
            }
        }
    }

    /// Run the pipeline, keeping the degrade reason visible.
    ///
    /// The only error is a hard constraint violation.
    pub async fn run(&self, request: &TripRequest) -> Result<Generation, ConstraintViolation> {
        let context = PlanningContext::from_request(request);
        let constrained = self.rules.apply(&context)?;
        let prompt = assemble_prompt(&constrained);

        let raw = match self.generate(&prompt.system, &prompt.task).await {
            Ok(raw) => raw,
            Err(err) if err.is_recoverable() => {
                warn!(
                    target: "vega::gateway",
                    backend = self.gateway.name(),
                    trip_id = %request.trip_id,
                    code = err.error_code(),
                    error = %err,
                    "generation failed, degrading to no suggestions"
                );
                let reason = match err {
                    VegaError::Timeout(_) => DegradeReason::Timeout,
                    _ => DegradeReason::GenerationUnavailable,
                };
                return Ok(Generation::degraded(reason));
            }
            Err(err) => {
                // A gateway has no business raising config or constraint errors.
                error!(
                    target: "vega::gateway",
                    backend = self.gateway.name(),
                    trip_id = %request.trip_id,
                    code = err.error_code(),
                    error = %err,
                    "gateway raised a non-recoverable error"
                );
                return Ok(Generation::degraded(DegradeReason::GenerationUnavailable));
            }
        };

        Ok(match parse_reply(&raw) {
            ParsedReply::WellFormed(set) => Generation::complete(sanitize_suggestions(set)),
            ParsedReply::Degraded(reason) => Generation::degraded(reason),
        })
    }

    async fn generate(&self, system: &str, task: &str) -> crate::Result<String> {
        timeout(self.timeout, self.gateway.generate(system, task))
            .await
            .map_err(|_| {
                VegaError::Timeout(format!(
                    "{} did not answer within {:?}",
                    self.gateway.name(),
                    self.timeout
                ))
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingGateway {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GenerationGateway for CountingGateway {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn generate(&self, _system: &str, _task: &str) -> crate::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(r#"{"suggestions": []}"#.to_string())
        }
    }

    #[derive(Debug)]
    struct FailingGateway(fn() -> VegaError);

    #[async_trait]
    impl GenerationGateway for FailingGateway {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn generate(&self, _system: &str, _task: &str) -> crate::Result<String> {
            Err((self.0)())
        }
    }

    #[derive(Debug)]
    struct StalledGateway;

    #[async_trait]
    impl GenerationGateway for StalledGateway {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn generate(&self, _system: &str, _task: &str) -> crate::Result<String> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }
    }

    fn request(remaining_budget: f64) -> TripRequest {
        TripRequest {
            trip_id: "t1".to_string(),
            city: "Paris".to_string(),
            country: "France".to_string(),
            day: 3,
            time_slot: "Afternoon".to_string(),
            total_budget: 15000.0,
            remaining_budget,
            preferences: None,
            adults: 1,
            children: 0,
        }
    }

    #[tokio::test]
    async fn test_rejected_request_never_reaches_gateway() {
        let gateway = Arc::new(CountingGateway::default());
        let pipeline = VegaPipeline::new(gateway.clone());

        let err = pipeline.run(&request(0.0)).await.unwrap_err();
        assert_eq!(err, ConstraintViolation::NoRemainingBudget);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_well_formed_empty_reply_is_not_degraded() {
        let gateway = Arc::new(CountingGateway::default());
        let pipeline = VegaPipeline::new(gateway.clone());

        let generation = pipeline.run(&request(100.0)).await.unwrap();
        assert!(!generation.is_degraded());
        assert!(generation.suggestions.is_empty());
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_gateway_times_out() {
        let pipeline =
            VegaPipeline::new(Arc::new(StalledGateway)).with_timeout(Duration::from_secs(30));

        let generation = pipeline.run(&request(100.0)).await.unwrap();
        assert_eq!(generation.degraded, Some(DegradeReason::Timeout));

        let response = pipeline.suggest(&request(100.0)).await;
        assert!(response.success);
        assert_eq!(response.message, "Generated 0 suggestions");
    }

    #[tokio::test]
    async fn test_gateway_errors_map_to_degrade_reasons() {
        let cases: [(fn() -> VegaError, DegradeReason); 4] = [
            (
                || VegaError::Timeout("read timed out".to_string()),
                DegradeReason::Timeout,
            ),
            (
                || VegaError::RateLimit { retry_after: 5 },
                DegradeReason::GenerationUnavailable,
            ),
            (
                || VegaError::Config("missing key".to_string()),
                DegradeReason::GenerationUnavailable,
            ),
            (
                || VegaError::Constraint(ConstraintViolation::InvalidDay),
                DegradeReason::GenerationUnavailable,
            ),
        ];

        for (make_error, expected) in cases {
            let pipeline = VegaPipeline::new(Arc::new(FailingGateway(make_error)));
            let generation = pipeline.run(&request(100.0)).await.unwrap();
            assert_eq!(generation.degraded, Some(expected));

            let response = pipeline.suggest(&request(100.0)).await;
            assert!(response.success, "{:?}", make_error());
            assert!(response.suggestions.is_empty());
        }
    }
}
