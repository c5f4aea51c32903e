use crate::core::Verdict;
use prometheus_client::{
    encoding::{EncodeLabelSet, EncodeLabelValue},
    metrics::{counter::Counter, family::Family},
    registry::Registry,
};

/// Counts admission requests by envelope and outcome.
#[derive(Clone, Debug)]
pub struct AdmissionMetrics {
    requests: Family<Labels, Counter>,
}

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum Endpoint {
    AdmissionReview,
    Validate,
    ValidateSettings,
}

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum Outcome {
    Accepted,
    Rejected,
    Invalid,
}

#[derive(Clone, Hash, PartialEq, Eq, EncodeLabelSet, Debug)]
struct Labels {
    endpoint: Endpoint,
    outcome: Outcome,
}

// === impl AdmissionMetrics ===

impl AdmissionMetrics {
    pub fn register(reg: &mut Registry) -> Self {
        let requests = Family::<Labels, Counter>::default();
        reg.register(
            "requests",
            "Total number of admission requests handled, by outcome",
            requests.clone(),
        );
        Self { requests }
    }

    pub(crate) fn record(&self, endpoint: Endpoint, outcome: Outcome) {
        self.requests
            .get_or_create(&Labels { endpoint, outcome })
            .inc();
    }

    pub(crate) fn record_verdict(&self, endpoint: Endpoint, verdict: &Verdict) {
        let outcome = if verdict.is_accepted() {
            Outcome::Accepted
        } else {
            Outcome::Rejected
        };
        self.record(endpoint, outcome);
    }
}
