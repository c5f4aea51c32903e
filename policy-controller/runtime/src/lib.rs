#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use ingress_tls_policy_core as core;
pub use ingress_tls_policy_k8s_api as k8s;

mod admission;
mod args;
mod metrics;
pub mod protocol;

pub use self::{
    admission::{Admission, Error},
    args::Args,
    metrics::AdmissionMetrics,
};
