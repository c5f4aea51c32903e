#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod config;
pub mod force_ssl_redirect;
mod verdict;

pub use self::{
    config::PolicyConfig,
    force_ssl_redirect::{evaluate, evaluate_ingress},
    verdict::{HostMismatch, Verdict, Violation},
};
