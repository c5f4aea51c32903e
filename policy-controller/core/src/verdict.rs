use std::fmt;
use thiserror::Error;

/// The outcome of evaluating an Ingress.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(Violation),
}

/// Describes why an Ingress that enables `force-ssl-redirect` is rejected.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Violation {
    #[error("force-ssl-redirect is true but Ingress spec is missing")]
    MissingSpec,

    #[error("force-ssl-redirect is true but no TLS configuration (spec.tls) is defined")]
    MissingTls,

    #[error("force-ssl-redirect is true but one or more Ingress rules have an empty host")]
    EmptyRuleHost,

    #[error("force-ssl-redirect is true but Ingress has no rules with host defined")]
    NoRuleHosts,

    #[error("force-ssl-redirect is true but spec.tls[*].hosts is empty")]
    NoTlsHosts,

    #[error("{0}")]
    HostMismatch(HostMismatch),
}

/// The difference between an Ingress's rule hosts and its TLS hosts.
///
/// Both lists are sorted. At least one of them is non-empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostMismatch {
    /// Rule hosts without a TLS entry.
    pub missing: Vec<String>,
    /// TLS hosts that no rule references.
    pub extra: Vec<String>,
}

// === impl Verdict ===

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accept)
    }

    /// Returns the human-readable rejection reason, if any.
    pub fn reason(&self) -> Option<String> {
        match self {
            Self::Accept => None,
            Self::Reject(violation) => Some(violation.to_string()),
        }
    }
}

impl From<Result<(), Violation>> for Verdict {
    fn from(res: Result<(), Violation>) -> Self {
        match res {
            Ok(()) => Self::Accept,
            Err(violation) => Self::Reject(violation),
        }
    }
}

// === impl HostMismatch ===

impl fmt::Display for HostMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TLS hosts must match Ingress rules hosts when force-ssl-redirect is true")?;
        if !self.missing.is_empty() {
            write!(
                f,
                "; missing TLS entries for hosts: {}",
                self.missing.join(",")
            )?;
        }
        if !self.extra.is_empty() {
            write!(
                f,
                "; TLS has extra hosts not present in rules: {}",
                self.extra.join(",")
            )?;
        }
        Ok(())
    }
}
