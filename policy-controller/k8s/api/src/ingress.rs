//! A lenient view of `networking.k8s.io/v1` Ingress objects.
//!
//! Only the fields that TLS-consistency admission inspects are modeled. Unlike
//! the `k8s-openapi` types, null entries in `spec.rules`, `spec.tls` and
//! `spec.tls[*].hosts` decode successfully and are skipped by consumers.

use crate::{networking, Annotations, ObjectMeta};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Ingress {
    #[serde(default)]
    pub metadata: Option<ObjectMeta>,
    #[serde(default)]
    pub spec: Option<IngressSpec>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct IngressSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<Option<IngressRule>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<Vec<Option<IngressTls>>>,
}

/// A routing rule. Paths and backends are not modeled.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct IngressRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

/// A TLS block. The secret name is not modeled.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct IngressTls {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosts: Option<Vec<Option<String>>>,
}

// === impl Ingress ===

impl Ingress {
    pub fn name(&self) -> &str {
        self.metadata
            .as_ref()
            .and_then(|m| m.name.as_deref())
            .unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        self.metadata
            .as_ref()
            .and_then(|m| m.namespace.as_deref())
            .unwrap_or_default()
    }

    pub fn annotations(&self) -> Option<&Annotations> {
        self.metadata.as_ref()?.annotations.as_ref()
    }
}

impl From<networking::Ingress> for Ingress {
    fn from(ingress: networking::Ingress) -> Self {
        Self {
            metadata: Some(ingress.metadata),
            spec: ingress.spec.map(Into::into),
        }
    }
}

// === impl IngressSpec ===

impl IngressSpec {
    pub fn rules(&self) -> &[Option<IngressRule>] {
        self.rules.as_deref().unwrap_or_default()
    }

    pub fn tls(&self) -> &[Option<IngressTls>] {
        self.tls.as_deref().unwrap_or_default()
    }
}

impl From<networking::IngressSpec> for IngressSpec {
    fn from(spec: networking::IngressSpec) -> Self {
        Self {
            rules: spec.rules.map(|rules| {
                rules
                    .into_iter()
                    .map(|rule| Some(IngressRule { host: rule.host }))
                    .collect()
            }),
            tls: spec.tls.map(|tls| {
                tls.into_iter()
                    .map(|tls| {
                        Some(IngressTls {
                            hosts: tls.hosts.map(|hosts| hosts.into_iter().map(Some).collect()),
                        })
                    })
                    .collect()
            }),
        }
    }
}

// === impl IngressTls ===

impl IngressTls {
    /// Iterates over the hosts in this block, skipping nulls.
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().flatten().flatten().map(String::as_str)
    }
}
