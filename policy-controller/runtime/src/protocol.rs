//! The Kubewarden policy envelope.
//!
//! Policy hosts that speak this protocol pass the policy settings alongside
//! each admission request and expect an `accepted` flag in return. Decoding
//! failures are reported as rejections with a `400` code; policy violations
//! carry no code.

use crate::{
    core::{evaluate_ingress, PolicyConfig, Verdict},
    k8s::Ingress,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

pub const BAD_REQUEST: u16 = 400;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ValidationRequest {
    pub request: KubernetesAdmissionRequest,
    #[serde(default)]
    pub settings: serde_json::Value,
}

/// The subset of the Kubernetes admission request that the policy reads.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesAdmissionRequest {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub operation: String,
    #[serde(default)]
    pub object: serde_json::Value,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ValidationResponse {
    pub accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SettingsValidationResponse {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Decodes a `ValidationRequest` and evaluates the Ingress it carries.
pub fn validate(payload: &[u8]) -> ValidationResponse {
    let ValidationRequest { request, settings } = match serde_json::from_slice(payload) {
        Ok(req) => req,
        Err(error) => {
            warn!(%error, "Failed to parse validation request");
            return ValidationResponse::bad_request(error);
        }
    };

    let config = match parse_settings(settings) {
        Ok(config) => config,
        Err(error) => {
            warn!(%error, uid = %request.uid, "Failed to parse settings");
            return ValidationResponse::bad_request(error);
        }
    };

    let ingress = match parse_object(request.object) {
        Ok(ingress) => ingress,
        Err(error) => {
            info!(%error, uid = %request.uid, "Failed to parse Ingress");
            return ValidationResponse::bad_request(format_args!(
                "Cannot decode Ingress object: {error}"
            ));
        }
    };

    evaluate_ingress(config, &ingress).into()
}

/// Checks that a settings document can configure the policy.
pub fn validate_settings(payload: &[u8]) -> SettingsValidationResponse {
    info!("Validating settings");
    let res = serde_json::from_slice::<serde_json::Value>(payload).and_then(parse_settings);
    match res {
        Ok(config) => {
            info!(?config, "Settings are valid");
            SettingsValidationResponse {
                valid: true,
                message: None,
            }
        }
        Err(error) => {
            warn!(%error, "Rejecting settings");
            SettingsValidationResponse {
                valid: false,
                message: Some(format!("Provided settings are not valid: {error}")),
            }
        }
    }
}

/// A null object, as sent with DELETE requests, decodes as an empty Ingress.
fn parse_object(object: serde_json::Value) -> serde_json::Result<Ingress> {
    if object.is_null() {
        return Ok(Ingress::default());
    }
    serde_json::from_value(object)
}

/// Absent settings configure the default policy.
fn parse_settings(settings: serde_json::Value) -> serde_json::Result<PolicyConfig> {
    if settings.is_null() {
        return Ok(PolicyConfig::default());
    }
    serde_json::from_value(settings)
}

// === impl ValidationResponse ===

impl ValidationResponse {
    pub fn accept() -> Self {
        Self {
            accepted: true,
            message: None,
            code: None,
        }
    }

    pub fn reject(message: impl fmt::Display) -> Self {
        Self {
            accepted: false,
            message: Some(message.to_string()),
            code: None,
        }
    }

    pub fn bad_request(message: impl fmt::Display) -> Self {
        Self {
            code: Some(BAD_REQUEST),
            ..Self::reject(message)
        }
    }
}

impl From<Verdict> for ValidationResponse {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Accept => Self::accept(),
            Verdict::Reject(violation) => Self::reject(violation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mk_payload(settings: serde_json::Value, object: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "request": {
                "uid": "1299d386-525b-4032-98ae-1949f69f9cfc",
                "kind": { "group": "networking.k8s.io", "version": "v1", "kind": "Ingress" },
                "operation": "CREATE",
                "object": object,
            },
            "settings": settings,
        }))
        .unwrap()
    }

    fn mk_ingress(tls: serde_json::Value) -> serde_json::Value {
        json!({
            "apiVersion": "networking.k8s.io/v1",
            "kind": "Ingress",
            "metadata": {
                "name": "test-ingress",
                "namespace": "default",
                "annotations": { "nginx.ingress.kubernetes.io/force-ssl-redirect": "true" },
            },
            "spec": {
                "rules": [{ "host": "example.com" }],
                "tls": tls,
            },
        })
    }

    #[test]
    fn empty_settings_accept() {
        let rsp = validate(&mk_payload(json!({}), mk_ingress(json!([]))));
        assert_eq!(rsp, ValidationResponse::accept());

        let rsp = validate(&mk_payload(json!(null), mk_ingress(json!([]))));
        assert_eq!(rsp, ValidationResponse::accept());
    }

    #[test]
    fn rejects_missing_tls() {
        let rsp = validate(&mk_payload(
            json!({ "validate_force_ssl_redirect": true }),
            mk_ingress(json!([])),
        ));
        assert!(!rsp.accepted);
        assert_eq!(rsp.code, None);
        assert_eq!(
            rsp.message.as_deref(),
            Some("force-ssl-redirect is true but no TLS configuration (spec.tls) is defined")
        );
    }

    #[test]
    fn rejects_mismatched_hosts() {
        let rsp = validate(&mk_payload(
            json!({ "validate_force_ssl_redirect": true }),
            mk_ingress(json!([{ "hosts": ["other.com"] }])),
        ));
        assert!(!rsp.accepted);
        let message = rsp.message.expect("rejection must have a message");
        assert!(message.contains("missing TLS entries for hosts: example.com"));
        assert!(message.contains("TLS has extra hosts not present in rules: other.com"));
    }

    #[test]
    fn accepts_matching_hosts() {
        let rsp = validate(&mk_payload(
            json!({ "validate_force_ssl_redirect": true }),
            mk_ingress(json!([{ "hosts": ["example.com"], "secretName": "example-tls" }])),
        ));
        assert_eq!(rsp, ValidationResponse::accept());
    }

    #[test]
    fn malformed_request() {
        let rsp = validate(b"{ not json");
        assert!(!rsp.accepted);
        assert_eq!(rsp.code, Some(BAD_REQUEST));
    }

    #[test]
    fn malformed_settings() {
        let rsp = validate(&mk_payload(
            json!({ "validate_force_ssl_redirect": "sure" }),
            mk_ingress(json!([])),
        ));
        assert!(!rsp.accepted);
        assert_eq!(rsp.code, Some(BAD_REQUEST));
    }

    #[test]
    fn malformed_object() {
        let rsp = validate(&mk_payload(
            json!({ "validate_force_ssl_redirect": true }),
            json!({ "spec": { "rules": "example.com" } }),
        ));
        assert!(!rsp.accepted);
        assert_eq!(rsp.code, Some(BAD_REQUEST));
        assert!(rsp
            .message
            .unwrap()
            .starts_with("Cannot decode Ingress object: "));
    }

    #[test]
    fn accepts_null_object() {
        let rsp = validate(&mk_payload(
            json!({ "validate_force_ssl_redirect": true }),
            json!(null),
        ));
        assert_eq!(rsp, ValidationResponse::accept());

        let payload = json!({
            "request": { "uid": "1299d386-525b-4032-98ae-1949f69f9cfc", "operation": "DELETE" },
            "settings": { "validate_force_ssl_redirect": true },
        });
        let rsp = validate(&serde_json::to_vec(&payload).unwrap());
        assert_eq!(rsp, ValidationResponse::accept());
    }

    #[test]
    fn settings_validation() {
        for settings in ["{}", "null", r#"{"validate_force_ssl_redirect": false}"#] {
            assert_eq!(
                validate_settings(settings.as_bytes()),
                SettingsValidationResponse {
                    valid: true,
                    message: None,
                },
                "{settings}"
            );
        }

        for settings in [r#"{"validate_force_ssl_redirect": 1}"#, "{"] {
            let rsp = validate_settings(settings.as_bytes());
            assert!(!rsp.valid, "{settings}");
            assert!(rsp
                .message
                .unwrap()
                .starts_with("Provided settings are not valid: "));
        }
    }
}
