use serde::{Deserialize, Serialize};

/// Policy settings.
///
/// Unknown keys are ignored and absent keys take their defaults, so an empty
/// settings document disables enforcement.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// When set, Ingresses that enable `force-ssl-redirect` must declare TLS
    /// hosts that match their rule hosts exactly.
    #[serde(rename = "validate_force_ssl_redirect")]
    pub enforce_consistency: bool,
}

impl PolicyConfig {
    pub fn new(enforce_consistency: bool) -> Self {
        Self {
            enforce_consistency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_settings_disable_enforcement() {
        let config = serde_json::from_str::<PolicyConfig>("{}").unwrap();
        assert_eq!(config, PolicyConfig::default());
        assert!(!config.enforce_consistency);
    }

    #[test]
    fn reads_settings_key() {
        let config = serde_json::from_value::<PolicyConfig>(serde_json::json!({
            "validate_force_ssl_redirect": true,
            "unrelated": "ignored",
        }))
        .unwrap();
        assert_eq!(config, PolicyConfig::new(true));
    }

    #[test]
    fn rejects_non_boolean_flag() {
        serde_json::from_value::<PolicyConfig>(serde_json::json!({
            "validate_force_ssl_redirect": "yes",
        }))
        .expect_err("a string flag must not decode");
    }
}
