//! Resolved run configuration for the remote training service.
//!
//! Values arrive as already-resolved optional strings (CLI flags with
//! env-var fallback); every missing key is reported in one error before
//! any network call is attempted.

use crate::error::TagliftError;

/// Env var names doubling as the keys named in configuration errors.
pub const ENDPOINT_KEY: &str = "TAGLIFT_ENDPOINT";
pub const CREDENTIAL_KEY: &str = "TAGLIFT_KEY";
pub const PROJECT_KEY: &str = "TAGLIFT_PROJECT";

/// Connection settings for the training service.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub endpoint: String,
    pub credential: String,
    pub project_id: String,
}

impl ServiceConfig {
    /// Validates the resolved values, collecting all missing keys into a
    /// single [`TagliftError::MissingConfig`].
    pub fn resolve(
        endpoint: Option<String>,
        credential: Option<String>,
        project_id: Option<String>,
    ) -> Result<Self, TagliftError> {
        let mut missing = Vec::new();
        let endpoint = require(endpoint, ENDPOINT_KEY, &mut missing);
        let credential = require(credential, CREDENTIAL_KEY, &mut missing);
        let project_id = require(project_id, PROJECT_KEY, &mut missing);

        if !missing.is_empty() {
            return Err(TagliftError::MissingConfig { keys: missing });
        }

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            credential,
            project_id,
        })
    }
}

fn require(value: Option<String>, key: &str, missing: &mut Vec<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => {
            missing.push(key.to_string());
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_complete_config() {
        let cfg = ServiceConfig::resolve(
            Some("https://example.test/".to_string()),
            Some("secret".to_string()),
            Some("proj-1".to_string()),
        )
        .unwrap();

        assert_eq!(cfg.endpoint, "https://example.test");
        assert_eq!(cfg.credential, "secret");
        assert_eq!(cfg.project_id, "proj-1");
    }

    #[test]
    fn reports_all_missing_keys_at_once() {
        let err = ServiceConfig::resolve(None, Some("  ".to_string()), None).unwrap_err();
        match err {
            TagliftError::MissingConfig { keys } => {
                assert_eq!(keys, vec![ENDPOINT_KEY, CREDENTIAL_KEY, PROJECT_KEY]);
            }
            other => panic!("expected MissingConfig, got {other:?}"),
        }
    }
}
