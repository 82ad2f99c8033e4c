//! Provider credential lookup.
//!
//! The key is resolved once, before any fetch, and handed to the provider
//! explicitly. Nothing downstream reads the environment.

use super::defaults::CREDENTIAL_ENV_VARS;
use super::file::{ConfigFileError, ProviderSettings};
use crate::provider::Credential;

/// Resolves the credential from the process environment, falling back to
/// `[provider] api_key`.
pub fn resolve_credential(settings: &ProviderSettings) -> Result<Credential, ConfigFileError> {
    resolve_credential_with(settings, |name| std::env::var(name).ok())
}

/// Resolves the credential using `lookup` in place of the environment.
pub fn resolve_credential_with<F>(
    settings: &ProviderSettings,
    lookup: F,
) -> Result<Credential, ConfigFileError>
where
    F: Fn(&str) -> Option<String>,
{
    CREDENTIAL_ENV_VARS
        .iter()
        .find_map(|name| lookup(name).and_then(Credential::new))
        .or_else(|| settings.api_key.clone().and_then(Credential::new))
        .ok_or_else(|| ConfigFileError::MissingCredential {
            checked: CREDENTIAL_ENV_VARS.join(", "),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_first_variable_wins() {
        let settings = ProviderSettings::default();
        let credential = resolve_credential_with(
            &settings,
            env(&[("GMAPS_KEY", "primary"), ("GOOGLE_MAPS_API_KEY", "secondary")]),
        )
        .unwrap();
        assert_eq!(credential.expose(), "primary");
    }

    #[test]
    fn test_second_variable_used_when_first_blank() {
        let settings = ProviderSettings::default();
        let credential = resolve_credential_with(
            &settings,
            env(&[("GMAPS_KEY", ""), ("GOOGLE_MAPS_API_KEY", "secondary")]),
        )
        .unwrap();
        assert_eq!(credential.expose(), "secondary");
    }

    #[test]
    fn test_config_file_fallback() {
        let settings = ProviderSettings {
            api_key: Some("from-file".into()),
            ..Default::default()
        };
        let credential = resolve_credential_with(&settings, env(&[])).unwrap();
        assert_eq!(credential.expose(), "from-file");
    }

    #[test]
    fn test_missing_everywhere() {
        let err = resolve_credential_with(&ProviderSettings::default(), env(&[])).unwrap_err();
        assert!(matches!(err, ConfigFileError::MissingCredential { .. }));
        assert!(err.to_string().contains("GMAPS_KEY"));
    }
}
