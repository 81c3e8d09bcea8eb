use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::policy::PolicyColumns;
use crate::ReconcileError;

/// Optional settings file. Every field has a default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub policy: PolicySettings,
    pub apply: ApplySettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicySettings {
    pub key_column: String,
    pub relays_column: String,
    pub exclusions_column: String,
    pub default_key: Option<String>,
}

impl Default for PolicySettings {
    fn default() -> Self {
        let columns = PolicyColumns::default();
        PolicySettings {
            key_column: columns.key,
            relays_column: columns.relays,
            exclusions_column: columns.exclusions,
            default_key: None,
        }
    }
}

impl PolicySettings {
    pub fn columns(&self) -> PolicyColumns {
        PolicyColumns {
            key: self.key_column.clone(),
            relays: self.relays_column.clone(),
            exclusions: self.exclusions_column.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApplySettings {
    /// Save the running configuration at the end of the session.
    pub commit: bool,
}

impl Default for ApplySettings {
    fn default() -> Self {
        ApplySettings { commit: true }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Settings, ReconcileError> {
        let raw = fs::read_to_string(path).map_err(|source| ReconcileError::Settings {
            path: path.display().to_string(),
            detail: source.to_string(),
        })?;
        Settings::parse(&raw, &path.display().to_string())
    }

    pub fn parse(raw: &str, origin: &str) -> Result<Settings, ReconcileError> {
        toml::from_str(raw).map_err(|source| ReconcileError::Settings {
            path: origin.to_string(),
            detail: source.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_settings_use_defaults() {
        let settings = Settings::parse("", "inline").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.policy.columns(), PolicyColumns::default());
        assert!(settings.apply.commit);
    }

    #[test]
    fn test_partial_settings() {
        let settings = Settings::parse(
            r#"
[policy]
relays_column = "Helpers"
default_key = "Site-001"

[apply]
commit = false
"#,
            "inline",
        )
        .unwrap();
        assert_eq!(settings.policy.key_column, "Key");
        assert_eq!(settings.policy.relays_column, "Helpers");
        assert_eq!(settings.policy.default_key.as_deref(), Some("Site-001"));
        assert!(!settings.apply.commit);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = Settings::parse("[policy]\nkey_colum = \"K\"\n", "relay.toml").unwrap_err();
        assert!(matches!(err, ReconcileError::Settings { ref path, .. } if path == "relay.toml"));
    }
}
