//! Application settings.
//!
//! Loaded from built-in defaults, then `beveiligd.yaml` in the working
//! directory (if present), then `BEVEILIGD_*` environment variables:
//!
//! ```yaml
//! bind: 0.0.0.0:8080
//! database_url: sqlite://beveiligd.db?mode=rwc
//! session_key: <at least 64 bytes>
//! lockout:
//!   max_attempts: 5
//!   lockout_minutes: 15
//! ```
//!
//! A `policy` section replaces the built-in staff policy, see
//! [`PolicyConfig`].

use std::time::Duration;

use beveiligd_security_core::http::security::{LockConfig, PolicyConfig};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

pub const SETTINGS_FILE: &str = "beveiligd.yaml";
pub const ENV_PREFIX: &str = "BEVEILIGD_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub bind: String,
    pub database_url: String,
    /// Cookie signing key. A random key is generated when absent, which logs
    /// everyone out on restart.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_key: Option<String>,
    /// Only send the session cookie over https.
    pub secure_cookies: bool,
    pub lockout: LockoutSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicyConfig>,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            bind: "127.0.0.1:8080".to_string(),
            database_url: "sqlite://beveiligd.db?mode=rwc".to_string(),
            session_key: None,
            secure_cookies: false,
            lockout: LockoutSettings::default(),
            policy: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockoutSettings {
    pub max_attempts: u32,
    pub lockout_minutes: u64,
}

impl Default for LockoutSettings {
    fn default() -> Self {
        LockoutSettings {
            max_attempts: 5,
            lockout_minutes: 15,
        }
    }
}

impl From<LockoutSettings> for LockConfig {
    fn from(settings: LockoutSettings) -> Self {
        LockConfig::new()
            .max_attempts(settings.max_attempts)
            .lockout_duration(Duration::from_secs(settings.lockout_minutes.saturating_mul(60)))
    }
}

impl AppSettings {
    /// Defaults, settings file, environment, in increasing precedence.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(AppSettings::default()))
            .merge(Yaml::file(SETTINGS_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load() -> Result<Self, figment::Error> {
        Self::from_figment(Self::figment())
    }

    pub fn from_figment(figment: Figment) -> Result<Self, figment::Error> {
        figment.extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beveiligd_security_core::http::security::AccessKind;

    fn from_yaml(yaml: &str) -> Result<AppSettings, figment::Error> {
        AppSettings::from_figment(
            Figment::from(Serialized::defaults(AppSettings::default())).merge(Yaml::string(yaml)),
        )
    }

    #[test]
    fn test_defaults() {
        let settings =
            AppSettings::from_figment(Figment::from(Serialized::defaults(AppSettings::default())))
                .unwrap();
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.bind, "127.0.0.1:8080");
        assert!(settings.policy.is_none());
    }

    #[test]
    fn test_yaml_overrides() {
        let settings = from_yaml(
            r#"
bind: 0.0.0.0:9000
database_url: sqlite::memory:
lockout:
  max_attempts: 3
"#,
        )
        .unwrap();

        assert_eq!(settings.bind, "0.0.0.0:9000");
        assert_eq!(settings.database_url, "sqlite::memory:");
        assert_eq!(settings.lockout.max_attempts, 3);
        assert_eq!(settings.lockout.lockout_minutes, 15);
    }

    #[test]
    fn test_policy_section() {
        let settings = from_yaml(
            r#"
policy:
  bypass: ["/css/**"]
  rules:
    - patterns: ["/offertes/**"]
      access: has_any_role
      roles: [manager]
    - patterns: ["/**"]
      access: authenticated
"#,
        )
        .unwrap();

        let policy = settings.policy.unwrap();
        assert_eq!(policy.bypass, vec!["/css/**".to_string()]);
        assert_eq!(policy.rules.len(), 2);
        assert_eq!(policy.rules[0].access, AccessKind::HasAnyRole);
    }

    #[test]
    fn test_unknown_access_kind_rejected() {
        let result = from_yaml(
            r#"
policy:
  rules:
    - patterns: ["/**"]
      access: sometimes
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_lock_config_from_settings() {
        let config = LockConfig::from(LockoutSettings {
            max_attempts: 2,
            lockout_minutes: 1,
        });
        assert_eq!(config.max_attempts, 2);
    }

    #[test]
    fn test_huge_lockout_minutes_saturate() {
        let config = LockConfig::from(LockoutSettings {
            max_attempts: 2,
            lockout_minutes: u64::MAX,
        });
        assert_eq!(config.lockout_duration, Duration::from_secs(u64::MAX));
    }
}
