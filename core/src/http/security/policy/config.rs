//! Serde representation of a policy, for loading it from configuration files.
//!
//! ```yaml
//! bypass: ["/images/**", "/css/**", "/js/**"]
//! rules:
//!   - patterns: ["/offertes/**"]
//!     access: has_any_role
//!     roles: [manager]
//!   - patterns: ["/", "/login"]
//!     access: permit_all
//!   - patterns: ["/**"]
//!     access: authenticated
//! ```

use serde::{Deserialize, Serialize};

use crate::http::error::ConfigError;
use crate::http::security::policy::{
    BypassSet, PolicyEvaluator, PolicyTable, PolicyTableBuilder, Requirement,
};
use crate::http::security::role::RoleSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessKind {
    PermitAll,
    Authenticated,
    HasAnyRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    pub patterns: Vec<String>,
    pub access: AccessKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    #[serde(default)]
    pub bypass: Vec<String>,
    pub rules: Vec<RuleConfig>,
}

impl RuleConfig {
    fn requirement(&self) -> Result<Requirement, ConfigError> {
        let first_pattern = || self.patterns.first().cloned().unwrap_or_default();
        match self.access {
            AccessKind::HasAnyRole => {
                let roles = RoleSet::parse(self.roles.as_slice())?;
                Ok(Requirement::RequireAnyOf(roles))
            }
            _ if !self.roles.is_empty() => Err(ConfigError::UnexpectedRoles {
                pattern: first_pattern(),
            }),
            AccessKind::PermitAll => Ok(Requirement::PermitAll),
            AccessKind::Authenticated => Ok(Requirement::AnyAuthenticated),
        }
    }
}

impl PolicyConfig {
    /// Validates the configuration into an evaluator.
    pub fn build(&self) -> Result<PolicyEvaluator, ConfigError> {
        let bypass = BypassSet::new(self.bypass.as_slice())?;

        let mut builder = PolicyTableBuilder::new();
        for rule in &self.rules {
            let requirement = rule.requirement()?;
            for pattern in &rule.patterns {
                builder = builder.access(pattern, requirement.clone());
            }
        }
        let table: PolicyTable = builder.build()?;

        Ok(PolicyEvaluator::new(bypass, table))
    }
}

impl TryFrom<&PolicyConfig> for PolicyEvaluator {
    type Error = ConfigError;

    fn try_from(config: &PolicyConfig) -> Result<Self, Self::Error> {
        config.build()
    }
}
