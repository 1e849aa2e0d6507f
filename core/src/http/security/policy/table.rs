//! Ordered policy table and its builder.
//!
//! # Spring Security Equivalent
//! `HttpSecurity.authorizeRequests(requests -> requests.mvcMatchers(...)...)`

use std::collections::HashSet;

use crate::http::error::ConfigError;
use crate::http::security::ant_matcher::CATCH_ALL;
use crate::http::security::policy::rule::{AccessRule, Requirement};
use crate::http::security::role::RoleSet;

/// Rules evaluated first-match-wins, ending in the `/**` catch-all.
///
/// A table can only be obtained through validation, so every instance has:
/// at least one rule, the catch-all last and requiring authentication, and
/// no rule shadowed by an earlier catch-all or an identical earlier pattern.
#[derive(Debug, Clone)]
pub struct PolicyTable {
    rules: Vec<AccessRule>,
}

impl PolicyTable {
    pub fn builder() -> PolicyTableBuilder {
        PolicyTableBuilder::new()
    }

    /// Validates an ordered list of rules.
    pub fn new(rules: Vec<AccessRule>) -> Result<Self, ConfigError> {
        let last = rules.last().ok_or(ConfigError::EmptyPolicy)?;

        let mut seen: HashSet<&str> = HashSet::new();
        let mut catch_all: Option<&str> = None;
        for rule in &rules {
            let shadowed_by = catch_all.or_else(|| seen.get(rule.pattern()).copied());
            if let Some(shadowed_by) = shadowed_by {
                return Err(ConfigError::UnreachableRule {
                    pattern: rule.pattern().to_string(),
                    shadowed_by: shadowed_by.to_string(),
                });
            }
            if rule.is_catch_all() {
                catch_all = Some(rule.pattern());
            }
            seen.insert(rule.pattern());
        }

        if !last.is_catch_all() {
            return Err(ConfigError::MissingCatchAll {
                pattern: last.pattern().to_string(),
            });
        }
        if !last.requirement().requires_authentication() {
            return Err(ConfigError::OpenCatchAll {
                pattern: last.pattern().to_string(),
            });
        }

        Ok(PolicyTable { rules })
    }

    /// Returns the first rule matching `path`.
    pub fn find_match(&self, path: &str) -> Option<&AccessRule> {
        self.rules.iter().find(|rule| rule.matches(path))
    }

    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Fluent builder; rules keep the order in which they are added.
///
/// # Example
/// ```
/// use beveiligd_security_core::http::security::PolicyTable;
///
/// let table = PolicyTable::builder()
///     .has_role("/offertes/**", "manager")
///     .has_any_role("/werknemers/**", &["magazijnier", "helpdeskmedewerker"])
///     .permit_all(&["/", "/login"])
///     .any_request_authenticated()
///     .build()
///     .unwrap();
///
/// assert_eq!(table.len(), 5);
/// ```
#[derive(Debug, Default)]
pub struct PolicyTableBuilder {
    rules: Vec<(String, Requirement)>,
    error: Option<ConfigError>,
}

impl PolicyTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule with an explicit requirement.
    pub fn access(mut self, pattern: &str, requirement: Requirement) -> Self {
        self.rules.push((pattern.to_string(), requirement));
        self
    }

    /// `permitAll()` for each pattern.
    pub fn permit_all(self, patterns: &[&str]) -> Self {
        patterns
            .iter()
            .fold(self, |b, p| b.access(p, Requirement::PermitAll))
    }

    /// `authenticated()` for each pattern.
    pub fn authenticated(self, patterns: &[&str]) -> Self {
        patterns
            .iter()
            .fold(self, |b, p| b.access(p, Requirement::AnyAuthenticated))
    }

    /// `hasAuthority(role)`.
    pub fn has_role(self, pattern: &str, role: &str) -> Self {
        self.has_any_role(pattern, &[role])
    }

    /// `hasAnyAuthority(roles...)`.
    pub fn has_any_role(mut self, pattern: &str, roles: &[&str]) -> Self {
        match RoleSet::parse(roles) {
            Ok(roles) => self.access(pattern, Requirement::RequireAnyOf(roles)),
            Err(e) => {
                self.error.get_or_insert(e);
                self
            }
        }
    }

    /// The closing `/**` rule requiring any authenticated principal.
    pub fn any_request_authenticated(self) -> Self {
        self.access(CATCH_ALL, Requirement::AnyAuthenticated)
    }

    /// Compiles every pattern and validates the table.
    ///
    /// Reports the first problem encountered.
    pub fn build(self) -> Result<PolicyTable, ConfigError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        let rules = self
            .rules
            .into_iter()
            .map(|(pattern, requirement)| AccessRule::new(&pattern, requirement))
            .collect::<Result<Vec<_>, _>>()?;
        PolicyTable::new(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_wins() {
        let table = PolicyTable::builder()
            .has_role("/offertes/**", "manager")
            .permit_all(&["/offertes/publiek"])
            .any_request_authenticated()
            .build()
            .unwrap();

        // the broader rule comes first, so it decides
        let rule = table.find_match("/offertes/publiek").unwrap();
        assert_eq!(rule.pattern(), "/offertes/**");
    }

    #[test]
    fn test_empty_table_rejected() {
        assert_eq!(
            PolicyTable::builder().build().unwrap_err(),
            ConfigError::EmptyPolicy
        );
    }

    #[test]
    fn test_missing_catch_all_rejected() {
        let err = PolicyTable::builder()
            .permit_all(&["/", "/login"])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingCatchAll {
                pattern: "/login".into()
            }
        );
    }

    #[test]
    fn test_catch_all_before_other_rules_rejected() {
        let err = PolicyTable::builder()
            .any_request_authenticated()
            .has_role("/offertes/**", "manager")
            .any_request_authenticated()
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnreachableRule {
                pattern: "/offertes/**".into(),
                shadowed_by: "/**".into(),
            }
        );
    }

    #[test]
    fn test_duplicate_pattern_rejected() {
        let err = PolicyTable::builder()
            .permit_all(&["/login"])
            .authenticated(&["/login"])
            .any_request_authenticated()
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnreachableRule { .. }));
    }

    #[test]
    fn test_open_catch_all_rejected() {
        let err = PolicyTable::builder()
            .permit_all(&["/**"])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::OpenCatchAll {
                pattern: "/**".into()
            }
        );
    }

    #[test]
    fn test_role_catch_all_accepted() {
        let table = PolicyTable::builder()
            .has_role("/**", "manager")
            .build()
            .unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_blank_role_reported() {
        let err = PolicyTable::builder()
            .has_any_role("/werknemers/**", &["magazijnier", " "])
            .any_request_authenticated()
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRole { .. }));
    }

    #[test]
    fn test_malformed_pattern_reported() {
        let err = PolicyTable::builder()
            .permit_all(&["login"])
            .any_request_authenticated()
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }
}
