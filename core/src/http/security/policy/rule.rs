//! Access rules: a URL pattern paired with what it takes to pass it.

use crate::http::error::ConfigError;
use crate::http::security::ant_matcher::AntMatcher;
use crate::http::security::policy::Decision;
use crate::http::security::role::RoleSet;

/// What a request must satisfy once its path matched a rule.
///
/// # Spring Security Equivalent
/// `authenticated()`, `hasAnyAuthority(...)`, `permitAll()`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// Any logged-in principal.
    AnyAuthenticated,
    /// A logged-in principal holding at least one of the roles.
    RequireAnyOf(RoleSet),
    /// Everyone, anonymous included.
    PermitAll,
}

impl Requirement {
    /// Decides a request for a principal with `roles`, `None` meaning anonymous.
    ///
    /// Anonymous requests are never refused outright: when a rule needs a
    /// principal they are sent to log in first.
    pub fn decide(&self, roles: Option<&RoleSet>) -> Decision {
        match (self, roles) {
            (Requirement::PermitAll, _) => Decision::Allow,
            (_, None) => Decision::RequireLogin,
            (Requirement::AnyAuthenticated, Some(_)) => Decision::Allow,
            (Requirement::RequireAnyOf(required), Some(held)) => {
                if held.intersects(required) {
                    Decision::Allow
                } else {
                    Decision::Deny
                }
            }
        }
    }

    pub fn requires_authentication(&self) -> bool {
        !matches!(self, Requirement::PermitAll)
    }
}

/// An ordered-table entry: pattern plus requirement.
#[derive(Debug, Clone)]
pub struct AccessRule {
    matcher: AntMatcher,
    requirement: Requirement,
}

impl AccessRule {
    /// Compiles the pattern and checks the requirement can ever be met.
    pub fn new(pattern: &str, requirement: Requirement) -> Result<Self, ConfigError> {
        let matcher = AntMatcher::parse(pattern)?;
        if let Requirement::RequireAnyOf(roles) = &requirement {
            if roles.is_empty() {
                return Err(ConfigError::EmptyRoleRequirement {
                    pattern: pattern.to_string(),
                });
            }
        }
        Ok(AccessRule {
            matcher,
            requirement,
        })
    }

    pub fn pattern(&self) -> &str {
        self.matcher.pattern()
    }

    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    pub fn matches(&self, path: &str) -> bool {
        self.matcher.matches(path)
    }

    pub fn is_catch_all(&self) -> bool {
        self.matcher.is_catch_all()
    }
}
