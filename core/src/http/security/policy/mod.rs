//! Request authorization policy.
//!
//! Evaluation order for a request path:
//!
//! 1. a path matching the [`BypassSet`] is [`Decision::Bypass`]
//! 2. otherwise the first rule in the [`PolicyTable`] matching the path decides
//! 3. no matching rule is [`Decision::RequireLogin`] (fail closed)
//!
//! Both sets are immutable once built, so a single [`PolicyEvaluator`] can be
//! shared by every worker behind an `Arc` without locking.
//!
//! # Example
//! ```
//! use beveiligd_security_core::http::security::{
//!     BypassSet, Decision, PolicyEvaluator, PolicyTable, RoleSet,
//! };
//!
//! let policy = PolicyEvaluator::new(
//!     BypassSet::new(&["/css/**"]).unwrap(),
//!     PolicyTable::builder()
//!         .has_role("/offertes/**", "manager")
//!         .permit_all(&["/"])
//!         .any_request_authenticated()
//!         .build()
//!         .unwrap(),
//! );
//!
//! let manager = RoleSet::parse(&["manager"]).unwrap();
//! assert_eq!(policy.evaluate("/css/site.css", None), Decision::Bypass);
//! assert_eq!(policy.evaluate("/offertes/1", Some(&manager)), Decision::Allow);
//! assert_eq!(policy.evaluate("/elders", None), Decision::RequireLogin);
//! ```

use derive_more::Display;
use log::debug;

use crate::http::security::role::RoleSet;

pub use bypass::BypassSet;
pub use config::{AccessKind, PolicyConfig, RuleConfig};
pub use rule::{AccessRule, Requirement};
pub use table::{PolicyTable, PolicyTableBuilder};

mod bypass;
mod config;
mod rule;
mod table;


/// Outcome of evaluating a request against the policy.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Exempt from security processing.
    #[display("bypass")]
    Bypass,
    #[display("allow")]
    Allow,
    /// Authenticated, but lacking the required role.
    #[display("deny")]
    Deny,
    /// Anonymous where a principal is needed.
    #[display("require-login")]
    RequireLogin,
}

/// Bypass set plus policy table, evaluated together.
#[derive(Debug, Clone)]
pub struct PolicyEvaluator {
    bypass: BypassSet,
    table: PolicyTable,
}

impl PolicyEvaluator {
    pub fn new(bypass: BypassSet, table: PolicyTable) -> Self {
        PolicyEvaluator { bypass, table }
    }

    /// True when the path skips security processing.
    pub fn is_bypassed(&self, path: &str) -> bool {
        self.bypass.matches(path)
    }

    /// Decides a request path for a principal with `roles`.
    ///
    /// `roles` is `None` for anonymous requests and `Some` (possibly empty)
    /// for authenticated ones.
    pub fn evaluate(&self, path: &str, roles: Option<&RoleSet>) -> Decision {
        if let Some(matcher) = self.bypass.find_match(path) {
            debug!("{} bypasses security via '{}'", path, matcher);
            return Decision::Bypass;
        }

        match self.table.find_match(path) {
            Some(rule) => {
                let decision = rule.requirement().decide(roles);
                debug!(
                    "{} matched '{}' ({}): {}",
                    path,
                    rule.pattern(),
                    if roles.is_some() { "authenticated" } else { "anonymous" },
                    decision
                );
                decision
            }
            None => {
                debug!("{} matched no rule: {}", path, Decision::RequireLogin);
                Decision::RequireLogin
            }
        }
    }

    pub fn bypass(&self) -> &BypassSet {
        &self.bypass
    }

    pub fn table(&self) -> &PolicyTable {
        &self.table
    }
}
