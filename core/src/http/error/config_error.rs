use derive_more::{Display, Error};

/// Configuration problems detected while loading the security setup.
///
/// These are fatal: an application should refuse to start rather than run
/// with a policy it could not fully understand.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[display("invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        pattern: String,
        reason: &'static str,
    },
    #[display("invalid role '{role}': role labels must be non-empty")]
    InvalidRole { role: String },
    #[display("policy table has no rules")]
    EmptyPolicy,
    #[display("policy table must end with the catch-all rule \"/**\", found '{pattern}'")]
    MissingCatchAll { pattern: String },
    #[display("rule '{pattern}' is unreachable, '{shadowed_by}' precedes it")]
    UnreachableRule {
        pattern: String,
        shadowed_by: String,
    },
    #[display("catch-all rule '{pattern}' must require authentication")]
    OpenCatchAll { pattern: String },
    #[display("rule '{pattern}' requires a role from an empty role set")]
    EmptyRoleRequirement { pattern: String },
    #[display("rule '{pattern}' lists roles but its access kind does not use them")]
    UnexpectedRoles { pattern: String },
}
