//! Roles and role sets.
//!
//! Access checks are set operations (membership, intersection) over
//! [`RoleSet`] rather than string comparisons scattered through handlers.

use std::borrow::Borrow;
use std::collections::btree_set::{self, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::http::error::ConfigError;

/// A role label such as `manager`.
///
/// Labels are trimmed and must be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Role(String);

impl Role {
    pub fn new(label: &str) -> Result<Self, ConfigError> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::InvalidRole {
                role: label.to_string(),
            });
        }
        Ok(Role(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Role {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::new(s)
    }
}

impl TryFrom<String> for Role {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Role::new(&value)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.0
    }
}

impl Borrow<str> for Role {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An unordered set of roles.
///
/// # Example
/// ```
/// use beveiligd_security_core::http::security::RoleSet;
///
/// let held = RoleSet::parse(&["magazijnier"]).unwrap();
/// let required = RoleSet::parse(&["magazijnier", "helpdeskmedewerker"]).unwrap();
///
/// assert!(held.intersects(&required));
/// assert!(held.contains("magazijnier"));
/// assert!(!held.contains("manager"));
/// ```
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    pub fn new() -> Self {
        RoleSet(BTreeSet::new())
    }

    /// Builds a set from labels, failing on the first blank one.
    pub fn parse<S: AsRef<str>>(labels: &[S]) -> Result<Self, ConfigError> {
        labels.iter().map(|l| Role::new(l.as_ref())).collect()
    }

    /// Adds a role; returns false when it was already present.
    pub fn insert(&mut self, role: Role) -> bool {
        self.0.insert(role)
    }

    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(role)
    }

    /// True when the two sets share at least one role.
    pub fn intersects(&self, other: &RoleSet) -> bool {
        !self.0.is_disjoint(&other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, Role> {
        self.0.iter()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        RoleSet(iter.into_iter().collect())
    }
}

impl Extend<Role> for RoleSet {
    fn extend<I: IntoIterator<Item = Role>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}

impl IntoIterator for RoleSet {
    type Item = Role;
    type IntoIter = btree_set::IntoIter<Role>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a RoleSet {
    type Item = &'a Role;
    type IntoIter = btree_set::Iter<'a, Role>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Debug for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.iter().map(Role::as_str)).finish()
    }
}
