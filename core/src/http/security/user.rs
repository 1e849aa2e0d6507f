//! Principal model for authentication and authorization.
//!
//! # Spring Equivalent
//! `UserDetails` interface

use std::fmt;

use crate::http::security::role::{Role, RoleSet};

/// An identity with an encoded password, an enabled flag, and a role set.
///
/// # Example
/// ```
/// use beveiligd_security_core::http::security::{Principal, RoleSet};
///
/// let joe = Principal::new("joe", "{noop}theboss")
///     .roles(RoleSet::parse(&["manager"]).unwrap());
///
/// assert!(joe.has_role("manager"));
/// assert!(joe.is_enabled());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Principal {
    username: String,
    password: String,
    enabled: bool,
    roles: RoleSet,
}

impl Principal {
    /// Creates an enabled principal without roles.
    ///
    /// The password is stored as given; it is expected to be encoded
    /// (for example `{argon2}$argon2id$...` or `{noop}secret`).
    pub fn new(username: impl Into<String>, encoded_password: impl Into<String>) -> Self {
        Principal {
            username: username.into(),
            password: encoded_password.into(),
            enabled: true,
            roles: RoleSet::new(),
        }
    }

    pub fn get_username(&self) -> &str {
        &self.username
    }

    pub fn get_password(&self) -> &str {
        &self.password
    }

    pub fn get_roles(&self) -> &RoleSet {
        &self.roles
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Adds all roles of `roles` (builder pattern).
    pub fn roles(mut self, roles: RoleSet) -> Self {
        self.roles.extend(roles);
        self
    }

    /// Adds a single role (builder pattern).
    pub fn role(mut self, role: Role) -> Self {
        self.roles.insert(role);
        self
    }

    /// Sets the enabled flag (builder pattern).
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Returns a copy without the password, suitable for request extensions.
    pub fn erase_credentials(&self) -> Self {
        Principal {
            password: String::new(),
            ..self.clone()
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Checks if the principal holds ANY of the roles (OR logic).
    pub fn has_any_role(&self, roles: &RoleSet) -> bool {
        self.roles.intersects(roles)
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("username", &self.username)
            .field("password", &"[PROTECTED]")
            .field("enabled", &self.enabled)
            .field("roles", &self.roles)
            .finish()
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Principal {{ username: {}, roles: {:?} }}",
            self.username, self.roles
        )
    }
}
