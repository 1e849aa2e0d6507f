//! Paths that skip security processing entirely.
//!
//! # Spring Security Equivalent
//! `WebSecurityCustomizer`: `web.ignoring().mvcMatchers("/images/**", ...)`

use crate::http::error::ConfigError;
use crate::http::security::ant_matcher::AntMatcher;

/// Patterns exempt from authentication and policy evaluation.
#[derive(Debug, Clone, Default)]
pub struct BypassSet {
    matchers: Vec<AntMatcher>,
}

impl BypassSet {
    /// Compiles every pattern; one malformed pattern fails the whole set.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let matchers = patterns
            .iter()
            .map(|p| AntMatcher::parse(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BypassSet { matchers })
    }

    /// A set that bypasses nothing.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn matches(&self, path: &str) -> bool {
        self.find_match(path).is_some()
    }

    /// Returns the first pattern matching `path`.
    pub fn find_match(&self, path: &str) -> Option<&AntMatcher> {
        self.matchers.iter().find(|m| m.matches(path))
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.matchers.iter().map(AntMatcher::pattern)
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_directories() {
        let bypass = BypassSet::new(&["/images/**", "/css/**", "/js/**"]).unwrap();
        assert!(bypass.matches("/images/logo.png"));
        assert!(bypass.matches("/css/site.css"));
        assert!(bypass.matches("/js/app/main.js"));
        assert!(bypass.matches("/css"));
        assert!(!bypass.matches("/offertes/1"));
        assert!(!bypass.matches("/cssx/site.css"));
        assert_eq!(
            bypass.find_match("/js/a.js").map(|m| m.pattern()),
            Some("/js/**")
        );
    }

    #[test]
    fn test_none_bypasses_nothing() {
        let bypass = BypassSet::none();
        assert!(bypass.is_empty());
        assert!(!bypass.matches("/images/logo.png"));
    }

    #[test]
    fn test_malformed_pattern_fails() {
        assert!(BypassSet::new(&["/images/**", "css/**"]).is_err());
    }
}
