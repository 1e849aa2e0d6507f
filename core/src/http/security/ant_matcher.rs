//! Ant-style path matching for URL rules.
//!
//! # Pattern Syntax
//!
//! - `?` matches exactly one character
//! - `*` matches zero or more characters within a path segment
//! - `**` matches zero or more path segments
//! - anything else matches literally
//!
//! Patterns are validated when they are compiled, so a malformed pattern is a
//! configuration error rather than a rule that silently never matches.
//!
//! # Examples
//!
//! ```rust
//! use beveiligd_security_core::http::security::ant_matcher::AntMatcher;
//!
//! let matcher = AntMatcher::parse("/offertes/**").unwrap();
//! assert!(matcher.matches("/offertes"));
//! assert!(matcher.matches("/offertes/12/regels"));
//! assert!(!matcher.matches("/werknemers/5"));
//!
//! let matcher = AntMatcher::parse("/login").unwrap();
//! assert!(matcher.matches("/login"));
//! assert!(!matcher.matches("/login/extra"));
//! ```
//!
//! # Spring Equivalent
//!
//! `org.springframework.util.AntPathMatcher`

use std::fmt;

use crate::http::error::ConfigError;

/// The pattern that matches every path.
pub const CATCH_ALL: &str = "/**";

/// Compiled ant-style path pattern.
#[derive(Clone, PartialEq, Eq)]
pub struct AntMatcher {
    pattern: String,
    segments: Vec<PatternSegment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternSegment {
    /// Literal text (no wildcards)
    Literal(String),
    /// `*`
    SingleWildcard,
    /// `**`
    DoubleWildcard,
    /// Segment mixing literal text with `*` or `?`
    Pattern(Vec<char>),
}

impl AntMatcher {
    /// Compiles a pattern, rejecting malformed input.
    ///
    /// A pattern is malformed when it is empty, does not start with `/`,
    /// contains whitespace, contains an empty interior segment (`//`), or
    /// mixes `**` with other characters inside one segment.
    pub fn parse(pattern: &str) -> Result<Self, ConfigError> {
        let invalid = |reason| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        if pattern.is_empty() {
            return Err(invalid("pattern is empty"));
        }
        if !pattern.starts_with('/') {
            return Err(invalid("pattern must start with '/'"));
        }
        if pattern.chars().any(char::is_whitespace) {
            return Err(invalid("pattern must not contain whitespace"));
        }

        // A single trailing slash is tolerated; "/a/" compiles like "/a".
        let body = &pattern[1..];
        let body = body.strip_suffix('/').unwrap_or(body);
        let mut segments = Vec::new();
        if !body.is_empty() {
            for part in body.split('/') {
                segments.push(Self::parse_segment(part).map_err(invalid)?);
            }
        }

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
        })
    }

    fn parse_segment(part: &str) -> Result<PatternSegment, &'static str> {
        if part.is_empty() {
            return Err("pattern contains an empty segment");
        }
        Ok(match part {
            "**" => PatternSegment::DoubleWildcard,
            "*" => PatternSegment::SingleWildcard,
            _ if part.contains("**") => {
                return Err("'**' must be a whole path segment");
            }
            _ if part.contains(['*', '?']) => PatternSegment::Pattern(part.chars().collect()),
            _ => PatternSegment::Literal(part.to_string()),
        })
    }

    /// Returns the pattern as written.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// True for `/**`, the pattern every path matches.
    pub fn is_catch_all(&self) -> bool {
        self.segments == [PatternSegment::DoubleWildcard]
    }

    /// Checks whether `path` matches this pattern.
    ///
    /// Empty path segments are ignored, so `/offertes/` and `/offertes`
    /// are the same path. Any query string must already be stripped.
    pub fn matches(&self, path: &str) -> bool {
        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match_segments(&self.segments, &path_segments)
    }
}

impl fmt::Debug for AntMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AntMatcher").field(&self.pattern).finish()
    }
}

impl fmt::Display for AntMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

fn match_segments(pattern: &[PatternSegment], path: &[&str]) -> bool {
    let Some((head, rest)) = pattern.split_first() else {
        return path.is_empty();
    };

    match head {
        // ** swallows zero or more segments
        PatternSegment::DoubleWildcard => {
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        _ => match path.split_first() {
            Some((segment, remaining)) => {
                match_segment(head, segment) && match_segments(rest, remaining)
            }
            None => false,
        },
    }
}

fn match_segment(pattern: &PatternSegment, segment: &str) -> bool {
    match pattern {
        PatternSegment::Literal(literal) => literal == segment,
        PatternSegment::SingleWildcard | PatternSegment::DoubleWildcard => true,
        PatternSegment::Pattern(chars) => {
            let text: Vec<char> = segment.chars().collect();
            match_chars(chars, &text)
        }
    }
}

fn match_chars(pattern: &[char], text: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some((&'*', rest)) => (0..=text.len()).any(|skip| match_chars(rest, &text[skip..])),
        Some((&'?', rest)) => !text.is_empty() && match_chars(rest, &text[1..]),
        Some((c, rest)) => text.first() == Some(c) && match_chars(rest, &text[1..]),
    }
}
