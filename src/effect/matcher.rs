//! Effect matchers.
//!
//! A matcher selects which handlers run for an effect `type`:
//!
//! | form | built from | bucket order |
//! |------|------------|--------------|
//! | exact name | `"toast"` | 1 |
//! | pattern | [`Regex`] / [`Matcher::pattern`] | 2 |
//! | predicate | [`Matcher::predicate`] | 3 |
//! | default | `"default"` | 4, only if nothing ran |
//! | wildcard | `"*"` | 5, always |

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::{PontError, Result};

/// Reserved matcher name for fallback handlers.
pub const DEFAULT_MATCHER: &str = "default";

/// Reserved matcher name for handlers that see every effect.
pub const WILDCARD_MATCHER: &str = "*";

pub(crate) type Predicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Rule selecting which handlers run for a given effect.
#[derive(Clone)]
pub enum Matcher {
    /// Effect `type` equals the name.
    Exact(String),
    /// Pattern tested against the effect `type`.
    Pattern(Regex),
    /// Predicate invoked with the effect `type`.
    Predicate(Predicate),
    /// Runs only when no earlier handler executed.
    Default,
    /// Runs for every effect.
    Wildcard,
}

impl Matcher {
    /// Exact-name matcher. Reserved names are not special here.
    pub fn exact(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(PontError::InvalidMatcher {
                reason: "effect name is empty".to_string(),
            });
        }
        Ok(Self::Exact(name))
    }

    /// Compile a pattern matcher.
    pub fn pattern(source: &str) -> Result<Self> {
        Regex::new(source)
            .map(Self::Pattern)
            .map_err(|e| PontError::InvalidMatcher {
                reason: format!("invalid pattern `{source}`: {e}"),
            })
    }

    /// Predicate matcher. Clones of the returned matcher share one bucket.
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(predicate))
    }

    /// Parse a matcher name: `"default"`, `"*"`, or an exact effect name.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            DEFAULT_MATCHER => Ok(Self::Default),
            WILDCARD_MATCHER => Ok(Self::Wildcard),
            other => Self::exact(other),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(name) => f.debug_tuple("Exact").field(name).finish(),
            Self::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            Self::Predicate(p) => write!(f, "Predicate({:p})", Arc::as_ptr(p)),
            Self::Default => f.write_str("Default"),
            Self::Wildcard => f.write_str("Wildcard"),
        }
    }
}

/// Conversion into a [`Matcher`], validated at registration time.
pub trait IntoMatcher {
    /// Convert, failing with `InvalidMatcher` on unusable input.
    fn into_matcher(self) -> Result<Matcher>;
}

impl IntoMatcher for Matcher {
    fn into_matcher(self) -> Result<Matcher> {
        Ok(self)
    }
}

impl IntoMatcher for &Matcher {
    fn into_matcher(self) -> Result<Matcher> {
        Ok(self.clone())
    }
}

impl IntoMatcher for &str {
    fn into_matcher(self) -> Result<Matcher> {
        Matcher::parse(self)
    }
}

impl IntoMatcher for String {
    fn into_matcher(self) -> Result<Matcher> {
        Matcher::parse(&self)
    }
}

impl IntoMatcher for &String {
    fn into_matcher(self) -> Result<Matcher> {
        Matcher::parse(self)
    }
}

impl IntoMatcher for Regex {
    fn into_matcher(self) -> Result<Matcher> {
        Ok(Matcher::Pattern(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reserved_names() {
        assert!(matches!(Matcher::parse("default").unwrap(), Matcher::Default));
        assert!(matches!(Matcher::parse("*").unwrap(), Matcher::Wildcard));
        assert!(matches!(Matcher::parse("toast").unwrap(), Matcher::Exact(n) if n == "toast"));
    }

    #[test]
    fn test_empty_name_is_invalid() {
        assert!(matches!(
            "".into_matcher(),
            Err(PontError::InvalidMatcher { .. })
        ));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            Matcher::pattern("("),
            Err(PontError::InvalidMatcher { .. })
        ));
    }

    #[test]
    fn test_regex_into_matcher() {
        let matcher = Regex::new("^nav\\.").unwrap().into_matcher().unwrap();
        match matcher {
            Matcher::Pattern(re) => assert!(re.is_match("nav.back")),
            other => panic!("unexpected matcher {other:?}"),
        }
    }

    #[test]
    fn test_predicate_debug_output() {
        let matcher = Matcher::predicate(|kind| kind.len() > 3);
        assert!(format!("{matcher:?}").starts_with("Predicate("));
    }
}
