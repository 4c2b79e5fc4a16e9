//! Named regex patterns shared across parameter declarations.
//!
//! A parameter may reference a pattern by `(holder, property)` instead of
//! spelling the regex inline. References are resolved once, when routes are
//! compiled; a missing entry fails the build.

use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type Accessor = Arc<dyn Fn() -> String + Send + Sync>;

#[derive(Clone)]
enum PatternEntry {
    Literal(String),
    Accessor(Accessor),
}

impl fmt::Debug for PatternEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternEntry::Literal(s) => f.debug_tuple("Literal").field(s).finish(),
            PatternEntry::Accessor(_) => f.write_str("Accessor(..)"),
        }
    }
}

/// Registry mapping `(holder, property)` to a regex expression.
#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
    entries: HashMap<(String, String), PatternEntry>,
}

impl PatternRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a literal expression.
    pub fn register(
        &mut self,
        holder: impl Into<String>,
        property: impl Into<String>,
        expression: impl Into<String>,
    ) -> &mut Self {
        self.entries.insert(
            (holder.into(), property.into()),
            PatternEntry::Literal(expression.into()),
        );
        self
    }

    /// Register an accessor evaluated when a route referencing it is compiled.
    pub fn register_accessor<F>(
        &mut self,
        holder: impl Into<String>,
        property: impl Into<String>,
        accessor: F,
    ) -> &mut Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.entries.insert(
            (holder.into(), property.into()),
            PatternEntry::Accessor(Arc::new(accessor)),
        );
        self
    }

    #[must_use]
    pub fn resolve(&self, holder: &str, property: &str) -> Option<String> {
        self.entries
            .get(&(holder.to_string(), property.to_string()))
            .map(|entry| match entry {
                PatternEntry::Literal(expr) => expr.clone(),
                PatternEntry::Accessor(f) => f(),
            })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Compile a pattern expression into a fully anchored regex.
///
/// Accepts a bare expression (`[a-z]+`) or a delimited one with trailing
/// flags (`/^[a-z]+$/i`). Flags `i`, `m`, `s`, `x` become inline flags and
/// `u` is accepted and ignored.
pub fn compile_pattern(expression: &str) -> Result<Regex, regex::Error> {
    let (body, flags) = split_delimited(expression).unwrap_or((expression, ""));
    let inline: String = flags.chars().filter(|c| *c != 'u').collect();
    let anchored = if inline.is_empty() {
        format!("^(?:{body})$")
    } else {
        format!("(?{inline})^(?:{body})$")
    };
    Regex::new(&anchored)
}

fn split_delimited(expression: &str) -> Option<(&str, &str)> {
    let rest = expression.strip_prefix('/')?;
    let end = rest.rfind('/')?;
    let flags = &rest[end + 1..];
    if flags.chars().all(|c| matches!(c, 'i' | 'm' | 's' | 'x' | 'u')) {
        Some((&rest[..end], flags))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_pattern_is_anchored() {
        let re = compile_pattern("[a-z]+").unwrap();
        assert!(re.is_match("abc"));
        assert!(!re.is_match("abc1"));
        assert!(!re.is_match("1abc"));
    }

    #[test]
    fn test_delimited_pattern_with_flags() {
        let re = compile_pattern(r"/^[\w]+$/").unwrap();
        assert!(re.is_match("Ann"));
        assert!(!re.is_match("Ann Lee"));

        let re = compile_pattern("/^abc$/i").unwrap();
        assert!(re.is_match("ABC"));

        let re = compile_pattern("/^abc$/u").unwrap();
        assert!(re.is_match("abc"));
    }

    #[test]
    fn test_alternation_is_fully_anchored() {
        let re = compile_pattern("cat|dog").unwrap();
        assert!(re.is_match("dog"));
        assert!(!re.is_match("dogs"));
    }

    #[test]
    fn test_registry_resolves_literals_and_accessors() {
        let mut registry = PatternRegistry::new();
        registry
            .register("Patterns", "slug", "[a-z-]+")
            .register_accessor("Patterns", "code", || "[A-Z]{3}".to_string());

        assert_eq!(registry.resolve("Patterns", "slug").as_deref(), Some("[a-z-]+"));
        assert_eq!(registry.resolve("Patterns", "code").as_deref(), Some("[A-Z]{3}"));
        assert_eq!(registry.resolve("Patterns", "missing"), None);
        assert_eq!(registry.len(), 2);
    }
}
