//! Request matching on top of the route index.

use smallvec::SmallVec;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::radix::RouteIndex;
use crate::routes::{split_path, CompiledRoute, Verb};

/// Maximum number of path variables before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Captured path variables in template order.
///
/// Names are shared with the index (`Arc<str>`); values are the raw,
/// still percent-encoded request segments.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// A route matched for one request, with its captured path variables.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub route: Arc<CompiledRoute>,
    pub path_variables: ParamVec,
}

impl MatchResult {
    /// Raw captured value of a placeholder.
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.path_variables
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Copy the captured variables into a map.
    /// Note: This allocates - use get() in hot paths instead
    #[must_use]
    pub fn path_variables_map(&self) -> HashMap<String, String> {
        self.path_variables
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// Normalize a request target into a matchable path.
///
/// Drops the query string and fragment, maps the empty path to `/` and
/// guarantees a leading `/`. Trailing slashes are kept.
#[must_use]
pub fn normalize_path(target: &str) -> Cow<'_, str> {
    let end = target.find(['?', '#']).unwrap_or(target.len());
    let path = &target[..end];
    if path.is_empty() {
        Cow::Borrowed("/")
    } else if path.starts_with('/') {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(format!("/{path}"))
    }
}

/// Remove a configured mount prefix (e.g. `/api`) from a request path.
///
/// Only whole segments are stripped: `/api/x` loses `/api`, `/apix` does not.
#[must_use]
pub fn strip_path_prefix<'a>(path: &'a str, prefix: &str) -> &'a str {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return path;
    }
    match path.strip_prefix(prefix) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => path,
    }
}

/// Resolves concrete request paths against a [`RouteIndex`].
#[derive(Debug, Clone, Copy)]
pub struct RequestMatcher<'i> {
    index: &'i RouteIndex,
}

impl<'i> RequestMatcher<'i> {
    #[must_use]
    pub fn new(index: &'i RouteIndex) -> Self {
        Self { index }
    }

    /// Match a method token and a raw request target.
    ///
    /// Returns `None` for unsupported verbs and unmatched paths; the caller
    /// decides whether that is a 404.
    #[must_use]
    pub fn match_request(&self, method: &str, target: &str) -> Option<MatchResult> {
        match method.parse::<Verb>() {
            Ok(verb) => self.match_verb(verb, target),
            Err(e) => {
                warn!(method = %method, path = %target, error = %e, "No route matched");
                None
            }
        }
    }

    /// Match a verb and a raw request target.
    #[must_use]
    pub fn match_verb(&self, verb: Verb, target: &str) -> Option<MatchResult> {
        let path = normalize_path(target);
        debug!(method = %verb, path = %path, "Route match attempt");

        let match_start = Instant::now();
        let result = self.index.lookup(verb, &split_path(&path));
        let match_duration = match_start.elapsed();

        match &result {
            Some(m) => {
                if match_duration > Duration::from_millis(1) {
                    warn!(
                        method = %verb,
                        path = %path,
                        handler_name = %m.route.handler(),
                        route_pattern = %m.route.template.as_str(),
                        path_params = ?m.path_variables,
                        duration_us = match_duration.as_micros(),
                        "Slow route matching detected"
                    );
                } else {
                    info!(
                        method = %verb,
                        path = %path,
                        handler_name = %m.route.handler(),
                        route_pattern = %m.route.template.as_str(),
                        path_params = ?m.path_variables,
                        duration_us = match_duration.as_micros(),
                        "Route matched"
                    );
                }
            }
            None => warn!(
                method = %verb,
                path = %path,
                duration_us = match_duration.as_micros(),
                "No route matched"
            ),
        }

        result
    }
}
