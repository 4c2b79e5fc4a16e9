//! Segment trie used for route lookup.
//!
//! Templates are split on `/` and inserted one segment per level:
//!
//! - literal segments (including the empty trailing-slash segment) are exact
//!   match edges stored in a map
//! - every placeholder at a given depth shares one wildcard edge, so
//!   `/users/{id}` and `/users/{user_id}/posts` reuse the same child
//! - a node ends a route when it carries a leaf for a verb; the leaf records
//!   the placeholder names of that route in template order
//!
//! Two routes with the same verb and the same literal/placeholder shape land
//! on the same leaf and are rejected as duplicates instead of shadowing one
//! another.
//!
//! Lookup walks the request segments left to right, trying the literal edge
//! before the wildcard edge and backtracking when a branch dead-ends, so
//! `/foo/bar` prefers a literal `/foo/bar` route over `/foo/{a}` but still
//! falls back to the placeholder route when the literal branch has no leaf
//! for the verb. Cost is proportional to path depth, not route count.

use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::core::{MatchResult, ParamVec};
use crate::error::ConfigurationError;
use crate::routes::{
    compile_route, CompiledRoute, PatternRegistry, RouteDefinition, Segment, Verb,
    MAX_INLINE_SEGMENTS,
};

type ParamNames = SmallVec<[Arc<str>; 4]>;

#[derive(Debug)]
struct Leaf {
    route: Arc<CompiledRoute>,
    param_names: ParamNames,
}

#[derive(Debug, Default)]
struct RadixNode {
    literals: HashMap<Box<str>, RadixNode>,
    wildcard: Option<Box<RadixNode>>,
    leaves: HashMap<Verb, Leaf>,
}

impl RadixNode {
    /// Insert a leaf, returning the existing route if the slot is taken.
    fn insert(
        &mut self,
        segments: &[Segment],
        verb: Verb,
        leaf: Leaf,
    ) -> Result<(), Arc<CompiledRoute>> {
        let Some((head, rest)) = segments.split_first() else {
            if let Some(existing) = self.leaves.get(&verb) {
                return Err(Arc::clone(&existing.route));
            }
            self.leaves.insert(verb, leaf);
            return Ok(());
        };

        let child = match head {
            Segment::Literal(lit) => self.literals.entry(lit.as_str().into()).or_default(),
            Segment::Placeholder(_) => self.wildcard.get_or_insert_with(Box::default).as_mut(),
        };
        child.insert(rest, verb, leaf)
    }

    fn search<'p>(
        &self,
        segments: &[&'p str],
        verb: Verb,
        captured: &mut SmallVec<[&'p str; MAX_INLINE_SEGMENTS]>,
    ) -> Option<&Leaf> {
        let Some((head, rest)) = segments.split_first() else {
            return self.leaves.get(&verb);
        };

        if let Some(child) = self.literals.get(*head) {
            if let Some(leaf) = child.search(rest, verb, captured) {
                return Some(leaf);
            }
        }

        if head.is_empty() {
            return None;
        }

        if let Some(wildcard) = &self.wildcard {
            captured.push(*head);
            if let Some(leaf) = wildcard.search(rest, verb, captured) {
                return Some(leaf);
            }
            // Backtrack
            captured.pop();
        }

        None
    }

    fn node_count(&self) -> usize {
        1 + self.literals.values().map(RadixNode::node_count).sum::<usize>()
            + self.wildcard.as_ref().map_or(0, |w| w.node_count())
    }
}

/// Compiled, read-only route lookup structure.
///
/// Built once from a full set of declarations. There is no incremental
/// update; a rebuild constructs a new index (see
/// [`SharedRouteIndex`](crate::dispatcher::SharedRouteIndex)).
#[derive(Debug, Default)]
pub struct RouteIndex {
    root: RadixNode,
    routes: Vec<Arc<CompiledRoute>>,
}

impl RouteIndex {
    /// Build an index from declarations with no named patterns available.
    pub fn build(routes: Vec<RouteDefinition>) -> Result<Self, ConfigurationError> {
        Self::build_with_patterns(routes, &PatternRegistry::new())
    }

    /// Build an index, resolving pattern references against `patterns`.
    ///
    /// Fails with the first [`ConfigurationError`] in declaration order;
    /// use [`RouteIndex::check`] to collect all of them.
    pub fn build_with_patterns(
        routes: Vec<RouteDefinition>,
        patterns: &PatternRegistry,
    ) -> Result<Self, ConfigurationError> {
        let (index, mut errors) = Self::assemble(routes, patterns);
        if errors.is_empty() {
            Ok(index)
        } else {
            Err(errors.swap_remove(0))
        }
    }

    /// Every configuration error in a set of declarations.
    #[must_use]
    pub fn check(routes: &[RouteDefinition], patterns: &PatternRegistry) -> Vec<ConfigurationError> {
        Self::assemble(routes.to_vec(), patterns).1
    }

    fn assemble(
        routes: Vec<RouteDefinition>,
        patterns: &PatternRegistry,
    ) -> (Self, Vec<ConfigurationError>) {
        let mut index = RouteIndex::default();
        let mut errors = Vec::new();

        for definition in routes {
            let compiled = match compile_route(definition, patterns) {
                Ok(compiled) => Arc::new(compiled),
                Err(e) => {
                    warn!(error = %e, "Route rejected");
                    errors.push(e);
                    continue;
                }
            };

            let leaf = Leaf {
                route: Arc::clone(&compiled),
                param_names: compiled.template.placeholder_names().map(Arc::from).collect(),
            };
            let verb = compiled.definition.method;
            match index.root.insert(compiled.template.segments(), verb, leaf) {
                Ok(()) => index.routes.push(compiled),
                Err(existing) => {
                    let e = ConfigurationError::DuplicateRoute {
                        verb,
                        template: compiled.template.as_str().to_string(),
                        existing_handler: existing.handler().to_string(),
                        handler: compiled.handler().to_string(),
                    };
                    warn!(error = %e, "Route rejected");
                    errors.push(e);
                }
            }
        }

        let routes_summary: Vec<String> = index.routes.iter().take(10).map(|r| r.label()).collect();
        info!(
            routes_count = index.routes.len(),
            nodes = index.root.node_count(),
            rejected = errors.len(),
            routes_summary = ?routes_summary,
            "Route index built"
        );

        (index, errors)
    }

    /// Resolve pre-split path segments for a verb.
    #[must_use]
    pub fn lookup(&self, verb: Verb, segments: &[&str]) -> Option<MatchResult> {
        let mut captured = SmallVec::new();
        let leaf = self.root.search(segments, verb, &mut captured)?;
        let path_variables: ParamVec = leaf
            .param_names
            .iter()
            .zip(captured)
            .map(|(name, value)| (Arc::clone(name), value.to_string()))
            .collect();
        Some(MatchResult {
            route: Arc::clone(&leaf.route),
            path_variables,
        })
    }

    /// Registered routes in declaration order.
    #[must_use]
    pub fn routes(&self) -> &[Arc<CompiledRoute>] {
        &self.routes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
