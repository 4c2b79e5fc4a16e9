use smallvec::SmallVec;

use crate::error::ConfigurationError;

/// Inline capacity for split request paths.
pub const MAX_INLINE_SEGMENTS: usize = 8;

/// One `/`-separated piece of a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Matches exactly. The empty literal marks a trailing slash.
    Literal(String),
    /// `{name}` or `{hint:name}`; matches any non-empty segment.
    Placeholder(String),
}

/// A parsed route template such as `/account/{accountId}/widgets/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse a template.
    ///
    /// The leading `/` is required and stripped; the remainder is split on
    /// `/` without dropping empty pieces, so `/foo/` yields `["foo", ""]` and
    /// `/` yields `[""]`. An empty piece anywhere but the end is rejected.
    pub fn parse(raw: &str) -> Result<Self, ConfigurationError> {
        let invalid = |reason: &str| ConfigurationError::InvalidTemplate {
            template: raw.to_string(),
            reason: reason.to_string(),
        };

        let body = raw
            .strip_prefix('/')
            .ok_or_else(|| invalid("template must start with '/'"))?;

        let pieces: Vec<&str> = body.split('/').collect();
        let last = pieces.len() - 1;
        let mut segments = Vec::with_capacity(pieces.len());
        let mut names: Vec<&str> = Vec::new();

        for (i, piece) in pieces.iter().enumerate() {
            if piece.is_empty() {
                if i != last {
                    return Err(invalid("empty segment"));
                }
                segments.push(Segment::Literal(String::new()));
                continue;
            }

            if let Some(inner) = piece.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                // `{int:id}` carries a type hint that does not affect binding
                let name = inner.rsplit(':').next().unwrap_or(inner).trim();
                if name.is_empty() {
                    return Err(invalid("placeholder without a name"));
                }
                if name.contains(['{', '}']) {
                    return Err(invalid("unbalanced braces"));
                }
                if names.contains(&name) {
                    return Err(invalid(&format!("placeholder '{name}' appears twice")));
                }
                names.push(name);
                segments.push(Segment::Placeholder(name.to_string()));
            } else if piece.contains(['{', '}']) {
                return Err(invalid("placeholder must span a whole segment"));
            } else {
                segments.push(Segment::Literal((*piece).to_string()));
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Placeholder names in template order.
    pub fn placeholder_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Literal/placeholder shape with names erased: `/foo/{a}/` becomes `/foo/{}/`.
    #[must_use]
    pub fn structural_key(&self) -> String {
        let mut key = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            key.push('/');
            match segment {
                Segment::Literal(lit) => key.push_str(lit),
                Segment::Placeholder(_) => key.push_str("{}"),
            }
        }
        key
    }
}

/// Split a normalized request path the same way templates are split.
#[must_use]
pub fn split_path(path: &str) -> SmallVec<[&str; MAX_INLINE_SEGMENTS]> {
    path.strip_prefix('/').unwrap_or(path).split('/').collect()
}
