use crate::config::Prefixes;
use smallvec::SmallVec;
use tracing::debug;

/// Path segments kept inline before heap allocation.
/// Resource paths rarely go past `<name>/<service>/<a>/<b>`.
pub const MAX_INLINE_SEGMENTS: usize = 8;

/// Decoded path segments after the category prefix.
pub type SegmentVec = SmallVec<[String; MAX_INLINE_SEGMENTS]>;

/// Top-level area a request path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteCategory {
    Meta,
    Code,
    Specialized,
    Resource,
    Static,
}

impl RouteCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Meta => "meta",
            Self::Code => "code",
            Self::Specialized => "specialized",
            Self::Resource => "resource",
            Self::Static => "static",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub category: RouteCategory,
    pub segments: SegmentVec,
}

/// Longest-prefix router over the configured category prefixes.
#[derive(Debug, Clone)]
pub struct PrefixRouter {
    /// Sorted by prefix length, longest first
    table: Vec<(String, RouteCategory)>,
}

impl PrefixRouter {
    #[must_use]
    pub fn new(prefixes: &Prefixes) -> Self {
        let mut table: Vec<(String, RouteCategory)> = [
            (&prefixes.meta, RouteCategory::Meta),
            (&prefixes.code, RouteCategory::Code),
            (&prefixes.specialized, RouteCategory::Specialized),
            (&prefixes.resource, RouteCategory::Resource),
            (&prefixes.static_files, RouteCategory::Static),
        ]
        .into_iter()
        .map(|(p, c)| (p.trim_end_matches('/').to_string(), c))
        .filter(|(p, _)| !p.is_empty())
        .collect();
        table.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { table }
    }

    /// Match a request path (query string allowed, it is ignored).
    ///
    /// `/` belongs to the meta category.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<RouteMatch> {
        let path = path.split('?').next().unwrap_or_default();
        if path.is_empty() || path == "/" {
            return Some(RouteMatch {
                category: RouteCategory::Meta,
                segments: SegmentVec::new(),
            });
        }
        for (prefix, category) in &self.table {
            let Some(rest) = path.strip_prefix(prefix.as_str()) else {
                continue;
            };
            if !rest.is_empty() && !rest.starts_with('/') {
                continue;
            }
            let segments = rest
                .split('/')
                .filter(|s| !s.is_empty())
                .map(|s| {
                    urlencoding::decode(s)
                        .map(|c| c.into_owned())
                        .unwrap_or_else(|_| s.to_string())
                })
                .collect();
            return Some(RouteMatch {
                category: *category,
                segments,
            });
        }
        debug!(path = %path, "No category prefix matches");
        None
    }
}
