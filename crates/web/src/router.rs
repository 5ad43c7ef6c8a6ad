//! Ordered regex route table.
//!
//! Routes are registered once at startup through a [`RouteTableBuilder`] and
//! frozen into a [`RouteTable`], which is then shared read-only by every
//! worker. Lookup walks the routes in registration order and returns the first
//! whose pattern matches the request path; there is no specificity ranking.

use dispatch_http::handler::Handler;
use regex::Regex;
use thiserror::Error;
use tracing::trace;

/// Default number of routes a table can hold.
pub const DEFAULT_ROUTE_CAPACITY: usize = 16;

/// Default maximum length of a route pattern in bytes.
pub const DEFAULT_MAX_PATTERN_LEN: usize = 32;

/// Frozen, ordered list of routes.
pub struct RouteTable {
    routes: Vec<Route>,
}

/// A compiled pattern and the handler it selects.
pub struct Route {
    pattern: Regex,
    handler: Box<dyn Handler>,
}

#[derive(Error, Debug)]
pub enum RouteError {
    #[error("route table is full, capacity {capacity}")]
    TableFull { capacity: usize },

    #[error("pattern '{pattern}' is {len} bytes, exceeds the limit {max_len}")]
    PatternTooLong { pattern: String, len: usize, max_len: usize },

    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::new()
    }

    /// Returns the handler of the first route whose pattern matches `path`.
    pub fn find(&self, path: &str) -> Option<&dyn Handler> {
        self.routes
            .iter()
            .find(|route| route.is_match(path))
            .inspect(|route| trace!(path, pattern = route.pattern(), "route matched"))
            .map(Route::handler)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Route patterns in evaluation order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(Route::pattern)
    }
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.patterns()).finish()
    }
}

impl Route {
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn handler(&self) -> &dyn Handler {
        self.handler.as_ref()
    }

    #[inline]
    fn is_match(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route").field("pattern", &self.pattern()).finish_non_exhaustive()
    }
}

/// Collects routes before the table is frozen.
pub struct RouteTableBuilder {
    routes: Vec<Route>,
    capacity: usize,
    max_pattern_len: usize,
}

impl RouteTableBuilder {
    fn new() -> Self {
        Self::with_limits(DEFAULT_ROUTE_CAPACITY, DEFAULT_MAX_PATTERN_LEN)
    }

    pub fn with_limits(capacity: usize, max_pattern_len: usize) -> Self {
        Self { routes: Vec::with_capacity(capacity), capacity, max_pattern_len }
    }

    /// Appends a route after the ones already registered.
    ///
    /// # Errors
    ///
    /// Fails when the table is already at capacity, the pattern is longer than
    /// the pattern limit, or the pattern is not a valid regular expression.
    pub fn route(mut self, pattern: &str, handler: impl Handler + 'static) -> Result<Self, RouteError> {
        self.register(pattern, handler)?;
        Ok(self)
    }

    /// Same as [`route`](Self::route), for callers holding a `&mut` builder.
    pub fn register(&mut self, pattern: &str, handler: impl Handler + 'static) -> Result<(), RouteError> {
        if self.routes.len() >= self.capacity {
            return Err(RouteError::TableFull { capacity: self.capacity });
        }

        if pattern.len() > self.max_pattern_len {
            return Err(RouteError::PatternTooLong {
                pattern: pattern.to_owned(),
                len: pattern.len(),
                max_len: self.max_pattern_len,
            });
        }

        let regex =
            Regex::new(pattern).map_err(|source| RouteError::InvalidPattern { pattern: pattern.to_owned(), source })?;

        self.routes.push(Route { pattern: regex, handler: Box::new(handler) });
        Ok(())
    }

    pub fn build(self) -> RouteTable {
        RouteTable { routes: self.routes }
    }
}

impl std::fmt::Debug for RouteTableBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTableBuilder")
            .field("routes", &self.routes.len())
            .field("capacity", &self.capacity)
            .field("max_pattern_len", &self.max_pattern_len)
            .finish()
    }
}
