//! Route lookup and path rewriting.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up the matching route for a path
//! - Rewrite the path for the upstream by stripping the gateway prefix
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Longest prefix wins; ties keep configuration order
//! - Explicit no-match rather than silent default

use crate::config::RouteConfig;
use crate::routing::matcher::PathPrefixMatcher;

/// A compiled route.
#[derive(Debug, Clone)]
pub struct Route {
    pub name: String,
    pub service: String,
    pub protected: bool,
    matcher: PathPrefixMatcher,
    strip_prefix: Option<String>,
}

impl Route {
    pub fn from_config(config: &RouteConfig) -> Self {
        Self {
            name: config.name.clone(),
            service: config.service.clone(),
            protected: config.protected,
            matcher: PathPrefixMatcher::new(config.path_prefix.clone()),
            strip_prefix: config
                .strip_prefix
                .as_deref()
                .map(|p| p.trim_end_matches('/').to_string())
                .filter(|p| !p.is_empty()),
        }
    }

    pub fn prefix(&self) -> &str {
        self.matcher.prefix()
    }

    /// Upstream path and query for an inbound path and optional query string.
    pub fn rewrite(&self, path: &str, query: Option<&str>) -> String {
        let stripped = match &self.strip_prefix {
            Some(prefix) => match path.strip_prefix(prefix.as_str()) {
                Some(rest) if rest.is_empty() => "/",
                Some(rest) if rest.starts_with('/') => rest,
                _ => path,
            },
            None => path,
        };

        match query {
            Some(q) if !q.is_empty() => format!("{}?{}", stripped, q),
            _ => stripped.to_string(),
        }
    }
}

/// Immutable route table.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn from_config(configs: &[RouteConfig]) -> Self {
        let mut routes: Vec<Route> = configs.iter().map(Route::from_config).collect();
        // Stable sort keeps configuration order among equal-length prefixes.
        routes.sort_by(|a, b| b.prefix().len().cmp(&a.prefix().len()));
        Self { routes }
    }

    pub fn match_path(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.matcher.matches(path))
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}
