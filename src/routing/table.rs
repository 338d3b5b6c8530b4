//! Route table module
//!
//! Routes are matched in registration order; the first route whose pattern
//! and method both match wins.

use hyper::Method;

use super::pattern::{PathValue, RoutePattern};
use crate::error::{Error, Result};

/// A registered route carrying an arbitrary target
#[derive(Debug, Clone)]
pub struct Route<T> {
    methods: Vec<Method>,
    pattern: RoutePattern,
    target: T,
}

impl<T> Route<T> {
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub const fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    pub const fn target(&self) -> &T {
        &self.target
    }

    /// `HEAD` is served by `GET` routes unless registered explicitly
    fn accepts(&self, method: &Method) -> bool {
        self.methods.contains(method) || (*method == Method::HEAD && self.methods.contains(&Method::GET))
    }
}

/// Lookup outcome
#[derive(Debug)]
pub enum RouteMatch<'a, T> {
    Found {
        route: &'a Route<T>,
        vars: Vec<(String, PathValue)>,
    },
    /// The path matched, but none of those routes accepts the method
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

#[derive(Debug, Clone)]
pub struct RouteTable<T> {
    routes: Vec<Route<T>>,
}

impl<T> Default for RouteTable<T> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<T> RouteTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `target` under `pattern` for space-separated `methods`
    pub fn add(&mut self, methods: &str, pattern: &str, target: T) -> Result<()> {
        let methods = parse_methods(methods)?;
        let pattern = RoutePattern::parse(pattern)?;
        self.routes.push(Route {
            methods,
            pattern,
            target,
        });
        Ok(())
    }

    /// Register `target` under `pattern` for an explicit method list
    pub fn add_with(&mut self, methods: Vec<Method>, pattern: &str, target: T) -> Result<()> {
        let pattern = RoutePattern::parse(pattern)?;
        self.routes.push(Route {
            methods,
            pattern,
            target,
        });
        Ok(())
    }

    pub fn lookup(&self, method: &Method, path: &str, strict_slashes: bool) -> RouteMatch<'_, T> {
        let mut allowed: Vec<Method> = Vec::new();

        for route in &self.routes {
            let Some(vars) = route.pattern.match_path(path, strict_slashes) else {
                continue;
            };
            if route.accepts(method) {
                return RouteMatch::Found { route, vars };
            }
            for m in &route.methods {
                if !allowed.contains(m) {
                    allowed.push(m.clone());
                }
            }
        }

        if allowed.is_empty() {
            RouteMatch::NotFound
        } else {
            RouteMatch::MethodNotAllowed(allowed)
        }
    }

    pub fn routes(&self) -> &[Route<T>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Parse a whitespace- or comma-separated method list such as `"GET POST"`
pub fn parse_methods(methods: &str) -> Result<Vec<Method>> {
    let parsed = methods
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|m| !m.is_empty())
        .map(|m| {
            Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                .map_err(|_| Error::InvalidMethod(m.to_string()))
        })
        .collect::<Result<Vec<_>>>()?;

    if parsed.is_empty() {
        return Err(Error::InvalidMethod(methods.to_string()));
    }
    Ok(parsed)
}
