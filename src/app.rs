//! Application module
//!
//! Owns the route table and the per-application settings. Every request
//! passes through [`Application::dispatch`], which is the single place where
//! handler failures and panics become 500 responses and where CORS headers
//! are added.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::Method;

use crate::config::AppConfig;
use crate::cors::{Cors, CorsOutcome};
use crate::error::Result;
use crate::handler::{Handler, HandlerError, Request, Resource, ResourceHandler};
use crate::http::Response;
use crate::logger::{self, AccessLogEntry};
use crate::routing::{RouteMatch, RouteTable};

/// A panic payload caught at the application boundary
#[derive(Debug, thiserror::Error)]
#[error("handler panicked: {0}")]
pub struct HandlerPanic(pub String);

/// Route table plus the settings applied to every response
pub struct Application {
    routes: RouteTable<Arc<dyn Handler>>,
    debug: bool,
    strict_slashes: bool,
    max_body_size: u64,
    cors: Option<Cors>,
    access_log: Option<String>,
}

impl Application {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            routes: RouteTable::new(),
            debug: config.debug,
            strict_slashes: config.strict_slashes,
            max_body_size: config.max_body_size,
            cors: Cors::from_setting(&config.cors),
            access_log: None,
        }
    }

    /// Write an access log line per request in `format`, `None` disables it
    #[must_use]
    pub fn with_access_log(mut self, format: Option<String>) -> Self {
        self.access_log = format;
        self
    }

    /// Register `handler` for the space- or comma-separated `methods` on `pattern`
    pub fn route<H: Handler>(&mut self, methods: &str, pattern: &str, handler: H) -> Result<&mut Self> {
        self.routes.add(methods, pattern, Arc::new(handler))?;
        Ok(self)
    }

    /// Register several routes at once
    pub fn add_routes<'a, I>(&mut self, routes: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str, Arc<dyn Handler>)>,
    {
        for (methods, pattern, handler) in routes {
            self.routes.add(methods, pattern, handler)?;
        }
        Ok(self)
    }

    /// Register a resource handler for the verbs it implements
    pub fn resource<T: ResourceHandler>(&mut self, pattern: &str, handler: T) -> Result<&mut Self> {
        let methods = handler.allowed_methods();
        self.routes
            .add_with(methods, pattern, Arc::new(Resource(handler)))?;
        Ok(self)
    }

    pub const fn debug(&self) -> bool {
        self.debug
    }

    pub const fn cors(&self) -> Option<&Cors> {
        self.cors.as_ref()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Produce the response for `request`
    pub fn dispatch(&self, mut request: Request) -> Response {
        self.respond(&mut request)
    }

    fn respond(&self, request: &mut Request) -> Response {
        let mut response = self.route_request(request);

        if let Some(cors) = &self.cors {
            if let CorsOutcome::Unauthorized(origin) = cors.apply(request.header("origin"), &mut response) {
                logger::log_debug(&format!("CORS: origin {origin} is not allowed"));
            }
        }
        response
    }

    fn route_request(&self, request: &mut Request) -> Response {
        let handler = match self
            .routes
            .lookup(request.method(), request.path(), self.strict_slashes)
        {
            RouteMatch::Found { route, vars } => {
                let handler = Arc::clone(route.target());
                request.set_vars(vars);
                handler
            }
            RouteMatch::MethodNotAllowed(allowed) => {
                return match &self.cors {
                    Some(cors) if *request.method() == Method::OPTIONS => cors.preflight(),
                    _ => Response::method_not_allowed(&allowed),
                };
            }
            RouteMatch::NotFound => {
                return Response::not_found(format!("Service not found: {}.", request.path()));
            }
        };

        let request: &Request = request;
        match catch_unwind(AssertUnwindSafe(|| handler.handle(request))) {
            Ok(Ok(response) | Err(HandlerError::Abort(response))) => response,
            Ok(Err(HandlerError::Failure(error))) => self.failure(request, error.as_ref()),
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(ToString::to_string)
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic payload".to_string());
                self.failure(request, &HandlerPanic(message))
            }
        }
    }

    fn failure(&self, request: &Request, error: &(dyn std::error::Error + 'static)) -> Response {
        logger::log_error(&format!(
            "{} {} failed: {error}",
            request.method(),
            request.path()
        ));
        Response::internal_server_error(error, self.debug)
    }

    /// Serve a `hyper` request: read the body, dispatch and log access
    pub async fn handle<B>(
        &self,
        request: hyper::Request<B>,
        peer: Option<SocketAddr>,
    ) -> std::result::Result<hyper::Response<Full<Bytes>>, Infallible>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let started = Instant::now();
        let (parts, body) = request.into_parts();

        let declared = parts
            .headers
            .get(hyper::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        let body = if declared.is_some_and(|len| len > self.max_body_size) {
            Err(Response::payload_too_large())
        } else {
            let limit = usize::try_from(self.max_body_size).unwrap_or(usize::MAX);
            match Limited::new(body, limit).collect().await {
                Ok(collected) => Ok(collected.to_bytes()),
                Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                    Err(Response::payload_too_large())
                }
                Err(e) => {
                    logger::log_warning(&format!("Failed to read request body: {e}"));
                    Err(Response::error("Failed to read request body."))
                }
            }
        };

        let (mut request, body_error) = match body {
            Ok(bytes) => (Request::from_parts(parts, bytes, peer), None),
            Err(response) => (Request::from_parts(parts, Bytes::new(), peer), Some(response)),
        };

        let response = match body_error {
            Some(mut response) => {
                if let Some(cors) = &self.cors {
                    cors.apply(request.header("origin"), &mut response);
                }
                response
            }
            None => self.respond(&mut request),
        };

        if let Some(format) = &self.access_log {
            logger::log_access(&AccessLogEntry::new(&request, &response, started.elapsed()), format);
        }
        Ok(response.into_hyper())
    }
}
