//! Request handler module
//!
//! Handlers return a [`HandlerResult`]: the response on success, or a
//! [`HandlerError`] that either short-circuits with a prepared response or
//! reports an unhandled failure. The application converts both into the
//! outbound response.

mod request;

pub use request::Request;

use hyper::Method;

use crate::http::Response;

pub type HandlerResult = Result<Response, HandlerError>;

/// Non-success outcome of a handler
#[derive(Debug)]
pub enum HandlerError {
    /// Stop handling and send this response as is
    Abort(Response),
    /// Unexpected failure, converted to a 500 response at the application boundary
    Failure(anyhow::Error),
}

impl From<Response> for HandlerError {
    fn from(response: Response) -> Self {
        Self::Abort(response)
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(error: anyhow::Error) -> Self {
        Self::Failure(error)
    }
}

impl From<crate::Error> for HandlerError {
    fn from(error: crate::Error) -> Self {
        Self::Failure(error.into())
    }
}

impl From<std::io::Error> for HandlerError {
    fn from(error: std::io::Error) -> Self {
        Self::Failure(error.into())
    }
}

/// A route handler
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: &Request) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(&Request) -> HandlerResult + Send + Sync + 'static,
{
    fn handle(&self, request: &Request) -> HandlerResult {
        self(request)
    }
}

/// Resource-oriented handler with one method per HTTP verb
///
/// A resource is only routed for the verbs listed by
/// [`ResourceHandler::allowed_methods`], so other verbs get a 405 with a
/// matching `Allow` header, and `OPTIONS` falls through to the CORS
/// preflight unless it is listed. `HEAD` defaults to `get`.
pub trait ResourceHandler: Send + Sync + 'static {
    /// Verbs this resource implements; override together with the verb methods
    fn allowed_methods(&self) -> Vec<Method> {
        vec![Method::GET, Method::HEAD]
    }

    fn get(&self, _request: &Request) -> HandlerResult {
        Err(not_allowed(self))
    }

    fn head(&self, request: &Request) -> HandlerResult {
        self.get(request)
    }

    fn post(&self, _request: &Request) -> HandlerResult {
        Err(not_allowed(self))
    }

    fn put(&self, _request: &Request) -> HandlerResult {
        Err(not_allowed(self))
    }

    fn patch(&self, _request: &Request) -> HandlerResult {
        Err(not_allowed(self))
    }

    fn delete(&self, _request: &Request) -> HandlerResult {
        Err(not_allowed(self))
    }

    fn options(&self, _request: &Request) -> HandlerResult {
        Err(not_allowed(self))
    }
}

/// Adapter that dispatches a [`ResourceHandler`] by request method
pub struct Resource<T>(pub T);

impl<T: ResourceHandler> Handler for Resource<T> {
    fn handle(&self, request: &Request) -> HandlerResult {
        match *request.method() {
            Method::GET => self.0.get(request),
            Method::HEAD => self.0.head(request),
            Method::POST => self.0.post(request),
            Method::PUT => self.0.put(request),
            Method::PATCH => self.0.patch(request),
            Method::DELETE => self.0.delete(request),
            Method::OPTIONS => self.0.options(request),
            _ => Err(not_allowed(&self.0)),
        }
    }
}

fn not_allowed<T: ResourceHandler + ?Sized>(handler: &T) -> HandlerError {
    Response::method_not_allowed(&handler.allowed_methods()).into()
}
