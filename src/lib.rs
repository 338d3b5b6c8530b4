//! Resource-oriented REST services on top of `hyper`
//!
//! Handlers return typed responses (plain text, HTML, XML, JSON, binary) and
//! are registered on an [`Application`] together with an optional CORS policy.
//! The [`server`] module hosts an application on a TCP listener.

pub mod app;
pub mod config;
pub mod cors;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod paging;
pub mod routing;
pub mod server;

pub use app::Application;
pub use config::{AppConfig, Config};
pub use error::{Error, Result};
pub use handler::{Handler, HandlerError, HandlerResult, Request, ResourceHandler};
pub use http::{JsonMessage, Response};
