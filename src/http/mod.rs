//! HTTP response layer
//!
//! Typed response builders and the payload helpers they delegate to.

pub mod json;
pub mod message;
pub mod mime;
pub mod response;
pub mod xml;

// Re-export commonly used types
pub use json::JsonOptions;
pub use message::JsonMessage;
pub use response::{ETag, Response, ResponseKind, ANY_STATUS, ERROR_STATUS, SUCCESS_STATUS};
pub use xml::{Element, Node, XmlDocument};
