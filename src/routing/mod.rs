//! Routing module
//!
//! Provides the small amount of routing the resource convention needs:
//! - Route patterns with typed placeholders
//! - An ordered route table with method matching

mod pattern;
mod table;

pub use pattern::{parse_bool, PathValue, PlaceholderType, RoutePattern};
pub use table::{parse_methods, Route, RouteMatch, RouteTable};
