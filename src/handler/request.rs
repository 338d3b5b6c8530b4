//! Request wrapper handed to route handlers

use std::net::SocketAddr;

use chrono::NaiveDateTime;
use hyper::body::Bytes;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, Method, Version};
use serde::de::DeserializeOwned;

use super::HandlerError;
use crate::http::json::parse_datetime;
use crate::http::Response;
use crate::routing::{parse_bool, PathValue};

/// An inbound request with its body fully read
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    args: Vec<(String, String)>,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
    vars: Vec<(String, PathValue)>,
    peer: Option<SocketAddr>,
}

impl Request {
    /// Build a request from a method and a request target such as `/a/b?x=1`
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };
        let path = if path.is_empty() { "/" } else { path };

        Self {
            method,
            path: path.to_string(),
            query: query.map(ToString::to_string),
            args: query.map(parse_query).unwrap_or_default(),
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            vars: Vec::new(),
            peer: None,
        }
    }

    pub(crate) fn from_parts(
        parts: hyper::http::request::Parts,
        body: Bytes,
        peer: Option<SocketAddr>,
    ) -> Self {
        let target = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_string(), ToString::to_string);
        let mut request = Self::new(parts.method, &target);
        request.version = parts.version;
        request.headers = parts.headers;
        request.body = body;
        request.peer = peer;
        request
    }

    /// Add a header; invalid names or values are ignored
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub const fn with_peer(mut self, peer: SocketAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    pub(crate) fn set_vars(&mut self, vars: Vec<(String, PathValue)>) {
        self.vars = vars;
    }

    pub const fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub const fn version(&self) -> Version {
        self.version
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as text, `None` if absent or not visible ASCII
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    pub const fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Captured path variables in pattern order
    pub fn vars(&self) -> &[(String, PathValue)] {
        &self.vars
    }

    /// The primary resource: the first path variable
    pub fn resource(&self) -> Option<&PathValue> {
        self.vars.first().map(|(_, value)| value)
    }

    pub fn var(&self, name: &str) -> Option<&PathValue> {
        self.vars
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn var_int(&self, name: &str) -> Option<i64> {
        self.var(name).and_then(PathValue::as_int)
    }

    /// First query argument named `key`
    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_arg(&self, key: &str) -> bool {
        self.args.iter().any(|(k, _)| k == key)
    }

    pub fn args(&self) -> &[(String, String)] {
        &self.args
    }

    /// Boolean query argument; malformed values are rejected with a 400 response
    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool, HandlerError> {
        let Some(value) = self.arg(key) else {
            return Ok(default);
        };
        parse_bool(value).ok_or_else(|| invalid_arg("boolean", key, value))
    }

    pub fn get_int(&self, key: &str) -> Result<Option<i64>, HandlerError> {
        self.arg(key)
            .map(|value| value.parse().map_err(|_| invalid_arg("integer", key, value)))
            .transpose()
    }

    /// ISO-8601 date/time query argument
    pub fn get_datetime(&self, key: &str) -> Result<Option<NaiveDateTime>, HandlerError> {
        self.arg(key)
            .map(|value| parse_datetime(value).ok_or_else(|| invalid_arg("datetime", key, value)))
            .transpose()
    }

    /// Requested byte range as `(start, end)`; `(0, None)` without a `Range` header
    pub fn get_range(&self) -> (u64, Option<u64>) {
        let Some(ranges) = self
            .header("range")
            .map(|r| r.trim().strip_prefix("bytes=").unwrap_or(r))
        else {
            return (0, None);
        };
        let Some((start, end)) = ranges.split(',').next().and_then(|r| r.split_once('-')) else {
            return (0, None);
        };
        (
            start.trim().parse().unwrap_or(0),
            end.trim().parse().ok(),
        )
    }

    /// Body decoded as UTF-8 text
    pub fn text(&self) -> Result<&str, HandlerError> {
        if self.body.is_empty() {
            return Err(Response::error("No data provided.").into());
        }
        std::str::from_utf8(&self.body)
            .map_err(|_| Response::error("Posted data is not UTF-8 text.").into())
    }

    /// Body deserialized from JSON into `T`
    ///
    /// Invalid JSON and JSON of the wrong shape are both rejected with a 400 response.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        let text = self.text()?;
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|_| HandlerError::from(Response::error("Text is not valid JSON.")))?;
        serde_json::from_value(value).map_err(|e| {
            Response::error(format!("Unexpected JSON data: {e}.")).into()
        })
    }

    /// Accepted media types with their quality, highest first
    pub fn accept(&self) -> Vec<(String, f32)> {
        self.header("accept").map(parse_quality_list).unwrap_or_default()
    }

    /// Accepted languages with their quality, highest first
    pub fn languages(&self) -> Vec<(String, f32)> {
        self.header("accept-language")
            .map(parse_quality_list)
            .unwrap_or_default()
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

fn invalid_arg(kind: &str, key: &str, value: &str) -> HandlerError {
    Response::error(format!("Not a {kind}: {key}={value}.")).into()
}

fn parse_quality_list(header: &str) -> Vec<(String, f32)> {
    let mut items: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|item| {
            let mut parts = item.split(';');
            let value = parts.next()?.trim();
            if value.is_empty() {
                return None;
            }
            let quality = parts
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|q| q.parse::<f32>().ok())
                .unwrap_or(1.0);
            Some((value.to_string(), quality))
        })
        .collect();
    items.sort_by(|a, b| b.1.total_cmp(&a.1));
    items
}
