//! HTTP response building module
//!
//! [`Response`] wraps a typed payload into a status, a content type, headers
//! and a body. Each constructor belongs to a [`ResponseKind`] that fixes the
//! default status, the content type and the range of statuses it accepts.
//! The finished value converts into a `hyper` response with [`Response::into_hyper`].

use std::ops::RangeInclusive;

use http_body_util::Full;
use hyper::body::Bytes;
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::json::{self, JsonOptions};
use super::mime;
use super::xml::{Element, XmlDocument};
use crate::error::{Error, Result};
use crate::logger;

/// Any valid HTTP status
pub const ANY_STATUS: RangeInclusive<u16> = 100..=599;
/// Statuses accepted by success responses
pub const SUCCESS_STATUS: RangeInclusive<u16> = 200..=299;
/// Statuses accepted by error responses
pub const ERROR_STATUS: RangeInclusive<u16> = 400..=599;

const TEXT_PLAIN: &str = "text/plain";
const TEXT_HTML: &str = "text/html";
const APPLICATION_XML: &str = "application/xml";
const APPLICATION_JSON: &str = "application/json";
const UTF_8: &str = "utf-8";

const INTERNAL_SERVER_ERROR: &str = "Internal Server Error.";

/// Response subtypes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    PlainText,
    Ok,
    Error,
    Html,
    Xml,
    Json,
    Binary,
    InternalServerError,
}

impl ResponseKind {
    pub const fn default_status(self) -> u16 {
        match self {
            Self::Error => 400,
            Self::InternalServerError => 500,
            _ => 200,
        }
    }

    pub const fn valid_range(self) -> RangeInclusive<u16> {
        match self {
            Self::Ok => SUCCESS_STATUS,
            Self::Error => ERROR_STATUS,
            Self::InternalServerError => 500..=500,
            _ => ANY_STATUS,
        }
    }
}

/// Entity tag settings for binary responses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ETag {
    /// SHA-256 hex digest of the body
    Checksum,
    /// Verbatim value
    Value(String),
}

/// A framework-independent HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    kind: ResponseKind,
    status: u16,
    valid_range: RangeInclusive<u16>,
    mimetype: String,
    charset: Option<String>,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl Response {
    fn build(kind: ResponseKind, status: u16, mimetype: &str, body: impl Into<Bytes>) -> Self {
        Self {
            kind,
            status,
            valid_range: kind.valid_range(),
            mimetype: mimetype.to_string(),
            charset: None,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    fn utf8(mut self) -> Self {
        self.charset = Some(UTF_8.to_string());
        self
    }

    /// Generic plain text response with any valid status
    pub fn new(message: impl Into<String>, status: u16) -> Result<Self> {
        Self::plain_text(message, status, &ANY_STATUS)
    }

    /// Plain text response whose status must lie in `valid_range`
    pub fn plain_text(
        message: impl Into<String>,
        status: u16,
        valid_range: &RangeInclusive<u16>,
    ) -> Result<Self> {
        let status = check_status(status, valid_range)?;
        let kind = if *valid_range == SUCCESS_STATUS {
            ResponseKind::Ok
        } else if *valid_range == ERROR_STATUS {
            ResponseKind::Error
        } else {
            ResponseKind::PlainText
        };
        let mut response = Self::build(kind, status, TEXT_PLAIN, message.into()).utf8();
        response.valid_range = valid_range.clone();
        Ok(response)
    }

    /// Plain text success response with status 200
    pub fn ok(message: impl Into<String>) -> Self {
        Self::build(ResponseKind::Ok, 200, TEXT_PLAIN, message.into()).utf8()
    }

    pub fn ok_with_status(message: impl Into<String>, status: u16) -> Result<Self> {
        Self::plain_text(message, status, &SUCCESS_STATUS)
    }

    /// Plain text error response with status 400
    pub fn error(message: impl Into<String>) -> Self {
        Self::build(ResponseKind::Error, 400, TEXT_PLAIN, message.into()).utf8()
    }

    pub fn error_with_status(message: impl Into<String>, status: u16) -> Result<Self> {
        Self::plain_text(message, status, &ERROR_STATUS)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::build(ResponseKind::Error, 404, TEXT_PLAIN, message.into()).utf8()
    }

    pub fn method_not_allowed(allowed: &[hyper::Method]) -> Self {
        let allow = allowed
            .iter()
            .map(hyper::Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        Self::build(ResponseKind::Error, 405, TEXT_PLAIN, "Method not allowed.")
            .utf8()
            .with_header("Allow", allow)
    }

    pub fn payload_too_large() -> Self {
        Self::build(ResponseKind::Error, 413, TEXT_PLAIN, "Payload too large.").utf8()
    }

    /// Empty 204 response without a content type, used for CORS preflight answers
    pub fn no_content() -> Self {
        Self::build(ResponseKind::PlainText, 204, "", Bytes::new())
    }

    pub fn html(markup: impl Into<String>) -> Self {
        Self::build(ResponseKind::Html, 200, TEXT_HTML, markup.into()).utf8()
    }

    /// HTML response rendered from an element tree
    pub fn html_document(document: &Element) -> Result<Self> {
        Ok(Self::html(document.to_html()?))
    }

    /// XML response from a typed document, an element tree or raw text
    ///
    /// The content type is always `application/xml; charset=utf-8`.
    pub fn xml<D: XmlDocument + ?Sized>(document: &D) -> Result<Self> {
        let text = document.to_xml()?;
        Ok(Self::build(ResponseKind::Xml, 200, APPLICATION_XML, text).utf8())
    }

    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Self::json_with(value, JsonOptions::default())
    }

    pub fn json_with<T: Serialize + ?Sized>(value: &T, options: JsonOptions) -> Result<Self> {
        let body = json::to_vec(value, options)?;
        Ok(Self::build(ResponseKind::Json, 200, APPLICATION_JSON, body))
    }

    /// Binary response with a sniffed content type
    ///
    /// A filename adds a `Content-Disposition: attachment` header and serves
    /// as extension hint when the bytes carry no known signature.
    pub fn binary(data: impl Into<Bytes>, filename: Option<&str>) -> Self {
        let data = data.into();
        let mimetype = mime::sniff(&data, filename);
        let response = Self::build(ResponseKind::Binary, 200, mimetype, data);
        match filename {
            Some(name) => response.with_filename(name),
            None => response,
        }
    }

    /// Status 500 response for an error escaping a handler
    ///
    /// With `debug` set the body lists the error and its full source chain,
    /// otherwise it carries a generic message.
    pub fn internal_server_error(error: &(dyn std::error::Error + 'static), debug: bool) -> Self {
        let body = if debug {
            describe_error(error)
        } else {
            INTERNAL_SERVER_ERROR.to_string()
        };
        Self::build(ResponseKind::InternalServerError, 500, TEXT_PLAIN, body).utf8()
    }

    /// Replace the status, validated against the range this response was built with
    pub fn with_status(mut self, status: u16) -> Result<Self> {
        self.status = check_status(status, &self.valid_range)?;
        Ok(self)
    }

    /// Set a header, replacing any existing header of the same name
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    #[must_use]
    pub fn with_charset(mut self, charset: Option<&str>) -> Self {
        self.charset = charset.map(ToString::to_string);
        self
    }

    /// Advertise `filename` through `Content-Disposition`
    #[must_use]
    pub fn with_filename(self, filename: &str) -> Self {
        let escaped = filename.replace('\\', "\\\\").replace('"', "\\\"");
        self.with_header(
            "Content-Disposition",
            format!("attachment; filename=\"{escaped}\""),
        )
    }

    #[must_use]
    pub fn with_etag(self, etag: ETag) -> Self {
        let value = match etag {
            ETag::Checksum => self.checksum(),
            ETag::Value(value) => value,
        };
        self.with_header("ETag", value)
    }

    #[must_use]
    pub fn without_etag(mut self) -> Self {
        self.remove_header("ETag");
        self
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            Some(existing) => existing.1 = value,
            None => self.headers.push((name, value)),
        }
    }

    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        let index = self
            .headers
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))?;
        Some(self.headers.remove(index).1)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub const fn kind(&self) -> ResponseKind {
        self.kind
    }

    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Statuses accepted by [`Response::with_status`]
    pub const fn valid_range(&self) -> &RangeInclusive<u16> {
        &self.valid_range
    }

    pub fn mimetype(&self) -> &str {
        &self.mimetype
    }

    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    /// Value of the `Content-Type` header, empty when the response has none
    pub fn content_type(&self) -> String {
        if self.mimetype.is_empty() {
            return String::new();
        }
        match &self.charset {
            Some(charset) if !self.mimetype.contains("charset=") => {
                format!("{}; charset={charset}", self.mimetype)
            }
            _ => self.mimetype.clone(),
        }
    }

    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as text, lossily decoded
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// SHA-256 hex digest of the body
    pub fn checksum(&self) -> String {
        format!("{:x}", Sha256::digest(&self.body))
    }

    /// Filename advertised through `Content-Disposition`, if any
    pub fn filename(&self) -> Option<String> {
        let disposition = self.header("Content-Disposition")?;
        let start = disposition.find("filename=\"")? + "filename=\"".len();
        let rest = &disposition[start..];

        let mut name = String::new();
        let mut chars = rest.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => name.push(chars.next()?),
                '"' => return Some(name),
                _ => name.push(c),
            }
        }
        None
    }

    /// Convert into a `hyper` response
    pub fn into_hyper(self) -> hyper::Response<Full<Bytes>> {
        let status = self.status;
        let mut builder = hyper::Response::builder().status(status);
        if !self.mimetype.is_empty() {
            builder = builder.header("Content-Type", self.content_type());
        }
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder.body(Full::new(self.body)).unwrap_or_else(|e| {
            log_build_error(status, &e);
            let mut fallback = hyper::Response::new(Full::new(Bytes::from(INTERNAL_SERVER_ERROR)));
            *fallback.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
    }
}

impl From<Response> for hyper::Response<Full<Bytes>> {
    fn from(response: Response) -> Self {
        response.into_hyper()
    }
}

fn check_status(status: u16, valid_range: &RangeInclusive<u16>) -> Result<u16> {
    if valid_range.contains(&status) && ANY_STATUS.contains(&status) {
        Ok(status)
    } else {
        Err(Error::InvalidStatus {
            status,
            min: *valid_range.start(),
            max: *valid_range.end(),
        })
    }
}

fn describe_error(error: &(dyn std::error::Error + 'static)) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    if source.is_some() {
        text.push_str("\n\nCaused by:");
    }
    let mut index = 0;
    while let Some(cause) = source {
        text.push_str(&format!("\n    {index}: {cause}"));
        index += 1;
        source = cause.source();
    }
    text
}

/// Log response build error
fn log_build_error(status: u16, error: &hyper::http::Error) {
    logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    const PNG_MAGIC: [u8; 16] = [
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52,
    ];

    #[test]
    fn test_success_range() {
        for status in SUCCESS_STATUS {
            let response = Response::ok_with_status("fine", status).unwrap();
            assert_eq!(response.status(), status);
            assert_eq!(response.kind(), ResponseKind::Ok);
        }
        for status in (100..200).chain(300..=599).chain([0, 99, 600, 999]) {
            assert!(matches!(
                Response::ok_with_status("fine", status),
                Err(Error::InvalidStatus { min: 200, max: 299, .. })
            ));
        }
    }

    #[test]
    fn test_error_range() {
        for status in ERROR_STATUS {
            let response = Response::error_with_status("bad", status).unwrap();
            assert_eq!(response.status(), status);
        }
        for status in (100..400).chain([0, 600, 1000]) {
            assert!(Response::error_with_status("bad", status).is_err());
        }
    }

    #[test]
    fn test_plain_text_defaults() {
        let ok = Response::ok("hello");
        assert_eq!(ok.status(), 200);
        assert_eq!(ok.content_type(), "text/plain; charset=utf-8");
        assert_eq!(ok.text(), "hello");

        let error = Response::error("nope");
        assert_eq!(error.status(), 400);
        assert_eq!(error.kind(), ResponseKind::Error);
    }

    #[test]
    fn test_plain_text_custom_range() {
        let range = 300..=399;
        assert_eq!(Response::plain_text("moved", 301, &range).unwrap().status(), 301);
        assert!(Response::plain_text("moved", 200, &range).is_err());
        assert!(Response::plain_text("huh", 700, &(100..=999)).is_err());
    }

    #[test]
    fn test_with_status_keeps_declared_range() {
        let range = 300..=399;
        let moved = Response::plain_text("moved", 301, &range).unwrap();
        assert_eq!(moved.valid_range(), &range);
        assert_eq!(moved.clone().with_status(308).unwrap().status(), 308);
        assert!(matches!(
            moved.with_status(200),
            Err(Error::InvalidStatus { status: 200, min: 300, max: 399 })
        ));
    }

    #[tokio::test]
    async fn test_no_content_has_no_content_type() {
        let response = Response::no_content();
        assert_eq!(response.content_type(), "");
        let response = response.into_hyper();
        assert_eq!(response.status(), 204);
        assert!(response.headers().get("content-type").is_none());
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }

    #[test]
    fn test_with_status_respects_kind() {
        assert_eq!(Response::error("x").with_status(503).unwrap().status(), 503);
        assert!(Response::error("x").with_status(201).is_err());
        assert!(Response::ok("x").with_status(404).is_err());
        assert_eq!(
            Response::json(&serde_json::json!({})).unwrap().with_status(201).unwrap().status(),
            201
        );
    }

    #[test]
    fn test_xml_element_tree() {
        let root = Element::new("root")
            .attr("foo", "42")
            .child(Element::new("bar").attr("spamm", "eggs").text("Hello world."));
        let response = Response::xml(&root).unwrap();
        assert_eq!(
            response.text(),
            r#"<root foo="42"><bar spamm="eggs">Hello world.</bar></root>"#
        );
        assert_eq!(response.content_type(), "application/xml; charset=utf-8");
    }

    #[test]
    fn test_xml_typed_document() {
        struct Greeting(&'static str);

        impl XmlDocument for Greeting {
            fn to_xml(&self) -> Result<String> {
                Element::new("greeting").text(self.0).to_xml()
            }
        }

        let response = Response::xml(&Greeting("hi")).unwrap();
        assert_eq!(response.text(), "<greeting>hi</greeting>");
        assert!(matches!(Response::xml("<broken>"), Err(Error::Xml(_))));
        assert!(matches!(Response::xml("junk<a/>"), Err(Error::Xml(_))));
    }

    #[test]
    fn test_json_response() {
        let response = Response::json(&serde_json::json!({"answer": 42})).unwrap();
        assert_eq!(response.content_type(), "application/json");
        assert_eq!(response.text(), r#"{"answer":42}"#);
    }

    #[test]
    fn test_binary_sniffed_without_filename() {
        let response = Response::binary(PNG_MAGIC.to_vec(), None);
        assert_eq!(response.content_type(), "image/png");
        assert_eq!(response.header("Content-Disposition"), None);
        assert_eq!(response.filename(), None);
    }

    #[test]
    fn test_binary_with_filename() {
        let response = Response::binary(vec![0x00, 0x01, 0x02], Some("x.bin"));
        assert_eq!(response.content_type(), "application/octet-stream");
        assert_eq!(
            response.header("content-disposition"),
            Some("attachment; filename=\"x.bin\"")
        );
        assert_eq!(response.filename().as_deref(), Some("x.bin"));
    }

    #[test]
    fn test_filename_quotes_round_trip() {
        let response = Response::binary(Vec::new(), Some(r#"we"ird.bin"#));
        assert_eq!(response.filename().as_deref(), Some(r#"we"ird.bin"#));
    }

    #[test]
    fn test_etag() {
        let response = Response::binary(b"abc".to_vec(), None).with_etag(ETag::Checksum);
        assert_eq!(
            response.header("ETag"),
            Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );

        let response = response.with_etag(ETag::Value("v1".to_string()));
        assert_eq!(response.header("etag"), Some("v1"));
        assert_eq!(response.without_etag().header("ETag"), None);
    }

    #[test]
    fn test_internal_server_error() {
        #[derive(Debug, thiserror::Error)]
        #[error("database unreachable")]
        struct Outer(#[source] std::io::Error);

        let err = Outer(std::io::Error::new(std::io::ErrorKind::Other, "connection refused"));

        let debug = Response::internal_server_error(&err, true);
        assert_eq!(debug.status(), 500);
        assert!(debug.text().contains("database unreachable"));
        assert!(debug.text().contains("0: connection refused"));

        let production = Response::internal_server_error(&err, false);
        assert_eq!(production.text(), "Internal Server Error.");
        assert!(production.with_status(501).is_err());
    }

    #[test]
    fn test_header_replacement_is_case_insensitive() {
        let response = Response::ok("x")
            .with_header("X-Token", "a")
            .with_header("x-token", "b");
        assert_eq!(response.headers().len(), 1);
        assert_eq!(response.header("X-TOKEN"), Some("b"));
    }

    #[tokio::test]
    async fn test_into_hyper() {
        let response = Response::error_with_status("gone", 410)
            .unwrap()
            .with_header("X-Reason", "expired")
            .into_hyper();
        assert_eq!(response.status(), 410);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/plain; charset=utf-8"
        );
        assert_eq!(response.headers().get("x-reason").unwrap(), "expired");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"gone");
    }

    #[test]
    fn test_into_hyper_rejects_bad_header() {
        let response = Response::ok("x").with_header("bad header", "v").into_hyper();
        assert_eq!(response.status(), 500);
    }
}
