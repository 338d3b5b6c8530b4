//! MIME type detection module
//!
//! Binary payloads are sniffed from their magic bytes first. When the bytes
//! carry no recognizable signature, the extension of an optional filename
//! hint is consulted, and `application/octet-stream` is the last resort.

use std::path::Path;

/// Generic binary content type used when detection fails
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Detect the MIME type of a byte payload
///
/// # Examples
/// ```
/// use restglue::http::mime::sniff;
/// let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];
/// assert_eq!(sniff(&png, None), "image/png");
/// assert_eq!(sniff(b"plain words", Some("notes.txt")), "text/plain; charset=utf-8");
/// assert_eq!(sniff(b"plain words", None), "application/octet-stream");
/// ```
pub fn sniff(data: &[u8], filename: Option<&str>) -> &'static str {
    if let Some(kind) = infer::get(data) {
        return kind.mime_type();
    }

    filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map_or(OCTET_STREAM, |ext| {
            get_content_type(Some(ext.to_ascii_lowercase().as_str()))
        })
}

/// Get MIME Content-Type based on file extension
pub fn get_content_type(extension: Option<&str>) -> &'static str {
    match extension {
        // Text
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("txt" | "md") => "text/plain; charset=utf-8",
        Some("csv") => "text/csv",
        Some("xml") => "application/xml",

        // JavaScript/WASM
        Some("js" | "mjs") => "application/javascript",
        Some("json") => "application/json",
        Some("wasm") => "application/wasm",

        // Images
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",

        // Video
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",

        // Audio
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",

        // Documents
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("gz" | "gzip") => "application/gzip",
        Some("tar") => "application/x-tar",

        _ => OCTET_STREAM,
    }
}
