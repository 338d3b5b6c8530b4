//! Cross-origin resource sharing
//!
//! CORS is configured once when the application is constructed. The setting
//! is either a boolean (`false` disables it, `true` allows every origin with
//! the default methods and headers) or a table of explicit options.

use serde::{Deserialize, Serialize};

use crate::http::Response;

pub const DEFAULT_METHODS: &[&str] = &["GET", "OPTIONS", "PATCH", "POST", "PUT", "DELETE"];
pub const DEFAULT_HEADERS: &[&str] = &[
    "Content-Type",
    "Cache-Control",
    "X-Requested-With",
    "Authorization",
];

/// CORS configuration as it appears in the config file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsSetting {
    Enabled(bool),
    Custom(CorsOptions),
}

impl Default for CorsSetting {
    fn default() -> Self {
        Self::Enabled(false)
    }
}

/// Explicit CORS options; omitted lists fall back to the defaults
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CorsOptions {
    /// Allowed origins, `None` or a `"*"` entry allows every origin
    #[serde(default)]
    pub origins: Option<Vec<String>>,
    #[serde(default)]
    pub methods: Option<Vec<String>>,
    #[serde(default)]
    pub headers: Option<Vec<String>>,
    #[serde(default)]
    pub credentials: bool,
    /// Preflight cache lifetime in seconds
    #[serde(default = "default_max_age")]
    pub max_age: u64,
}

impl Default for CorsOptions {
    fn default() -> Self {
        Self {
            origins: None,
            methods: None,
            headers: None,
            credentials: false,
            max_age: default_max_age(),
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_age() -> u64 {
    86400
}

/// Result of applying CORS to a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOutcome {
    /// Headers were added
    Applied,
    /// The request carried no `Origin` header
    NoOrigin,
    /// The origin is not in the allowed list
    Unauthorized(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

/// Effective CORS policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cors {
    origins: AllowedOrigins,
    methods: Vec<String>,
    headers: Vec<String>,
    credentials: bool,
    max_age: u64,
}

impl Cors {
    /// Policy for `setting`, `None` when CORS is disabled
    pub fn from_setting(setting: &CorsSetting) -> Option<Self> {
        match setting {
            CorsSetting::Enabled(false) => None,
            CorsSetting::Enabled(true) => Some(Self::permissive()),
            CorsSetting::Custom(options) => Some(Self::from_options(options)),
        }
    }

    /// Every origin with the default methods and headers
    pub fn permissive() -> Self {
        Self::from_options(&CorsOptions::default())
    }

    pub fn from_options(options: &CorsOptions) -> Self {
        let origins = match &options.origins {
            Some(list) if !list.iter().any(|o| o == "*") => AllowedOrigins::List(list.clone()),
            _ => AllowedOrigins::Any,
        };
        Self {
            origins,
            methods: options.methods.clone().unwrap_or_else(|| to_owned(DEFAULT_METHODS)),
            headers: options.headers.clone().unwrap_or_else(|| to_owned(DEFAULT_HEADERS)),
            credentials: options.credentials,
            max_age: options.max_age,
        }
    }

    /// Value for `Access-Control-Allow-Origin`, if `origin` is allowed
    pub fn allow_origin(&self, origin: &str) -> Option<String> {
        match &self.origins {
            AllowedOrigins::Any => Some("*".to_string()),
            AllowedOrigins::List(list) => list
                .iter()
                .any(|allowed| allowed == origin)
                .then(|| origin.to_string()),
        }
    }

    /// Add CORS headers to `response` for a request from `origin`
    pub fn apply(&self, origin: Option<&str>, response: &mut Response) -> CorsOutcome {
        let Some(origin) = origin.filter(|o| !o.is_empty()) else {
            return CorsOutcome::NoOrigin;
        };
        let Some(allowed) = self.allow_origin(origin) else {
            return CorsOutcome::Unauthorized(origin.to_string());
        };

        if allowed != "*" {
            response.set_header("Vary", "Origin");
        }
        response.set_header("Access-Control-Allow-Origin", allowed);
        if self.credentials {
            response.set_header("Access-Control-Allow-Credentials", "true");
        }
        response.set_header("Access-Control-Allow-Headers", self.headers.join(", "));
        response.set_header("Access-Control-Allow-Methods", self.methods.join(", "));
        CorsOutcome::Applied
    }

    /// Answer to a preflight `OPTIONS` request; CORS headers are added by `apply`
    pub fn preflight(&self) -> Response {
        Response::no_content().with_header("Access-Control-Max-Age", self.max_age.to_string())
    }

    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}
