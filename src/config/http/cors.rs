use http::{HeaderName, Method};
use serde::Deserialize;
use std::{str::FromStr, time::Duration};

/// Cross-origin policy applied by the last link of the middleware chain.
///
/// The default is permissive with credentials: the request origin, method
/// and headers are mirrored back and cookies are allowed. Preflight requests
/// are answered by the chain and never reach a route.
///
/// ```toml
/// [http.cors]
/// allow_credentials = true
/// allowed_origins = ["https://app.example.com"]
/// exposed_headers = ["x-request-id"]
/// max_age = "1h"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "CorsConfig::default_allow_credentials")]
    pub allow_credentials: bool,

    /// Origins allowed to call the API. Mirrors the request origin when unset.
    #[serde(default)]
    pub allowed_origins: Option<Vec<String>>,

    /// Mirrors the preflight's requested method when unset.
    #[serde(default)]
    pub allowed_methods: Option<Vec<CorsMethod>>,

    /// Mirrors the preflight's requested headers when unset.
    #[serde(default)]
    pub allowed_headers: Option<Vec<CorsHeader>>,

    #[serde(default = "CorsConfig::default_exposed_headers")]
    pub exposed_headers: Vec<CorsHeader>,

    #[serde(default, with = "humantime_serde")]
    pub max_age: Option<Duration>,
}

impl CorsConfig {
    fn default_allow_credentials() -> bool {
        true
    }

    fn default_exposed_headers() -> Vec<CorsHeader> {
        vec![CorsHeader(HeaderName::from_static("x-request-id"))]
    }

    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = Some(origins);
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        CorsConfig {
            allow_credentials: Self::default_allow_credentials(),
            allowed_origins: None,
            allowed_methods: None,
            allowed_headers: None,
            exposed_headers: Self::default_exposed_headers(),
            max_age: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CorsMethod(pub Method);

impl<'de> Deserialize<'de> for CorsMethod {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let method = Method::from_str(&s).map_err(serde::de::Error::custom)?;
        Ok(CorsMethod(method))
    }
}

#[derive(Debug, Clone)]
pub struct CorsHeader(pub HeaderName);

impl<'de> Deserialize<'de> for CorsHeader {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let header = HeaderName::from_str(&s).map_err(serde::de::Error::custom)?;
        Ok(CorsHeader(header))
    }
}
