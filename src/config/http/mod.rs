mod cors;
mod session;

pub use cors::*;
pub use session::*;

use {
    crate::{Error, Result},
    serde::Deserialize,
    std::time::Duration,
};

/// Listener and middleware-chain settings.
///
/// ```toml
/// [http]
/// bind_addr = "0.0.0.0"
/// bind_port = 8080            # overridden by PORT
/// shutdown_timeout = "30s"
/// max_graphql_payload = "1MiB"
/// real_ip_headers = ["true-client-ip", "x-real-ip", "x-forwarded-for"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "HttpConfig::default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "HttpConfig::default_bind_port")]
    pub bind_port: u16,

    /// Grace period for in-flight requests once a shutdown signal arrives.
    #[serde(
        default = "HttpConfig::default_shutdown_timeout",
        with = "humantime_serde"
    )]
    pub shutdown_timeout: Duration,

    /// Largest accepted body on `POST /graphql`.
    #[serde(default = "HttpConfig::default_max_graphql_payload")]
    pub max_graphql_payload: byte_unit::Byte,

    /// Proxy headers trusted to carry the originating client address, in
    /// order of preference. Lower-case names.
    #[serde(default = "HttpConfig::default_real_ip_headers")]
    pub real_ip_headers: Vec<String>,

    #[serde(default)]
    pub cors: CorsConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

impl HttpConfig {
    pub fn full_bind_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.bind_port)
    }

    fn default_bind_addr() -> String {
        "0.0.0.0".into()
    }

    fn default_bind_port() -> u16 {
        8080
    }

    fn default_shutdown_timeout() -> Duration {
        Duration::from_secs(30)
    }

    fn default_max_graphql_payload() -> byte_unit::Byte {
        byte_unit::Byte::from_u64(1024 * 1024)
    }

    fn default_real_ip_headers() -> Vec<String> {
        vec![
            "true-client-ip".into(),
            "x-real-ip".into(),
            "x-forwarded-for".into(),
        ]
    }

    pub fn validate(&self) -> Result<()> {
        if self.bind_addr.parse::<std::net::IpAddr>().is_err() {
            return Err(Error::config(format!(
                "http.bind_addr must be an IP address, got {:?}",
                self.bind_addr
            )));
        }

        if self.max_graphql_payload.as_u64() == 0 {
            return Err(Error::config("http.max_graphql_payload must be > 0"));
        }

        for name in &self.real_ip_headers {
            http::HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                Error::config(format!("http.real_ip_headers contains invalid header {name:?}"))
            })?;
        }

        for origin in self.cors.allowed_origins.iter().flatten() {
            http::HeaderValue::from_str(origin).map_err(|_| {
                Error::config(format!(
                    "http.cors.allowed_origins contains invalid origin {origin:?}"
                ))
            })?;
        }

        Ok(())
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            bind_addr: Self::default_bind_addr(),
            bind_port: Self::default_bind_port(),
            shutdown_timeout: Self::default_shutdown_timeout(),
            max_graphql_payload: Self::default_max_graphql_payload(),
            real_ip_headers: Self::default_real_ip_headers(),
            cors: CorsConfig::default(),
            session: SessionConfig::default(),
        }
    }
}
