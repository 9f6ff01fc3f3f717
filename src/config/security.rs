use {
    crate::{Error, Result},
    serde::Deserialize,
    std::collections::BTreeMap,
};

/// Inputs for the two security policies.
///
/// ```toml
/// [security]
/// hosts_proxy_headers = ["X-Forwarded-Host"]
/// sts_seconds = 86400
/// # ssl_host = "api.example.com"
///
/// [security.ssl_proxy_headers]
/// X-Forwarded-Proto = "https"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Headers that may carry the host name a proxy received the request on.
    #[serde(default = "SecurityConfig::default_hosts_proxy_headers")]
    pub hosts_proxy_headers: Vec<String>,

    /// Header/value pairs a TLS-terminating proxy sets on secure requests.
    #[serde(default = "SecurityConfig::default_ssl_proxy_headers")]
    pub ssl_proxy_headers: BTreeMap<String, String>,

    /// Strict-Transport-Security max-age for the enforced group.
    #[serde(default = "SecurityConfig::default_sts_seconds")]
    pub sts_seconds: u64,

    /// Host used for TLS redirects instead of the request's own host.
    #[serde(default)]
    pub ssl_host: Option<String>,
}

impl SecurityConfig {
    fn default_hosts_proxy_headers() -> Vec<String> {
        vec!["X-Forwarded-Host".into()]
    }

    fn default_ssl_proxy_headers() -> BTreeMap<String, String> {
        BTreeMap::from([("X-Forwarded-Proto".to_string(), "https".to_string())])
    }

    fn default_sts_seconds() -> u64 {
        86400
    }

    pub fn validate(&self) -> Result<()> {
        if self.sts_seconds == 0 {
            return Err(Error::config("security.sts_seconds must be > 0"));
        }
        if self.hosts_proxy_headers.is_empty() {
            return Err(Error::config(
                "security.hosts_proxy_headers must name at least one header",
            ));
        }
        let names = self
            .hosts_proxy_headers
            .iter()
            .chain(self.ssl_proxy_headers.keys());
        for name in names {
            http::HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::config(format!("invalid security header name {name:?}")))?;
        }
        if let Some(host) = &self.ssl_host
            && host.parse::<http::uri::Authority>().is_err()
        {
            return Err(Error::config(format!("security.ssl_host {host:?} is not a host")));
        }
        Ok(())
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        SecurityConfig {
            hosts_proxy_headers: Self::default_hosts_proxy_headers(),
            ssl_proxy_headers: Self::default_ssl_proxy_headers(),
            sts_seconds: Self::default_sts_seconds(),
            ssl_host: None,
        }
    }
}
