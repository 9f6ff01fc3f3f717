use {
    crate::{DeploymentMode, Error, Result, SecurityConfig},
    http::{HeaderMap, HeaderName, HeaderValue, Uri, header::HOST, uri::Scheme},
};

/// Transport and header directives shared by every route of one group.
///
/// Two instances exist per process: [`SecurityPolicy::open`] for probes and
/// scrapes, [`SecurityPolicy::enforced`] for everything user-facing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityPolicy {
    pub name: &'static str,
    pub hosts_proxy_headers: Vec<HeaderName>,
    pub ssl_proxy_headers: Vec<(HeaderName, String)>,
    pub ssl_host: Option<String>,
    pub frame_deny: bool,
    pub content_type_nosniff: bool,
    pub browser_xss_filter: bool,
    pub sts_seconds: Option<u64>,
    pub ssl_redirect: bool,
    pub is_development: bool,
}

impl SecurityPolicy {
    /// Header hardening only. Never redirects and never sends
    /// Strict-Transport-Security, whatever the transport.
    pub fn open(config: &SecurityConfig, mode: DeploymentMode) -> Result<Self> {
        Ok(SecurityPolicy {
            name: "open",
            hosts_proxy_headers: header_names(&config.hosts_proxy_headers)?,
            ssl_proxy_headers: ssl_proxy_headers(config)?,
            ssl_host: None,
            frame_deny: true,
            content_type_nosniff: true,
            browser_xss_filter: true,
            sts_seconds: None,
            ssl_redirect: false,
            is_development: mode.is_development(),
        })
    }

    /// TLS only: plain requests are redirected and secure ones get
    /// Strict-Transport-Security, except in development mode.
    pub fn enforced(config: &SecurityConfig, mode: DeploymentMode) -> Result<Self> {
        Ok(SecurityPolicy {
            name: "enforced",
            ssl_host: config.ssl_host.clone(),
            sts_seconds: Some(config.sts_seconds),
            ssl_redirect: true,
            ..Self::open(config, mode)?
        })
    }

    /// Whether this policy can short-circuit a request.
    pub fn enforces_transport(&self) -> bool {
        !self.is_development && (self.ssl_redirect || self.sts_seconds.is_some())
    }

    /// A request is secure when it reached us over TLS, or when a proxy both
    /// forwarded the original host and declared the original scheme secure.
    /// Without a forwarded host the proxy headers are not trusted.
    pub fn is_secure(&self, uri: &Uri, headers: &HeaderMap) -> bool {
        if uri.scheme() == Some(&Scheme::HTTPS) {
            return true;
        }
        if self.forwarded_host(headers).is_none() {
            return false;
        }
        self.ssl_proxy_headers.iter().any(|(name, expected)| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.trim().eq_ignore_ascii_case(expected))
        })
    }

    /// The HTTPS equivalent of the request URL, path and query unchanged.
    ///
    /// The host is the configured TLS host, else the forwarded host, else
    /// `Host`, else the URI authority. `None` when no host is known.
    pub fn redirect_location(&self, uri: &Uri, headers: &HeaderMap) -> Option<String> {
        let host = self
            .ssl_host
            .clone()
            .or_else(|| self.forwarded_host(headers).map(str::to_owned))
            .or_else(|| {
                headers
                    .get(HOST)
                    .and_then(|v| v.to_str().ok())
                    .filter(|v| !v.is_empty())
                    .map(str::to_owned)
            })
            .or_else(|| uri.authority().map(|a| a.to_string()))?;

        let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        Some(format!("https://{host}{path_and_query}"))
    }

    pub fn sts_header_value(&self) -> Option<HeaderValue> {
        self.sts_seconds
            .map(|secs| HeaderValue::from_str(&format!("max-age={secs}")))
            .and_then(|v| v.ok())
    }

    fn forwarded_host<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        self.hosts_proxy_headers.iter().find_map(|name| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
    }
}

fn header_names(names: &[String]) -> Result<Vec<HeaderName>> {
    names
        .iter()
        .map(|name| {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::config(format!("invalid security header name {name:?}")))
        })
        .collect()
}

fn ssl_proxy_headers(config: &SecurityConfig) -> Result<Vec<(HeaderName, String)>> {
    let names: Vec<String> = config.ssl_proxy_headers.keys().cloned().collect();
    Ok(header_names(&names)?
        .into_iter()
        .zip(config.ssl_proxy_headers.values().cloned())
        .collect())
}
