//!
//! Process configuration, read once at startup.
//!
//! A configuration is assembled in three layers:
//!
//! 1. built-in defaults ([`Config::default`])
//! 2. an optional TOML file `config/{RUST_ENV}.toml`, in which `{{ VAR }}`
//!    references are replaced by environment variables before parsing
//! 3. the deployment environment: `PORT`, `DATABASE_URL`, `NAT_ENV`,
//!    `GIT_REVISION`, `GIT_TAG`, `GIT_BRANCH` and, with the `opentelemetry`
//!    feature, `OTEL_EXPORTER_OTLP_ENDPOINT`
//!
//! [`Config::load`] runs all three. The result is validated by
//! [`Config::validate`]; any failure there is fatal to startup.
//!
mod auth;
mod build;
mod database;
mod deployment;
mod http;
mod logging;
mod metrics;
mod security;

pub use auth::*;
pub use build::*;
pub use database::*;
pub use deployment::*;
pub use http::*;
pub use logging::*;
pub use metrics::*;
pub use security::*;

#[cfg(feature = "opentelemetry")]
mod opentelemetry;
#[cfg(feature = "opentelemetry")]
pub use opentelemetry::*;

pub use byte_unit::Byte;

use {
    crate::{
        Error, Result, Sensitive, observability::TelemetryGuard,
        utils::replace_handlebars_with_env,
    },
    serde::Deserialize,
    std::{env, fs, str::FromStr},
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mode: DeploymentMode,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub build: BuildInfo,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Defaults, then `config/{RUST_ENV}.toml` when `RUST_ENV` is set, then
    /// the process environment.
    pub fn load() -> Result<Config> {
        let config = match env::var("RUST_ENV") {
            Ok(rust_env) => Self::from_toml_file(rust_env)?,
            Err(_) => Config::default(),
        };
        config.with_env_overrides(|key| env::var(key).ok())
    }

    pub fn from_toml_file(env: impl AsRef<str>) -> Result<Config> {
        let path = format!("config/{}.toml", env.as_ref());
        let text = fs::read_to_string(path)?;
        text.parse()
    }

    /// Applies the deployment environment on top of this configuration.
    ///
    /// `lookup` resolves a variable name; empty values count as unset.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.is_empty());

        if let Some(port) = lookup("PORT") {
            self.http.bind_port = port
                .parse()
                .map_err(|_| Error::config(format!("PORT must be a port number, got {port:?}")))?;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = Sensitive(url);
        }
        if let Some(mode) = lookup("NAT_ENV") {
            self.mode = DeploymentMode::from_indicator(Some(&mode));
        }
        if let Some(revision) = lookup("GIT_REVISION") {
            self.build.revision = revision;
        }
        if let Some(tag) = lookup("GIT_TAG") {
            self.build.tag = tag;
        }
        if let Some(branch) = lookup("GIT_BRANCH") {
            self.build.branch = branch;
        }
        #[cfg(feature = "opentelemetry")]
        if let Some(endpoint) = lookup("OTEL_EXPORTER_OTLP_ENDPOINT") {
            self.logging.opentelemetry = Some(OpenTelemetryConfig::new(&endpoint));
        }
        Ok(self)
    }

    pub fn with_bind_addr<S: AsRef<str>>(mut self, addr: S) -> Self {
        self.http.bind_addr = addr.as_ref().into();
        self
    }

    pub fn with_bind_port(mut self, port: u16) -> Self {
        self.http.bind_port = port;
        self
    }

    pub fn with_database_url(mut self, url: &str) -> Self {
        self.database.url = Sensitive::from(url);
        self
    }

    pub fn with_mode(mut self, mode: DeploymentMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_build_info(mut self, build: BuildInfo) -> Self {
        self.build = build;
        self
    }

    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.logging.format = format;
        self
    }

    #[cfg(feature = "opentelemetry")]
    pub fn with_opentelemetry_config(mut self, otel_config: OpenTelemetryConfig) -> Self {
        self.logging.opentelemetry = Some(otel_config);
        self
    }

    /// Checks every section. A missing data-source URL is reported first.
    pub fn validate(&self) -> Result<()> {
        self.database.validate()?;
        self.http.validate()?;
        self.security.validate()?;
        self.metrics.validate()?;
        self.auth.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Installs the global tracing subscriber.
    ///
    /// The filter comes from `RUST_LOG` (default `info`). When a trace
    /// exporter is configured it is attached as an extra layer and the
    /// returned guard flushes it on drop. Calling this twice keeps the
    /// first subscriber.
    pub fn setup_tracing(&self) -> Result<TelemetryGuard> {
        use tracing_subscriber::{EnvFilter, Layer, prelude::*};

        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = match self.logging.format {
            LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
            LogFormat::Default => tracing_subscriber::fmt::layer().boxed(),
            LogFormat::Compact => tracing_subscriber::fmt::layer().compact().boxed(),
            LogFormat::Pretty => tracing_subscriber::fmt::layer().pretty().boxed(),
        };
        let registry = tracing_subscriber::registry().with(fmt_layer).with(env_filter);

        #[cfg(feature = "opentelemetry")]
        {
            let (otel_layer, guard) = crate::observability::trace_exporter(&self.logging)?;
            let _ = registry.with(otel_layer).try_init();
            Ok(guard)
        }

        #[cfg(not(feature = "opentelemetry"))]
        {
            let _ = registry.try_init();
            Ok(TelemetryGuard::default())
        }
    }
}

impl FromStr for Config {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let config_file = replace_handlebars_with_env(s);
        let config = toml::from_str::<Config>(&config_file)?;
        Ok(config)
    }
}
