use serde::Deserialize;
use std::time::Duration;

/// Cookie session settings for the session link of the middleware chain.
///
/// The `Secure` cookie attribute follows the deployment mode: it is set in
/// production and left off in development so sessions work over plain HTTP.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "SessionConfig::default_cookie_name")]
    pub cookie_name: String,

    #[serde(
        default = "SessionConfig::default_inactivity_timeout",
        with = "humantime_serde"
    )]
    pub inactivity_timeout: Duration,
}

impl SessionConfig {
    fn default_cookie_name() -> String {
        "graphql.sid".into()
    }

    fn default_inactivity_timeout() -> Duration {
        Duration::from_secs(3600)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            cookie_name: Self::default_cookie_name(),
            inactivity_timeout: Self::default_inactivity_timeout(),
        }
    }
}
