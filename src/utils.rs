//!
//! Small shared helpers.
//!
//! - [`Sensitive`] keeps secrets such as the data-source URL or development
//!   passwords out of debug output and zeroes them on drop
//! - [`RequestIdGenerator`] produces the `x-request-id` assigned by the first
//!   link of the middleware chain
//! - [`replace_handlebars_with_env`] substitutes `{{ VAR }}` references in
//!   configuration text
//!

use {
    http::{HeaderName, HeaderValue, Request},
    regex::{Captures, Regex},
    serde::Deserialize,
    std::{env, sync::LazyLock},
    tower_http::request_id::{MakeRequestId, RequestId},
    uuid::{ContextV7, Timestamp, Uuid},
    zeroize::{Zeroize, ZeroizeOnDrop},
};

const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Matches `{{ VAR_NAME }}` with optional whitespace around an upper-case name.
static HANDLEBAR_REGEXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Z0-9_]+)\s*\}\}").unwrap());

/// A value that prints as `Sensitive(****)` and is zeroed when dropped.
///
/// ```
/// use graphql_server::Sensitive;
///
/// let url = Sensitive::from("postgres://user:secret@db/app");
/// assert_eq!(format!("{url:?}"), "Sensitive(****)");
/// assert!(url.0.contains("secret"));
/// ```
#[derive(Clone, Deserialize, Default, Zeroize, ZeroizeOnDrop)]
pub struct Sensitive<T: Default + Zeroize>(pub T);

impl Sensitive<String> {
    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<T: Default + Zeroize + PartialEq> PartialEq for Sensitive<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: Default + Zeroize> std::fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sensitive(****)")
    }
}

/// Keeps an inbound `x-request-id` or mints a time-ordered UUIDv7.
#[derive(Debug, Clone, Copy)]
pub struct RequestIdGenerator;

impl MakeRequestId for RequestIdGenerator {
    fn make_request_id<B>(&mut self, req: &Request<B>) -> Option<RequestId> {
        if let Some(inbound) = req.headers().get(X_REQUEST_ID).filter(|v| !v.is_empty()) {
            return Some(RequestId::new(inbound.clone()));
        }
        let id = Uuid::new_v7(Timestamp::now(ContextV7::new().with_additional_precision()));
        HeaderValue::from_str(&id.to_string()).ok().map(RequestId::new)
    }
}

/// Replaces every `{{ VAR }}` with the value of the environment variable `VAR`.
///
/// Unset variables become empty strings and are reported at warn level, so
/// a missing required value surfaces later as a validation error rather than
/// a parse error.
pub fn replace_handlebars_with_env(input: &str) -> String {
    HANDLEBAR_REGEXP
        .replace_all(input, |caps: &Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| {
                tracing::warn!(
                    variable = %var_name,
                    "Environment variable not found, substituting with empty string"
                );
                String::new()
            })
        })
        .to_string()
}
