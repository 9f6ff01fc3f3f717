//! HTML views.
//!
//! Handlers never format HTML themselves; they ask a [`Renderer`] for a
//! named view. [`BuiltinViews`] covers the views this server needs (`404`,
//! `login`, `admin`) inside one shared layout.

use {
    crate::{Error, Result},
    axum::response::{Html, IntoResponse, Response},
    http::StatusCode,
    regex::{Captures, Regex},
    serde_json::Value,
    std::{collections::HashMap, sync::LazyLock},
};

static PLACEHOLDER_REGEXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap());

const CONTENT_MARKER: &str = "{{> content }}";

pub trait Renderer: Send + Sync + 'static {
    /// Renders `view` with `data`, returning the complete document.
    fn render(&self, view: &str, data: &Value) -> Result<Vec<u8>>;
}

/// Views compiled into the binary.
///
/// `{{ Key }}` is replaced by the HTML-escaped value of `data.Key`; missing
/// keys render as nothing. The layout receives the view through
/// `{{> content }}`.
pub struct BuiltinViews {
    layout: &'static str,
    views: HashMap<&'static str, &'static str>,
}

impl Default for BuiltinViews {
    fn default() -> Self {
        BuiltinViews {
            layout: LAYOUT,
            views: HashMap::from([("404", NOT_FOUND), ("admin", ADMIN), ("login", LOGIN)]),
        }
    }
}

impl BuiltinViews {
    #[must_use]
    pub fn with_view(mut self, name: &'static str, template: &'static str) -> Self {
        self.views.insert(name, template);
        self
    }
}

impl Renderer for BuiltinViews {
    fn render(&self, view: &str, data: &Value) -> Result<Vec<u8>> {
        let template = self
            .views
            .get(view)
            .ok_or_else(|| Error::rendering(format!("unknown view {view:?}")))?;
        let content = fill(template, data);
        let page = fill(self.layout, data).replacen(CONTENT_MARKER, &content, 1);
        Ok(page.into_bytes())
    }
}

/// Renders `view` as an HTML response with `status`.
pub fn render_html(
    renderer: &dyn Renderer,
    status: StatusCode,
    view: &str,
    data: &Value,
) -> Response {
    match renderer.render(view, data) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(page) => (status, Html(page)).into_response(),
            Err(err) => Error::rendering(err.to_string()).into_response(),
        },
        Err(err) => err.into_response(),
    }
}

fn fill(template: &str, data: &Value) -> String {
    PLACEHOLDER_REGEXP
        .replace_all(template, |caps: &Captures| match data.get(&caps[1]) {
            Some(Value::String(s)) => escape_html(s),
            Some(Value::Null) | None => String::new(),
            Some(other) => escape_html(&other.to_string()),
        })
        .into_owned()
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{ Title }}</title>
</head>
<body>
{{> content }}
</body>
</html>
"#;

const NOT_FOUND: &str = r#"<main class="not-found">
  <h1>{{ Title }}</h1>
  <p><a href="/">Back to the query console</a></p>
</main>"#;

const ADMIN: &str = r#"<main class="admin">
  <h1>Admin</h1>
  <p>Signed in as {{ Login }}.</p>
</main>"#;

const LOGIN: &str = r#"<main class="login">
  <h1>Sign in</h1>
  <form method="post" action="/auth/password/login">
    <label>Login <input name="login" autocomplete="username" required></label>
    <label>Password <input name="password" type="password" autocomplete="current-password" required></label>
    <button type="submit">Sign in</button>
  </form>
</main>"#;
