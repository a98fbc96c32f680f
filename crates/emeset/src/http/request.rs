//! HTTP request wrapper.
//!
//! A [`Request`] exposes the input sources a controller reads from, keyed by
//! [`Input`]:
//!
//! | Source | Content |
//! |--------|---------|
//! | `Get` | Decoded query string |
//! | `Post` | Decoded form body |
//! | `Request` | `Get` overlaid by `Post` |
//! | `Server` | CGI meta-variables (`REQUEST_METHOD`, `REQUEST_URI`, `HTTP_*`, ...) |
//! | `Files` | Uploaded file descriptors |
//! | `Session` | The shared [`Session`] |
//!
//! Reads through [`Request::get`] are filtered: strings are HTML-escaped
//! unless another [`Filter`] is requested. Session and file reads are never
//! filtered.
//!
//! # Test doubles
//!
//! [`Request::fake`] builds a request from explicit maps. Every read on a
//! fake request returns the injected value exactly, with no filtering, so
//! controllers can be exercised without a web server:
//!
//! ```rust
//! use emeset::http::{FakeInput, Input, Request};
//! use serde_json::json;
//!
//! let request = Request::fake(
//!     FakeInput::new()
//!         .get("page", "1")
//!         .server("REQUEST_METHOD", "GET")
//!         .server("REQUEST_URI", "/hello"),
//! );
//!
//! assert_eq!(request.get(Input::Get, "page"), Some(json!("1")));
//! assert_eq!(request.path(), "/hello");
//! ```

use std::io::{self, Read};

use serde_json::{Map, Value};

use super::query::parse_query;
use super::session::Session;

/// CGI meta-variables copied into the `Server` source by [`Request::from_cgi`].
const CGI_VARIABLES: &[&str] = &[
    "REQUEST_METHOD",
    "REQUEST_URI",
    "QUERY_STRING",
    "CONTENT_TYPE",
    "CONTENT_LENGTH",
    "SCRIPT_NAME",
    "PATH_INFO",
    "SERVER_NAME",
    "SERVER_PORT",
    "SERVER_PROTOCOL",
    "REMOTE_ADDR",
    "HTTPS",
];

/// Identifies an input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Input {
    Get,
    Post,
    Request,
    Server,
    Files,
    Session,
}

/// Filter applied to values read through [`Request::get_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    /// HTML-escape string values (recursively inside arrays).
    #[default]
    Sanitize,
    /// Return the value untouched.
    Raw,
    /// Accept integers only.
    Int,
    /// Accept numbers only.
    Float,
    /// Accept boolean-like values (`1/0`, `true/false`, `on/off`, `yes/no`).
    Bool,
}

/// Explicit input maps for [`Request::fake`].
#[derive(Debug, Clone, Default)]
pub struct FakeInput {
    pub get: Map<String, Value>,
    pub post: Map<String, Value>,
    pub session: Map<String, Value>,
    pub params: Map<String, Value>,
    pub server: Map<String, Value>,
    pub files: Map<String, Value>,
}

impl FakeInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.get.insert(key.into(), value.into());
        self
    }

    pub fn post(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.post.insert(key.into(), value.into());
        self
    }

    pub fn session(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.session.insert(key.into(), value.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn server(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.server.insert(key.into(), value.into());
        self
    }

    pub fn file(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.files.insert(key.into(), value.into());
        self
    }
}

/// The raw pieces of an HTTP request, as handed over by a server adapter.
#[derive(Debug, Clone, Default)]
pub struct RequestParts {
    pub method: String,
    pub uri: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub files: Map<String, Value>,
}

/// The current HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
    params: Map<String, Value>,
    testing: bool,
    get: Map<String, Value>,
    post: Map<String, Value>,
    request: Map<String, Value>,
    server: Map<String, Value>,
    files: Map<String, Value>,
    session: Session,
}

impl Request {
    /// Builds a request from a server map and an optional body.
    ///
    /// `GET` comes from `QUERY_STRING` (or the query part of `REQUEST_URI`).
    /// `POST` is decoded from the body when the content type is
    /// `application/x-www-form-urlencoded`.
    pub fn from_server(
        server: Map<String, Value>,
        body: Option<&str>,
        files: Map<String, Value>,
        session: Session,
    ) -> Self {
        let query = server
            .get("QUERY_STRING")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                server
                    .get("REQUEST_URI")
                    .and_then(Value::as_str)
                    .and_then(|uri| uri.split_once('?'))
                    .map(|(_, q)| q.to_string())
            })
            .unwrap_or_default();
        let get = parse_query(&query);

        let post = match body {
            Some(body) if is_form(&server) => parse_query(body),
            _ => Map::new(),
        };

        let mut request = get.clone();
        request.extend(post.clone());

        Self {
            params: Map::new(),
            testing: false,
            get,
            post,
            request,
            server,
            files,
            session,
        }
    }

    /// Builds a request from explicit parts.
    pub fn from_parts(parts: RequestParts, session: Session) -> Self {
        let mut server = Map::new();
        let method = if parts.method.is_empty() {
            "GET".to_string()
        } else {
            parts.method.to_ascii_uppercase()
        };
        let uri = if parts.uri.is_empty() {
            "/".to_string()
        } else {
            parts.uri
        };
        server.insert("REQUEST_METHOD".into(), Value::String(method));
        if let Some((_, query)) = uri.split_once('?') {
            server.insert("QUERY_STRING".into(), Value::String(query.to_string()));
        }
        server.insert("REQUEST_URI".into(), Value::String(uri));

        for (name, value) in parts.headers {
            let key = if name.eq_ignore_ascii_case("content-type") {
                "CONTENT_TYPE".to_string()
            } else {
                format!("HTTP_{}", name.to_ascii_uppercase().replace('-', "_"))
            };
            server.insert(key, Value::String(value));
        }

        Self::from_server(server, parts.body.as_deref(), parts.files, session)
    }

    /// Builds a request from the CGI process environment and stdin.
    pub fn from_cgi(session: Session) -> io::Result<Self> {
        let mut server = Map::new();
        for (key, value) in std::env::vars() {
            if key.starts_with("HTTP_") || CGI_VARIABLES.contains(&key.as_str()) {
                server.insert(key, Value::String(value));
            }
        }
        if !server.contains_key("REQUEST_URI") {
            let script = std::env::var("SCRIPT_NAME").unwrap_or_default();
            let info = std::env::var("PATH_INFO").unwrap_or_default();
            let mut uri = format!("{}{}", script, info);
            if uri.is_empty() {
                uri.push('/');
            }
            if let Ok(query) = std::env::var("QUERY_STRING") {
                if !query.is_empty() {
                    uri.push('?');
                    uri.push_str(&query);
                }
            }
            server.insert("REQUEST_URI".into(), Value::String(uri));
        }

        let length = server
            .get("CONTENT_LENGTH")
            .and_then(Value::as_str)
            .and_then(|l| l.trim().parse::<u64>().ok())
            .unwrap_or(0);
        let body = if length > 0 {
            let mut bytes = Vec::new();
            io::stdin().take(length).read_to_end(&mut bytes)?;
            form_body(&server, &bytes)
        } else {
            None
        };

        Ok(Self::from_server(server, body.as_deref(), Map::new(), session))
    }

    /// Builds a test double answering every read from `input`.
    pub fn fake(input: FakeInput) -> Self {
        let mut request = input.get.clone();
        request.extend(input.post.clone());
        Self {
            params: input.params,
            testing: true,
            get: input.get,
            post: input.post,
            request,
            server: input.server,
            files: input.files,
            session: Session::from_map(input.session),
        }
    }

    /// Returns true for requests built with [`Request::fake`].
    pub fn is_fake(&self) -> bool {
        self.testing
    }

    /// Filtered read (HTML-escaped strings).
    pub fn get(&self, input: Input, id: &str) -> Option<Value> {
        self.get_with(input, id, Filter::Sanitize)
    }

    /// Unfiltered read.
    pub fn get_raw(&self, input: Input, id: &str) -> Option<Value> {
        self.get_with(input, id, Filter::Raw)
    }

    /// Read with an explicit filter.
    pub fn get_with(&self, input: Input, id: &str, filter: Filter) -> Option<Value> {
        let value = self.lookup(input, id)?;
        if self.testing || matches!(input, Input::Session | Input::Files) {
            return Some(value);
        }
        apply_filter(value, filter)
    }

    /// Returns true if the source holds `id`.
    pub fn has(&self, input: Input, id: &str) -> bool {
        match input {
            Input::Session => self.session.contains(id),
            _ => self.source(input).is_some_and(|m| m.contains_key(id)),
        }
    }

    /// Replaces the route parameters.
    pub fn set_params(&mut self, params: Map<String, Value>) {
        self.params = params;
    }

    /// Returns a route parameter.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// All route parameters.
    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// True for `X-Requested-With: XMLHttpRequest` requests.
    pub fn is_ajax(&self) -> bool {
        self.get_raw(Input::Server, "HTTP_X_REQUESTED_WITH")
            .and_then(|v| v.as_str().map(|s| s.eq_ignore_ascii_case("xmlhttprequest")))
            .unwrap_or(false)
    }

    /// Request method, upper-cased. Defaults to `GET`.
    pub fn method(&self) -> String {
        self.server
            .get("REQUEST_METHOD")
            .and_then(Value::as_str)
            .map(str::to_ascii_uppercase)
            .unwrap_or_else(|| "GET".to_string())
    }

    /// Request path without the query string. Defaults to `/`.
    pub fn path(&self) -> String {
        self.server
            .get("REQUEST_URI")
            .and_then(Value::as_str)
            .map(|uri| uri.split('?').next().unwrap_or(uri).to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "/".to_string())
    }

    /// The session shared with the response.
    pub fn session(&self) -> &Session {
        &self.session
    }

    fn source(&self, input: Input) -> Option<&Map<String, Value>> {
        match input {
            Input::Get => Some(&self.get),
            Input::Post => Some(&self.post),
            Input::Request => Some(&self.request),
            Input::Server => Some(&self.server),
            Input::Files => Some(&self.files),
            Input::Session => None,
        }
    }

    fn lookup(&self, input: Input, id: &str) -> Option<Value> {
        match input {
            Input::Session => self.session.get(id),
            _ => self.source(input)?.get(id).cloned(),
        }
    }
}

fn apply_filter(value: Value, filter: Filter) -> Option<Value> {
    match filter {
        Filter::Raw => Some(value),
        Filter::Sanitize => Some(sanitize(value)),
        Filter::Int => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(Value::Number(n)),
            Value::String(s) => s.trim().parse::<i64>().ok().map(Value::from),
            _ => None,
        },
        Filter::Float => match value {
            Value::Number(n) => Some(Value::Number(n)),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            _ => None,
        },
        Filter::Bool => match value {
            Value::Bool(b) => Some(Value::Bool(b)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => Some(Value::Bool(true)),
                "0" | "false" | "off" | "no" | "" => Some(Value::Bool(false)),
                _ => None,
            },
            Value::Number(n) => match n.as_i64() {
                Some(1) => Some(Value::Bool(true)),
                Some(0) => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        },
    }
}

fn sanitize(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(escape_html(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize).collect()),
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, sanitize(v))).collect()),
        other => other,
    }
}

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

fn is_form(server: &Map<String, Value>) -> bool {
    server
        .get("CONTENT_TYPE")
        .and_then(Value::as_str)
        .is_some_and(|ct| ct.starts_with(FORM_CONTENT_TYPE))
}

/// Keeps a raw body only when it is a urlencoded form. Invalid UTF-8 is
/// replaced rather than rejected.
fn form_body(server: &Map<String, Value>, bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() || !is_form(server) {
        return None;
    }
    Some(String::from_utf8_lossy(bytes).into_owned())
}

/// Escapes `& < > " '` for safe inclusion in HTML.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    out
}
