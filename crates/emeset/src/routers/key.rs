//! Route keys and HTTP methods.

use std::fmt;

/// Key a route is registered under.
///
/// Canonical integer strings are normalised to [`RouteKey::Index`], so
/// `"0"`, `0i32` and `0i64` all name the fallback route. Strings that merely
/// look numeric (`"05"`, `"+5"`, `" 5"`) stay paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RouteKey {
    Index(i64),
    Path(String),
}

/// The fallback route key.
pub const FALLBACK: RouteKey = RouteKey::Index(0);

impl RouteKey {
    pub fn parse(key: &str) -> Self {
        match key.parse::<i64>() {
            Ok(n) if n.to_string() == key => RouteKey::Index(n),
            _ => RouteKey::Path(key.to_string()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        *self == FALLBACK
    }
}

impl From<&str> for RouteKey {
    fn from(key: &str) -> Self {
        RouteKey::parse(key)
    }
}

impl From<String> for RouteKey {
    fn from(key: String) -> Self {
        RouteKey::parse(&key)
    }
}

impl From<i32> for RouteKey {
    fn from(key: i32) -> Self {
        RouteKey::Index(key.into())
    }
}

impl From<i64> for RouteKey {
    fn from(key: i64) -> Self {
        RouteKey::Index(key)
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteKey::Index(n) => write!(f, "{}", n),
            RouteKey::Path(p) => write!(f, "{:?}", p),
        }
    }
}

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    /// Parses a method name, ignoring case.
    pub fn parse(method: &str) -> Option<Self> {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "PATCH" => Some(Method::Patch),
            "DELETE" => Some(Method::Delete),
            "HEAD" => Some(Method::Head),
            "OPTIONS" => Some(Method::Options),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
