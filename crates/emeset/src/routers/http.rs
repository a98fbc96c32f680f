//! Path and method router.

use super::{Method, RouteKey, RouteTable, RouteTarget, Router};
use crate::http::Request;

/// Matches `REQUEST_URI` (without its query string) and `REQUEST_METHOD`.
///
/// A path registered only for other methods counts as not allowed and is
/// served by the fallback route.
#[derive(Debug, Default)]
pub struct HttpRouter {
    table: RouteTable,
}

impl HttpRouter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Router for HttpRouter {
    fn name(&self) -> &'static str {
        "http"
    }

    fn table(&self) -> &RouteTable {
        &self.table
    }

    fn request_key(&self, req: &Request) -> RouteKey {
        RouteKey::from(req.path())
    }

    fn find(&self, req: &Request) -> Option<RouteTarget> {
        self.table
            .find(&self.request_key(req), Method::parse(&req.method()))
    }
}
