//! Query-parameter router.

use serde_json::Value;

use super::{RouteKey, RouteTable, RouteTarget, Router};
use crate::http::{Input, Request};

/// Request parameter holding the route key.
pub const ROUTE_PARAM: &str = "r";

/// Matches the `r` request parameter (`index.cgi?r=home`).
///
/// A missing `r` is looked up as the empty key `""`. Methods are ignored.
#[derive(Debug, Default)]
pub struct ParamRouter {
    table: RouteTable,
}

impl ParamRouter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Router for ParamRouter {
    fn name(&self) -> &'static str {
        "param"
    }

    fn table(&self) -> &RouteTable {
        &self.table
    }

    fn request_key(&self, req: &Request) -> RouteKey {
        match req.get(Input::Request, ROUTE_PARAM) {
            Some(Value::String(s)) => RouteKey::from(s),
            Some(Value::Number(n)) => RouteKey::from(n.to_string()),
            _ => RouteKey::from(""),
        }
    }

    fn find(&self, req: &Request) -> Option<RouteTarget> {
        self.table.find(&self.request_key(req), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;
    use crate::http::{FakeInput, Response, Session};
    use crate::middleware::action;
    use crate::routers::RouterExt;
    use crate::views::{View, ViewEngine};
    use std::rc::Rc;

    fn body(text: &'static str) -> RouteTarget {
        RouteTarget::from(action(move |_req, mut res, _c| {
            res.set_body(text);
            Ok(res)
        }))
    }

    fn run(router: &ParamRouter, input: FakeInput) -> anyhow::Result<Response> {
        let container = Container::empty(".");
        let res = Response::new(View::new(Rc::new(ViewEngine::new())), Session::new());
        router.execute(&mut Request::fake(input), res, &container)
    }

    #[test]
    fn test_missing_param_uses_empty_key() {
        let router = ParamRouter::new();
        router.route("", body("default"));

        let res = run(&router, FakeInput::new()).unwrap();
        assert_eq!(res.body(), Some("default"));
    }

    #[test]
    fn test_specific_route() {
        let router = ParamRouter::new();
        router.route("home", body("home"));

        let res = run(&router, FakeInput::new().get("r", "home")).unwrap();
        assert_eq!(res.body(), Some("home"));
    }

    #[test]
    fn test_post_param_is_seen() {
        let router = ParamRouter::new();
        router.route("save", body("saved"));

        let res = run(&router, FakeInput::new().post("r", "save")).unwrap();
        assert_eq!(res.body(), Some("saved"));
    }

    #[test]
    fn test_unknown_param_uses_fallback() {
        let router = ParamRouter::new();
        router.route(0, body("fallback"));
        router.route("home", body("home"));

        let res = run(&router, FakeInput::new().get("r", "nowhere")).unwrap();
        assert_eq!(res.body(), Some("fallback"));
    }

    #[test]
    fn test_zero_param_reaches_fallback_key() {
        let router = ParamRouter::new();
        router.route(0, body("fallback"));

        let res = run(&router, FakeInput::new().get("r", "0")).unwrap();
        assert_eq!(res.body(), Some("fallback"));
    }

    #[test]
    fn test_method_is_ignored() {
        let router = ParamRouter::new();
        router.route("home", body("home"));

        let input = FakeInput::new()
            .get("r", "home")
            .server("REQUEST_METHOD", "DELETE");
        assert_eq!(run(&router, input).unwrap().body(), Some("home"));
    }
}
