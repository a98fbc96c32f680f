//! Request routing.
//!
//! Two strategies share one contract: find an exact match for the request in
//! the route table, or run the fallback route registered under key `0`.
//! There is no pattern matching.
//!
//! - [`HttpRouter`] matches the request path and method.
//! - [`ParamRouter`] matches the `r` request parameter (`?r=home`).
//!
//! Routes are registered through [`RouterExt`], which is implemented for
//! every router, including `dyn Router`:
//!
//! ```rust
//! use emeset::middleware::action;
//! use emeset::routers::{HttpRouter, RouterExt};
//!
//! let router = HttpRouter::new();
//! router.get("/", action(|_req, mut res, _c| {
//!     res.set_template("index.html");
//!     Ok(res)
//! }));
//! router.post("/login", "Auth:login");
//! router.get(0, ("Errors", "not_found"));
//! ```

mod http;
mod key;
mod param;

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::caller::HandlerRef;
use crate::container::Container;
use crate::error::RouterError;
use crate::http::{Request, Response};
use crate::middleware::{self, Action, MiddlewareFn, Target};

pub use self::http::HttpRouter;
pub use key::{Method, RouteKey, FALLBACK};
pub use param::ParamRouter;

/// A handler plus the middleware wrapping it.
#[derive(Clone)]
pub struct RouteTarget {
    middleware: Vec<Rc<MiddlewareFn>>,
    handler: HandlerRef<Action>,
}

impl RouteTarget {
    pub fn new(handler: impl Into<HandlerRef<Action>>) -> Self {
        Self {
            middleware: Vec::new(),
            handler: handler.into(),
        }
    }

    /// A handler wrapped by `middleware`, outermost first.
    pub fn chain(middleware: Vec<Rc<MiddlewareFn>>, handler: impl Into<HandlerRef<Action>>) -> Self {
        Self {
            middleware,
            handler: handler.into(),
        }
    }

    /// Appends a middleware inside the ones already present.
    pub fn with(mut self, middleware: Rc<MiddlewareFn>) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub fn handler(&self) -> &HandlerRef<Action> {
        &self.handler
    }

    pub fn middleware(&self) -> &[Rc<MiddlewareFn>] {
        &self.middleware
    }

    /// Resolves the handler reference into a runnable [`Target`].
    pub fn resolve(&self, container: &Container) -> anyhow::Result<Target> {
        let controller = match &self.handler {
            HandlerRef::Callable(controller) => Rc::clone(controller),
            other => container.caller()?.resolve(other, container)?,
        };
        if self.middleware.is_empty() {
            Ok(Target::Controller(controller))
        } else {
            Ok(Target::Chain(self.middleware.clone(), controller))
        }
    }
}

impl fmt::Debug for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTarget")
            .field("middleware", &self.middleware.len())
            .field("handler", &self.handler)
            .finish()
    }
}

impl From<Rc<Action>> for RouteTarget {
    fn from(controller: Rc<Action>) -> Self {
        RouteTarget::new(controller)
    }
}

impl From<HandlerRef<Action>> for RouteTarget {
    fn from(handler: HandlerRef<Action>) -> Self {
        RouteTarget::new(handler)
    }
}

impl From<&str> for RouteTarget {
    fn from(name: &str) -> Self {
        RouteTarget::new(name)
    }
}

impl From<String> for RouteTarget {
    fn from(name: String) -> Self {
        RouteTarget::new(name)
    }
}

impl From<(&str, &str)> for RouteTarget {
    fn from(pair: (&str, &str)) -> Self {
        RouteTarget::new(pair)
    }
}

impl From<[&str; 2]> for RouteTarget {
    fn from(pair: [&str; 2]) -> Self {
        RouteTarget::new(pair)
    }
}

#[derive(Debug, Clone)]
struct Route {
    method: Option<Method>,
    target: RouteTarget,
}

/// Routes keyed by [`RouteKey`], optionally restricted to one method.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: RefCell<HashMap<RouteKey, Vec<Route>>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route. Re-registering the same key and method replaces it.
    pub fn add(&self, method: Option<Method>, key: RouteKey, target: RouteTarget) {
        let mut routes = self.routes.borrow_mut();
        let entries = routes.entry(key).or_default();
        match entries.iter_mut().find(|r| r.method == method) {
            Some(existing) => existing.target = target,
            None => entries.push(Route { method, target }),
        }
    }

    /// Exact match on key, accepting routes for `method` or for any method.
    pub fn find(&self, key: &RouteKey, method: Option<Method>) -> Option<RouteTarget> {
        self.routes
            .borrow()
            .get(key)?
            .iter()
            .find(|r| r.method.is_none() || r.method == method)
            .map(|r| r.target.clone())
    }

    /// The route registered under key `0`, whatever its method.
    pub fn fallback(&self) -> Option<RouteTarget> {
        self.routes
            .borrow()
            .get(&FALLBACK)?
            .first()
            .map(|r| r.target.clone())
    }

    /// Returns true if any route uses `key`.
    pub fn contains(&self, key: &RouteKey) -> bool {
        self.routes.borrow().contains_key(key)
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.borrow().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A routing strategy.
pub trait Router {
    /// Strategy name, as used by the `router` config key.
    fn name(&self) -> &'static str;

    fn table(&self) -> &RouteTable;

    /// The key this request is looked up under.
    fn request_key(&self, req: &Request) -> RouteKey;

    /// Exact match for the request, ignoring the fallback.
    fn find(&self, req: &Request) -> Option<RouteTarget>;

    /// Registers a route.
    fn add(&self, method: Option<Method>, key: RouteKey, target: RouteTarget) {
        self.table().add(method, key, target);
    }

    /// Runs the matched route, or the fallback when nothing matches.
    fn execute(&self, req: &mut Request, res: Response, c: &Container) -> anyhow::Result<Response> {
        let target = match self.find(req) {
            Some(target) => {
                tracing::debug!(router = self.name(), method = %req.method(), path = %req.path(), "route matched");
                target
            }
            None => {
                let key = self.request_key(req);
                tracing::warn!(router = self.name(), method = %req.method(), key = %key, "no route matched, using fallback");
                self.table().fallback().ok_or_else(|| RouterError::NoRoute {
                    method: req.method(),
                    key: key.to_string(),
                })?
            }
        };
        let target = target.resolve(c)?;
        middleware::next(req, res, c, &target)
    }
}

impl<R: Router + ?Sized> Router for Box<R> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn table(&self) -> &RouteTable {
        (**self).table()
    }

    fn request_key(&self, req: &Request) -> RouteKey {
        (**self).request_key(req)
    }

    fn find(&self, req: &Request) -> Option<RouteTarget> {
        (**self).find(req)
    }

    fn add(&self, method: Option<Method>, key: RouteKey, target: RouteTarget) {
        (**self).add(method, key, target)
    }

    fn execute(&self, req: &mut Request, res: Response, c: &Container) -> anyhow::Result<Response> {
        (**self).execute(req, res, c)
    }
}

/// Registration helpers available on every router.
pub trait RouterExt: Router {
    /// Route for every method.
    fn route(&self, key: impl Into<RouteKey>, target: impl Into<RouteTarget>) {
        self.add(None, key.into(), target.into());
    }

    /// Alias of [`route`](RouterExt::route).
    fn any(&self, key: impl Into<RouteKey>, target: impl Into<RouteTarget>) {
        self.route(key, target);
    }

    /// Route restricted to `method`.
    fn method(&self, method: Method, key: impl Into<RouteKey>, target: impl Into<RouteTarget>) {
        self.add(Some(method), key.into(), target.into());
    }

    fn get(&self, key: impl Into<RouteKey>, target: impl Into<RouteTarget>) {
        self.method(Method::Get, key, target);
    }

    fn post(&self, key: impl Into<RouteKey>, target: impl Into<RouteTarget>) {
        self.method(Method::Post, key, target);
    }

    fn put(&self, key: impl Into<RouteKey>, target: impl Into<RouteTarget>) {
        self.method(Method::Put, key, target);
    }

    fn patch(&self, key: impl Into<RouteKey>, target: impl Into<RouteTarget>) {
        self.method(Method::Patch, key, target);
    }

    fn delete(&self, key: impl Into<RouteKey>, target: impl Into<RouteTarget>) {
        self.method(Method::Delete, key, target);
    }
}

impl<R: Router + ?Sized> RouterExt for R {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::action;

    fn named(body: &'static str) -> RouteTarget {
        RouteTarget::from(action(move |_req, mut res, _c| {
            res.set_body(body);
            Ok(res)
        }))
    }

    #[test]
    fn test_table_replaces_same_key_and_method() {
        let table = RouteTable::new();
        table.add(Some(Method::Get), "/a".into(), named("one"));
        table.add(Some(Method::Get), "/a".into(), named("two"));
        table.add(Some(Method::Post), "/a".into(), named("three"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_table_find_respects_method() {
        let table = RouteTable::new();
        table.add(Some(Method::Post), "/a".into(), named("post"));
        assert!(table.find(&"/a".into(), Some(Method::Get)).is_none());
        assert!(table.find(&"/a".into(), Some(Method::Post)).is_some());

        table.add(None, "/b".into(), named("any"));
        assert!(table.find(&"/b".into(), Some(Method::Delete)).is_some());
        assert!(table.find(&"/b".into(), None).is_some());
    }

    #[test]
    fn test_fallback_ignores_method() {
        let table = RouteTable::new();
        assert!(table.fallback().is_none());
        table.add(Some(Method::Get), 0.into(), named("default"));
        assert!(table.fallback().is_some());
        assert!(table.contains(&FALLBACK));
    }

    #[test]
    fn test_route_target_builders() {
        let mw = middleware::middleware(|req, res, c, next| next.run(req, res, c));
        let target = RouteTarget::new("Home:index").with(Rc::clone(&mw)).with(mw);
        assert_eq!(target.middleware().len(), 2);
        assert!(matches!(target.handler(), HandlerRef::Named(n) if n == "Home:index"));

        let pair = RouteTarget::from(["Home", "index"]);
        assert!(matches!(pair.handler(), HandlerRef::Method { class, .. } if class == "Home"));
    }
}
