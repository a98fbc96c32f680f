//! Controller and middleware chaining.
//!
//! A controller is an [`Action`]: it takes the request, the response and the
//! container, and returns the (possibly modified) response. A middleware is a
//! [`MiddlewareFn`]: it additionally receives a [`Next`] continuation bound to
//! the rest of the chain.
//!
//! A middleware decides where the rest of the chain runs relative to its own
//! logic:
//!
//! ```rust
//! use emeset::middleware::{self, Target};
//!
//! let auth = middleware::middleware(|req, res, c, next| {
//!     // before
//!     let res = next.run(req, res, c)?;
//!     // after
//!     Ok(res)
//! });
//! let controller = middleware::action(|_req, mut res, _c| {
//!     res.set_body("ok");
//!     Ok(res)
//! });
//!
//! let target = Target::Chain(vec![auth], controller);
//! ```
//!
//! [`Next`] is consumed by [`Next::run`], so the remainder of a chain runs at
//! most once per middleware. A middleware that never calls it short-circuits
//! the chain and its returned response is final.

use std::fmt;
use std::rc::Rc;

use crate::container::Container;
use crate::http::{Request, Response};

/// Controller signature.
pub type Action = dyn Fn(&mut Request, Response, &Container) -> anyhow::Result<Response>;

/// Middleware signature.
pub type MiddlewareFn =
    dyn Fn(&mut Request, Response, &Container, Next<'_>) -> anyhow::Result<Response>;

/// Wraps a closure as a shareable controller.
pub fn action<F>(f: F) -> Rc<Action>
where
    F: Fn(&mut Request, Response, &Container) -> anyhow::Result<Response> + 'static,
{
    Rc::new(f)
}

/// Wraps a closure as a shareable middleware.
pub fn middleware<F>(f: F) -> Rc<MiddlewareFn>
where
    F: Fn(&mut Request, Response, &Container, Next<'_>) -> anyhow::Result<Response> + 'static,
{
    Rc::new(f)
}

/// What a route executes.
#[derive(Clone)]
pub enum Target {
    /// A plain controller.
    Controller(Rc<Action>),
    /// Middleware in order, terminated by a controller.
    Chain(Vec<Rc<MiddlewareFn>>, Rc<Action>),
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Controller(_) => f.write_str("Controller"),
            Target::Chain(layers, _) => write!(f, "Chain({} middleware)", layers.len()),
        }
    }
}

impl From<Rc<Action>> for Target {
    fn from(controller: Rc<Action>) -> Self {
        Target::Controller(controller)
    }
}

/// Continuation over the rest of a middleware chain.
pub struct Next<'a> {
    layers: &'a [Rc<MiddlewareFn>],
    controller: &'a Action,
}

impl<'a> Next<'a> {
    /// Continuation running `layers` in order, then `controller`.
    pub fn new(layers: &'a [Rc<MiddlewareFn>], controller: &'a Action) -> Self {
        Self { layers, controller }
    }

    /// Middleware left before the controller.
    pub fn remaining(&self) -> usize {
        self.layers.len()
    }

    /// Runs the rest of the chain.
    pub fn run(
        self,
        req: &mut Request,
        res: Response,
        c: &Container,
    ) -> anyhow::Result<Response> {
        match self.layers.split_first() {
            Some((first, rest)) => first(req, res, c, Next::new(rest, self.controller)),
            None => (self.controller)(req, res, c),
        }
    }
}

/// Runs a target: a controller directly, or a chain through its middleware.
pub fn next(
    req: &mut Request,
    res: Response,
    c: &Container,
    target: &Target,
) -> anyhow::Result<Response> {
    match target {
        Target::Controller(controller) => controller(req, res, c),
        Target::Chain(layers, controller) => Next::new(layers, controller.as_ref()).run(req, res, c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{FakeInput, Session};
    use crate::views::{View, ViewEngine};
    use std::cell::RefCell;

    fn fixtures() -> (Request, Response, Container) {
        let req = Request::fake(FakeInput::new());
        let res = Response::new(View::new(Rc::new(ViewEngine::new())), Session::new());
        (req, res, Container::empty("."))
    }

    fn recorder() -> Rc<RefCell<Vec<String>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn wrap(log: &Rc<RefCell<Vec<String>>>, name: &'static str) -> Rc<MiddlewareFn> {
        let log = Rc::clone(log);
        middleware(move |req, res, c, next| {
            log.borrow_mut().push(format!("{}-before", name));
            let res = next.run(req, res, c)?;
            log.borrow_mut().push(format!("{}-after", name));
            Ok(res)
        })
    }

    fn controller(log: &Rc<RefCell<Vec<String>>>) -> Rc<Action> {
        let log = Rc::clone(log);
        action(move |_req, mut res, _c| {
            log.borrow_mut().push("controller".into());
            res.set_body("done");
            Ok(res)
        })
    }

    #[test]
    fn test_plain_controller() {
        let (mut req, res, c) = fixtures();
        let log = recorder();

        let res = next(&mut req, res, &c, &Target::Controller(controller(&log))).unwrap();

        assert_eq!(res.body(), Some("done"));
        assert_eq!(*log.borrow(), vec!["controller"]);
    }

    #[test]
    fn test_single_middleware_wraps_controller() {
        let (mut req, res, c) = fixtures();
        let log = recorder();
        let target = Target::Chain(vec![wrap(&log, "mw1")], controller(&log));

        next(&mut req, res, &c, &target).unwrap();

        assert_eq!(*log.borrow(), vec!["mw1-before", "controller", "mw1-after"]);
    }

    #[test]
    fn test_nested_chain_preserves_order() {
        let (mut req, res, c) = fixtures();
        let log = recorder();
        let target = Target::Chain(
            vec![wrap(&log, "outer"), wrap(&log, "inner")],
            controller(&log),
        );

        next(&mut req, res, &c, &target).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                "outer-before",
                "inner-before",
                "controller",
                "inner-after",
                "outer-after"
            ]
        );
    }

    #[test]
    fn test_middleware_can_short_circuit() {
        let (mut req, res, c) = fixtures();
        let log = recorder();
        let guard = middleware(|_req, mut res, _c, _next| {
            res.redirect("Location: /login");
            Ok(res)
        });
        let target = Target::Chain(vec![guard], controller(&log));

        let res = next(&mut req, res, &c, &target).unwrap();

        assert!(res.is_redirect());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_empty_chain_runs_controller() {
        let (mut req, res, c) = fixtures();
        let log = recorder();
        let target = Target::Chain(Vec::new(), controller(&log));

        next(&mut req, res, &c, &target).unwrap();
        assert_eq!(*log.borrow(), vec!["controller"]);
    }

    #[test]
    fn test_errors_propagate_through_chain() {
        let (mut req, res, c) = fixtures();
        let log = recorder();
        let failing = action(|_req, _res, _c| anyhow::bail!("controller failed"));
        let target = Target::Chain(vec![wrap(&log, "mw")], failing);

        let err = next(&mut req, res, &c, &target).unwrap_err();

        assert_eq!(err.to_string(), "controller failed");
        assert_eq!(*log.borrow(), vec!["mw-before"]);
    }

    #[test]
    fn test_middleware_sees_remaining_count() {
        let (mut req, res, c) = fixtures();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let probe = |seen: &Rc<RefCell<Vec<usize>>>| {
            let seen = Rc::clone(seen);
            middleware(move |req, res, c, next| {
                seen.borrow_mut().push(next.remaining());
                next.run(req, res, c)
            })
        };
        let target = Target::Chain(vec![probe(&seen), probe(&seen)], action(|_r, res, _c| Ok(res)));

        next(&mut req, res, &c, &target).unwrap();
        assert_eq!(*seen.borrow(), vec![1, 0]);
    }
}
