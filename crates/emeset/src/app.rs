//! Application facade.

use std::io::Write;
use std::rc::Rc;

use crate::container::Container;
use crate::error::ContainerError;
use crate::front_controller::FrontController;
use crate::http::Response;
use crate::routers::{Method, RouteKey, RouteTarget, Router, RouterExt};

/// An application: a container plus route registration shortcuts.
///
/// ```rust,no_run
/// use emeset::middleware::action;
/// use emeset::{Config, Container, Emeset};
///
/// let app = Emeset::new(Container::new(Config::new()))?;
/// app.get("/", action(|_req, mut res, _c| {
///     res.set("greeting", "Hola");
///     Ok(res)
/// }));
/// app.run(std::io::stdout())?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct Emeset {
    container: Container,
    router: Rc<Box<dyn Router>>,
}

impl Emeset {
    /// Wraps a container, resolving its `router` service.
    pub fn new(container: Container) -> Result<Self, ContainerError> {
        let router = container.router()?;
        Ok(Self { container, router })
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn router(&self) -> &dyn Router {
        &**self.router
    }

    /// Route for every method (or a parameter route with [`ParamRouter`](crate::routers::ParamRouter)).
    pub fn route(&self, key: impl Into<RouteKey>, target: impl Into<RouteTarget>) {
        self.router.route(key, target);
    }

    pub fn get(&self, key: impl Into<RouteKey>, target: impl Into<RouteTarget>) {
        self.router.method(Method::Get, key, target);
    }

    pub fn post(&self, key: impl Into<RouteKey>, target: impl Into<RouteTarget>) {
        self.router.method(Method::Post, key, target);
    }

    pub fn put(&self, key: impl Into<RouteKey>, target: impl Into<RouteTarget>) {
        self.router.method(Method::Put, key, target);
    }

    pub fn patch(&self, key: impl Into<RouteKey>, target: impl Into<RouteTarget>) {
        self.router.method(Method::Patch, key, target);
    }

    pub fn delete(&self, key: impl Into<RouteKey>, target: impl Into<RouteTarget>) {
        self.router.method(Method::Delete, key, target);
    }

    /// Dispatches the current request and returns the response.
    pub fn handle(&self) -> anyhow::Result<Response> {
        FrontController::dispatch(&self.container)
    }

    /// Dispatches the current request and writes a CGI response to `out`.
    ///
    /// Failures, including template errors at render time, are written as a
    /// bare `500` and returned.
    pub fn run<W: Write>(&self, mut out: W) -> anyhow::Result<()> {
        match self
            .handle()
            .and_then(|response| response.write_to(&mut out))
        {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::error!(error = %err, "request failed");
                write!(out, "Status: 500 Internal Server Error\nContent-Type: text/plain\n\n")?;
                out.flush()?;
                Err(err)
            }
        }
    }
}
