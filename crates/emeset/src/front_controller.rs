//! Single entry point for web requests.

use crate::container::Container;
use crate::http::{Request, Response};
use crate::routers::Router;

/// Builds the request and response for one run and hands them to the router.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrontController;

impl FrontController {
    /// Makes fresh `request` and `response` services, then executes the
    /// `router` service.
    pub fn dispatch(container: &Container) -> anyhow::Result<Response> {
        let mut request = container.make::<Request>("request")?;
        let response = container.make::<Response>("response")?;
        let router = container.router()?;
        tracing::debug!(router = router.name(), method = %request.method(), path = %request.path(), "dispatching request");
        router.execute(&mut request, response, container)
    }
}
