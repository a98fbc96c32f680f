//! A minimal MVC web framework.
//!
//! `emeset` wires a small set of pieces into a request lifecycle:
//!
//! - **Container**: lazy service registry ([`Container`])
//! - **HTTP wrappers**: [`Request`](http::Request) with filtered input reads and a
//!   fake constructor for tests, [`Response`](http::Response) with redirect, body,
//!   template and JSON output
//! - **Routers**: path + method ([`HttpRouter`](routers::HttpRouter)) or query
//!   parameter ([`ParamRouter`](routers::ParamRouter)), both falling back to key `0`
//! - **Middleware**: controllers wrapped by continuation-passing middleware
//! - **Caller**: `"Class:method"` and `(class, method)` handler references
//! - **Views**: MiniJinja templates with a JSON fallback
//!
//! # Lifecycle
//!
//! ```text
//! Container ─► FrontController ─► Router ─► Middleware… ─► Controller ─► Response::render
//! ```
//!
//! # Example
//!
//! ```rust
//! use emeset::http::{FakeInput, Request};
//! use emeset::middleware::action;
//! use emeset::{Config, Container, Emeset};
//!
//! let container = Container::with_root(Config::new().set("router", "param"), ".");
//! container.set("request", |_c| {
//!     Ok(Request::fake(FakeInput::new().get("r", "hello")))
//! });
//!
//! let app = Emeset::new(container)?;
//! app.route("hello", action(|_req, mut res, _c| {
//!     res.set("message", "Hola Món");
//!     Ok(res)
//! }));
//!
//! let response = app.handle()?;
//! assert_eq!(response.render()?, r#"{"message":"Hola Món"}"#);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod caller;
pub mod config;
pub mod container;
pub mod env;
pub mod error;
pub mod http;
pub mod middleware;
pub mod routers;
pub mod views;

mod app;
mod front_controller;

pub use app::Emeset;
pub use caller::{Caller, Class, HandlerRef};
pub use config::Config;
pub use container::Container;
pub use env::Env;
pub use error::{CallerError, ConfigError, ContainerError, RouterError, ViewError};
pub use front_controller::FrontController;
pub use middleware::{action, middleware, Action, MiddlewareFn, Next, Target};
pub use routers::{RouteKey, RouteTarget, Router, RouterExt};
