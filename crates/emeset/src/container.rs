//! Dependency-injection container.
//!
//! The container maps service identifiers to lazy factories. A factory runs
//! the first time its service is requested through [`Container::get`]; the
//! result is cached and shared (`Rc<T>`) for the rest of the process.
//! [`Container::make`] runs a factory afresh and hands back an owned value,
//! which is how per-request services (`request`, `response`) are produced.
//!
//! # Default services
//!
//! | Identifier | Type |
//! |------------|------|
//! | `config` | [`Config`] |
//! | `env` | [`Env`] |
//! | `session` | [`Session`] |
//! | `request` | [`Request`] (use `make`) |
//! | `view` | [`ViewEngine`] |
//! | `response` | [`Response`] (use `make`) |
//! | `router` | `Box<dyn Router>` |
//! | `caller` | [`Caller<Action>`] |
//!
//! Any of them can be replaced with [`Container::set`]; replacing a service
//! drops its cached instance.
//!
//! ```rust
//! use emeset::{Config, Container};
//!
//! struct Mailer { from: String }
//!
//! let container = Container::new(Config::new());
//! container.set("mailer", |_c| Ok(Mailer { from: "noreply@example.com".into() }));
//!
//! let mailer = container.get::<Mailer>("mailer")?;
//! assert_eq!(mailer.from, "noreply@example.com");
//! # Ok::<(), emeset::ContainerError>(())
//! ```

use std::any::{type_name, Any};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::caller::Caller;
use crate::config::Config;
use crate::env::{self, Env};
use crate::error::ContainerError;
use crate::http::{Request, Response, Session};
use crate::middleware::Action;
use crate::routers::{HttpRouter, ParamRouter, Router};
use crate::views::{View, ViewEngine};

type Factory = Rc<dyn Fn(&Container) -> anyhow::Result<Box<dyn Any>>>;

/// Lazy service container.
pub struct Container {
    root: PathBuf,
    factories: RefCell<HashMap<String, Factory>>,
    instances: RefCell<HashMap<String, Rc<dyn Any>>>,
}

impl Container {
    /// Creates a container rooted at the current working directory.
    pub fn new(config: Config) -> Self {
        let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::with_root(config, root)
    }

    /// Creates a container for an explicit project root.
    ///
    /// The root is where `.env` / `.env.test` are read from and what relative
    /// template directories resolve against.
    pub fn with_root(config: Config, root: impl Into<PathBuf>) -> Self {
        let container = Self::empty(root);
        container.register_defaults(config);
        container
    }

    /// Creates a container with no services at all.
    pub fn empty(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            factories: RefCell::new(HashMap::new()),
            instances: RefCell::new(HashMap::new()),
        }
    }

    fn register_defaults(&self, config: Config) {
        self.instance("config", config);

        self.set("env", |c| Ok(Env::load(c.root(), env::is_testing())?));

        self.set("session", |_c| Ok(Session::new()));

        self.set("request", |c| {
            let session = c.get::<Session>("session")?;
            Ok(Request::from_cgi(Session::clone(&session))?)
        });

        self.set("view", |c| {
            let config = c.config()?;
            let dir = config.get_str("views").unwrap_or("views");
            Ok(ViewEngine::with_dir(c.root().join(dir)))
        });

        self.set("response", |c| {
            let engine = c.get::<ViewEngine>("view")?;
            let session = c.get::<Session>("session")?;
            Ok(Response::new(View::new(engine), Session::clone(&session)))
        });

        self.set("router", |c| {
            let config = c.config()?;
            let router: Box<dyn Router> = match config.get_str("router") {
                Some("param") => Box::new(ParamRouter::new()),
                _ => Box::new(HttpRouter::new()),
            };
            Ok(router)
        });

        self.set("caller", |_c| Ok(Caller::<Action>::new()));
    }

    /// Project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Registers (or replaces) a lazy service factory.
    pub fn set<T, F>(&self, id: impl Into<String>, factory: F)
    where
        T: 'static,
        F: Fn(&Container) -> anyhow::Result<T> + 'static,
    {
        let id = id.into();
        self.instances.borrow_mut().remove(&id);
        let factory: Factory = Rc::new(move |c: &Container| -> anyhow::Result<Box<dyn Any>> {
            Ok(Box::new(factory(c)?))
        });
        self.factories.borrow_mut().insert(id, factory);
    }

    /// Registers an already-built service.
    pub fn instance<T: 'static>(&self, id: impl Into<String>, value: T) {
        let id = id.into();
        self.factories.borrow_mut().remove(&id);
        self.instances.borrow_mut().insert(id, Rc::new(value));
    }

    /// Returns true if the identifier is registered.
    pub fn has(&self, id: &str) -> bool {
        self.instances.borrow().contains_key(id) || self.factories.borrow().contains_key(id)
    }

    /// Resolves a shared service, building it on first use.
    pub fn get<T: 'static>(&self, id: &str) -> Result<Rc<T>, ContainerError> {
        let cached = self.instances.borrow().get(id).cloned();
        if let Some(service) = cached {
            return downcast(id, service);
        }

        let factory = self.factory(id)?;
        tracing::debug!(service = id, "building service");
        let built = factory(self).map_err(|source| ContainerError::Factory {
            id: id.to_string(),
            source,
        })?;
        let service: Rc<dyn Any> = Rc::from(built);
        self.instances
            .borrow_mut()
            .insert(id.to_string(), Rc::clone(&service));
        downcast(id, service)
    }

    /// Runs a factory afresh and returns an owned value. Nothing is cached.
    pub fn make<T: 'static>(&self, id: &str) -> Result<T, ContainerError> {
        let factory = self.factory(id)?;
        let built = factory(self).map_err(|source| ContainerError::Factory {
            id: id.to_string(),
            source,
        })?;
        built
            .downcast::<T>()
            .map(|b| *b)
            .map_err(|_| ContainerError::TypeMismatch {
                id: id.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Shortcut for the `config` service.
    pub fn config(&self) -> Result<Rc<Config>, ContainerError> {
        self.get::<Config>("config")
    }

    /// Shortcut for the `env` service.
    pub fn env(&self) -> Result<Rc<Env>, ContainerError> {
        self.get::<Env>("env")
    }

    /// Shortcut for the `router` service.
    pub fn router(&self) -> Result<Rc<Box<dyn Router>>, ContainerError> {
        self.get::<Box<dyn Router>>("router")
    }

    /// Shortcut for the `caller` service.
    pub fn caller(&self) -> Result<Rc<Caller<Action>>, ContainerError> {
        self.get::<Caller<Action>>("caller")
    }

    fn factory(&self, id: &str) -> Result<Factory, ContainerError> {
        self.factories
            .borrow()
            .get(id)
            .cloned()
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))
    }
}

fn downcast<T: 'static>(id: &str, service: Rc<dyn Any>) -> Result<Rc<T>, ContainerError> {
    service
        .downcast::<T>()
        .map_err(|_| ContainerError::TypeMismatch {
            id: id.to_string(),
            expected: type_name::<T>(),
        })
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<String> = self.factories.borrow().keys().cloned().collect();
        ids.extend(self.instances.borrow().keys().cloned());
        ids.sort();
        ids.dedup();
        f.debug_struct("Container")
            .field("root", &self.root)
            .field("services", &ids)
            .finish()
    }
}
