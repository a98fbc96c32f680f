//! Handler reference resolution.
//!
//! Routes and CLI commands refer to their handlers in one of three ways:
//!
//! - a native callable (`Rc<H>`),
//! - a `(class, method)` pair,
//! - a `"Class:method"` string.
//!
//! Class references are resolved through a [`Caller`] registry. A [`Class`]
//! knows how to build an instance from the [`Container`] and which methods it
//! exposes; resolving a reference builds the instance and binds the method to
//! it, producing the same `Rc<H>` a native callable would.
//!
//! ```rust
//! use std::rc::Rc;
//! use emeset::caller::{Caller, Class, HandlerRef};
//! use emeset::Container;
//!
//! type Greet = dyn Fn() -> String;
//!
//! struct Greeter { name: String }
//!
//! let caller: Caller<Greet> = Caller::new();
//! caller.class(
//!     "Greeter",
//!     Class::new(|_c| Ok(Greeter { name: "Món".into() }))
//!         .method("hello", |g: Rc<Greeter>| -> Rc<Greet> {
//!             Rc::new(move || format!("Hola {}", g.name))
//!         }),
//! );
//!
//! let container = Container::empty(".");
//! let hello = caller.resolve(&HandlerRef::from("Greeter:hello"), &container)?;
//! assert_eq!(hello(), "Hola Món");
//! # Ok::<(), emeset::CallerError>(())
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::container::Container;
use crate::error::CallerError;

/// A reference to a handler of signature `H`.
pub enum HandlerRef<H: ?Sized> {
    /// A ready-to-call handler.
    Callable(Rc<H>),
    /// A method on a registered class.
    Method { class: String, method: String },
    /// A `"Class:method"` string, parsed on resolution.
    Named(String),
}

impl<H: ?Sized> Clone for HandlerRef<H> {
    fn clone(&self) -> Self {
        match self {
            HandlerRef::Callable(h) => HandlerRef::Callable(Rc::clone(h)),
            HandlerRef::Method { class, method } => HandlerRef::Method {
                class: class.clone(),
                method: method.clone(),
            },
            HandlerRef::Named(name) => HandlerRef::Named(name.clone()),
        }
    }
}

impl<H: ?Sized> fmt::Debug for HandlerRef<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerRef::Callable(_) => f.write_str("Callable"),
            HandlerRef::Method { class, method } => write!(f, "[{}, {}]", class, method),
            HandlerRef::Named(name) => write!(f, "{:?}", name),
        }
    }
}

impl<H: ?Sized> From<Rc<H>> for HandlerRef<H> {
    fn from(handler: Rc<H>) -> Self {
        HandlerRef::Callable(handler)
    }
}

impl<H: ?Sized> From<(&str, &str)> for HandlerRef<H> {
    fn from((class, method): (&str, &str)) -> Self {
        HandlerRef::Method {
            class: class.to_string(),
            method: method.to_string(),
        }
    }
}

impl<H: ?Sized> From<[&str; 2]> for HandlerRef<H> {
    fn from([class, method]: [&str; 2]) -> Self {
        HandlerRef::from((class, method))
    }
}

impl<H: ?Sized> From<&str> for HandlerRef<H> {
    fn from(name: &str) -> Self {
        HandlerRef::Named(name.to_string())
    }
}

impl<H: ?Sized> From<String> for HandlerRef<H> {
    fn from(name: String) -> Self {
        HandlerRef::Named(name)
    }
}

/// Splits `"Class:method"` at its last colon, so namespaced class names
/// such as `"App::Controllers::Home:index"` keep their path.
pub fn split_named(name: &str) -> Result<(&str, &str), CallerError> {
    match name.rsplit_once(':') {
        Some((class, method))
            if !class.is_empty() && !method.is_empty() && !class.ends_with(':') =>
        {
            Ok((class, method))
        }
        _ => Err(CallerError::Malformed(name.to_string())),
    }
}

type Binder<T, H> = Rc<dyn Fn(Rc<T>) -> Rc<H>>;
type Resolver<H> = Rc<dyn Fn(&Container, &str) -> Result<Rc<H>, CallerError>>;

/// A constructible class exposing handler methods.
pub struct Class<T, H: ?Sized> {
    ctor: Rc<dyn Fn(&Container) -> anyhow::Result<T>>,
    methods: HashMap<String, Binder<T, H>>,
}

impl<T: 'static, H: ?Sized + 'static> Class<T, H> {
    /// Declares a class built from the container.
    pub fn new<F>(ctor: F) -> Self
    where
        F: Fn(&Container) -> anyhow::Result<T> + 'static,
    {
        Self {
            ctor: Rc::new(ctor),
            methods: HashMap::new(),
        }
    }

    /// Exposes a method: `bind` turns an instance into a handler.
    pub fn method<F>(mut self, name: &str, bind: F) -> Self
    where
        F: Fn(Rc<T>) -> Rc<H> + 'static,
    {
        self.methods.insert(name.to_string(), Rc::new(bind));
        self
    }

    fn into_resolver(self, class: String) -> Resolver<H> {
        let Class { ctor, methods } = self;
        Rc::new(move |container: &Container, method: &str| {
            let bind = methods
                .get(method)
                .ok_or_else(|| CallerError::UnknownMethod {
                    class: class.clone(),
                    method: method.to_string(),
                })?;
            let instance = ctor(container).map_err(|source| CallerError::Construct {
                class: class.clone(),
                source,
            })?;
            Ok(bind(Rc::new(instance)))
        })
    }
}

/// Registry resolving [`HandlerRef`]s into handlers.
pub struct Caller<H: ?Sized> {
    classes: RefCell<HashMap<String, Resolver<H>>>,
}

impl<H: ?Sized + 'static> Caller<H> {
    pub fn new() -> Self {
        Self {
            classes: RefCell::new(HashMap::new()),
        }
    }

    /// Registers a class under `name`.
    pub fn class<T: 'static>(&self, name: &str, class: Class<T, H>) {
        self.classes
            .borrow_mut()
            .insert(name.to_string(), class.into_resolver(name.to_string()));
    }

    /// Returns true if a class is registered under `name`.
    pub fn has_class(&self, name: &str) -> bool {
        self.classes.borrow().contains_key(name)
    }

    /// Resolves a reference into a callable handler.
    ///
    /// Class references build a fresh instance on every resolution.
    pub fn resolve(&self, handler: &HandlerRef<H>, container: &Container) -> Result<Rc<H>, CallerError> {
        match handler {
            HandlerRef::Callable(h) => Ok(Rc::clone(h)),
            HandlerRef::Method { class, method } => self.bind(class, method, container),
            HandlerRef::Named(name) => {
                let (class, method) = split_named(name)?;
                self.bind(class, method, container)
            }
        }
    }

    fn bind(&self, class: &str, method: &str, container: &Container) -> Result<Rc<H>, CallerError> {
        let resolver = self
            .classes
            .borrow()
            .get(class)
            .cloned()
            .ok_or_else(|| CallerError::UnknownClass(class.to_string()))?;
        tracing::debug!(class, method, "resolving handler");
        resolver(container, method)
    }
}

impl<H: ?Sized + 'static> Default for Caller<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ?Sized> fmt::Debug for Caller<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.classes.borrow().keys().cloned().collect();
        names.sort();
        f.debug_struct("Caller").field("classes", &names).finish()
    }
}
