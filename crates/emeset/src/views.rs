//! Template views.
//!
//! A [`ViewEngine`] owns the template environment and is shared by every
//! response. A [`View`] is per response: it accumulates the values a
//! controller sets, remembers which template to render and falls back to a
//! JSON encoding of those values when there is no template.
//!
//! Templates are [MiniJinja](minijinja) templates. The engine loads them by
//! name from its template directory; inline templates can be added with
//! [`ViewEngine::add_template`].
//!
//! ```rust
//! use std::rc::Rc;
//! use emeset::views::{View, ViewEngine};
//!
//! let mut engine = ViewEngine::new();
//! engine.add_template("hello.html", "Hola, {{ name }}!").unwrap();
//!
//! let mut view = View::new(Rc::new(engine));
//! view.set("name", "Món");
//! view.set_template("hello.html");
//! assert_eq!(view.render().unwrap(), "Hola, Món!");
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use minijinja::Environment;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ViewError;

/// Key selecting every value in [`View::json`].
pub const ALL_KEYS: &str = "*";

/// Shared template environment.
pub struct ViewEngine {
    env: Environment<'static>,
    dir: Option<PathBuf>,
}

impl ViewEngine {
    /// Creates an engine with inline templates only.
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
            dir: None,
        }
    }

    /// Creates an engine loading templates from `dir`.
    ///
    /// A directory that does not exist is not an error; lookups simply fail
    /// with [`ViewError::TemplateNotFound`].
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let mut env = Environment::new();
        if dir.is_dir() {
            env.set_loader(minijinja::path_loader(&dir));
        } else {
            tracing::debug!(dir = %dir.display(), "template directory not found");
        }
        Self {
            env,
            dir: Some(dir),
        }
    }

    /// Registers an inline template.
    pub fn add_template(&mut self, name: &str, source: &str) -> Result<(), ViewError> {
        self.env
            .add_template_owned(name.to_string(), source.to_string())?;
        Ok(())
    }

    /// Template directory, if any.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Returns true if `name` can be loaded.
    pub fn has_template(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }

    /// Renders a named template with `values` as its context.
    pub fn render(&self, name: &str, values: &Map<String, Value>) -> Result<String, ViewError> {
        let tmpl = self.env.get_template(name)?;
        Ok(tmpl.render(minijinja::Value::from_serialize(values))?)
    }

    /// Mutable access to the MiniJinja environment for filters and globals.
    pub fn environment_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }
}

impl Default for ViewEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ViewEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewEngine").field("dir", &self.dir).finish()
    }
}

/// Values and template for one response.
#[derive(Debug, Clone)]
pub struct View {
    values: Map<String, Value>,
    template: Option<String>,
    engine: Rc<ViewEngine>,
}

impl View {
    pub fn new(engine: Rc<ViewEngine>) -> Self {
        Self {
            values: Map::new(),
            template: None,
            engine,
        }
    }

    /// Sets a value for the template (or the JSON fallback).
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Sets any serializable value.
    pub fn set_serialized<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<(), ViewError> {
        self.values.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Values set so far, in insertion order.
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn set_template(&mut self, name: impl Into<String>) {
        self.template = Some(name.into());
    }

    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    pub fn has_template(&self) -> bool {
        self.template.is_some()
    }

    /// Compact JSON of the selected keys.
    ///
    /// `["*"]` selects every value. Otherwise only the listed keys that were
    /// set are included, in the order they were set.
    pub fn json(&self, keys: &[&str]) -> Result<String, ViewError> {
        if keys.contains(&ALL_KEYS) {
            return Ok(serde_json::to_string(&self.values)?);
        }
        let selected: Map<String, Value> = self
            .values
            .iter()
            .filter(|(k, _)| keys.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(serde_json::to_string(&selected)?)
    }

    /// Renders the template, or all values as JSON when there is none.
    pub fn render(&self) -> Result<String, ViewError> {
        match &self.template {
            Some(name) => self.engine.render(name, &self.values),
            None => self.json(&[ALL_KEYS]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn view() -> View {
        View::new(Rc::new(ViewEngine::new()))
    }

    #[test]
    fn test_set_stores_values() {
        let mut view = view();
        view.set("title", "Hola");
        view.set("message", "Món");

        let expected = json!({"title": "Hola", "message": "Món"});
        assert_eq!(Value::Object(view.values().clone()), expected);
    }

    #[test]
    fn test_has_template() {
        let mut view = view();
        assert!(!view.has_template());
        view.set_template("index.html");
        assert!(view.has_template());
        assert_eq!(view.template(), Some("index.html"));
    }

    #[test]
    fn test_json_all_values() {
        let mut view = view();
        view.set("a", 1);
        view.set("b", 2);
        assert_eq!(view.json(&["*"]).unwrap(), r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn test_json_selected_keys() {
        let mut view = view();
        view.set("a", 1);
        view.set("b", 2);
        assert_eq!(view.json(&["b"]).unwrap(), r#"{"b":2}"#);
        assert_eq!(view.json(&["missing"]).unwrap(), "{}");
    }

    #[test]
    fn test_set_serialized() {
        #[derive(Serialize)]
        struct User {
            name: &'static str,
        }

        let mut view = view();
        view.set_serialized("user", &User { name: "dani" }).unwrap();
        assert_eq!(view.json(&["*"]).unwrap(), r#"{"user":{"name":"dani"}}"#);
    }

    #[test]
    fn test_render_missing_template() {
        let mut view = view();
        view.set_template("nope.html");
        assert!(matches!(view.render(), Err(ViewError::TemplateNotFound(_))));
    }

    #[test]
    fn test_with_dir_loads_templates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>{{ title }}</h1>").unwrap();

        let engine = ViewEngine::with_dir(dir.path());
        assert!(engine.has_template("index.html"));

        let mut view = View::new(Rc::new(engine));
        view.set("title", "Hola");
        view.set_template("index.html");
        assert_eq!(view.render().unwrap(), "<h1>Hola</h1>");
    }

    #[test]
    fn test_with_missing_dir() {
        let engine = ViewEngine::with_dir("/definitely/not/here");
        assert!(!engine.has_template("index.html"));
    }
}
