//! HTTP response builder.
//!
//! Controllers receive a [`Response`] by value and return it. What ends up on
//! the wire is decided by [`Response::render`]:
//!
//! 1. a redirect renders as an empty body,
//! 2. an explicit body is returned as-is,
//! 3. JSON output selected with [`Response::set_json`],
//! 4. the view template, when one is set,
//! 5. otherwise compact JSON of every value set on the view.

use std::io::Write;

use serde_json::Value;

use super::session::Session;
use crate::error::ViewError;
use crate::views::{View, ALL_KEYS};

/// The response under construction.
#[derive(Debug, Clone)]
pub struct Response {
    view: View,
    body: Option<String>,
    header: Option<String>,
    redirect: bool,
    json_keys: Option<Vec<String>>,
    status: u16,
    session: Session,
}

impl Response {
    pub fn new(view: View, session: Session) -> Self {
        Self {
            view,
            body: None,
            header: None,
            redirect: false,
            json_keys: None,
            status: 200,
            session,
        }
    }

    /// Sets a view value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.view.set(key, value);
    }

    pub fn set_template(&mut self, name: impl Into<String>) {
        self.view.set_template(name);
    }

    /// Replaces template rendering with a literal body.
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = Some(body.into());
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Marks the response as a redirect carrying a raw header line,
    /// e.g. `"Location: /login"`.
    pub fn redirect(&mut self, header: impl Into<String>) {
        self.header = Some(header.into());
        self.redirect = true;
    }

    pub fn is_redirect(&self) -> bool {
        self.redirect
    }

    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    /// Stores a session value.
    pub fn set_session(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.session.set(key, value);
    }

    /// Removes a session value.
    pub fn unset_session(&mut self, key: &str) {
        self.session.remove(key);
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Renders view values as JSON. An empty `keys` slice selects all.
    pub fn set_json(&mut self, keys: &[&str]) {
        let keys = if keys.is_empty() { &[ALL_KEYS][..] } else { keys };
        self.json_keys = Some(keys.iter().map(|k| k.to_string()).collect());
    }

    pub fn is_json(&self) -> bool {
        self.json_keys.is_some()
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut View {
        &mut self.view
    }

    /// Produces the response body.
    pub fn render(&self) -> Result<String, ViewError> {
        if self.redirect {
            return Ok(String::new());
        }
        if let Some(body) = &self.body {
            return Ok(body.clone());
        }
        if let Some(keys) = &self.json_keys {
            let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
            return self.view.json(&keys);
        }
        self.view.render()
    }

    /// Content type implied by what [`render`](Self::render) produces.
    pub fn content_type(&self) -> &'static str {
        if self.body.is_none() && (self.json_keys.is_some() || !self.view.has_template()) {
            "application/json"
        } else {
            "text/html; charset=utf-8"
        }
    }

    /// Writes a CGI response: header lines, a blank line, then the body.
    pub fn write_to<W: Write>(&self, mut out: W) -> anyhow::Result<()> {
        let body = self.render()?;
        if self.redirect {
            writeln!(out, "Status: 302 Found")?;
            if let Some(header) = &self.header {
                writeln!(out, "{}", header)?;
            }
        } else {
            writeln!(out, "Status: {}", self.status)?;
            writeln!(out, "Content-Type: {}", self.content_type())?;
        }
        writeln!(out)?;
        out.write_all(body.as_bytes())?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::ViewEngine;
    use serde_json::json;
    use std::rc::Rc;

    fn response() -> Response {
        let mut engine = ViewEngine::new();
        engine.add_template("hello.html", "Hola {{ name }}").unwrap();
        Response::new(View::new(Rc::new(engine)), Session::new())
    }

    #[test]
    fn test_set_delegates_to_view() {
        let mut res = response();
        res.set("title", "Hola");
        assert_eq!(res.view().values().get("title"), Some(&json!("Hola")));
    }

    #[test]
    fn test_session_mutation() {
        let session = Session::new();
        session.set("stale", true);
        let mut res = Response::new(View::new(Rc::new(ViewEngine::new())), session.clone());

        res.set_session("user", "admin");
        res.unset_session("stale");

        assert_eq!(session.get("user"), Some(json!("admin")));
        assert!(!session.contains("stale"));
    }

    #[test]
    fn test_redirect_sets_header_and_flag() {
        let mut res = response();
        res.redirect("Location: /home");
        assert!(res.is_redirect());
        assert_eq!(res.header(), Some("Location: /home"));
    }

    #[test]
    fn test_render_precedence() {
        let mut res = response();
        res.set("name", "Dani");
        assert_eq!(res.render().unwrap(), r#"{"name":"Dani"}"#);

        res.set_template("hello.html");
        assert_eq!(res.render().unwrap(), "Hola Dani");

        res.set_json(&[]);
        assert_eq!(res.render().unwrap(), r#"{"name":"Dani"}"#);

        res.set_body("Custom body");
        assert_eq!(res.render().unwrap(), "Custom body");

        res.redirect("Location: /home");
        assert_eq!(res.render().unwrap(), "");
    }

    #[test]
    fn test_set_json_filters_keys() {
        let mut res = response();
        res.set("a", 1);
        res.set("b", 2);
        res.set_json(&["b"]);
        assert_eq!(res.render().unwrap(), r#"{"b":2}"#);
        assert_eq!(res.content_type(), "application/json");
    }

    #[test]
    fn test_write_to_plain() {
        let mut res = response();
        res.set_body("ok");
        res.set_status(201);

        let mut out = Vec::new();
        res.write_to(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Status: 201\nContent-Type: text/html; charset=utf-8\n\nok"
        );
    }

    #[test]
    fn test_write_to_redirect() {
        let mut res = response();
        res.redirect("Location: /login");

        let mut out = Vec::new();
        res.write_to(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Status: 302 Found\nLocation: /login\n\n"
        );
    }
}
