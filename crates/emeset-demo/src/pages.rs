//! Guestbook pages.

use std::rc::Rc;

use emeset::http::{Filter, Input, Request, Response};
use emeset::middleware::{action, middleware, Action, MiddlewareFn, Next};
use emeset::{Class, Container, Emeset, RouteTarget};
use emeset_logs::Log;
use serde_json::Value;

/// Session key holding the signed names.
pub const GUESTS: &str = "guests";

pub struct Pages {
    title: String,
}

impl Pages {
    fn new(container: &Container) -> anyhow::Result<Self> {
        let config = container.config()?;
        Ok(Self {
            title: config.get_str("title").unwrap_or("Guestbook").to_string(),
        })
    }

    fn home(&self, req: &mut Request, res: Response) -> anyhow::Result<Response> {
        Ok(self.page(res, guests(req)))
    }

    fn page(&self, mut res: Response, list: Vec<Value>) -> Response {
        res.set("title", self.title.as_str());
        res.set(GUESTS, list);
        res.set_template("index.html");
        res
    }

    /// Adds a signature and answers with the updated page.
    ///
    /// The session only lasts for the current request, so the list is
    /// rendered here rather than after a redirect that would lose it.
    fn sign(&self, req: &mut Request, mut res: Response) -> anyhow::Result<Response> {
        let name = req
            .get_with(Input::Post, "name", Filter::Raw)
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let mut list = guests(req);
        list.push(Value::String(name));
        res.set_session(GUESTS, list.clone());
        Ok(self.page(res, list))
    }

    fn api(&self, req: &mut Request, mut res: Response) -> anyhow::Result<Response> {
        let list = guests(req);
        res.set("title", self.title.as_str());
        res.set("count", list.len());
        res.set(GUESTS, list);
        res.set_json(&[GUESTS, "count"]);
        Ok(res)
    }
}

fn guests(req: &Request) -> Vec<Value> {
    req.get(Input::Session, GUESTS)
        .and_then(|v| v.as_array().cloned())
        .unwrap_or_default()
}

fn bind(f: fn(&Pages, &mut Request, Response) -> anyhow::Result<Response>) -> impl Fn(Rc<Pages>) -> Rc<Action> {
    move |pages: Rc<Pages>| -> Rc<Action> {
        action(move |req: &mut Request, res: Response, _c: &Container| f(&pages, req, res))
    }
}

/// Rejects sign-ups without a name.
pub fn require_name() -> Rc<MiddlewareFn> {
    middleware(|req, mut res, c, next: Next<'_>| {
        let missing = req
            .get(Input::Post, "name")
            .and_then(|v| v.as_str().map(|s| s.trim().is_empty()))
            .unwrap_or(true);
        if missing {
            res.set_status(400);
            res.set("error", "name is required");
            res.set_json(&["error"]);
            return Ok(res);
        }
        next.run(req, res, c)
    })
}

/// Logs every request once the rest of the chain has run.
pub fn access_log() -> Rc<MiddlewareFn> {
    middleware(|req, res, c, next: Next<'_>| {
        let method = req.method();
        let path = req.path();
        let res = next.run(req, res, c)?;

        let line = format!("{} {} -> {}", method, path, res.status());
        let logged = c
            .get::<Log>("log")
            .map_err(anyhow::Error::from)
            .and_then(|log| Ok(log.do_log("http", &line, "info", false)?));
        if let Err(e) = logged {
            tracing::warn!(error = %e, "access log failed");
        }
        Ok(res)
    })
}

/// Registers the `Pages` class and the guestbook routes.
pub fn routes(app: &Emeset) -> anyhow::Result<()> {
    app.container().caller()?.class(
        "Pages",
        Class::new(Pages::new)
            .method("home", bind(Pages::home))
            .method("sign", bind(Pages::sign))
            .method("api", bind(Pages::api)),
    );

    app.get("/", RouteTarget::chain(vec![access_log()], "Pages:home"));
    app.post(
        "/sign",
        RouteTarget::chain(vec![access_log(), require_name()], ["Pages", "sign"]),
    );
    app.get("/api/guests", "Pages:api");
    app.route(
        0,
        action(|_req, mut res, _c| {
            res.set_status(404);
            res.set_body("Not Found");
            Ok(res)
        }),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use emeset::http::FakeInput;
    use emeset::Config;

    fn app(input: FakeInput) -> Emeset {
        let root = env!("CARGO_MANIFEST_DIR");
        let container = Container::with_root(Config::new().set("title", "Signatures"), root);
        let request = Rc::new(input);
        container.set("request", move |_c| Ok(Request::fake(FakeInput::clone(&request))));
        container.set("log", |_c| {
            let tmp = std::env::temp_dir().join("emeset-demo-tests");
            Ok(Log::new(None).with_root(tmp).with_library(false))
        });
        let app = Emeset::new(container).unwrap();
        routes(&app).unwrap();
        app
    }

    #[test]
    fn test_home_renders_guests() {
        let app = app(
            FakeInput::new()
                .server("REQUEST_METHOD", "GET")
                .server("REQUEST_URI", "/")
                .session(GUESTS, serde_json::json!(["Ada", "<b>Linus</b>"])),
        );
        let html = app.handle().unwrap().render().unwrap();
        assert!(html.contains("<title>Signatures</title>"));
        assert!(html.contains("<li>Ada</li>"));
        assert!(html.contains("&lt;b&gt;Linus"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_sign_shows_new_name_in_same_response() {
        let app = app(
            FakeInput::new()
                .server("REQUEST_METHOD", "POST")
                .server("REQUEST_URI", "/sign")
                .session(GUESTS, serde_json::json!(["Ada"]))
                .post("name", "Grace"),
        );
        let res = app.handle().unwrap();
        assert!(!res.is_redirect());
        assert_eq!(res.session().get(GUESTS), Some(serde_json::json!(["Ada", "Grace"])));

        let html = res.render().unwrap();
        assert!(html.contains("<li>Ada</li>"));
        assert!(html.contains("<li>Grace</li>"));
    }

    #[test]
    fn test_sign_without_name_is_rejected() {
        let app = app(
            FakeInput::new()
                .server("REQUEST_METHOD", "POST")
                .server("REQUEST_URI", "/sign"),
        );
        let res = app.handle().unwrap();
        assert_eq!(res.status(), 400);
        assert_eq!(res.render().unwrap(), r#"{"error":"name is required"}"#);
    }

    #[test]
    fn test_api_lists_guests_as_json() {
        let app = app(
            FakeInput::new()
                .server("REQUEST_URI", "/api/guests")
                .session(GUESTS, serde_json::json!(["Ada"])),
        );
        let res = app.handle().unwrap();
        assert_eq!(res.render().unwrap(), r#"{"count":1,"guests":["Ada"]}"#);
    }

    #[test]
    fn test_unknown_path_is_404() {
        let app = app(FakeInput::new().server("REQUEST_URI", "/nope"));
        let res = app.handle().unwrap();
        assert_eq!(res.status(), 404);
        assert_eq!(res.render().unwrap(), "Not Found");
    }
}
