//! HTTP request and response wrappers.

mod query;
mod request;
mod response;
mod session;

pub use query::{decode_component, parse_query};
pub use request::{escape_html, FakeInput, Filter, Input, Request, RequestParts};
pub use response::Response;
pub use session::Session;
