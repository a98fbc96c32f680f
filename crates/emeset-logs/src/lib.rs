//! # emeset-logs
//!
//! Application logging for emeset projects.
//!
//! [`Log::do_log`] records a message under a context and a level, attributed
//! to the current user. Entries go to one of two places:
//!
//! - daily files under `<root>/Log/` ([`FileSink`]), the default
//! - a MySQL `logs` table ([`MySqlSink`]) when a database sink is given
//!
//! Either destination can be reached directly or through a scoped `tracing`
//! subscriber. The choice comes from the `LOG_USE_TRACING` env variable, or
//! from whether the project's `Cargo.toml` depends on `tracing`; see
//! [`flag`].
//!
//! Levels are the usual syslog names, see [`Level`]. Users resolve to
//! `cron`, an admin's nickname, `user` or `guest`; see [`user::resolve`].

pub mod flag;
pub mod layer;
pub mod user;

mod error;
mod file;
mod level;
mod log;
mod mysql;
mod sink;

pub use error::LogError;
pub use file::{FileSink, LOG_DIR};
pub use level::Level;
pub use log::{register, Log, DB_SERVICE};
pub use mysql::MySqlSink;
pub use sink::{LogRecord, LogSink, MemorySink};
