//! Command-line dispatch for emeset applications.
//!
//! - [`Parser`] wraps a root `clap::Command`; [`Args`] exposes the parsed
//!   command, its options and trailing arguments.
//! - [`Cli`] maps command names to handlers. Handlers are native closures,
//!   `(class, method)` pairs or `"Class:method"` strings resolved through the
//!   same [`Caller`](emeset::Caller) mechanism the web routers use.
//! - [`Output`] is what handlers write to. [`ConsoleOutput`] renders it with
//!   `console` styles; tests can supply their own implementation.
//!
//! Handlers receive `(args, output, container)`:
//!
//! ```rust,no_run
//! use emeset::{Config, Container};
//! use emeset_cli::{command, register, Cli};
//!
//! let container = Container::new(Config::new());
//! register(&container);
//!
//! let cli = container.get::<Cli>("cli")?;
//! cli.add_command("greet", command(|args, out, _c| {
//!     let name = args.args().first().cloned().unwrap_or_else(|| "world".into());
//!     out.info(&format!("Hello, {}", name))?;
//!     Ok(())
//! }), "Prints a greeting");
//!
//! cli.run(std::env::args(), &container)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

mod cli;
mod error;
mod output;
mod parser;

pub use cli::{command, register, Cli, CommandFn};
pub use error::CliError;
pub use output::{Color, ConsoleOutput, Output, RealTerminal, TerminalIO};
pub use parser::{Args, Parser, ARGS_ID};
