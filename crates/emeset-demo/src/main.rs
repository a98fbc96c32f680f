//! Guestbook: an emeset application served CGI-style.
//!
//! Run without arguments under a CGI-capable web server to serve the
//! guestbook. Run with arguments to use the maintenance commands:
//!
//! ```text
//! guestbook hello Ada
//! guestbook log "cache cleared" --level notice
//! guestbook check
//! ```
//!
//! Signatures live in the per-request session, so each page shows the
//! list posted with that request only.
//!
//! Set `RUST_LOG=debug` to see route resolution on stderr.

mod commands;
mod pages;

use emeset::{Config, Container, Emeset};
use emeset_cli::{Cli, CliError};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::IsTerminal::is_terminal(&std::io::stderr()))
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let root = env!("CARGO_MANIFEST_DIR");
    let config_path = std::path::Path::new(root).join("config.yaml");
    let config = if config_path.exists() {
        Config::from_path(&config_path)?
    } else {
        Config::new()
    };
    let container = Container::with_root(config, root);
    emeset_logs::register(&container);

    let argv: Vec<String> = std::env::args().collect();
    if argv.len() > 1 {
        return run_cli(argv, &container);
    }

    let app = Emeset::new(container)?;
    pages::routes(&app)?;
    app.run(std::io::stdout())
}

fn run_cli(argv: Vec<String>, container: &Container) -> anyhow::Result<()> {
    emeset_cli::register(container);
    let cli = container.get::<Cli>("cli")?;
    commands::register(&cli);

    match cli.run(argv, container) {
        Err(CliError::Parse(e)) => e.exit(),
        other => Ok(other?),
    }
}
