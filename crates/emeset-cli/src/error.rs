use thiserror::Error;

/// Errors raised while dispatching a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument parsing failed, or help/version was requested.
    ///
    /// Call [`clap::Error::exit`] to print the message with clap's formatting.
    #[error(transparent)]
    Parse(#[from] clap::Error),

    /// The parsed command has no registered handler.
    #[error("unknown command \"{0}\"")]
    UnknownCommand(String),

    /// A command was run from inside another command of the same `Cli`.
    #[error("command \"{0}\" started while another command holds the output")]
    Reentrant(String),

    /// The handler reference could not be resolved.
    #[error(transparent)]
    Caller(#[from] emeset::CallerError),

    /// The command ran and failed.
    #[error("command \"{name}\" failed: {source}")]
    Command {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}
