//! Argument parsing on top of clap.
//!
//! [`Parser`] owns a root [`clap::Command`] whose subcommands are the
//! application's commands. Commands added with [`Parser::command`] accept any
//! number of trailing positional arguments, available through
//! [`Args::args`]. Commands that need options are declared in full with
//! [`Parser::command_with`].

use std::ffi::OsString;

use clap::error::ErrorKind;
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::error::CliError;

/// Id of the trailing positional argument on simple commands.
pub const ARGS_ID: &str = "args";

/// Root command builder.
#[derive(Debug, Clone)]
pub struct Parser {
    root: Command,
}

impl Parser {
    /// Creates a parser for a program called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            root: Command::new(name.into())
                .subcommand_required(true)
                .arg_required_else_help(true),
        }
    }

    /// Adds a command taking free positional arguments.
    pub fn command(&mut self, name: &str, description: &str) -> &mut Self {
        let cmd = Command::new(name.to_string())
            .about(description.to_string())
            .arg(
                Arg::new(ARGS_ID)
                    .action(ArgAction::Append)
                    .num_args(0..)
                    .trailing_var_arg(true)
                    .allow_hyphen_values(true),
            );
        self.command_with(cmd)
    }

    /// Adds a fully declared clap command.
    pub fn command_with(&mut self, cmd: Command) -> &mut Self {
        let root = std::mem::replace(&mut self.root, Command::new(""));
        self.root = root.subcommand(cmd);
        self
    }

    /// Names of the registered commands.
    pub fn commands(&self) -> Vec<String> {
        self.root
            .get_subcommands()
            .map(|c| c.get_name().to_string())
            .collect()
    }

    /// Parses a full argv, program name first.
    pub fn parse<I, T>(&self, argv: I) -> Result<Args, CliError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
        let matches = match self.root.clone().try_get_matches_from(&argv) {
            Ok(matches) => matches,
            Err(e) if e.kind() == ErrorKind::InvalidSubcommand => {
                let name = argv
                    .get(1)
                    .map(|arg| arg.to_string_lossy().into_owned())
                    .unwrap_or_default();
                return Err(CliError::UnknownCommand(name));
            }
            Err(e) => return Err(e.into()),
        };
        match matches.subcommand() {
            Some((name, sub)) => Ok(Args {
                command: name.to_string(),
                matches: sub.clone(),
            }),
            None => Err(CliError::UnknownCommand(String::new())),
        }
    }

    /// Root clap command, for help rendering.
    pub fn root(&self) -> &Command {
        &self.root
    }
}

/// Parsed arguments for one command.
#[derive(Debug, Clone)]
pub struct Args {
    command: String,
    matches: ArgMatches,
}

impl Args {
    /// Name of the command that was invoked.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Value of an option. Flags read as `"true"` when set.
    pub fn get_opt(&self, name: &str) -> Option<String> {
        if let Ok(Some(value)) = self.matches.try_get_one::<String>(name) {
            return Some(value.clone());
        }
        match self.matches.try_get_one::<bool>(name) {
            Ok(Some(true)) => Some("true".to_string()),
            _ => None,
        }
    }

    /// Value of an option, or `default`.
    pub fn get_opt_or(&self, name: &str, default: &str) -> String {
        self.get_opt(name).unwrap_or_else(|| default.to_string())
    }

    /// True if a flag was passed.
    pub fn get_flag(&self, name: &str) -> bool {
        matches!(self.matches.try_get_one::<bool>(name), Ok(Some(true)))
    }

    /// Trailing positional arguments.
    pub fn args(&self) -> Vec<String> {
        self.matches
            .try_get_many::<String>(ARGS_ID)
            .ok()
            .flatten()
            .map(|values| values.cloned().collect())
            .unwrap_or_default()
    }

    /// Underlying clap matches.
    pub fn matches(&self) -> &ArgMatches {
        &self.matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> Parser {
        let mut parser = Parser::new("app");
        parser.command("hello", "Says hello");
        parser.command_with(
            Command::new("serve")
                .about("Starts the server")
                .arg(Arg::new("port").long("port").short('p'))
                .arg(Arg::new("verbose").long("verbose").action(ArgAction::SetTrue)),
        );
        parser
    }

    #[test]
    fn test_parse_simple_command() {
        let args = parser().parse(["app", "hello", "world", "again"]).unwrap();
        assert_eq!(args.command(), "hello");
        assert_eq!(args.args(), vec!["world", "again"]);
    }

    #[test]
    fn test_simple_command_without_args() {
        let args = parser().parse(["app", "hello"]).unwrap();
        assert!(args.args().is_empty());
    }

    #[test]
    fn test_options_and_flags() {
        let args = parser()
            .parse(["app", "serve", "--port", "8080", "--verbose"])
            .unwrap();
        assert_eq!(args.command(), "serve");
        assert_eq!(args.get_opt("port").as_deref(), Some("8080"));
        assert_eq!(args.get_opt("verbose").as_deref(), Some("true"));
        assert!(args.get_flag("verbose"));
        assert!(args.args().is_empty());
    }

    #[test]
    fn test_missing_option_uses_default() {
        let args = parser().parse(["app", "serve"]).unwrap();
        assert_eq!(args.get_opt("port"), None);
        assert_eq!(args.get_opt_or("port", "80"), "80");
        assert_eq!(args.get_opt("nonexistent"), None);
        assert!(!args.get_flag("verbose"));
    }

    #[test]
    fn test_unknown_command() {
        let err = parser().parse(["app", "nope"]).unwrap_err();
        assert!(matches!(err, CliError::UnknownCommand(ref name) if name == "nope"));
    }

    #[test]
    fn test_bad_option_is_a_parse_error() {
        let err = parser().parse(["app", "serve", "--nope"]).unwrap_err();
        assert!(matches!(err, CliError::Parse(_)));
    }

    #[test]
    fn test_commands_listed() {
        assert_eq!(parser().commands(), vec!["hello", "serve"]);
    }
}
