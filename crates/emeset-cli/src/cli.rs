//! Command registry and dispatch.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::OsString;
use std::rc::Rc;

use emeset::{Caller, Container, HandlerRef};

use crate::error::CliError;
use crate::output::{ConsoleOutput, Output};
use crate::parser::{Args, Parser};

/// Command handler signature.
pub type CommandFn = dyn Fn(&Args, &mut dyn Output, &Container) -> anyhow::Result<()>;

/// Wraps a closure as a shareable command handler.
pub fn command<F>(f: F) -> Rc<CommandFn>
where
    F: Fn(&Args, &mut dyn Output, &Container) -> anyhow::Result<()> + 'static,
{
    Rc::new(f)
}

/// Dispatches parsed command lines to registered handlers.
///
/// ```rust
/// use emeset::Container;
/// use emeset_cli::{command, Cli, ConsoleOutput, Parser};
///
/// let output = ConsoleOutput::new(Box::new(std::io::sink()), Box::new(emeset_cli::RealTerminal));
/// let cli = Cli::new(Parser::new("app"), Box::new(output));
/// cli.add_command("hello", command(|args, out, _c| {
///     out.success(&format!("Hola {}", args.args().join(" ")))?;
///     Ok(())
/// }), "Greets");
///
/// let container = Container::empty(".");
/// cli.run(["app", "hello", "Món"], &container)?;
/// # Ok::<(), emeset_cli::CliError>(())
/// ```
pub struct Cli {
    parser: RefCell<Parser>,
    actions: RefCell<HashMap<String, HandlerRef<CommandFn>>>,
    caller: Caller<CommandFn>,
    /// `None` while a command runs.
    output: RefCell<Option<Box<dyn Output>>>,
}

impl Cli {
    pub fn new(parser: Parser, output: Box<dyn Output>) -> Self {
        Self {
            parser: RefCell::new(parser),
            actions: RefCell::new(HashMap::new()),
            caller: Caller::new(),
            output: RefCell::new(Some(output)),
        }
    }

    /// Registers a command taking free positional arguments.
    pub fn add_command(
        &self,
        name: &str,
        handler: impl Into<HandlerRef<CommandFn>>,
        description: &str,
    ) {
        self.parser.borrow_mut().command(name, description);
        self.actions
            .borrow_mut()
            .insert(name.to_string(), handler.into());
    }

    /// Registers a fully declared clap command.
    pub fn add_clap_command(&self, cmd: clap::Command, handler: impl Into<HandlerRef<CommandFn>>) {
        let name = cmd.get_name().to_string();
        self.parser.borrow_mut().command_with(cmd);
        self.actions.borrow_mut().insert(name, handler.into());
    }

    /// Class registry for `"Class:method"` command handlers.
    pub fn caller(&self) -> &Caller<CommandFn> {
        &self.caller
    }

    /// Names of the registered commands.
    pub fn commands(&self) -> Vec<String> {
        self.parser.borrow().commands()
    }

    /// Parses `argv` (program name first) and runs the matching command.
    ///
    /// The output is lent to the handler for the duration of the call. A
    /// handler that runs another command on the same `Cli` gets
    /// [`CliError::Reentrant`].
    pub fn run<I, T>(&self, argv: I, container: &Container) -> Result<(), CliError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args = self.parser.borrow().parse(argv)?;
        let name = args.command().to_string();

        let handler = self
            .actions
            .borrow()
            .get(&name)
            .cloned()
            .ok_or_else(|| CliError::UnknownCommand(name.clone()))?;
        let call = self.caller.resolve(&handler, container)?;

        tracing::debug!(command = %name, "running command");
        let mut output = self
            .output
            .borrow_mut()
            .take()
            .ok_or_else(|| CliError::Reentrant(name.clone()))?;
        let result = call(&args, &mut *output, container);
        *self.output.borrow_mut() = Some(output);
        result.map_err(|source| CliError::Command { name, source })
    }
}

/// Registers the `cli.output` and `cli` services.
///
/// `cli.output` builds a stdout [`ConsoleOutput`]; replace it to capture
/// output. `cli` is named after the `cli.name` config key (default
/// `emeset`).
pub fn register(container: &Container) {
    container.set("cli.output", |_c| {
        Ok(Box::new(ConsoleOutput::stdout()) as Box<dyn Output>)
    });
    container.set("cli", |c| {
        let name = c
            .config()
            .ok()
            .and_then(|config| config.get_str("cli.name").map(str::to_string))
            .unwrap_or_else(|| "emeset".to_string());
        let output = c.make::<Box<dyn Output>>("cli.output")?;
        Ok(Cli::new(Parser::new(name), output))
    });
}
