//! Guestbook maintenance commands.

use std::rc::Rc;

use clap::{Arg, ArgAction, Command};
use emeset::{Class, Container};
use emeset_cli::{command, Cli, CommandFn};
use emeset_logs::{Level, Log};

struct Maintenance {
    views: std::path::PathBuf,
    root: std::path::PathBuf,
}

impl Maintenance {
    fn new(container: &Container) -> anyhow::Result<Self> {
        let config = container.config()?;
        let root = container.root().to_path_buf();
        Ok(Self {
            views: root.join(config.get_str("views").unwrap_or("views")),
            root,
        })
    }
}

/// Registers the demo commands on `cli`.
pub fn register(cli: &Cli) {
    cli.add_command(
        "hello",
        command(|args, out, _c| {
            let names = args.args();
            let who = if names.is_empty() {
                "Món".to_string()
            } else {
                names.join(" ")
            };
            out.success(&format!("Hola {}", who))?;
            Ok(())
        }),
        "Says hello",
    );

    cli.add_clap_command(
        Command::new("log")
            .about("Writes an entry to the application log")
            .arg(Arg::new("message").required(true))
            .arg(Arg::new("level").long("level").short('l'))
            .arg(Arg::new("cron").long("cron").action(ArgAction::SetTrue)),
        command(|args, out, c| {
            let message = args.get_opt_or("message", "");
            let level = args.get_opt_or("level", "info");
            let log = c.get::<Log>("log")?;
            log.do_log("cli", &message, &level, args.get_flag("cron"))?;
            out.info(&format!("logged as {}", Level::parse(&level)))?;
            Ok(())
        }),
    );

    cli.caller().class(
        "Maintenance",
        Class::new(Maintenance::new).method("check", |m: Rc<Maintenance>| -> Rc<CommandFn> {
            command(move |_args, out, c| {
                let rows = vec![
                    vec!["root".to_string(), m.root.display().to_string()],
                    vec![
                        "views".to_string(),
                        yes_no(m.views.is_dir()).to_string(),
                    ],
                    vec!["env".to_string(), yes_no(c.env()?.path().is_some_and(|p| p.is_file())).to_string()],
                ];
                out.table(&["check", "status"], &rows)?;
                Ok(())
            })
        }),
    );
    cli.add_command("check", "Maintenance:check", "Checks the project layout");
}

fn yes_no(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "missing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::io::{self, Write};

    use emeset::Config;
    use emeset_cli::{ConsoleOutput, Parser, RealTerminal};

    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.borrow()).into_owned()
        }
    }

    fn cli() -> (Cli, SharedBuf) {
        let buf = SharedBuf::default();
        let output = ConsoleOutput::new(Box::new(buf.clone()), Box::new(RealTerminal));
        let cli = Cli::new(Parser::new("guestbook"), Box::new(output));
        register(&cli);
        (cli, buf)
    }

    #[test]
    fn test_hello() {
        let (cli, buf) = cli();
        let container = Container::empty(".");
        cli.run(["guestbook", "hello", "Ada", "L."], &container).unwrap();
        cli.run(["guestbook", "hello"], &container).unwrap();
        assert_eq!(buf.text(), "Hola Ada L.\nHola Món\n");
    }

    #[test]
    fn test_log_writes_project_log() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        let container = Container::with_root(Config::new(), &root);
        container.set("log", move |_c| {
            Ok(Log::new(None).with_root(&root).with_library(false))
        });

        let (cli, buf) = cli();
        cli.run(
            ["guestbook", "log", "cache cleared", "--level", "notice", "--cron"],
            &container,
        )
        .unwrap();

        assert_eq!(buf.text(), "logged as NOTICE\n");
        let entry = std::fs::read_dir(tmp.path().join("Log"))
            .unwrap()
            .next()
            .unwrap()
            .unwrap();
        let content = std::fs::read_to_string(entry.path()).unwrap();
        assert!(content.contains("NOTICE: [cli] (cron) cache cleared"));
    }

    #[test]
    fn test_check_reports_layout() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("views")).unwrap();
        let container = Container::with_root(Config::new(), tmp.path());

        let (cli, buf) = cli();
        cli.run(["guestbook", "check"], &container).unwrap();

        let text = buf.text();
        assert!(text.contains("views"));
        assert!(text.contains("ok"));
        assert!(text.contains("missing"));
    }
}
