//! The application-facing logger.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use emeset::http::Session;
use emeset::{Container, Env};

use crate::error::LogError;
use crate::file::FileSink;
use crate::flag;
use crate::layer;
use crate::level::Level;
use crate::sink::{LogRecord, LogSink};
use crate::user;

/// Writes application log entries to daily files or a database.
///
/// Without a database sink entries go to `<root>/Log/dd-mm-YYYY.log`. When
/// the library flag is on, entries pass through a `tracing` subscriber
/// before reaching the sink.
///
/// ```rust
/// use emeset_logs::{Log, MemorySink};
///
/// let sink = MemorySink::new();
/// let log = Log::new(Some(std::sync::Arc::new(sink.clone())))
///     .with_library(false);
/// log.do_log("auth", "login ok", "notice", false)?;
///
/// assert_eq!(sink.records()[0].user, "guest");
/// # Ok::<(), emeset_logs::LogError>(())
/// ```
pub struct Log {
    root: PathBuf,
    db: Option<Arc<dyn LogSink>>,
    library: Option<bool>,
    env: Env,
    session: Session,
}

impl Log {
    /// Creates a logger for the project containing the working directory.
    ///
    /// `db` replaces the file sink when given.
    pub fn new(db: Option<Arc<dyn LogSink>>) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let root = flag::project_root(&cwd);
        let env = Env::load(&root, emeset::env::is_testing()).unwrap_or_default();
        Self {
            root,
            db,
            library: None,
            env,
            session: Session::new(),
        }
    }

    /// Builds a logger from the container's root, env and session.
    pub fn from_container(container: &Container) -> anyhow::Result<Self> {
        let db = if container.has(DB_SERVICE) {
            Some(Arc::clone(
                &*container.get::<Arc<dyn LogSink>>(DB_SERVICE)?,
            ))
        } else {
            None
        };
        let env = Env::clone(&*container.env()?);
        let session = Session::clone(&*container.get::<Session>("session")?);
        Ok(Self::new(db)
            .with_root(container.root())
            .with_env(env)
            .with_session(session))
    }

    /// Forces the library flag instead of resolving it.
    pub fn with_library(mut self, enabled: bool) -> Self {
        self.library = Some(enabled);
        self
    }

    pub fn with_root(mut self, root: impl AsRef<Path>) -> Self {
        self.root = root.as_ref().to_path_buf();
        self
    }

    pub fn with_env(mut self, env: Env) -> Self {
        self.env = env;
        self
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether entries pass through `tracing`.
    pub fn uses_library(&self) -> bool {
        self.library
            .unwrap_or_else(|| flag::library_enabled(&self.root, &self.env))
    }

    /// Logs `message` under `context`.
    ///
    /// `level` is a level name; unknown names log as info. `cron` marks
    /// entries from scheduled jobs.
    pub fn do_log(
        &self,
        context: &str,
        message: &str,
        level: &str,
        cron: bool,
    ) -> Result<(), LogError> {
        let user = user::resolve(&self.env, &self.session, cron);
        let record = LogRecord::now(context, user, Level::parse(level), message);

        let sink: Arc<dyn LogSink> = match &self.db {
            Some(db) => Arc::clone(db),
            None => Arc::new(FileSink::in_project(&self.root)),
        };
        if self.uses_library() {
            layer::dispatch(sink, &record)
        } else {
            sink.write(&record)
        }
    }
}

impl std::fmt::Debug for Log {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Log")
            .field("root", &self.root)
            .field("db", &self.db.is_some())
            .field("library", &self.library)
            .finish_non_exhaustive()
    }
}

/// Service id of an optional database sink (`Arc<dyn LogSink>`).
pub const DB_SERVICE: &str = "log.db";

/// Registers the `log` service on a container.
///
/// The logger writes to the `log.db` service when one is registered and to
/// files otherwise.
pub fn register(container: &Container) {
    container.set("log", Log::from_container);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    fn log_in(root: &Path) -> Log {
        Log::new(None).with_root(root).with_env(Env::new())
    }

    #[test]
    fn test_file_sink_is_the_default() {
        let tmp = tempfile::tempdir().unwrap();
        log_in(tmp.path())
            .with_library(false)
            .do_log("boot", "started", "info", false)
            .unwrap();

        let dir = tmp.path().join("Log");
        let files: Vec<_> = std::fs::read_dir(&dir).unwrap().collect();
        assert_eq!(files.len(), 1);
        let content = std::fs::read_to_string(files[0].as_ref().unwrap().path()).unwrap();
        assert!(content.contains("INFO: [boot] (guest) started"));
    }

    #[test]
    fn test_file_sink_through_library() {
        let tmp = tempfile::tempdir().unwrap();
        log_in(tmp.path())
            .with_library(true)
            .do_log("boot", "via tracing", "warning", true)
            .unwrap();

        let file = std::fs::read_dir(tmp.path().join("Log"))
            .unwrap()
            .next()
            .unwrap()
            .unwrap();
        let content = std::fs::read_to_string(file.path()).unwrap();
        assert!(content.contains("WARNING: [boot] (cron) via tracing"));
    }

    #[test]
    fn test_db_sink_replaces_files() {
        let tmp = tempfile::tempdir().unwrap();
        let db = MemorySink::new();
        for library in [false, true] {
            Log::new(Some(Arc::new(db.clone())))
                .with_root(tmp.path())
                .with_env(Env::new())
                .with_library(library)
                .do_log("orders", "paid", "bogus", false)
                .unwrap();
        }

        let records = db.records();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.level == Level::Info));
        assert!(!tmp.path().join("Log").exists());
    }

    #[test]
    fn test_session_user_is_attributed() {
        let db = MemorySink::new();
        let env = Env::from_pairs([
            (user::USER_KEY, "account"),
            (user::ROLE_KEY, "role"),
            (user::NICKNAME_KEY, "nick"),
        ]);
        let session = Session::new();
        session.set("account", serde_json::json!({"role": "admin", "nick": "ada"}));

        Log::new(Some(Arc::new(db.clone())))
            .with_env(env)
            .with_session(session)
            .with_library(false)
            .do_log("admin", "settings changed", "notice", false)
            .unwrap();

        assert_eq!(db.records()[0].user, "ada");
    }
}
