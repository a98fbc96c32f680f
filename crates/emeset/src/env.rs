//! Environment file loading.
//!
//! [`Env`] reads a dotenv-style file (`KEY=VALUE`, `KEY = VALUE`, `#` comments,
//! optional quotes, optional `export` prefix). Loading is immutable: variables
//! already present in the process environment win over file values, and the
//! process environment is never modified.
//!
//! [`upsert`] rewrites a single key in an env file. It is how cached
//! capability flags are persisted between runs.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Process variable that switches the framework into test mode.
pub const TESTING_VAR: &str = "EMESET_TESTING";

/// Returns true when running under the test harness (`EMESET_TESTING=1`).
pub fn is_testing() -> bool {
    std::env::var(TESTING_VAR).map(|v| v == "1").unwrap_or(false)
}

/// Values loaded from an env file, layered under the process environment.
#[derive(Debug, Clone, Default)]
pub struct Env {
    values: HashMap<String, String>,
    path: Option<PathBuf>,
}

impl Env {
    /// Creates an empty env with no backing file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an env from explicit pairs. Useful in tests.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            path: None,
        }
    }

    /// Loads the env file for a project root.
    ///
    /// Under test `.env.test` is preferred when it exists; otherwise `.env` is
    /// used. A missing file yields an empty env.
    pub fn load(root: impl AsRef<Path>, testing: bool) -> io::Result<Self> {
        let root = root.as_ref();
        let mut path = root.join(".env");
        if testing {
            let test_path = root.join(".env.test");
            if test_path.exists() {
                path = test_path;
            }
        }
        Self::from_file(path)
    }

    /// Loads a specific env file. A missing file yields an empty env.
    pub fn from_file(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(content) => parse(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e),
        };
        Ok(Self {
            values,
            path: Some(path),
        })
    }

    /// Reads a variable. Process environment wins over the file.
    pub fn get(&self, key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .or_else(|| self.values.get(key).cloned())
    }

    /// Reads a variable, falling back to `default` when missing.
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Sets a value in memory only.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// The file this env was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Parses env file content into a map. Later keys override earlier ones.
pub fn parse(content: &str) -> HashMap<String, String> {
    content.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), unquote(value.trim())))
}

fn unquote(value: &str) -> String {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return value[1..value.len() - 1].to_string();
        }
    }
    // Unquoted values may carry a trailing comment.
    match value.find(" #") {
        Some(idx) => value[..idx].trim_end().to_string(),
        None => value.to_string(),
    }
}

/// Ensures `path` holds exactly one `KEY = value` line for `key`.
///
/// Returns `Ok(false)` without touching the file when the expected line is
/// already present. Creates the file when missing.
pub fn upsert(path: impl AsRef<Path>, key: &str, value: &str) -> io::Result<bool> {
    let path = path.as_ref();
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e),
    };

    let expected = format!("{} = {}", key, value);
    if content.lines().any(|line| line.trim() == expected) {
        return Ok(false);
    }

    let mut lines: Vec<&str> = content
        .lines()
        .filter(|line| parse_line(line).map(|(k, _)| k != key).unwrap_or(true))
        .collect();
    lines.push(&expected);

    let mut out = lines.join("\n");
    out.push('\n');
    std::fs::write(path, out)?;
    Ok(true)
}
