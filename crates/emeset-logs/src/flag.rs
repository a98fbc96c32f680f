//! Whether log records go through `tracing`.
//!
//! Resolution order: the process-wide cache, then the `LOG_USE_TRACING` env
//! variable, then a scan of the project's `Cargo.toml`. A scanned answer is
//! written back to `<root>/.env` so later runs skip the scan.

use std::path::{Path, PathBuf};

use emeset::Env;
use once_cell::sync::OnceCell;

pub const FLAG_VAR: &str = "LOG_USE_TRACING";
pub const MANIFEST: &str = "Cargo.toml";

/// How many parent directories are searched for a manifest.
pub const MAX_DEPTH: usize = 15;

const DEPENDENCY_TABLES: [&str; 2] = ["dependencies", "dev-dependencies"];

static CACHED: OnceCell<bool> = OnceCell::new();

/// Finds the nearest ancestor of `start` holding a `Cargo.toml`.
///
/// Falls back to `start` itself when none is found within [`MAX_DEPTH`]
/// levels.
pub fn project_root(start: &Path) -> PathBuf {
    start
        .ancestors()
        .take(MAX_DEPTH + 1)
        .find(|dir| dir.join(MANIFEST).is_file())
        .unwrap_or(start)
        .to_path_buf()
}

/// Parses a flag value. Only `true` and `1` enable the library.
pub fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1")
}

/// Returns true if the manifest under `root` depends on `tracing`.
///
/// A missing or unparsable manifest counts as no.
pub fn manifest_uses_tracing(root: &Path) -> bool {
    let Ok(content) = std::fs::read_to_string(root.join(MANIFEST)) else {
        return false;
    };
    let manifest = match toml::from_str::<toml::Table>(&content) {
        Ok(table) => table,
        Err(e) => {
            tracing::warn!(error = %e, "unparsable manifest");
            return false;
        }
    };

    let has = |table: Option<&toml::Value>| {
        table
            .and_then(toml::Value::as_table)
            .is_some_and(|deps| deps.contains_key("tracing"))
    };
    DEPENDENCY_TABLES
        .iter()
        .any(|name| has(manifest.get(*name)))
        || has(manifest
            .get("workspace")
            .and_then(|w| w.get("dependencies")))
}

/// Resolves the flag without consulting the cache.
pub fn detect(root: &Path, env: &Env) -> bool {
    if let Some(value) = env.get(FLAG_VAR) {
        return parse_flag(&value);
    }

    let enabled = manifest_uses_tracing(root);
    let value = if enabled { "true" } else { "false" };
    if let Err(e) = emeset::env::upsert(root.join(".env"), FLAG_VAR, value) {
        tracing::warn!(error = %e, "could not persist {}", FLAG_VAR);
    }
    enabled
}

/// Resolves the flag once per process.
pub fn library_enabled(root: &Path, env: &Env) -> bool {
    *CACHED.get_or_init(|| detect(root, env))
}
