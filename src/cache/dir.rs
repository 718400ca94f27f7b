//! Cache directory resolution
//!
//! Resolves the root directory that all cache files live under. The result
//! depends only on the environment and platform; this module performs no I/O
//! and never creates the directory.

use std::env;
use std::path::PathBuf;

use directories::BaseDirs;

/// Environment variable that overrides the resolved cache root.
///
/// When set to a non-empty value it is used verbatim, taking precedence over
/// the platform default.
pub const CACHE_DIR_ENV: &str = "CRATEVER_CACHE_DIR";

/// Directory name used under `~/.cache` on POSIX platforms
const APP_DIR: &str = "cratever";

/// Directory name used under `AppData\Local` on Windows
const APP_DIR_WINDOWS: &str = "Cratever";

/// Resolves the cache root directory.
///
/// Precedence:
/// 1. `CRATEVER_CACHE_DIR`, if set and non-empty
/// 2. `home\AppData\Local\Cratever` on Windows, `home/.cache/cratever`
///    elsewhere
///
/// When no home directory can be determined the path is rooted at `.`, so
/// the function always returns the same path for the same environment.
pub fn cache_root() -> PathBuf {
    if let Some(dir) = env::var_os(CACHE_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }

    let home = BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));

    if cfg!(windows) {
        home.join("AppData").join("Local").join(APP_DIR_WINDOWS)
    } else {
        home.join(".cache").join(APP_DIR)
    }
}
