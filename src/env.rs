//! Process-wide mode and environment switches.
//!
//! Everything here is intended to be read **once** at process start and then
//! threaded explicitly through constructors. Components never re-read ambient
//! environment state at request time.
//!
//! ## Environment Variables
//!
//! | Variable          | Effect                                             |
//! |-------------------|----------------------------------------------------|
//! | `STAGEHAND_ENV`   | `production` selects production mode; anything else (including unset) is development |
//! | `STAGEHAND_WATCH` | `true` enables watch mode (hot reload + browser open) |
//! | `STAGEHAND_FAST`  | `true` enables fast mode (dev middleware skips the filesystem watcher) |
//! | `STAGEHAND_BASE`  | base directory of the running package (assets are served from here) |
//! | `PROJECT_DIR`     | target project directory being built/served        |

use std::env;
use std::path::PathBuf;

/// Serving strategy selector: production serves the built bundle, development
/// serves the asset-injected source index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeMode {
    Production,
    Development,
}

impl RuntimeMode {
    /// Derive the mode from `STAGEHAND_ENV`. Call once at startup and pass
    /// the value down; the mode is immutable for the process lifetime.
    pub fn from_env() -> Self {
        Self::from_name(env::var("STAGEHAND_ENV").ok().as_deref())
    }

    fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("production") => RuntimeMode::Production,
            _ => RuntimeMode::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == RuntimeMode::Production
    }
}

/// Optional behavior switches, resolved once alongside [`RuntimeMode`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvFlags {
    /// Watch mode: mount the hot-reload middleware and open a browser after
    /// a successful development bind.
    pub watch: bool,
    /// Fast mode: the dev middleware serves its reload endpoint but does not
    /// install a filesystem watcher.
    pub fast: bool,
}

impl EnvFlags {
    pub fn from_env() -> Self {
        EnvFlags {
            watch: flag_enabled("STAGEHAND_WATCH"),
            fast: flag_enabled("STAGEHAND_FAST"),
        }
    }
}

fn flag_enabled(name: &str) -> bool {
    env::var(name).map(|v| v == "true").unwrap_or(false)
}

/// Base directory of the running package. Own assets are served from here.
pub fn base_dir() -> PathBuf {
    env::var_os("STAGEHAND_BASE")
        .map(PathBuf::from)
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Target project directory: the build being served. Differs from
/// [`base_dir`] in watch/dev-proxy scenarios.
pub fn project_dir() -> PathBuf {
    env::var_os("PROJECT_DIR")
        .map(PathBuf::from)
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}
