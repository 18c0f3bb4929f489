//! Hot-reload capability.
//!
//! The bootstrap takes a [`HotReloadProvider`] selected at composition time:
//! production wires the no-op implementation, development wires
//! [`DevHotReload`]. The dev middleware watches the build assets directory
//! and serves a revision counter under [`RELOAD_PATH`]; a page polls it and
//! reloads itself when the revision changes.

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use may_minihttp::Response;
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde_json::json;
use tracing::{debug, info};

use crate::config::RuntimeConfig;
use crate::middleware::{Middleware, Outcome};
use crate::server::request::RequestContext;
use crate::server::response::write_json;

/// Polling endpoint served by the dev middleware.
pub const RELOAD_PATH: &str = "/__stagehand/reload";

#[cfg(target_os = "macos")]
const OPEN_COMMAND: &str = "open";
#[cfg(not(target_os = "macos"))]
const OPEN_COMMAND: &str = "xdg-open";

pub trait HotReloadProvider: Send + Sync {
    /// The middleware to mount ahead of all others, if this provider has one.
    fn middleware(&self, config: &RuntimeConfig) -> anyhow::Result<Option<Box<dyn Middleware>>>;

    /// Side effect after a successful watch-mode bind.
    fn open_browser(&self, port: u16);
}

/// Production implementation: no middleware, no side effects.
pub struct NoopHotReload;

impl HotReloadProvider for NoopHotReload {
    fn middleware(&self, _config: &RuntimeConfig) -> anyhow::Result<Option<Box<dyn Middleware>>> {
        Ok(None)
    }

    fn open_browser(&self, _port: u16) {}
}

/// Development implementation backed by a filesystem watcher.
pub struct DevHotReload {
    /// Fast mode serves the reload endpoint without installing a watcher.
    pub fast: bool,
}

impl DevHotReload {
    pub fn new(fast: bool) -> Self {
        Self { fast }
    }
}

impl HotReloadProvider for DevHotReload {
    fn middleware(&self, config: &RuntimeConfig) -> anyhow::Result<Option<Box<dyn Middleware>>> {
        let watch_dir = config.base.join(&config.assets_path_prefix);
        let stage = if self.fast {
            ReloadMiddleware::unwatched()
        } else {
            ReloadMiddleware::watching(&watch_dir)?
        };
        Ok(Some(Box::new(stage)))
    }

    fn open_browser(&self, port: u16) {
        let url = format!("http://localhost:{port}");
        info!(%url, "opening browser");
        if let Err(e) = std::process::Command::new(OPEN_COMMAND).arg(&url).spawn() {
            debug!(error = %e, "browser open failed");
        }
    }
}

/// Serves the current build revision; every observed change to the watched
/// directory bumps it.
pub struct ReloadMiddleware {
    revision: Arc<AtomicU64>,
    _watcher: Option<Arc<Mutex<RecommendedWatcher>>>,
}

impl ReloadMiddleware {
    fn unwatched() -> Self {
        Self {
            revision: Arc::new(AtomicU64::new(0)),
            _watcher: None,
        }
    }

    fn watching(dir: &Path) -> anyhow::Result<Self> {
        let revision = Arc::new(AtomicU64::new(0));
        if !dir.is_dir() {
            debug!(dir = %dir.display(), "assets dir absent, reload watcher not installed");
            return Ok(Self {
                revision,
                _watcher: None,
            });
        }

        let counter = Arc::clone(&revision);
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                        let rev = counter.fetch_add(1, Ordering::SeqCst) + 1;
                        debug!(revision = rev, "build output changed");
                    }
                }
                Err(e) => debug!(error = %e, "watch error"),
            },
            Config::default(),
        )?;
        watcher.watch(dir, RecursiveMode::Recursive)?;

        Ok(Self {
            revision,
            _watcher: Some(Arc::new(Mutex::new(watcher))),
        })
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }
}

impl Middleware for ReloadMiddleware {
    fn handle(&self, ctx: &mut RequestContext, res: &mut Response) -> io::Result<Outcome> {
        if ctx.method == http::Method::GET && ctx.path == RELOAD_PATH {
            write_json(res, 200, json!({ "revision": self.revision() }));
            return Ok(Outcome::Done);
        }
        Ok(Outcome::Next)
    }
}
