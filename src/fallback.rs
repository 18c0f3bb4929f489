//! Catch-all HTML fallback.
//!
//! For apps without server-side rendering every request not answered by an
//! earlier stage gets the index page: the built `index.html` in production,
//! the asset-injected source index in development.

use std::io;
use std::path::PathBuf;

use may_minihttp::Response;
use tracing::error;

use crate::assets::{inject_assets, AssetManifest};
use crate::config::RuntimeConfig;
use crate::env::RuntimeMode;
use crate::middleware::{Middleware, Outcome};
use crate::server::request::RequestContext;
use crate::server::response::write_html;

/// The catch-all stage, shaped at construction time from mode and config.
pub enum HtmlFallback {
    /// Production: stream `<base>/index.html` from disk per request. A read
    /// failure propagates as the request's I/O error, never swallowed.
    ProductionIndex { index_path: PathBuf },
    /// Development: the source index was read once at construction; per
    /// request the cached content gets asset references injected.
    InjectedIndex {
        html: String,
        manifest: AssetManifest,
    },
    /// Development without a usable source index: yield to the next stage so
    /// later registrations, if any, may still answer.
    PassThrough,
}

/// Build the catch-all handler for `config`.
///
/// Development reads `<public_dir>/index.html` synchronously here, exactly
/// once per server construction. A file change on disk after that is not
/// observed. A missing index is not fatal: it only disables the fallback,
/// optionally logged when `log_not_found` is set.
pub fn default_html_fallback(
    mode: RuntimeMode,
    config: &RuntimeConfig,
    log_not_found: bool,
) -> HtmlFallback {
    if mode.is_production() {
        return HtmlFallback::ProductionIndex {
            index_path: config.base.join("index.html"),
        };
    }

    let Some(public_dir) = &config.server_public_dir else {
        return HtmlFallback::PassThrough;
    };

    let index_path = public_dir.join("index.html");
    match std::fs::read_to_string(&index_path) {
        Ok(html) => HtmlFallback::InjectedIndex {
            html,
            manifest: AssetManifest::load(config),
        },
        Err(e) => {
            if log_not_found {
                error!(path = %index_path.display(), error = %e, "reading index.html failed");
            }
            HtmlFallback::PassThrough
        }
    }
}

impl Middleware for HtmlFallback {
    fn handle(&self, ctx: &mut RequestContext, res: &mut Response) -> io::Result<Outcome> {
        if ctx.method != http::Method::GET {
            return Ok(Outcome::Next);
        }
        match self {
            HtmlFallback::ProductionIndex { index_path } => {
                let bytes = std::fs::read(index_path)?;
                write_html(res, 200, bytes);
                Ok(Outcome::Done)
            }
            HtmlFallback::InjectedIndex { html, manifest } => {
                let page = inject_assets(html, manifest);
                write_html(res, 200, page.into_bytes());
                Ok(Outcome::Done)
            }
            HtmlFallback::PassThrough => Ok(Outcome::Next),
        }
    }
}
