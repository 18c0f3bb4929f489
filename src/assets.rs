//! Build-asset manifest and HTML asset injection.
//!
//! The development fallback serves the source `index.html` with references to
//! the compiled bundle injected. Injection always starts from the pristine
//! cached page and skips references already present, so repeated requests see
//! each asset exactly once.

use crate::config::RuntimeConfig;
use serde::Deserialize;
use tracing::debug;

const MANIFEST_FILE: &str = "assets.json";

/// Compiled build artifacts to reference from the served page.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AssetManifest {
    #[serde(default)]
    pub scripts: Vec<String>,
    #[serde(default)]
    pub styles: Vec<String>,
}

impl AssetManifest {
    /// Load `<base>/assets.json`. A missing or unparsable manifest falls back
    /// to the conventional bundle names under the configured prefix.
    pub fn load(config: &RuntimeConfig) -> Self {
        let path = config.base.join(MANIFEST_FILE);
        match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(manifest) => manifest,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "asset manifest unparsable, using defaults");
                    Self::conventional(&config.assets_path_prefix)
                }
            },
            Err(_) => Self::conventional(&config.assets_path_prefix),
        }
    }

    /// Conventional bundle names when no manifest exists.
    pub fn conventional(prefix: &str) -> Self {
        let prefix = prefix.trim_matches('/');
        AssetManifest {
            scripts: vec![format!("/{prefix}/main.js")],
            styles: vec![format!("/{prefix}/main.css")],
        }
    }
}

/// Inject stylesheet and script references into `html`.
///
/// Styles go before `</head>`, scripts before `</body>`. Pages without those
/// markers get styles prepended and scripts appended. A reference whose URL
/// already appears in the page is skipped.
pub fn inject_assets(html: &str, manifest: &AssetManifest) -> String {
    let mut page = html.to_string();

    for style in &manifest.styles {
        if page.contains(style.as_str()) {
            continue;
        }
        let tag = format!("<link rel=\"stylesheet\" href=\"{style}\">");
        page = match page.find("</head>") {
            Some(pos) => {
                let mut out = String::with_capacity(page.len() + tag.len());
                out.push_str(&page[..pos]);
                out.push_str(&tag);
                out.push_str(&page[pos..]);
                out
            }
            None => format!("{tag}{page}"),
        };
    }

    for script in &manifest.scripts {
        if page.contains(script.as_str()) {
            continue;
        }
        let tag = format!("<script src=\"{script}\"></script>");
        page = match page.find("</body>") {
            Some(pos) => {
                let mut out = String::with_capacity(page.len() + tag.len());
                out.push_str(&page[..pos]);
                out.push_str(&tag);
                out.push_str(&page[pos..]);
                out
            }
            None => {
                page.push_str(&tag);
                page
            }
        };
    }

    page
}
