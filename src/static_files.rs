use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use may_minihttp::Response;
use tracing::debug;

use crate::middleware::{Middleware, Outcome};
use crate::server::request::RequestContext;
use crate::server::response::write_file;

pub struct StaticFiles {
    base_dir: PathBuf,
}

impl StaticFiles {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self { base_dir: base.into() }
    }

    fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let mut pb = self.base_dir.clone();
        for comp in Path::new(url_path.trim_start_matches('/')).components() {
            match comp {
                Component::Normal(s) => pb.push(s),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(pb)
    }

    /// Read the file mapped from `url_path`. Directories are not served
    /// (index listing disabled); traversal outside the base is rejected.
    pub fn load(&self, url_path: &str) -> io::Result<(PathBuf, Vec<u8>)> {
        let path = self
            .map_path(url_path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "invalid path"))?;
        if !path.is_file() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        }
        let bytes = fs::read(&path)?;
        Ok((path, bytes))
    }
}

/// Static file serving mounted at a URL prefix.
///
/// Misses fall through to the next stage, matching the chain contract: a
/// static mount never answers 404 on behalf of the rest of the pipeline.
pub struct StaticMount {
    prefix: String,
    files: StaticFiles,
}

impl StaticMount {
    /// Mount `dir` under `prefix`. The prefix must already carry its leading
    /// slash; the bootstrap normalizes configured values before mounting.
    pub fn new<P: Into<PathBuf>>(prefix: impl Into<String>, dir: P) -> Self {
        Self {
            prefix: prefix.into(),
            files: StaticFiles::new(dir),
        }
    }

    /// Mount `dir` at the site root (secondary public-dir mount).
    pub fn at_root<P: Into<PathBuf>>(dir: P) -> Self {
        Self::new("/", dir)
    }

    fn strip_prefix<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.prefix == "/" {
            return Some(path.trim_start_matches('/'));
        }
        let rest = path.strip_prefix(&self.prefix)?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest.trim_start_matches('/'))
        } else {
            // /assetsfoo must not match a /assets mount
            None
        }
    }
}

impl Middleware for StaticMount {
    fn handle(&self, ctx: &mut RequestContext, res: &mut Response) -> io::Result<Outcome> {
        if ctx.method != http::Method::GET {
            return Ok(Outcome::Next);
        }
        let Some(rest) = self.strip_prefix(&ctx.path) else {
            return Ok(Outcome::Next);
        };
        if rest.is_empty() {
            // directory root without index listing
            return Ok(Outcome::Next);
        }
        match self.files.load(rest) {
            Ok((path, bytes)) => {
                debug!(path = %path.display(), "static file served");
                write_file(res, &path, bytes);
                Ok(Outcome::Done)
            }
            Err(_) => Ok(Outcome::Next),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_path_prevents_traversal() {
        let sf = StaticFiles::new("static");
        assert!(sf.map_path("../Cargo.toml").is_none());
        assert!(sf.map_path("../../etc/passwd").is_none());
        assert_eq!(sf.map_path("./a/b.js"), Some(PathBuf::from("static/a/b.js")));
    }

    #[test]
    fn test_load_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.txt"), "Hello\n").unwrap();
        let sf = StaticFiles::new(dir.path());
        let (path, bytes) = sf.load("hello.txt").unwrap();
        assert_eq!(path, dir.path().join("hello.txt"));
        assert_eq!(String::from_utf8(bytes).unwrap(), "Hello\n");
    }

    #[test]
    fn test_load_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let sf = StaticFiles::new(dir.path());
        assert!(sf.load("sub").is_err());
    }

    #[test]
    fn test_strip_prefix() {
        let mount = StaticMount::new("/assets", "static");
        assert_eq!(mount.strip_prefix("/assets/app.js"), Some("app.js"));
        assert_eq!(mount.strip_prefix("/assets"), Some(""));
        assert_eq!(mount.strip_prefix("/assetsfoo/app.js"), None);
        assert_eq!(mount.strip_prefix("/other/app.js"), None);

        let root = StaticMount::at_root("static");
        assert_eq!(root.strip_prefix("/app.js"), Some("app.js"));
    }
}
