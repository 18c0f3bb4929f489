mod common;

use std::io;
use std::net::{SocketAddr, TcpListener};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use common::{get, parse_parts, probe_free_port, test_server};
use may_minihttp::Response;
use stagehand::env::{EnvFlags, RuntimeMode};
use stagehand::hot_reload::RELOAD_PATH;
use stagehand::middleware::{Middleware, Outcome};
use stagehand::server::request::RequestContext;
use stagehand::server::response::write_json;
use stagehand::server::{create_server, Server, ServerOptions};
use tempfile::TempDir;

fn dev_options(base: &Path, project: &Path) -> ServerOptions {
    let mut options = ServerOptions::new(RuntimeMode::Development, EnvFlags::default());
    options.base_dir = Some(base.to_path_buf());
    options.project_dir = Some(project.to_path_buf());
    options.fallback_port = Some(probe_free_port());
    options
}

fn start(options: ServerOptions) -> (Server, SocketAddr) {
    test_server::setup_may_runtime();
    let server = create_server(options).unwrap();
    server.wait_ready().unwrap();
    let addr = server.handle().unwrap().addr();
    (server, addr)
}

/// Base dir with a `bundle.js` under the default assets prefix.
fn base_with_assets() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("assets")).unwrap();
    std::fs::write(dir.path().join("assets/bundle.js"), "console.log('hi')").unwrap();
    dir
}

/// Project dir with a public source index configured.
fn project_with_public_index() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("public")).unwrap();
    std::fs::write(
        dir.path().join("public/index.html"),
        "<html><head></head><body><div id=\"app\"></div></body></html>",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("stagehand.toml"),
        "server_public_dir = \"public\"\n",
    )
    .unwrap();
    dir
}

#[test]
fn test_assets_prefix_normalized_and_served() {
    // the configured prefix has no leading slash; the mount must get one
    let base = base_with_assets();
    std::fs::write(
        base.path().join("stagehand.toml"),
        "assets_path_prefix = \"assets\"\n",
    )
    .unwrap();
    let project = tempfile::tempdir().unwrap();

    let (server, addr) = start(dev_options(base.path(), project.path()));
    let resp = get(&addr, "/assets/bundle.js");
    server.stop();

    let (status, ct, body) = parse_parts(&resp);
    assert_eq!(status, 200);
    assert_eq!(ct, "application/javascript");
    assert_eq!(body, "console.log('hi')");
}

#[test]
fn test_dev_catch_all_injects_assets_idempotently() {
    let base = tempfile::tempdir().unwrap();
    let project = project_with_public_index();

    let (server, addr) = start(dev_options(base.path(), project.path()));
    let first = get(&addr, "/client/route");
    let second = get(&addr, "/client/route");
    server.stop();

    for resp in [first, second] {
        let (status, ct, body) = parse_parts(&resp);
        assert_eq!(status, 200);
        assert_eq!(ct, "text/html");
        assert_eq!(body.matches("/assets/main.js").count(), 1);
        assert_eq!(body.matches("/assets/main.css").count(), 1);
        assert!(body.contains("<div id=\"app\"></div>"));
    }
}

#[test]
fn test_traversal_blocked_on_asset_mount() {
    let base = base_with_assets();
    let project = tempfile::tempdir().unwrap();
    std::fs::write(base.path().join("secret.txt"), "nope").unwrap();

    let (server, addr) = start(dev_options(base.path(), project.path()));
    let resp = get(&addr, "/assets/../secret.txt");
    server.stop();

    let (status, _, _) = parse_parts(&resp);
    assert_eq!(status, 404);
}

#[test]
fn test_dev_without_public_dir_falls_through_to_404() {
    let base = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();

    let (server, addr) = start(dev_options(base.path(), project.path()));
    let resp = get(&addr, "/nothing/here");
    server.stop();

    let (status, ct, body) = parse_parts(&resp);
    assert_eq!(status, 404);
    assert_eq!(ct, "application/json");
    assert!(body.contains("\"path\":\"/nothing/here\""));
}

#[test]
fn test_production_serves_index_unmodified() {
    let base = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();
    let index = "<html><head><title>built</title></head><body>bundle</body></html>";
    std::fs::write(project.path().join("index.html"), index).unwrap();

    let mut options = ServerOptions::new(RuntimeMode::Production, EnvFlags::default());
    options.base_dir = Some(base.path().to_path_buf());
    options.project_dir = Some(project.path().to_path_buf());
    options.fallback_port = Some(probe_free_port());

    let (server, addr) = start(options);
    let resp = get(&addr, "/any/path/at/all");
    server.stop();

    let (status, ct, body) = parse_parts(&resp);
    assert_eq!(status, 200);
    assert_eq!(ct, "text/html");
    // byte-identical to the file on disk, no injection
    assert_eq!(body, index);
}

#[test]
fn test_public_dir_files_win_over_catch_all() {
    let base = tempfile::tempdir().unwrap();
    let project = project_with_public_index();
    std::fs::write(project.path().join("public/robots.txt"), "Allow: *\n").unwrap();

    // the public mount serves from the *own* config in the pipeline, so
    // point base at the project layout here
    let (server, addr) = start(dev_options(project.path(), project.path()));
    let resp = get(&addr, "/robots.txt");
    server.stop();

    let (status, ct, body) = parse_parts(&resp);
    assert_eq!(status, 200);
    assert_eq!(ct, "text/plain");
    assert_eq!(body, "Allow: *\n");
}

#[test]
fn test_preferred_port_taken_resolves_free_port() {
    let base = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();

    let taken = TcpListener::bind("0.0.0.0:0").unwrap();
    let preferred = taken.local_addr().unwrap().port();

    let mut options = dev_options(base.path(), project.path());
    options.fallback_port = Some(preferred);

    let (server, addr) = start(options);
    let bound = server.port().unwrap();
    let resp = get(&addr, "/x");
    server.stop();
    drop(taken);

    assert_ne!(bound, preferred);
    let (status, _, _) = parse_parts(&resp);
    assert_eq!(status, 404);
}

#[test]
fn test_production_bind_failure_is_fatal() {
    let base = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();

    let taken = TcpListener::bind("0.0.0.0:0").unwrap();
    let preferred = taken.local_addr().unwrap().port();

    let mut options = ServerOptions::new(RuntimeMode::Production, EnvFlags::default());
    options.base_dir = Some(base.path().to_path_buf());
    options.project_dir = Some(project.path().to_path_buf());
    options.fallback_port = Some(preferred);

    test_server::setup_may_runtime();
    assert!(create_server(options).is_err());
}

#[test]
fn test_watch_mode_serves_reload_endpoint() {
    let base = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();

    let flags = EnvFlags {
        watch: true,
        fast: true,
    };
    let mut options = ServerOptions::new(RuntimeMode::Development, flags);
    options.base_dir = Some(base.path().to_path_buf());
    options.project_dir = Some(project.path().to_path_buf());
    options.fallback_port = Some(probe_free_port());

    let (server, addr) = start(options);
    let resp = get(&addr, RELOAD_PATH);
    server.stop();

    let (status, ct, body) = parse_parts(&resp);
    assert_eq!(status, 200);
    assert_eq!(ct, "application/json");
    assert!(body.contains("\"revision\":0"));
}

struct PingStage;

impl Middleware for PingStage {
    fn handle(&self, ctx: &mut RequestContext, res: &mut Response) -> io::Result<Outcome> {
        if ctx.path == "/ping" {
            write_json(res, 200, serde_json::json!({ "pong": true }));
            return Ok(Outcome::Done);
        }
        Ok(Outcome::Next)
    }
}

#[test]
fn test_early_stage_answers_before_static_mounts() {
    let base = base_with_assets();
    let project = tempfile::tempdir().unwrap();

    let mut options = dev_options(base.path(), project.path()).early_stage(|p| {
        p.mount(PingStage);
    });
    options.fallback_port = Some(probe_free_port());

    let (server, addr) = start(options);
    let ping = get(&addr, "/ping");
    let asset = get(&addr, "/assets/bundle.js");
    server.stop();

    let (status, _, body) = parse_parts(&ping);
    assert_eq!(status, 200);
    assert!(body.contains("\"pong\":true"));
    let (status, _, _) = parse_parts(&asset);
    assert_eq!(status, 200);
}

#[test]
fn test_on_ready_called_after_bind() {
    let base = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();

    let called = Arc::new(AtomicBool::new(false));
    let seen = Arc::clone(&called);
    let mut options = dev_options(base.path(), project.path());
    options.on_ready = Some(Box::new(move || {
        seen.store(true, Ordering::SeqCst);
    }));

    let (server, _) = start(options);
    server.stop();
    assert!(called.load(Ordering::SeqCst));
}

#[test]
fn test_no_listen_returns_unbound_server() {
    let base = tempfile::tempdir().unwrap();
    let project = tempfile::tempdir().unwrap();

    let mut options = dev_options(base.path(), project.path());
    options.start_listening = false;

    let server = create_server(options).unwrap();
    assert!(server.handle().is_none());
}
