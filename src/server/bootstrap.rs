use std::path::PathBuf;

use tracing::info;

use super::http_server::{HttpServer, ServerHandle};
use super::service::AppService;
use crate::config::{resolve_port, RuntimeConfig};
use crate::env::{self, EnvFlags, RuntimeMode};
use crate::fallback::default_html_fallback;
use crate::hot_reload::{DevHotReload, HotReloadProvider, NoopHotReload};
use crate::middleware::{Middleware, RequestLogMiddleware};
use crate::ports::{PortResolver, ScanningPortResolver};
use crate::static_files::StaticMount;

/// Ordered, append-only middleware chain under construction. Frozen into an
/// [`AppService`] before the server starts listening.
pub struct PipelineBuilder {
    stages: Vec<Box<dyn Middleware>>,
}

impl PipelineBuilder {
    fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn mount<M: Middleware + 'static>(&mut self, stage: M) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn mount_boxed(&mut self, stage: Box<dyn Middleware>) -> &mut Self {
        self.stages.push(stage);
        self
    }

    fn freeze(self) -> AppService {
        AppService::new(self.stages)
    }
}

/// A caller-supplied pipeline stage: appends its middleware to the chain
/// built so far. Builders run in list order, preserving the construction
/// ordering invariants without ad hoc hook fields.
pub type StageBuilder = Box<dyn FnOnce(&mut PipelineBuilder)>;

/// Configuration for [`create_server`]. Owned by the caller and read-only to
/// the bootstrap.
///
/// There is no logger field: components log through the process-global
/// `tracing` subscriber installed by [`crate::telemetry::init`], and the
/// request-log middleware guarantees a per-request span.
pub struct ServerOptions {
    pub mode: RuntimeMode,
    pub flags: EnvFlags,
    /// Stages mounted before the static mounts.
    pub early_stages: Vec<StageBuilder>,
    /// Stages mounted after the static mounts, before the catch-all.
    pub late_stages: Vec<StageBuilder>,
    /// Invoked once after a successful bind.
    pub on_ready: Option<Box<dyn FnOnce()>>,
    /// When false the composed server is returned without binding a socket.
    pub start_listening: bool,
    pub hot_reload: Box<dyn HotReloadProvider>,
    pub port_resolver: Box<dyn PortResolver>,
    /// Port precedence: `PORT` env > this fallback > configured port.
    pub fallback_port: Option<u16>,
    /// Override for the running package's own base dir (else `STAGEHAND_BASE`/cwd).
    pub base_dir: Option<PathBuf>,
    /// Override for the target project dir (else `PROJECT_DIR`/cwd).
    pub project_dir: Option<PathBuf>,
}

impl ServerOptions {
    /// Defaults for `mode`: listening on, no extra stages, the scanning port
    /// resolver, and the hot-reload capability matching the mode.
    pub fn new(mode: RuntimeMode, flags: EnvFlags) -> Self {
        let hot_reload: Box<dyn HotReloadProvider> = if mode.is_production() {
            Box::new(NoopHotReload)
        } else {
            Box::new(DevHotReload::new(flags.fast))
        };
        Self {
            mode,
            flags,
            early_stages: Vec::new(),
            late_stages: Vec::new(),
            on_ready: None,
            start_listening: true,
            hot_reload,
            port_resolver: Box::new(ScanningPortResolver::default()),
            fallback_port: None,
            base_dir: None,
            project_dir: None,
        }
    }

    pub fn early_stage(mut self, builder: impl FnOnce(&mut PipelineBuilder) + 'static) -> Self {
        self.early_stages.push(Box::new(builder));
        self
    }

    pub fn late_stage(mut self, builder: impl FnOnce(&mut PipelineBuilder) + 'static) -> Self {
        self.late_stages.push(Box::new(builder));
        self
    }
}

/// A composed server: the frozen pipeline plus, when listening was
/// requested, the handle of the bound socket.
pub struct Server {
    pub service: AppService,
    bound: Option<ServerHandle>,
}

impl Server {
    pub fn handle(&self) -> Option<&ServerHandle> {
        self.bound.as_ref()
    }

    /// The port actually bound, when listening.
    pub fn port(&self) -> Option<u16> {
        self.bound.as_ref().map(ServerHandle::port)
    }

    pub fn wait_ready(&self) -> std::io::Result<()> {
        match &self.bound {
            Some(handle) => handle.wait_ready(),
            None => Ok(()),
        }
    }

    /// Block until the server finishes. A no-op when not listening.
    pub fn join(self) -> std::thread::Result<()> {
        match self.bound {
            Some(handle) => handle.join(),
            None => Ok(()),
        }
    }

    pub fn stop(self) {
        if let Some(handle) = self.bound {
            handle.stop();
        }
    }
}

/// Route prefixes have to start with `/`; configured values may omit it.
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.starts_with('/') {
        prefix.to_string()
    } else {
        format!("/{prefix}")
    }
}

/// Compose the middleware pipeline and (unless `start_listening` is off)
/// bind and serve.
///
/// Construction order is a correctness invariant: later stages must not
/// shadow earlier ones and static mounts must win over the catch-all.
///
/// # Errors
///
/// Fails when either configuration cannot be resolved, the hot-reload
/// middleware cannot be built, no free port can be resolved, or the bind
/// fails. A production bind failure is fatal here, with no local recovery;
/// development gets exactly one recovery via the port resolver.
pub fn create_server(mut options: ServerOptions) -> anyhow::Result<Server> {
    let base = options.base_dir.take().unwrap_or_else(env::base_dir);
    let project = options.project_dir.take().unwrap_or_else(env::project_dir);

    // two configs per bootstrap: the running package's own base serves the
    // assets, the target project is the build being served
    let config = RuntimeConfig::load(&base)?;
    let build_config = RuntimeConfig::load(&project)?;

    let mut pipeline = PipelineBuilder::new();

    if !options.mode.is_production() && options.flags.watch {
        if let Some(stage) = options.hot_reload.middleware(&build_config)? {
            pipeline.mount_boxed(stage);
        }
    }

    pipeline.mount(RequestLogMiddleware);

    for builder in options.early_stages.drain(..) {
        builder(&mut pipeline);
    }

    let prefix = normalize_prefix(&config.assets_path_prefix);
    pipeline.mount(StaticMount::new(
        prefix,
        config.base.join(&config.assets_path_prefix),
    ));

    if let Some(public_dir) = &config.server_public_dir {
        pipeline.mount(StaticMount::at_root(public_dir));
    }

    for builder in options.late_stages.drain(..) {
        builder(&mut pipeline);
    }

    // catch-all is always last; late stages can never intercept it
    pipeline.mount(default_html_fallback(options.mode, &build_config, false));

    let service = pipeline.freeze();

    if !options.start_listening {
        return Ok(Server {
            service,
            bound: None,
        });
    }

    let preferred = resolve_port(&config, options.fallback_port);
    let use_port = if options.mode.is_production() {
        preferred
    } else {
        options.port_resolver.resolve_free_port(preferred)?
    };

    let handle = HttpServer(service.clone()).start(("0.0.0.0", use_port))?;
    info!(port = handle.port(), "server listening");

    if !options.mode.is_production() && options.flags.watch {
        options.hot_reload.open_browser(handle.port());
    }
    if let Some(callback) = options.on_ready.take() {
        callback();
    }

    Ok(Server {
        service,
        bound: Some(handle),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix("assets"), "/assets");
        assert_eq!(normalize_prefix("/assets"), "/assets");
        assert_eq!(normalize_prefix("/"), "/");
    }

    #[test]
    fn test_compose_without_listening() {
        let dir = tempfile::tempdir().unwrap();
        let mut options = ServerOptions::new(RuntimeMode::Development, EnvFlags::default());
        options.start_listening = false;
        options.base_dir = Some(dir.path().to_path_buf());
        options.project_dir = Some(dir.path().to_path_buf());
        let server = create_server(options).unwrap();
        assert!(server.handle().is_none());
        assert!(server.port().is_none());
        // request log + assets mount + catch-all
        assert_eq!(server.service.stage_count(), 3);
    }

    #[test]
    fn test_stage_builders_extend_chain_in_order() {
        struct Tag;
        impl crate::middleware::Middleware for Tag {
            fn handle(
                &self,
                _ctx: &mut crate::server::request::RequestContext,
                _res: &mut may_minihttp::Response,
            ) -> std::io::Result<crate::middleware::Outcome> {
                Ok(crate::middleware::Outcome::Next)
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let mut options = ServerOptions::new(RuntimeMode::Development, EnvFlags::default())
            .early_stage(|p| {
                p.mount(Tag);
            })
            .late_stage(|p| {
                p.mount(Tag);
            });
        options.start_listening = false;
        options.base_dir = Some(dir.path().to_path_buf());
        options.project_dir = Some(dir.path().to_path_buf());
        let server = create_server(options).unwrap();
        assert_eq!(server.service.stage_count(), 5);
    }
}
