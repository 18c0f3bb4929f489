//! # stagehand
//!
//! **stagehand** is a development/production bootstrap layer for web
//! applications, built on the `may` coroutine runtime and `may_minihttp`.
//! It assembles an HTTP server from an ordered middleware pipeline, resolves
//! a listening port, serves either a pre-built production bundle or an
//! asset-injected development index page, and launches a test-runner child
//! process with mode-dependent argument rewriting.
//!
//! ## Architecture
//!
//! - **[`env`]** - process-wide mode and environment switches, read once
//! - **[`config`]** - per-base resolved runtime settings (`stagehand.toml`)
//! - **[`server`]** - pipeline composition, bootstrap and HTTP server wrapper
//! - **[`middleware`]** - the pipeline stage trait and the request-log stage
//! - **[`static_files`]** - traversal-safe static serving and prefix mounts
//! - **[`fallback`]** - the catch-all HTML route (production bundle vs
//!   injected dev index)
//! - **[`assets`]** - build-asset manifest and idempotent HTML injection
//! - **[`ports`]** - free-port resolution for the development bootstrap
//! - **[`hot_reload`]** - hot-reload capability with dev and no-op providers
//! - **[`launcher`]** - test-runner argument state machine and process spawn
//! - **[`telemetry`]** - `tracing` subscriber installation
//! - **[`cli`]** - the `stagehand` binary surface
//!
//! ## Quick Start
//!
//! ```no_run
//! use stagehand::env::{EnvFlags, RuntimeMode};
//! use stagehand::server::{create_server, ServerOptions};
//!
//! let mode = RuntimeMode::from_env();
//! let flags = EnvFlags::from_env();
//! stagehand::telemetry::init(mode).expect("subscriber");
//!
//! let server = create_server(ServerOptions::new(mode, flags)).expect("bootstrap");
//! server.join().expect("server failed");
//! ```
//!
//! ## Pipeline Order
//!
//! Construction order is a correctness invariant. The chain is, in order:
//! hot-reload middleware (development watch mode only), the request-log
//! guarantee, caller early stages, the static assets mount, the optional
//! public-dir mount, caller late stages, and the catch-all HTML fallback.
//! The catch-all is always last; nothing registered later can intercept it.
//!
//! ## Runtime Considerations
//!
//! stagehand uses the `may` coroutine runtime, not tokio or async-std. Port
//! resolution and the test launcher's clean step are blocking calls on the
//! bootstrap path; the spawned test runner is waited on through its
//! [`launcher::TestRun`] handle.

pub mod assets;
pub mod cli;
pub mod config;
pub mod env;
pub mod fallback;
pub mod hot_reload;
pub mod launcher;
pub mod middleware;
pub mod ports;
pub mod server;
pub mod static_files;
pub mod telemetry;

pub use config::RuntimeConfig;
pub use env::{EnvFlags, RuntimeMode};
pub use launcher::{build_launch_plan, LaunchPlan, TestLauncher, TestRun};
pub use server::{create_server, Server, ServerOptions};
