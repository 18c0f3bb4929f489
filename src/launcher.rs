//! Test-runner launch.
//!
//! [`build_launch_plan`] rewrites the caller's parameter tokens into the
//! final argument list through a fixed sequence of states (parse-debug,
//! inject-inband, inject-config, finalize), producing a new immutable
//! [`LaunchPlan`] instead of splicing in place. [`TestLauncher::launch`]
//! runs the clean step for non-debug runs and spawns the runner with its
//! output captured.

use std::io;
use std::path::PathBuf;
use std::process::{Child, Command, Output, Stdio};

use tracing::{debug, info};

use crate::config::RuntimeConfig;

/// Literal token enabling debug mode; consumed, never forwarded.
pub const DEBUG_TOKEN: &str = "debug";
/// Serial-execution flag: a debugger attaches to a single process, so debug
/// runs must not parallelize workers.
pub const SERIAL_FLAG: &str = "--run-in-band";
pub const CONFIG_FLAG: &str = "--config";
/// Browser-oriented default configuration for regular runs.
pub const DEFAULT_CONFIG: &str = "presets/test/browser.json";
/// Plain-runtime default configuration for debug runs.
pub const DEFAULT_DEBUG_CONFIG: &str = "presets/test/runtime.json";
/// Native debug-port flag handed to the runner executable in debug mode.
const DEBUG_RUNNER_FLAG: &str = "--inspect";

const TEST_ENV_VAR: &str = "STAGEHAND_ENV";

/// Finalized launch arguments. Built once per invocation, then frozen and
/// handed to the spawn call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    /// Arguments for the runner: synthesized flags first, caller params
    /// after, so a last-wins argument parser lets callers override.
    pub args: Vec<String>,
    pub is_debug: bool,
    /// Runner-executable flags, placed ahead of `args`; only populated in
    /// debug mode.
    pub runner_flags: Vec<String>,
}

/// Run the argument state machine over the caller's parameter tokens.
pub fn build_launch_plan(params: &[String]) -> LaunchPlan {
    // parse-debug: exactly one occurrence consumed
    let mut params: Vec<String> = params.to_vec();
    let is_debug = match params.iter().position(|p| p == DEBUG_TOKEN) {
        Some(idx) => {
            params.remove(idx);
            true
        }
        None => false,
    };

    let mut args: Vec<String> = Vec::new();

    // inject-inband
    if is_debug && !params.iter().any(|p| p == SERIAL_FLAG) {
        args.push(SERIAL_FLAG.to_string());
    }

    // inject-config: callers naming their own config keep it
    let config_defined = params.iter().any(|p| p.starts_with(CONFIG_FLAG));
    if !config_defined {
        args.push(CONFIG_FLAG.to_string());
        args.push(
            if is_debug {
                DEFAULT_DEBUG_CONFIG
            } else {
                DEFAULT_CONFIG
            }
            .to_string(),
        );
    }

    // finalize: caller params after the synthesized flags
    args.extend(params);

    LaunchPlan {
        args,
        is_debug,
        runner_flags: if is_debug {
            vec![DEBUG_RUNNER_FLAG.to_string()]
        } else {
            Vec::new()
        },
    }
}

/// Clean/reset side effect awaited before non-debug runs.
pub trait Cleaner {
    fn clean(&self) -> io::Result<()>;
}

/// Removes build output directories. Absent directories are tolerated.
pub struct BuildCleaner {
    dirs: Vec<PathBuf>,
}

impl BuildCleaner {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Clean the build output of `config`: its assets directory.
    pub fn for_build(config: &RuntimeConfig) -> Self {
        Self::new(vec![config.base.join(&config.assets_path_prefix)])
    }
}

impl Cleaner for BuildCleaner {
    fn clean(&self) -> io::Result<()> {
        for dir in &self.dirs {
            match std::fs::remove_dir_all(dir) {
                Ok(()) => debug!(dir = %dir.display(), "build output removed"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

/// Spawns the configured test-runner executable.
pub struct TestLauncher {
    runner: PathBuf,
}

impl TestLauncher {
    pub fn new(runner: impl Into<PathBuf>) -> Self {
        Self {
            runner: runner.into(),
        }
    }

    /// Build the spawn command for `plan`: runner flags precede the argument
    /// list, the parent environment is inherited with the mode variable
    /// forced to `test`, and both output pipes are captured.
    pub fn command(&self, plan: &LaunchPlan) -> Command {
        let mut cmd = Command::new(&self.runner);
        cmd.args(&plan.runner_flags)
            .args(&plan.args)
            .env(TEST_ENV_VAR, "test")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    /// Rewrite `params` into a plan, run the clean step for non-debug runs
    /// (completing before the spawn), and start the runner.
    ///
    /// # Errors
    ///
    /// A clean failure or a spawn failure surfaces here; the completed run
    /// is observed through [`TestRun::wait`]. No retry on either.
    pub fn launch(&self, params: &[String], cleaner: &dyn Cleaner) -> io::Result<TestRun> {
        let plan = build_launch_plan(params);
        if !plan.is_debug {
            cleaner.clean()?;
        }
        info!(
            runner = %self.runner.display(),
            args = ?plan.args,
            debug = plan.is_debug,
            "launching test runner"
        );
        let child = self.command(&plan).spawn()?;
        Ok(TestRun { child })
    }
}

/// A running test-runner process.
///
/// Completion is observed exactly once: [`TestRun::wait`] consumes the
/// handle. [`TestRun::kill`] is the reserved cancellation handle; nothing in
/// the launch path uses it.
pub struct TestRun {
    child: Child,
}

impl TestRun {
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    pub fn kill(&mut self) -> io::Result<()> {
        self.child.kill()
    }

    /// Block until the runner exits, returning its status and captured
    /// output.
    pub fn wait(self) -> io::Result<Output> {
        self.child.wait_with_output()
    }
}
