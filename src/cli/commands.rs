use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

use crate::config::RuntimeConfig;
use crate::env::{self, EnvFlags, RuntimeMode};
use crate::launcher::{BuildCleaner, TestLauncher};
use crate::server::{create_server, ServerOptions};
use crate::telemetry;

/// Command-line interface for stagehand
///
/// Provides commands for serving a web application build and for launching
/// the test runner.
#[derive(Parser)]
#[command(name = "stagehand")]
#[command(about = "Stagehand CLI", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands for stagehand
#[derive(Subcommand)]
pub enum Commands {
    /// Serve the production bundle or the asset-injected development index
    Serve {
        /// Fallback port, used when neither the PORT env var nor the config
        /// names one
        #[arg(long)]
        port: Option<u16>,

        /// Compose the middleware pipeline without binding a socket
        #[arg(long, default_value_t = false)]
        no_listen: bool,
    },
    /// Launch the test runner
    Test {
        /// Test-runner executable to spawn
        #[arg(long, env = "STAGEHAND_TEST_RUNNER")]
        runner: PathBuf,

        /// Parameters forwarded to the runner; the literal `debug` token
        /// enables debug mode
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        params: Vec<String>,
    },
}

/// Execute the CLI command provided by the user
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be resolved
/// - The server fails to compose or bind
/// - The clean step or the test-runner spawn fails
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mode = RuntimeMode::from_env();
    telemetry::init(mode)?;

    match cli.command {
        Commands::Serve { port, no_listen } => {
            let flags = EnvFlags::from_env();
            let mut options = ServerOptions::new(mode, flags);
            options.fallback_port = port;
            options.start_listening = !no_listen;
            let server = create_server(options)?;
            if no_listen {
                info!(stages = server.service.stage_count(), "pipeline composed");
                return Ok(());
            }
            server
                .join()
                .map_err(|e| anyhow::anyhow!("server failed: {e:?}"))
        }
        Commands::Test { runner, params } => {
            let build_config = RuntimeConfig::load(&env::project_dir())?;
            let cleaner = BuildCleaner::for_build(&build_config);
            let run = TestLauncher::new(runner).launch(&params, &cleaner)?;
            let output = run.wait()?;
            // pipes were captured, surface them to the invoking terminal
            std::io::stdout().write_all(&output.stdout)?;
            std::io::stderr().write_all(&output.stderr)?;
            if !output.status.success() {
                std::process::exit(output.status.code().unwrap_or(1));
            }
            Ok(())
        }
    }
}
