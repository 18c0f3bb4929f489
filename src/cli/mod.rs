//! # CLI Module
//!
//! Command-line interface for the stagehand bootstrap.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! Compose the middleware pipeline and serve the application:
//!
//! ```bash
//! stagehand serve
//! STAGEHAND_ENV=production stagehand serve --port 8080
//! STAGEHAND_WATCH=true stagehand serve
//! ```
//!
//! ### `test`
//!
//! Launch the test runner with mode-dependent argument rewriting:
//!
//! ```bash
//! stagehand test --runner node_modules/.bin/runner
//! stagehand test --runner node_modules/.bin/runner debug suites/login
//! ```

mod commands;


pub use commands::{run_cli, Cli, Commands};
