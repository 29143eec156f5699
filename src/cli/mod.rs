//! # CLI Module
//!
//! Command-line access to a configured dispatcher: validate a service configuration,
//! list its bindings, or push a single simulated request through negotiation.
//!
//! ## Commands
//!
//! ### `check`
//!
//! Build the dispatcher from a configuration and report its envelope and bindings.
//! Overlapping bindings or an inverted envelope make the command fail:
//!
//! ```bash
//! microversion check --config config/microversions.yaml
//! ```
//!
//! ### `routes`
//!
//! List bindings per resource action in registration order:
//!
//! ```bash
//! microversion routes --config config/microversions.yaml
//! ```
//!
//! ### `negotiate`
//!
//! Dispatch one request and print status, negotiated version, headers and body:
//!
//! ```bash
//! microversion negotiate --config config/microversions.yaml \
//!     --action microversions2:index --version 3.1
//! ```
//!
//! Leaving out `--version` sends no version header, so the service minimum is used.
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use microversion::cli::{Cli, run_cli};
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! run_cli(cli)?;
//! ```

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{execute, run_cli, Cli, Commands};
