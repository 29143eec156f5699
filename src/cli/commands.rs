use crate::dispatcher::HandlerRequest;
use crate::runtime_config::ServiceConfig;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use http::Method;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

/// Command-line interface for the microversion dispatcher
///
/// Every command loads a service configuration file, applies the
/// `MICROVERSION_*` environment overrides and builds the dispatcher from it.
#[derive(Parser)]
#[command(name = "microversion")]
#[command(about = "Microversion negotiation and dispatch", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Validate a service configuration (envelope, ranges and overlaps)
    Check {
        /// Path to the service configuration file (YAML)
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List every resource action and its bindings in registration order
    Routes {
        /// Path to the service configuration file (YAML)
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Dispatch a single request and print the response as JSON
    Negotiate {
        /// Path to the service configuration file (YAML)
        #[arg(short, long)]
        config: PathBuf,

        /// Resource action to dispatch, e.g. `servers:index`
        #[arg(short, long)]
        action: String,

        /// Raw version header value; omitted means "unspecified"
        #[arg(short, long)]
        version: Option<String>,

        /// HTTP method of the simulated request
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request path of the simulated request
        #[arg(short, long, default_value = "/")]
        path: String,

        /// JSON request body
        #[arg(short, long)]
        body: Option<String>,
    },
}

#[derive(Serialize)]
struct CheckReport<'a> {
    envelope: String,
    version_header: &'a str,
    resource_actions: usize,
    bindings: usize,
    unreachable: Vec<String>,
}

#[derive(Serialize)]
struct RouteEntry<'a> {
    resource_action: &'a str,
    min_version: String,
    max_version: String,
    precedence: usize,
}

#[derive(Serialize)]
struct NegotiateOutput {
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_version: Option<String>,
    headers: BTreeMap<String, String>,
    body: Value,
}

/// Parse the command line and run it, writing to stdout
pub fn run_cli(cli: Cli) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&cli.command, &mut out)
}

/// Run a command, writing its JSON output to `out`
pub fn execute<W: Write>(command: &Commands, out: &mut W) -> Result<()> {
    match command {
        Commands::Check { config } => {
            let service = ServiceConfig::from_env(config)?;
            let dispatcher = service.build_dispatcher()?;
            let envelope = dispatcher.negotiator().envelope();
            let registry = dispatcher.registry();
            let report = CheckReport {
                envelope: envelope.to_string(),
                version_header: dispatcher.version_header(),
                resource_actions: registry.resource_actions().len(),
                bindings: registry.len(),
                unreachable: registry
                    .iter()
                    .filter(|b| !b.range().overlaps(&envelope))
                    .map(|b| format!("{} {}", b.resource_action(), b.range()))
                    .collect(),
            };
            write_json(out, &report)
        }
        Commands::Routes { config } => {
            let service = ServiceConfig::from_env(config)?;
            let registry = service.registry()?;
            let routes: Vec<RouteEntry<'_>> = registry
                .resource_actions()
                .into_iter()
                .flat_map(|action| registry.candidates_for(action))
                .map(|b| RouteEntry {
                    resource_action: b.resource_action(),
                    min_version: b.range().min().to_string(),
                    max_version: b.range().max().to_string(),
                    precedence: b.precedence(),
                })
                .collect();
            write_json(out, &routes)
        }
        Commands::Negotiate {
            config,
            action,
            version,
            method,
            path,
            body,
        } => {
            let service = ServiceConfig::from_env(config)?;
            let dispatcher = service.build_dispatcher()?;
            let method: Method = method
                .to_uppercase()
                .parse()
                .with_context(|| format!("invalid HTTP method '{method}'"))?;

            let mut req = HandlerRequest::new(method, path, action);
            if let Some(raw) = version {
                req = req.with_header(dispatcher.version_header(), raw);
            }
            if let Some(raw) = body {
                let body: Value =
                    serde_json::from_str(raw).context("request body is not valid JSON")?;
                req = req.with_body(body);
            }

            let mut resp = dispatcher.dispatch(req);
            resp.echo_version(dispatcher.version_header());
            let output = NegotiateOutput {
                status: resp.status,
                api_version: resp.api_version.map(|v| v.to_string()),
                headers: resp
                    .headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
                body: resp.body,
            };
            write_json(out, &output)
        }
    }
}

fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("failed to serialize output")?;
    writeln!(out).context("failed to write output")?;
    Ok(())
}
