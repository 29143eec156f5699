//! Unit tests for CLI commands

use crate::cli::{execute, Cli, Commands};
use clap::Parser;
use serde_json::Value;
use std::io::Write;
use tempfile::NamedTempFile;

const CONFIG: &str = r#"
versioning:
  min_version: "2.1"
  max_version: "3.5"
resources:
  - action: "microversions2:index"
    bindings:
      - min_version: "2.2"
        max_version: "3.0"
        body: { param: controller2_val1 }
      - min_version: "3.1"
        max_version: "3.5"
        status: 202
        body: { param: controller2_val2 }
"#;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn run(args: &[&str]) -> Value {
    let cli = Cli::try_parse_from(args).unwrap();
    let mut out = Vec::new();
    execute(&cli.command, &mut out).unwrap();
    serde_json::from_slice(&out).unwrap()
}

#[test]
fn test_negotiate_command_parses() {
    let cli = Cli::try_parse_from([
        "microversion",
        "negotiate",
        "--config",
        "svc.yaml",
        "--action",
        "servers:index",
        "--version",
        "2.10",
    ])
    .unwrap();

    match cli.command {
        Commands::Negotiate {
            config,
            action,
            version,
            method,
            path,
            body,
        } => {
            assert_eq!(config.to_string_lossy(), "svc.yaml");
            assert_eq!(action, "servers:index");
            assert_eq!(version.as_deref(), Some("2.10"));
            assert_eq!(method, "GET");
            assert_eq!(path, "/");
            assert!(body.is_none());
        }
        _ => panic!("Expected Negotiate command"),
    }
}

#[test]
fn test_config_is_required() {
    assert!(Cli::try_parse_from(["microversion", "check"]).is_err());
    assert!(Cli::try_parse_from(["microversion", "negotiate", "--config", "a.yaml"]).is_err());
}

#[test]
fn test_check_reports_envelope() {
    let file = config_file(CONFIG);
    let path = file.path().to_str().unwrap();
    let report = run(&["microversion", "check", "--config", path]);
    assert_eq!(report["envelope"], "[2.1, 3.5]");
    assert_eq!(report["bindings"], 2);
    assert_eq!(report["unreachable"], serde_json::json!([]));
}

#[test]
fn test_check_fails_on_overlap() {
    let file = config_file(
        r#"
versioning:
  min_version: "2.1"
  max_version: "3.5"
resources:
  - action: "a"
    bindings:
      - { min_version: "2.1", max_version: "2.5" }
      - { min_version: "2.5", max_version: "3.0" }
"#,
    );
    let cli = Cli::try_parse_from([
        "microversion",
        "check",
        "--config",
        file.path().to_str().unwrap(),
    ])
    .unwrap();
    let err = execute(&cli.command, &mut Vec::<u8>::new()).unwrap_err();
    assert!(format!("{err:#}").contains("overlap"));
}

#[test]
fn test_routes_lists_bindings_in_order() {
    let file = config_file(CONFIG);
    let routes = run(&[
        "microversion",
        "routes",
        "--config",
        file.path().to_str().unwrap(),
    ]);
    let routes = routes.as_array().unwrap();
    assert_eq!(routes.len(), 2);
    assert_eq!(routes[0]["min_version"], "2.2");
    assert_eq!(routes[1]["min_version"], "3.1");
    assert!(routes[0]["precedence"].as_u64() < routes[1]["precedence"].as_u64());
}

#[test]
fn test_negotiate_selects_newer_binding() {
    let file = config_file(CONFIG);
    let out = run(&[
        "microversion",
        "negotiate",
        "-c",
        file.path().to_str().unwrap(),
        "-a",
        "microversions2:index",
        "-v",
        "3.1",
    ]);
    assert_eq!(out["status"], 202);
    assert_eq!(out["api_version"], "3.1");
    assert_eq!(out["body"]["param"], "controller2_val2");
    assert_eq!(out["headers"]["X-OpenStack-Compute-API-Version"], "3.1");
}

#[test]
fn test_negotiate_out_of_range_fault() {
    let file = config_file(CONFIG);
    let out = run(&[
        "microversion",
        "negotiate",
        "-c",
        file.path().to_str().unwrap(),
        "-a",
        "microversions2:index",
        "-v",
        "3.7",
    ]);
    assert_eq!(out["status"], 406);
    assert_eq!(out["body"]["computeFault"]["code"], 406);
    assert!(out.get("api_version").is_none());
}
