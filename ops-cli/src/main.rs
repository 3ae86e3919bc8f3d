use anyhow::{Context, Result};
use auth_policy::Principal;
use clap::{Parser, Subcommand};
use http::Method;
use ops_cli::{build_router, check, load_config, route_table, validate, Verdict};
use std::path::PathBuf;
use std::process::ExitCode;
use telemetry::{init_tracing, TelemetryConfig};
use tracing::error;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "guardctl")]
#[command(about = "Validate resource policy configuration and dry-run routing decisions")]
#[command(version)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Print command output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load and compile a configuration, reporting every error
    Validate { config: PathBuf },

    /// Print the route table for every configured resource
    Routes { config: PathBuf },

    /// Route a request and evaluate its request-level policies
    Check {
        config: PathBuf,

        #[arg(short, long, default_value = "GET")]
        method: Method,

        #[arg(short, long)]
        path: String,

        /// Authenticated principal id; omit for an anonymous caller
        #[arg(short, long)]
        user: Option<Uuid>,

        #[arg(long, requires = "user")]
        privileged: bool,

        #[arg(short, long = "group")]
        groups: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let telemetry = TelemetryConfig::default()
        .with_level(if cli.verbose { "debug" } else { "warn" })
        .with_json(cli.json_logs);
    if let Err(e) = init_tracing(&telemetry) {
        eprintln!("Warning: logging disabled ({e})");
    }

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = ?e, "guardctl failed");
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether the command succeeded (valid config, allowed request).
fn run(cli: &Cli) -> Result<bool> {
    match &cli.command {
        Command::Validate { config } => {
            let config = load_config(config)?;
            let report = validate(&config);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else if report.is_valid() {
                println!("OK: {} resource(s)", report.resources);
            } else {
                for issue in &report.issues {
                    println!("ERROR: {issue}");
                }
            }
            Ok(report.is_valid())
        }
        Command::Routes { config } => {
            let router = build_router(&load_config(config)?)?;
            let rows = route_table(&router);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for row in rows {
                    println!(
                        "{:<12} {:<32} {:<12} {}",
                        row.methods.join(","),
                        row.path,
                        row.action,
                        row.policies.join(" & ")
                    );
                }
            }
            Ok(true)
        }
        Command::Check {
            config,
            method,
            path,
            user,
            privileged,
            groups,
        } => {
            let router = build_router(&load_config(config)?)
                .with_context(|| format!("cannot check {method} {path}"))?;
            let principal = match user {
                Some(id) => {
                    let principal = Principal::authenticated(*id).with_groups(groups.iter().cloned());
                    if *privileged {
                        principal.privileged()
                    } else {
                        principal
                    }
                }
                None => Principal::anonymous(),
            };

            let verdict = check(&router, method, path, principal);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&verdict)?);
            } else {
                match &verdict {
                    Verdict::Allow { resource, action, policies } => {
                        println!("ALLOW {resource}/{action} ({})", policies.join(" & "));
                    }
                    Verdict::Deny { kind, code, message } => {
                        println!("DENY {kind} [{code}]: {message}");
                    }
                }
            }
            Ok(verdict.is_allowed())
        }
    }
}
