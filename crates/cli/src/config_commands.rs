use std::path::Path;

use {anyhow::Result, clap::Subcommand};

use receptionist_config::{Severity, discover_and_load, find_config_file, validate};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the configuration and report errors/warnings.
    Check,
}

pub fn handle_config(action: ConfigAction, config_dir: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Check => check(config_dir),
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn check(config_dir: Option<&Path>) -> Result<()> {
    let config = discover_and_load(config_dir);
    let result = validate(&config, find_config_file(config_dir));

    if let Some(ref path) = result.config_path {
        eprintln!("Checking {}\n", path.display());
    } else {
        eprintln!("No config file found; checking defaults and environment.\n");
    }

    for d in &result.diagnostics {
        let color = match d.severity {
            Severity::Error => RED,
            Severity::Warning => YELLOW,
        };
        eprintln!("  {BOLD}{color}{}{RESET} {}: {}", d.severity, d.path, d.message);
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if !result.diagnostics.is_empty() {
        eprintln!();
    }

    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if result.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}
