mod cli;

use std::io::Read;

use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use oxidized_sf_audit::{audit, config, detectors, hook, output};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Validate {
            paths,
            kind,
            format,
            output: output_path,
            strict,
            config: config_path,
        } => {
            let mut config = load_config(config_path.as_deref());
            if strict {
                config.strict.enabled = true;
            }

            let summary = audit::run_audit(&paths, kind.kind(), &config).unwrap_or_else(|e| {
                eprintln!("Error: {e}");
                std::process::exit(2);
            });
            if summary.files.is_empty() && !summary.errors.is_empty() {
                for error in &summary.errors {
                    eprintln!("Error: {}: {}", error.file.display(), error.message);
                }
                std::process::exit(2);
            }

            let formatted = output::format_summary(&summary, &format);
            if let Some(out_path) = output_path {
                std::fs::write(&out_path, &formatted).unwrap_or_else(|e| {
                    eprintln!("Error writing output: {e}");
                    std::process::exit(2);
                });
                eprintln!("Output written to {}", out_path.display());
            } else {
                print!("{formatted}");
            }

            std::process::exit(if summary.passed { 0 } else { 1 });
        }

        Commands::Gate {
            config: config_path,
        } => {
            let mut input = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut input) {
                tracing::warn!(error = %e, "failed to read hook input");
            }
            // The gate fails open, so a broken config degrades to defaults.
            let config = config::Config::load(config_path.as_deref()).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "using default configuration");
                config::Config::default()
            });
            let response = hook::gate(&input, &config);
            match serde_json::to_string(&response) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::error!(error = %e, "failed to serialize hook response"),
            }
        }

        Commands::ListRules => {
            let rules = detectors::all_rules();
            println!("{}", "Built-in Rules".bold().underline());
            println!();

            let mut current_detector = "";
            for rule in &rules {
                if rule.detector != current_detector {
                    if !current_detector.is_empty() {
                        println!();
                    }
                    println!("  {}", rule.detector.bold());
                    current_detector = rule.detector;
                }

                println!(
                    "    [{severity}] {id:<34} {points:>2} pts  {message}",
                    severity = output::pretty::severity_label(rule.check.severity),
                    id = rule.check.id,
                    points = rule.check.points,
                    message = rule.check.message,
                );
            }

            println!();
            println!("  Total: {} rules", rules.len());
        }

        Commands::Explain { rule_id } => {
            let rules = detectors::all_rules();
            match rules.iter().find(|r| r.check.id == rule_id) {
                Some(rule) => {
                    println!("{}", rule.check.id.bold());
                    println!();
                    println!("  Artifact:     {}", rule.kind);
                    println!("  Detector:     {}", rule.detector);
                    println!("  Category:     {}", rule.check.category.title());
                    println!("  Severity:     {}", rule.check.severity);
                    println!("  Deduction:    {} points", rule.check.points);
                    println!("  Description:  {}", rule.check.message);
                    println!("  Remediation:  {}", rule.check.remediation);
                }
                None => {
                    eprintln!("Unknown rule: {rule_id}");
                    eprintln!("Use 'oxidized-sf-audit list-rules' to see all available rules.");
                    std::process::exit(2);
                }
            }
        }

        Commands::Rubric {
            kind,
            config: config_path,
        } => {
            let config = load_config(config_path.as_deref());
            let rubric = config.rubric(kind).unwrap_or_else(|e| {
                eprintln!("Error: {e}");
                std::process::exit(2);
            });

            println!(
                "{}",
                format!("{kind} rubric ({} points)", rubric.max_score())
                    .bold()
                    .underline()
            );
            println!();
            for budget in &rubric.budgets {
                println!(
                    "  {:<24} {:>3}",
                    budget.category.title(),
                    budget.max_points
                );
            }
            println!();
            println!("{}", "Rating scale".bold());
            for tier in rubric.scale.tiers() {
                let stars = tier.stars.map(|s| format!(" ({s}/5)")).unwrap_or_default();
                println!("  >= {:>3}%  {}{stars}", tier.min_percent, tier.label);
            }
            println!();
            println!(
                "  Warning threshold: {}%{}",
                config.threshold(kind),
                if config.strict.enabled { " (strict)" } else { "" }
            );
        }
    }
}

/// Logs go to stderr so JSON and hook output on stdout stay machine-readable.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<&std::path::Path>) -> config::Config {
    config::Config::load(path).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(2);
    })
}
