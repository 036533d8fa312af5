use clap::{Parser, Subcommand, ValueEnum};
use oxidized_sf_audit::output::OutputFormat;
use oxidized_sf_audit::rubric::ArtifactKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "oxidized-sf-audit",
    version,
    about = "Quality scoring for Salesforce Apex, Flow and data operations"
)]
pub struct Cli {
    /// Enable debug logging on stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Artifact kind selection for `validate`.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    /// Guess from the file extension
    Auto,
    Apex,
    Flow,
    Data,
}

impl KindArg {
    pub fn kind(self) -> Option<ArtifactKind> {
        match self {
            KindArg::Auto => None,
            KindArg::Apex => Some(ArtifactKind::Apex),
            KindArg::Flow => Some(ArtifactKind::Flow),
            KindArg::Data => Some(ArtifactKind::Data),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score Apex, Flow or data-operation files
    Validate {
        /// Files or directories to validate
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Artifact kind
        #[arg(long, short, default_value = "auto", value_enum)]
        kind: KindArg,

        /// Output format
        #[arg(long, short, default_value = "pretty", value_enum)]
        format: OutputFormat,

        /// Write output to file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Treat warnings as blocking
        #[arg(long)]
        strict: bool,

        /// Custom config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Answer a PreToolUse hook call read from stdin
    Gate {
        /// Custom config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List all built-in rules with descriptions
    ListRules,

    /// Show full explanation for a rule
    Explain {
        /// Rule ID (e.g., "apex/soql-in-loop")
        rule_id: String,
    },

    /// Print the category budgets and rating scale for an artifact kind
    Rubric {
        #[arg(value_enum)]
        kind: ArtifactKind,

        /// Custom config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },
}
