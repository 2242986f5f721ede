use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// A tool to filter, diff and reconcile network flow map snapshots
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML profile file with named filter presets
    #[arg(long, global = true, env = "FLOWLENS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write the rendered output to this file in addition to stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// When to use colors in terminal output
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Increase diagnostic output (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Always,
    Never,
    Auto,
}

/// Filter options shared by the commands that evaluate frames.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Filter expression, e.g. "from:label=app=frontend !to:ip=10.0.0.1"
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Start from a named preset in the profile file
    #[arg(short, long)]
    pub preset: Option<String>,

    /// Keep only flows touching this namespace
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Keep only flows with this verdict (forwarded, dropped, audit, error)
    #[arg(long)]
    pub verdict: Option<String>,

    /// HTTP status filter, exact ("404") or bounded ("4+", "5-")
    #[arg(long)]
    pub http_status: Option<String>,

    /// Drop traffic with a host endpoint
    #[arg(long)]
    pub skip_host: bool,

    /// Drop DNS traffic to the cluster DNS service
    #[arg(long)]
    pub skip_kube_dns: bool,

    /// Drop traffic with a remote-node endpoint
    #[arg(long)]
    pub skip_remote_node: bool,

    /// Drop Prometheus scrape targets from the service map
    #[arg(long)]
    pub skip_prometheus_app: bool,

    /// Accepted for forward compatibility; no predicate consults it yet
    #[arg(long, hide = true)]
    pub skip_kube_api_server: bool,

    /// How multiple clauses combine: any clause passing, or all of them
    #[arg(long)]
    pub mode: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply filters to one frame snapshot and show what stays visible
    Filter {
        /// Frame snapshot file (JSON or JSON5)
        #[arg(short = 'F', long)]
        frame: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Fold a stream of frames through reconciliation and show the final view
    Replay {
        /// NDJSON file with one frame per line, or a JSON array of frames
        #[arg(short = 'F', long)]
        frames: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Show what changed between two filter configurations
    Diff {
        /// Older side: an expression, or @name for a preset. Omit to diff
        /// against empty filters
        #[arg(short, long)]
        before: Option<String>,

        /// Newer side: an expression, or @name for a preset
        #[arg(short, long)]
        after: String,
    },
    /// Summarize the inventory of a frame snapshot
    Info {
        /// Frame snapshot file (JSON or JSON5)
        #[arg(short = 'F', long)]
        frame: PathBuf,
    },
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}
