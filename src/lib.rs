pub mod cli;
pub mod config;
pub mod display;
pub mod filter;
pub mod filtering;
pub mod frame;
pub mod reconcile;

pub use cli::{Cli, ColorMode, Commands, OutputFormat, cli_parse};
pub use filter::{
    Change, FilterDirection, FilterEntry, FilterKind, FilterParseError, Filters, FiltersDiff,
    MatchMode, parse_expression,
};
pub use filtering::{filter_flow, filter_link, filter_service};
pub use frame::{
    Flow, FlowEndpoint, Frame, Label, Link, ServiceCard, Verdict, load_frame, load_frame_stream,
};
pub use reconcile::reconcile;

use anyhow::Context;
use std::path::Path;
use std::str::FromStr;

/// Builds the effective Filters for a command: preset first, explicit flags
/// on top. An explicit expression replaces the preset's clause list.
fn build_filters(
    args: &cli::FilterArgs,
    config: &config::FlowlensConfig,
) -> anyhow::Result<Filters> {
    let mut filters = match &args.preset {
        Some(name) => config.preset(name)?.to_filters(),
        None => Filters::default(),
    };

    if let Some(expression) = &args.filter {
        filters.entries = parse_expression(expression);
    }
    if let Some(namespace) = &args.namespace {
        filters.namespace = Some(namespace.clone());
    }
    if let Some(verdict) = &args.verdict {
        filters.verdict = Some(Verdict::from_str(verdict)?);
    }
    if let Some(status) = &args.http_status {
        filters.http_status = Some(status.clone());
    }
    if let Some(mode) = &args.mode {
        filters.mode = MatchMode::from_str(mode)?;
    }
    if args.skip_host {
        filters.skip_host = true;
    }
    if args.skip_kube_dns {
        filters.skip_kube_dns = true;
    }
    if args.skip_remote_node {
        filters.skip_remote_node = true;
    }
    if args.skip_prometheus_app {
        filters.skip_prometheus_app = true;
    }
    if args.skip_kube_api_server {
        filters.skip_kube_api_server = true;
    }

    Ok(filters)
}

/// Resolves one side of a `diff` invocation: `@name` loads a preset, any
/// other text is parsed as a filter expression.
fn resolve_diff_side(
    side: &str,
    config: &config::FlowlensConfig,
) -> anyhow::Result<Filters> {
    if let Some(name) = side.strip_prefix('@') {
        return Ok(config.preset(name)?.to_filters());
    }
    Ok(Filters::default().with_entries(parse_expression(side)))
}

fn write_output_file(path: &Path, content: &str) -> anyhow::Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write output file '{}'", path.display()))
}

/// Prints the rendered output and mirrors it to `--output` when requested.
fn emit(output: Option<&Path>, content: &str) -> anyhow::Result<()> {
    print!("{content}");
    if !content.ends_with('\n') {
        println!();
    }
    if let Some(path) = output {
        write_output_file(path, content)?;
    }
    Ok(())
}

pub fn run() -> anyhow::Result<()> {
    let cli = cli_parse();
    let config = config::load_config(cli.config.as_deref()).context("Failed to load config")?;

    // Set up color handling based on user preference
    match cli.color {
        ColorMode::Always => unsafe {
            std::env::set_var("CLICOLOR_FORCE", "1");
        },
        ColorMode::Never => unsafe {
            std::env::set_var("NO_COLOR", "1");
        },
        ColorMode::Auto => {}
    }

    if cli.verbose > 0 && !cli.quiet {
        eprintln!("Verbosity level: {}", cli.verbose);
        if let Some(config_path) = &cli.config {
            eprintln!("Config file: {}", config_path.display());
        }
        if let Some(out_path) = &cli.output {
            eprintln!("Output will be written to: {}", out_path.display());
        }
    }

    match &cli.command {
        Commands::Filter { frame, filters } => {
            let filters = build_filters(filters, &config)?;
            let frame = load_frame(frame)
                .with_context(|| format!("Failed to load frame '{}'", frame.display()))?;

            let visible = frame.filtered(&filters);
            let rendered = match cli.format {
                OutputFormat::Text => display::format_frame_text(&visible),
                OutputFormat::Json => display::format_frame_json(&visible)?,
            };
            emit(cli.output.as_deref(), &rendered)?;
        }
        Commands::Replay { frames, filters } => {
            let filters = build_filters(filters, &config)?;
            let stream = load_frame_stream(frames)
                .with_context(|| format!("Failed to load frame stream '{}'", frames.display()))?;

            let mut view = Frame::default();
            for next in &stream {
                view = view.apply(next, &filters);
            }

            if !cli.quiet {
                eprintln!("Replayed {} frames", stream.len());
            }
            let rendered = match cli.format {
                OutputFormat::Text => display::format_frame_text(&view),
                OutputFormat::Json => display::format_frame_json(&view)?,
            };
            emit(cli.output.as_deref(), &rendered)?;
        }
        Commands::Diff { before, after } => {
            let after_filters = resolve_diff_side(after, &config)?;
            let diff = match before {
                Some(before) => {
                    let before_filters = resolve_diff_side(before, &config)?;
                    let diff = after_filters.diff(Some(&before_filters));
                    if cli.verbose > 0 && cli.format == OutputFormat::Text && !cli.quiet {
                        eprint!(
                            "{}",
                            display::format_filters_text_diff(&before_filters, &after_filters)
                        );
                    }
                    diff
                }
                None => FiltersDiff::from_empty(&after_filters),
            };

            let rendered = match cli.format {
                OutputFormat::Text => display::format_diff_text(&diff),
                OutputFormat::Json => display::format_diff_json(&diff)?,
            };
            emit(cli.output.as_deref(), &rendered)?;
        }
        Commands::Info { frame } => {
            let frame = load_frame(frame)
                .with_context(|| format!("Failed to load frame '{}'", frame.display()))?;

            let rendered = match cli.format {
                OutputFormat::Text => display::format_info_text(&frame),
                OutputFormat::Json => display::format_frame_json(&frame)?,
            };
            emit(cli.output.as_deref(), &rendered)?;
        }
    }

    Ok(())
}
