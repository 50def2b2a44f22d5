//! Fill command - process documents and fill an HTML page's form.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use autofill_core::{DecoderRegistry, Document, FileOutcome, Session};

use super::{expand_inputs, load_config, process, remote_processor};

/// Arguments for the fill command.
#[derive(Args)]
pub struct FillArgs {
    /// HTML page containing the form
    #[arg(short, long)]
    page: PathBuf,

    /// Documents to fill from, processed in order
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output file for the filled page (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write a JSON report of every file's outcome
    #[arg(long)]
    report: Option<PathBuf>,

    /// Clear all detected fields before filling
    #[arg(long)]
    clear: bool,

    /// Delegate decoding to a process server (e.g. http://127.0.0.1:5000/process)
    #[arg(long)]
    server: Option<String>,

    /// Delegate decoding to the process server set in decode.serverUrl
    #[arg(long, conflicts_with = "server")]
    remote: bool,
}

pub async fn run(args: FillArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.page.exists() {
        anyhow::bail!("Page not found: {}", args.page.display());
    }
    let files = expand_inputs(&args.inputs)?;

    let html = fs::read_to_string(&args.page)?;
    let mut session = Session::new(Document::parse_html(&html));
    info!("Detected {} form fields in {}", session.fields().len(), args.page.display());

    if !config.settings.enabled {
        eprintln!(
            "{} Autofill is disabled in settings; the page will not be changed.",
            style("!").yellow()
        );
    }

    if args.clear {
        let cleared = session.clear(&config.settings);
        debug!("Cleared {} fields", cleared);
    }

    let registry = DecoderRegistry::new();
    let remote = remote_processor(args.server.as_deref(), args.remote, &config)?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );
    if files.len() < 2 {
        pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }

    // Each file is decoded, extracted and matched before the next starts.
    let mut outcomes: Vec<FileOutcome> = Vec::with_capacity(files.len());
    for path in &files {
        pb.set_message(path.display().to_string());
        let response = process(&config, &registry, remote.as_ref(), path).await;
        outcomes.push(session.apply_response(&config.settings, response));
        pb.inc(1);
    }
    pb.finish_and_clear();

    for outcome in &outcomes {
        match &outcome.fill {
            Some(fill) if fill.fields_changed > 0 => {
                eprintln!("{} {}", style("✓").green(), fill.message())
            }
            Some(fill) => eprintln!("{} {}", style("ℹ").blue(), fill.message()),
            None => eprintln!("{} {}", style("✗").red(), outcome.response.message()),
        }
    }

    if let Some(report_path) = &args.report {
        fs::write(report_path, serde_json::to_string_pretty(&outcomes)?)?;
        debug!("Wrote report to {}", report_path.display());
    }

    let filled = session.into_document().to_html();
    if let Some(output_path) = &args.output {
        fs::write(output_path, &filled)?;
        eprintln!(
            "{} Filled page written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        print!("{}", filled);
    }

    debug!("Total processing time: {:?}", start.elapsed());
    Ok(())
}
