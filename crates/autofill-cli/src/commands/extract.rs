//! Extract command - pull form data out of documents.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use autofill_core::{DecoderRegistry, EntityExtractor, ExtractionMatch, ProcessResponse};

use super::{expand_inputs, load_config, process, remote_processor, OutputFormat};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input files or glob patterns
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// List every match with its offsets instead of one value per category
    #[arg(long, conflicts_with_all = ["server", "remote"])]
    all: bool,

    /// Include the decoded text in JSON output
    #[arg(long)]
    with_text: bool,

    /// Delegate decoding to a process server (e.g. http://127.0.0.1:5000/process)
    #[arg(long)]
    server: Option<String>,

    /// Delegate decoding to the process server set in decode.serverUrl
    #[arg(long, conflicts_with = "server")]
    remote: bool,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let mut config = load_config(config_path)?;
    config.extraction.include_text = args.with_text || args.all;

    let files = expand_inputs(&args.inputs)?;
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

    let mut responses = Vec::with_capacity(files.len());
    for path in &files {
        pb.set_message(path.display().to_string());
        responses.push(process(&config, &registry, remote.as_ref(), path).await);
        pb.inc(1);
    }
    pb.finish_and_clear();

    let output = if args.all {
        let extractor = EntityExtractor::from_config(&config.extraction);
        let matches: Vec<(String, Vec<ExtractionMatch>)> = responses
            .iter()
            .map(|r| {
                let text = r.extracted_text.as_deref().unwrap_or_default();
                (r.file_name.clone(), extractor.extract_all(text))
            })
            .collect();
        format_matches(&matches, args.format)?
    } else {
        if !args.with_text {
            for response in &mut responses {
                response.extracted_text = None;
            }
        }
        format_responses(&responses, args.format)?
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    for response in &responses {
        if response.success {
            eprintln!("{} {}", style("✓").green(), response.message());
        } else {
            eprintln!("{} {}", style("✗").red(), response.message());
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    let failed = responses.iter().filter(|r| !r.success).count();
    if failed == responses.len() {
        anyhow::bail!("No file could be processed");
    }
    Ok(())
}

fn format_responses(responses: &[ProcessResponse], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(responses)?),
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(vec![]);
            wtr.write_record(["file", "status", "key", "value", "error"])?;
            for response in responses {
                if !response.success {
                    wtr.write_record([
                        response.file_name.as_str(),
                        "error",
                        "",
                        "",
                        response.error.as_deref().unwrap_or_default(),
                    ])?;
                    continue;
                }
                for (key, value) in response.data().iter() {
                    wtr.write_record([response.file_name.as_str(), "success", key, value, ""])?;
                }
            }
            Ok(String::from_utf8(wtr.into_inner()?)?)
        }
        OutputFormat::Text => {
            let mut output = String::new();
            for response in responses {
                output.push_str(&format!("{}\n", response.message()));
                for (key, value) in response.data().iter() {
                    output.push_str(&format!("  {}: {}\n", key, value));
                }
            }
            Ok(output.trim_end().to_string())
        }
    }
}

fn format_matches(
    matches: &[(String, Vec<ExtractionMatch>)],
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => {
            let value: serde_json::Map<String, serde_json::Value> = matches
                .iter()
                .map(|(file, found)| Ok((file.clone(), serde_json::to_value(found)?)))
                .collect::<anyhow::Result<_>>()?;
            Ok(serde_json::to_string_pretty(&value)?)
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(vec![]);
            wtr.write_record(["file", "category", "value", "start", "end"])?;
            for (file, found) in matches {
                for m in found {
                    wtr.write_record([
                        file.as_str(),
                        m.category.as_str(),
                        m.value.as_str(),
                        &m.start.to_string(),
                        &m.end.to_string(),
                    ])?;
                }
            }
            Ok(String::from_utf8(wtr.into_inner()?)?)
        }
        OutputFormat::Text => {
            let mut output = String::new();
            for (file, found) in matches {
                output.push_str(&format!("{} ({} matches)\n", file, found.len()));
                for m in found {
                    output.push_str(&format!(
                        "  {:<11} {:>6}..{:<6} {}\n",
                        m.category.as_str(),
                        m.start,
                        m.end,
                        m.value
                    ));
                }
            }
            Ok(output.trim_end().to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autofill_core::FormData;

    #[test]
    fn test_csv_rows_per_entry() {
        let data: FormData = [("email", "a@b.com"), ("phone", "555-123-4567")].into_iter().collect();
        let responses = vec![
            ProcessResponse::succeeded("a.txt", data),
            ProcessResponse::failed("b.exe", "unsupported file type: exe"),
        ];

        let csv = format_responses(&responses, OutputFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "a.txt,success,email,a@b.com,");
        assert_eq!(lines[3], "b.exe,error,,,unsupported file type: exe");
    }

    #[test]
    fn test_text_summary() {
        let data: FormData = [("email", "a@b.com")].into_iter().collect();
        let text = format_responses(&[ProcessResponse::succeeded("a.txt", data)], OutputFormat::Text)
            .unwrap();
        assert_eq!(text, "Extracted 1 field from a.txt\n  email: a@b.com");
    }

    #[test]
    fn test_match_listing() {
        let text = "a@b.com c@d.com";
        let found = EntityExtractor::new().extract_all(text);
        let listing = format_matches(&[("a.txt".to_string(), found)], OutputFormat::Csv).unwrap();
        assert!(listing.contains("a.txt,email,c@d.com,8,15"));
    }
}
