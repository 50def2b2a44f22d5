//! Fields command - show how the classifier sees a page.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use serde::Serialize;

use autofill_core::{Document, FormField, Session};

use super::{load_config, OutputFormat};

/// Arguments for the fields command.
#[derive(Args)]
pub struct FieldsArgs {
    /// HTML page to inspect
    page: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

/// One row of the field listing.
#[derive(Serialize)]
struct FieldRow<'a> {
    control: &'a str,
    category: &'a str,
    label: &'a str,
    id: &'a str,
    name: &'a str,
    placeholder: &'a str,
}

pub fn run(args: FieldsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    // Validates the config file even though classification has no options.
    load_config(config_path)?;

    if !args.page.exists() {
        anyhow::bail!("Page not found: {}", args.page.display());
    }
    let html = fs::read_to_string(&args.page)?;
    let session = Session::new(Document::parse_html(&html));

    let rows = rows(session.document(), session.fields());
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(vec![]);
            for row in &rows {
                wtr.serialize(row)?;
            }
            print!("{}", String::from_utf8(wtr.into_inner()?)?);
        }
        OutputFormat::Text => {
            println!(
                "{} Found {} form fields",
                style("ℹ").blue(),
                rows.len()
            );
            for row in &rows {
                let label = if row.label.is_empty() { "-" } else { row.label };
                println!(
                    "  {:<9} {:<8} {}",
                    row.control,
                    style(row.category).cyan(),
                    label
                );
            }
        }
    }
    Ok(())
}

fn rows<'a>(doc: &'a Document, fields: &'a [FormField]) -> Vec<FieldRow<'a>> {
    fields
        .iter()
        .map(|field| {
            let attr = |name| {
                doc.element(field.node)
                    .and_then(|e| e.attr(name))
                    .unwrap_or_default()
            };
            FieldRow {
                control: field.control.as_str(),
                category: field.category.as_str(),
                label: &field.label,
                id: attr("id"),
                name: attr("name"),
                placeholder: attr("placeholder"),
            }
        })
        .collect()
}
