use std::path::Path;

use anyhow::Context;
use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_list, output_success};
use crate::cli::OutputFormat;
use crate::config::{config, ReporterConfig};
use crate::schema::{render_markdown, FieldDescriptions, SchemaInspector};
use crate::state::open_store;

#[derive(Subcommand)]
pub enum DocsCommands {
    #[command(about = "Sample the database and write its structure as markdown")]
    Generate {
        #[arg(long, short, help = "Output file (default: docs/database_structure.md)")]
        output: Option<String>,

        #[arg(long, help = "Documents sampled per collection")]
        sample_size: Option<usize>,

        #[arg(long, help = "YAML file with extra field descriptions")]
        descriptions: Option<String>,
    },

    #[command(about = "List top-level collections")]
    Collections,
}

pub async fn handle(cmd: DocsCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        DocsCommands::Generate {
            output,
            sample_size,
            descriptions,
        } => {
            let mut settings = config().reporter.clone();
            if let Some(output) = output {
                settings.output_path = output;
            }
            if let Some(sample_size) = sample_size {
                settings.sample_size = sample_size;
            }
            if descriptions.is_some() {
                settings.descriptions_path = descriptions;
            }
            generate(settings, &output_format).await
        }
        DocsCommands::Collections => {
            let store = open_store(config()).await?;
            let collections = store
                .list_collections(None)
                .await
                .context("failed to list collections")?;
            let names: Vec<String> = collections.iter().map(|c| c.as_str().to_string()).collect();
            output_list(&output_format, "collections", &names, "No collections found")
        }
    }
}

async fn generate(settings: ReporterConfig, output_format: &OutputFormat) -> anyhow::Result<()> {
    let descriptions = match &settings.descriptions_path {
        Some(path) => FieldDescriptions::load(path)?,
        None => FieldDescriptions::builtin(),
    };

    let store = open_store(config()).await?;
    let output_path = settings.output_path.clone();

    let report = SchemaInspector::new(store, settings).inspect().await?;
    for (path, error) in report.failures() {
        tracing::warn!("Collection {} documented partially: {}", path, error);
    }

    let markdown = render_markdown(&report, &descriptions);
    write_report(Path::new(&output_path), &markdown)?;

    output_success(
        output_format,
        &format!("Documentation written to {}", output_path),
        Some(json!({
            "output": output_path,
            "collections": report.collections.len(),
            "failures": report.failures().len(),
        })),
    )
}

/// Writes the markdown, creating parent directories as needed
fn write_report(path: &Path, markdown: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    std::fs::write(path, markdown).with_context(|| format!("failed to write {}", path.display()))
}
