//! `reportgen generate`: XML report in, chunked html report out.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use reportgen_core::{ExportLayout, Exporter, ReportConfig};
use tracing::warn;

/// Arguments for the `generate` command.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// XML report to convert
    pub input: PathBuf,

    /// Output html file (default: input path with an .html extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Open the generated report in the default browser
    #[arg(long)]
    pub open: bool,
}

pub fn execute(args: GenerateArgs, config: &ReportConfig) -> Result<()> {
    let output = output_path(&args.input, args.output.as_deref())?;

    let doc = reportgen_core::parse(&args.input)
        .with_context(|| format!("Failed to parse {}", args.input.display()))?;
    println!(
        "Parsed {} items ({} executed, {} skipped, {} steps)",
        doc.items.len(),
        doc.executed_count(),
        doc.skipped_count(),
        doc.step_count()
    );

    let manifest = Exporter::new(config.viewer.clone())
        .export(&doc, &output)
        .with_context(|| format!("Failed to export report to {}", output.display()))?;

    let layout = ExportLayout::for_destination(&output);
    println!("Report:   {}", output.display());
    println!("Data:     {}", layout.data_dir().display());
    println!("Chunks:   {}", manifest.chunk_count());

    if args.open
        && let Err(e) = open::that(&output)
    {
        warn!("Could not open {}: {}", output.display(), e);
    }
    Ok(())
}

fn output_path(input: &Path, output: Option<&Path>) -> Result<PathBuf> {
    let output = output.map_or_else(|| input.with_extension("html"), Path::to_path_buf);
    if output == input {
        bail!(
            "Output {} would overwrite the input report; pass --output",
            output.display()
        );
    }
    Ok(output)
}
