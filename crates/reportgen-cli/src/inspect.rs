//! Inspection commands: `summary`, `items` and `steps`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use reportgen_core::{
    ExportLayout, FsChunkSource, ItemFilter, ReportConfig, StepFilter, StepLoader, StepQuery,
    ValidationError, query_page, read_manifest, step_context, summarize, summarize_items,
};
use reportgen_proto::{ManifestItem, Step, SystemInfo};
use serde::Serialize;

use crate::OutputFormat;
use crate::display::{single_line, truncate};

/// Arguments for the `summary` command.
#[derive(Parser, Debug)]
pub struct SummaryArgs {
    /// XML report to summarize
    pub input: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

/// Arguments for the `items` command.
#[derive(Parser, Debug)]
pub struct ItemsArgs {
    /// Generated html report
    pub report: PathBuf,

    /// Show only items with this verdict (all, pass, fail, warn, skipped)
    #[arg(long, default_value = "all")]
    pub filter: ItemFilter,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

/// Arguments for the `steps` command.
#[derive(Parser, Debug)]
pub struct StepsArgs {
    /// Generated html report
    pub report: PathBuf,

    /// Index of the item whose steps to show
    #[arg(long)]
    pub item: usize,

    /// Show only steps with this result (all, pass, fail, warn)
    #[arg(long, default_value = "all")]
    pub filter: StepFilter,

    /// Case-insensitive text to search for in step text and tables
    #[arg(long, default_value = "")]
    pub search: String,

    /// Page to show, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Show the steps surrounding the Nth matching step (counting from 1)
    #[arg(long, value_name = "N")]
    pub around: Option<usize>,

    /// Number of steps to show on each side with --around
    #[arg(long, default_value_t = 10)]
    pub radius: usize,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct SummaryOutput<'a> {
    title: &'a str,
    start_time: &'a str,
    end_time: &'a str,
    items: usize,
    steps: usize,
    summary: reportgen_proto::ReportSummary,
    system_info: SystemInfo,
}

pub fn summary(args: SummaryArgs) -> Result<()> {
    let doc = reportgen_core::parse(&args.input)
        .with_context(|| format!("Failed to parse {}", args.input.display()))?;
    let stats = summarize(&doc);

    match args.format {
        OutputFormat::Table => {
            println!("Title:     {}", doc.title);
            println!("Start:     {}", doc.start_time);
            println!("End:       {}", doc.end_time);
            println!("Items:     {} ({} steps)", doc.items.len(), doc.step_count());
            println!("Executed:  {}", stats.total);
            println!("Passed:    {}", stats.passed);
            println!("Failed:    {}", stats.failed);
            println!("Warned:    {}", stats.warned);
            println!("Skipped:   {}", stats.skipped);
            println!("Pass rate: {:.1}%", stats.pass_rate);
            print_system_info(&SystemInfo::from(&doc));
        }
        OutputFormat::Json => {
            let output = SummaryOutput {
                title: &doc.title,
                start_time: &doc.start_time,
                end_time: &doc.end_time,
                items: doc.items.len(),
                steps: doc.step_count(),
                summary: stats,
                system_info: SystemInfo::from(&doc),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn print_system_info(info: &SystemInfo) {
    if info.is_empty() {
        return;
    }
    for (heading, entries) in [("Engineer", &info.engineer), ("Test setup", &info.testsetup)] {
        if entries.is_empty() {
            continue;
        }
        println!();
        println!("{heading}:");
        for (name, value) in entries {
            println!("  {name}: {value}");
        }
    }
    if info.hardware.is_empty() {
        return;
    }
    println!();
    println!("Hardware:");
    for hardware in info.hardware.values() {
        if hardware.category.is_empty() {
            println!("  {}", hardware.name);
        } else {
            println!("  {} ({})", hardware.name, hardware.category);
        }
        for (i, device) in hardware.devices.iter().enumerate() {
            println!("    {} device {}", device.device_type, i + 1);
            for property in device.properties.values() {
                println!("      {}: {}", property.name, property.description);
            }
        }
    }
}

fn load_manifest_items(report: &Path) -> Result<(ExportLayout, Vec<ManifestItem>)> {
    let layout = ExportLayout::for_destination(report);
    let manifest = read_manifest(&layout.manifest_path()).with_context(|| {
        format!(
            "Failed to read report data for {} (expected {})",
            report.display(),
            layout.manifest_path().display()
        )
    })?;
    Ok((layout, manifest.items))
}

pub fn items(args: ItemsArgs) -> Result<()> {
    let (_, items) = load_manifest_items(&args.report)?;
    let shown = args.filter.apply(&items);

    match args.format {
        OutputFormat::Table => {
            if shown.is_empty() {
                println!("No items found");
                return Ok(());
            }
            println!("{:<6} {:<8} {:<7} {:<50}", "Index", "Verdict", "Steps", "Title");
            println!("{}", "-".repeat(74));
            for item in &shown {
                let verdict = match item {
                    ManifestItem::Skipped { .. } => "NT".to_string(),
                    ManifestItem::Testcase { .. } => item.verdict().to_uppercase(),
                };
                println!(
                    "{:<6} {:<8} {:<7} {:<50}",
                    item.index(),
                    verdict,
                    item.steps_count(),
                    truncate(item.title(), 50)
                );
            }
            let stats = summarize_items(&items);
            println!(
                "{} items: {} passed, {} failed, {} warned, {} skipped",
                items.len(),
                stats.passed,
                stats.failed,
                stats.warned,
                stats.skipped
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&shown)?);
        }
    }
    Ok(())
}

pub async fn steps(args: StepsArgs, config: &ReportConfig) -> Result<()> {
    let (layout, items) = load_manifest_items(&args.report)?;
    let loader = StepLoader::new(items, FsChunkSource::for_layout(&layout), &config.viewer);

    let steps = loader
        .load_steps(args.item)
        .await
        .with_context(|| format!("Failed to load steps of item {}", args.item))?;

    let query = StepQuery::new(args.filter, &args.search);
    if let Some(position) = args.around {
        return show_context(&steps, &query, position, args.radius, args.format);
    }

    let Some(page_index) = args.page.checked_sub(1) else {
        bail!("Pages are numbered from 1");
    };
    let page = match query_page(&steps, &query, page_index, config.viewer.page_size) {
        Ok(page) => page,
        Err(ValidationError::PageOutOfRange { page_count: 0, .. }) => {
            println!("No matching steps");
            return Ok(());
        }
        Err(ValidationError::PageOutOfRange { page_count, .. }) => {
            bail!(
                "Page {} is out of range; valid pages are 1 to {}",
                args.page,
                page_count
            );
        }
        Err(e) => return Err(e.into()),
    };

    match args.format {
        OutputFormat::Table => {
            print_step_header("");
            for step in &page.steps {
                print_step_row("", step);
            }
            println!(
                "Page {} of {} ({} matching steps)",
                page.page_index + 1,
                page.page_count,
                page.total_matches
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
    }
    Ok(())
}

/// Shows the full, unfiltered neighbourhood of the `position`th step matching `query`.
fn show_context(
    steps: &[Step],
    query: &StepQuery,
    position: usize,
    radius: usize,
    format: OutputFormat,
) -> Result<()> {
    let mut matching = steps.iter().filter(|step| query.matches(step));
    let target = position
        .checked_sub(1)
        .and_then(|skip| matching.nth(skip));
    let Some(target) = target else {
        let total = steps.iter().filter(|step| query.matches(step)).count();
        bail!("Step {position} is out of range; {total} steps match");
    };
    let Some(context) = step_context(steps, target, radius) else {
        bail!("Step {position} is not part of the item's steps");
    };

    match format {
        OutputFormat::Table => {
            print_step_header("  #     ");
            for (i, step) in context.steps.iter().enumerate() {
                let marker = if i == context.focus { '>' } else { ' ' };
                print_step_row(&format!("{marker} {:<5} ", context.offset + i + 1), step);
            }
            println!(
                "Steps {} to {} of {}",
                context.offset + 1,
                context.offset + context.steps.len(),
                steps.len()
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&context)?);
        }
    }
    Ok(())
}

fn print_step_header(prefix: &str) {
    println!(
        "{prefix}{:<14} {:<20} {:<6} {:<60}",
        "Timestamp", "Ident", "Result", "Content"
    );
    println!("{}", "-".repeat(prefix.len() + 103));
}

fn print_step_row(prefix: &str, step: &Step) {
    println!(
        "{prefix}{:<14} {:<20} {:<6} {:<60}",
        truncate(&step.timestamp, 14),
        truncate(&step.ident, 20),
        step.result,
        truncate(&single_line(&step.content), 60)
    );
}
