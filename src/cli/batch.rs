//! Working-set lifecycle commands (`idcard batch ...`).

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use chrono::Local;
use clap::{Args, Subcommand};
use idcard::{Batch, CardVariant, Settings, SourceRequest, default_export_name, load_into};
use tracing::warn;

use crate::cli::common::VariantArg;
use crate::cli::utils::{load_batch, print_records, zero_based};

/// Supported `idcard batch` subcommands.
#[derive(Subcommand, Debug)]
pub enum BatchCommand {
    /// Create an empty batch file.
    Init(BatchInitArgs),
    /// Show batch metadata and its cards.
    Info(BatchPathArgs),
    /// Change the active card variant of a batch.
    Variant(BatchVariantArgs),
    /// Import candidates from a CSV/workbook file or a published CSV URL.
    Import(BatchImportArgs),
    /// Remove every card from a batch.
    Clear(BatchPathArgs),
}

/// Arguments for `idcard batch init`.
#[derive(Args, Debug)]
pub struct BatchInitArgs {
    /// Output batch path (JSONL).
    pub path: PathBuf,
    /// Card variant; defaults to the settings file.
    #[arg(long, value_enum)]
    pub variant: Option<VariantArg>,
}

#[derive(Args, Debug)]
pub struct BatchPathArgs {
    /// Batch file.
    pub batch: PathBuf,
}

/// Arguments for `idcard batch variant`.
#[derive(Args, Debug)]
pub struct BatchVariantArgs {
    /// Batch file to modify.
    pub batch: PathBuf,
    #[arg(value_enum)]
    pub variant: VariantArg,
}

/// Arguments for `idcard batch import`.
#[derive(Args, Debug)]
pub struct BatchImportArgs {
    /// Batch file to modify.
    pub batch: PathBuf,
    /// Local file path or http(s) URL.
    #[arg(short = 's', long)]
    pub source: String,
    /// Only import candidates matching this text.
    #[arg(long, default_value = "")]
    pub search: String,
    /// Import a single candidate by its 1-based position in the filtered list.
    #[arg(long)]
    pub row: Option<usize>,
}

/// Execute a batch command.
pub async fn handle(command: BatchCommand, settings: &Settings) -> Result<()> {
    match command {
        BatchCommand::Init(args) => init(args, settings),
        BatchCommand::Info(args) => info(args),
        BatchCommand::Variant(args) => variant(args),
        BatchCommand::Import(args) => import(args).await,
        BatchCommand::Clear(args) => clear(args),
    }
}

fn init(args: BatchInitArgs, settings: &Settings) -> Result<()> {
    let variant = args.variant.map(CardVariant::from).unwrap_or(settings.variant);
    let mut batch = Batch::new(variant);
    batch.save(&args.path)?;
    println!("Created {} batch {}", variant, args.path.display());
    Ok(())
}

fn info(args: BatchPathArgs) -> Result<()> {
    let batch = load_batch(&args.batch)?;
    let workspace = batch.to_workspace();
    let matching = workspace
        .working_set()
        .iter()
        .filter(|r| r.variant() == batch.variant())
        .count();
    println!("Batch: {}", args.batch.display());
    println!("Variant: {}", batch.variant());
    println!(
        "Created: {}",
        batch.header.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("Cards: {} ({} printable)", batch.cards.len(), matching);
    println!("Pages: {}", workspace.pages().len());
    println!(
        "Export name: {}",
        default_export_name(Local::now().date_naive())
    );
    print_records(&batch.cards, |record| {
        if record.variant() == batch.variant() { " " } else { "~" }
    });
    Ok(())
}

fn variant(args: BatchVariantArgs) -> Result<()> {
    let mut batch = load_batch(&args.batch)?;
    let mut workspace = batch.to_workspace();
    let target = CardVariant::from(args.variant);
    if !workspace.switch_variant(target) {
        println!("Batch {} already uses {}", args.batch.display(), target);
        return Ok(());
    }
    batch.update_from(workspace);
    batch.save(&args.batch)?;
    println!("Switched {} to {}", args.batch.display(), target);
    Ok(())
}

async fn import(args: BatchImportArgs) -> Result<()> {
    let mut batch = load_batch(&args.batch)?;
    let mut workspace = batch.to_workspace();
    let request = SourceRequest::parse(&args.source);
    if !load_into(&mut workspace, &request).await || workspace.candidates().is_empty() {
        warn!(source = %request, "nothing to import");
        println!("No candidates loaded from {}", request);
        return Ok(());
    }

    let added = match args.row {
        Some(row) => {
            let filtered = workspace.search(&args.search);
            let idx = zero_based(row, filtered.len())?;
            let target = filtered[idx].id();
            let position = workspace
                .candidates()
                .iter()
                .position(|c| c.id() == target)
                .ok_or_else(|| anyhow!("candidate {} disappeared", row))?;
            usize::from(workspace.import_one(position))
        }
        None => workspace.import_all(&args.search),
    };
    if let Some(branch) = workspace.selected_branch(&args.search) {
        println!("Branch: {} ({})", branch.name, branch.code);
    }
    let total = workspace.working_set().len();
    batch.update_from(workspace);
    batch.save(&args.batch)?;
    println!(
        "Imported {} card(s) into {} ({} total)",
        added,
        args.batch.display(),
        total
    );
    Ok(())
}

fn clear(args: BatchPathArgs) -> Result<()> {
    let mut batch = load_batch(&args.batch)?;
    let mut workspace = batch.to_workspace();
    let removed = workspace.working_set().len();
    workspace.clear();
    batch.update_from(workspace);
    batch.save(&args.batch)?;
    println!("Removed {} card(s) from {}", removed, args.batch.display());
    Ok(())
}
