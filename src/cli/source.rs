//! Source inspection commands (`idcard source ...`).

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use idcard::{CardVariant, Settings, SourceRequest, Workspace, load_into};

use crate::cli::common::VariantArg;
use crate::cli::utils::{load_batch, print_records};

/// Source subcommands.
#[derive(Subcommand, Debug)]
pub enum SourceCommand {
    /// List the candidates a source would produce.
    Preview(SourcePreviewArgs),
}

/// Arguments for `idcard source preview`.
#[derive(Args, Debug)]
pub struct SourcePreviewArgs {
    /// Local file path or http(s) URL.
    #[arg(short = 's', long)]
    pub source: String,
    /// Variant used to map rows; defaults to the batch, then the settings file.
    #[arg(long, value_enum)]
    pub variant: Option<VariantArg>,
    /// Only list candidates matching this text.
    #[arg(long, default_value = "")]
    pub search: String,
    /// Mark candidates already present in this batch.
    #[arg(long)]
    pub batch: Option<PathBuf>,
}

/// Execute a source command.
pub async fn handle(command: SourceCommand, settings: &Settings) -> Result<()> {
    match command {
        SourceCommand::Preview(args) => preview(args, settings).await,
    }
}

async fn preview(args: SourcePreviewArgs, settings: &Settings) -> Result<()> {
    let mut workspace = match &args.batch {
        Some(path) => load_batch(path)?.to_workspace(),
        None => Workspace::new(settings.variant),
    };
    if let Some(variant) = args.variant {
        workspace.switch_variant(CardVariant::from(variant));
    }

    let request = SourceRequest::parse(&args.source);
    load_into(&mut workspace, &request).await;

    let filtered = workspace.search(&args.search);
    println!(
        "{} candidate(s) from {} as {} ({} matching)",
        workspace.candidates().len(),
        request,
        workspace.variant(),
        filtered.len()
    );
    if let Some(branch) = workspace.selected_branch(&args.search) {
        println!("Branch: {} ({})", branch.name, branch.code);
    }
    print_records(filtered, |candidate| {
        if workspace.is_selected(candidate) { "*" } else { " " }
    });
    Ok(())
}
