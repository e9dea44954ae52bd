//! Command-line interface wiring for the `idcard` binary.
//!
//! This module owns the clap definitions and delegates execution to
//! submodules that encapsulate each command family.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod batch;
pub mod card;
pub mod common;
pub mod layout;
pub mod render;
pub mod source;
pub mod template;
pub mod utils;

/// Parsed CLI entrypoint for the `idcard` binary.
#[derive(Parser, Debug)]
#[command(
    name = "idcard",
    version,
    about = "Build print-ready ID card sheets from spreadsheets"
)]
pub struct Cli {
    /// Settings file (defaults to $IDCARD_SETTINGS or the user config dir).
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Top-level command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// High-level command families made available to end users.
#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(subcommand)]
    Batch(batch::BatchCommand),
    #[command(subcommand)]
    Source(source::SourceCommand),
    #[command(subcommand)]
    Card(card::CardCommand),
    /// Print card or page geometry as JSON.
    Layout(layout::LayoutArgs),
    #[command(subcommand)]
    Render(render::RenderCommand),
    #[command(subcommand)]
    Template(template::TemplateCommand),
}

/// Execute the requested command.
pub async fn run(cli: Cli) -> Result<()> {
    let settings = utils::load_settings(cli.settings.as_deref())?;
    match cli.command {
        Command::Batch(cmd) => batch::handle(cmd, &settings).await,
        Command::Source(cmd) => source::handle(cmd, &settings).await,
        Command::Card(cmd) => card::handle(cmd),
        Command::Layout(args) => layout::handle(args, &settings),
        Command::Render(cmd) => render::handle(cmd, &settings),
        Command::Template(cmd) => template::handle(cmd, &settings),
    }
}
