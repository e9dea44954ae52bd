//! Rendering commands (`idcard render ...`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Subcommand};
use idcard::image::{PngRenderer, write_pages};
use idcard::{
    HtmlDocument, PrintSpacing, RenderContext, Settings, SheetLayout, default_export_name,
};

use crate::cli::common::SpacingArg;
use crate::cli::utils::{load_batch, write_output};

/// Available render subcommands.
#[derive(Subcommand, Debug)]
pub enum RenderCommand {
    /// Rasterize every sheet to `page_NNN.png`.
    Image(RenderImageArgs),
    /// Write one HTML print document for the whole batch.
    Html(RenderHtmlArgs),
}

/// Args for `idcard render image`.
#[derive(Args, Debug)]
pub struct RenderImageArgs {
    /// Batch file to render.
    pub batch: PathBuf,
    /// Output directory for generated PNGs.
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Print spacing preset; defaults to the settings file.
    #[arg(long, value_enum)]
    pub spacing: Option<SpacingArg>,
    /// Dots per inch used when rasterising; defaults to the settings file.
    #[arg(long)]
    pub dpi: Option<u32>,
    /// TrueType/OpenType font for card text.
    #[arg(long)]
    pub font: Option<PathBuf>,
}

/// Args for `idcard render html`.
#[derive(Args, Debug)]
pub struct RenderHtmlArgs {
    /// Batch file to render.
    pub batch: PathBuf,
    /// Output file (`-` for stdout); defaults to "ID Card DDMMYYYY.html".
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Print spacing preset; defaults to the settings file.
    #[arg(long, value_enum)]
    pub spacing: Option<SpacingArg>,
}

/// Execute a render command.
pub fn handle(command: RenderCommand, settings: &Settings) -> Result<()> {
    match command {
        RenderCommand::Image(args) => image(args, settings),
        RenderCommand::Html(args) => html(args, settings),
    }
}

fn context(settings: &Settings, spacing: Option<SpacingArg>) -> RenderContext {
    let mut ctx = RenderContext::from_settings(settings);
    if let Some(spacing) = spacing {
        ctx.sheet = SheetLayout::new(PrintSpacing::from(spacing));
    }
    ctx
}

fn image(args: RenderImageArgs, settings: &Settings) -> Result<()> {
    let batch = load_batch(&args.batch)?;
    let workspace = batch.to_workspace();
    let pages = workspace.printable_pages()?;
    let ctx = context(settings, args.spacing);

    let mut renderer = PngRenderer::new(args.dpi.unwrap_or(settings.dpi));
    if let Some(font) = args.font.as_ref().or(settings.font.as_ref()) {
        renderer = renderer.with_font_file(font)?;
    }

    let written = write_pages(&renderer, &pages, &ctx, &args.output)
        .with_context(|| format!("failed to render pages into {}", args.output.display()))?;
    println!(
        "Rendered {} page(s) to {} at {} DPI",
        written.len(),
        args.output.display(),
        renderer.dpi()
    );
    Ok(())
}

fn html(args: RenderHtmlArgs, settings: &Settings) -> Result<()> {
    let batch = load_batch(&args.batch)?;
    let workspace = batch.to_workspace();
    let pages = workspace.printable_pages()?;
    let ctx = context(settings, args.spacing);

    let title = default_export_name(Local::now().date_naive());
    let document = HtmlDocument.render(&title, &pages, &ctx)?;
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{title}.html")));
    write_output(&output, &document)?;
    if output.as_os_str() != "-" {
        println!("Wrote {} page(s) to {}", pages.len(), output.display());
    }
    Ok(())
}
