//! Geometry inspection (`idcard layout ...`).

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use idcard::core::{Rect, layout};
use idcard::{CardSlot, CardVariant, PrintSpacing, Settings, SheetLayout};
use serde::Serialize;

use crate::cli::common::{ModeArg, SpacingArg};
use crate::cli::utils::{load_batch, write_output, zero_based};

/// Arguments for `idcard layout`.
#[derive(Args, Debug)]
pub struct LayoutArgs {
    /// Batch file to read.
    pub batch: PathBuf,
    /// 1-based card index; omit for a blank card of the batch variant.
    #[arg(short = 'i', long = "index")]
    pub index: Option<usize>,
    #[arg(long, default_value_t = ModeArg::Print, value_enum)]
    pub mode: ModeArg,
    /// Preview scale factor (ignored in print mode).
    #[arg(long, default_value_t = 1.0)]
    pub scale: f32,
    /// Emit page descriptors with sheet placement instead of one card.
    #[arg(long)]
    pub pages: bool,
    /// Override the spacing preset from the settings file.
    #[arg(long, value_enum)]
    pub spacing: Option<SpacingArg>,
    /// Output file (`-` for stdout).
    #[arg(short = 'o', long = "output", default_value = "-")]
    pub output: PathBuf,
}

#[derive(Serialize)]
struct PlacedSlot<'a> {
    #[serde(flatten)]
    slot: &'a CardSlot<'a>,
    cell: Rect,
    front: Rect,
    back: Rect,
    crop_frame: Rect,
}

#[derive(Serialize)]
struct PlacedPage<'a> {
    index: usize,
    variant: CardVariant,
    slots: Vec<PlacedSlot<'a>>,
}

/// Execute the layout command.
pub fn handle(args: LayoutArgs, settings: &Settings) -> Result<()> {
    let batch = load_batch(&args.batch)?;
    let json = if args.pages {
        let spacing = args
            .spacing
            .map(PrintSpacing::from)
            .unwrap_or_else(|| settings.spacing.resolve());
        let sheet = SheetLayout::new(spacing);
        let workspace = batch.to_workspace();
        let pages = workspace.pages();
        let placed: Vec<PlacedPage<'_>> = pages
            .iter()
            .map(|page| PlacedPage {
                index: page.index,
                variant: page.variant,
                slots: page
                    .slots
                    .iter()
                    .map(|slot| PlacedSlot {
                        slot,
                        cell: sheet.cell(slot),
                        front: sheet.front(slot),
                        back: sheet.back(slot),
                        crop_frame: sheet.crop_frame(slot),
                    })
                    .collect(),
            })
            .collect();
        serde_json::to_string_pretty(&placed)?
    } else {
        let variant = batch.variant();
        let record = match args.index {
            Some(index) => Some(&batch.cards[zero_based(index, batch.cards.len())?]),
            None => None,
        };
        let variant = record.map(|r| r.variant()).unwrap_or(variant);
        let geometry = layout(
            record,
            variant,
            &settings.template(variant),
            args.mode.into(),
            args.scale,
        );
        serde_json::to_string_pretty(&geometry)?
    };
    write_output(&args.output, &format!("{json}\n"))
}
