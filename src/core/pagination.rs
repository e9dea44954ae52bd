//! Batching of working-set records onto landscape A4 sheets.
//!
//! Each sheet holds a 2 x 2 grid of cells and each cell carries the front and
//! the back of one card side by side. Records are assigned to cells with a
//! fixed permutation so that the sheet stays aligned when printed duplex.

use serde::Serialize;
use tracing::warn;

use crate::core::layout::{CARD_HEIGHT_MM, CARD_WIDTH_MM, MM_TO_PX};
use crate::core::record::{CardRecord, CardVariant};

pub const PAGE_CAPACITY: usize = 4;
pub const SHEET_WIDTH_MM: f32 = 297.0;
pub const SHEET_HEIGHT_MM: f32 = 210.0;
pub const CELL_WIDTH_MM: f32 = CARD_WIDTH_MM * 2.0;
pub const CELL_HEIGHT_MM: f32 = CARD_HEIGHT_MM;

/// (column, row, position within the page) in grid order.
const SLOT_ORDER: [(u8, u8, usize); PAGE_CAPACITY] = [(1, 1, 0), (1, 2, 2), (2, 1, 1), (2, 2, 3)];

/// One grid cell of a page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CardSlot<'a> {
    pub column: u8,
    pub row: u8,
    pub record: Option<&'a CardRecord>,
}

/// A single printable sheet; always exactly [`PAGE_CAPACITY`] slots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageDescriptor<'a> {
    /// Zero-based sheet index.
    pub index: usize,
    pub variant: CardVariant,
    pub slots: [CardSlot<'a>; PAGE_CAPACITY],
}

impl<'a> PageDescriptor<'a> {
    /// One-based number used in file names and captions.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|s| s.record.is_some()).count()
    }

    pub fn slot(&self, column: u8, row: u8) -> Option<&CardSlot<'a>> {
        self.slots.iter().find(|s| s.column == column && s.row == row)
    }
}

/// Split `records` of `variant` into pages of four duplex-safe slots.
///
/// Records of another variant are skipped; a page never mixes variants.
pub fn paginate(records: &[CardRecord], variant: CardVariant) -> Vec<PageDescriptor<'_>> {
    let matching: Vec<&CardRecord> = records.iter().filter(|r| r.variant() == variant).collect();
    let skipped = records.len() - matching.len();
    if skipped > 0 {
        warn!(skipped, %variant, "records of another variant left out of pagination");
    }

    matching
        .chunks(PAGE_CAPACITY)
        .enumerate()
        .map(|(index, chunk)| PageDescriptor {
            index,
            variant,
            slots: SLOT_ORDER.map(|(column, row, position)| CardSlot {
                column,
                row,
                record: chunk.get(position).copied(),
            }),
        })
        .collect()
}

/// Gap between cells and crop-frame offset, in reference pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PrintSpacing {
    pub gap_px: f32,
    pub frame_offset_px: f32,
}

impl PrintSpacing {
    pub const NORMAL: PrintSpacing = PrintSpacing {
        gap_px: 10.0,
        frame_offset_px: -5.5,
    };
    pub const TIGHT: PrintSpacing = PrintSpacing {
        gap_px: 2.0,
        frame_offset_px: -1.5,
    };

    pub fn custom(gap_px: f32, frame_offset_px: f32) -> Self {
        Self {
            gap_px,
            frame_offset_px,
        }
    }

    pub fn gap_mm(&self) -> f32 {
        self.gap_px / MM_TO_PX
    }

    pub fn frame_offset_mm(&self) -> f32 {
        self.frame_offset_px / MM_TO_PX
    }
}

impl Default for PrintSpacing {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// Axis-aligned rectangle in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Grow by `amount` on every side; negative values shrink.
    pub fn inflate(&self, amount: f32) -> Rect {
        Rect {
            x: self.x - amount,
            y: self.y - amount,
            width: self.width + 2.0 * amount,
            height: self.height + 2.0 * amount,
        }
    }
}

/// Physical placement of the 2 x 2 grid on one sheet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SheetLayout {
    pub spacing: PrintSpacing,
    pub origin_x: f32,
    pub origin_y: f32,
}

impl SheetLayout {
    /// Center the grid, with `spacing.gap` between cells, on the sheet.
    pub fn new(spacing: PrintSpacing) -> Self {
        let gap = spacing.gap_mm();
        let grid_width = 2.0 * CELL_WIDTH_MM + gap;
        let grid_height = 2.0 * CELL_HEIGHT_MM + gap;
        Self {
            spacing,
            origin_x: (SHEET_WIDTH_MM - grid_width) / 2.0,
            origin_y: (SHEET_HEIGHT_MM - grid_height) / 2.0,
        }
    }

    pub fn sheet(&self) -> Rect {
        Rect {
            x: 0.0,
            y: 0.0,
            width: SHEET_WIDTH_MM,
            height: SHEET_HEIGHT_MM,
        }
    }

    /// Cell rectangle of a slot; empty slots occupy theirs too.
    pub fn cell(&self, slot: &CardSlot<'_>) -> Rect {
        let gap = self.spacing.gap_mm();
        let column = f32::from(slot.column.clamp(1, 2) - 1);
        let row = f32::from(slot.row.clamp(1, 2) - 1);
        Rect {
            x: self.origin_x + column * (CELL_WIDTH_MM + gap),
            y: self.origin_y + row * (CELL_HEIGHT_MM + gap),
            width: CELL_WIDTH_MM,
            height: CELL_HEIGHT_MM,
        }
    }

    /// Left half of the cell.
    pub fn front(&self, slot: &CardSlot<'_>) -> Rect {
        Rect {
            width: CARD_WIDTH_MM,
            ..self.cell(slot)
        }
    }

    /// Right half of the cell.
    pub fn back(&self, slot: &CardSlot<'_>) -> Rect {
        let cell = self.cell(slot);
        Rect {
            x: cell.x + CARD_WIDTH_MM,
            width: CARD_WIDTH_MM,
            ..cell
        }
    }

    /// Cutting guide around a cell; a negative offset pushes it outward.
    pub fn crop_frame(&self, slot: &CardSlot<'_>) -> Rect {
        self.cell(slot).inflate(-self.spacing.frame_offset_mm())
    }
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self::new(PrintSpacing::default())
    }
}
