//! ID card toolkit: spreadsheet ingestion, card layout and duplex print pagination.

pub mod batch;
pub mod core;
pub mod error;
pub mod image;
pub mod loader;
pub mod logging;
pub mod render;
pub mod settings;
pub mod workspace;

pub use crate::batch::{Batch, BatchHeader};
pub use crate::core::{
    CardGeometry, CardRecord, CardSlot, CardTemplate, CardVariant, Cell, LayoutMode,
    PageDescriptor, PrintSpacing, RegularCard, SafetyCard, SelectionIndex, SheetLayout,
    SourceRow, TemplateRegistry, layout, map_row, paginate, parse_csv,
};
pub use crate::error::{RenderError, SettingsError, SourceError};
pub use crate::image::PngRenderer;
pub use crate::loader::{LoadedSource, SourceRequest, fetch, load_into};
pub use crate::render::{HtmlDocument, PageRenderer, RenderContext};
pub use crate::settings::{JsonSettingsStore, Settings, SettingsStore, SpacingChoice};
pub use crate::workspace::{LoadTicket, Workspace, default_export_name};
