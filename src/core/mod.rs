//! Pure card pipeline: source rows, records, selection, layout and pagination.

pub mod layout;
pub mod mapper;
pub mod pagination;
pub mod record;
pub mod selection;
pub mod source;
pub mod templates;

pub use layout::{
    CardGeometry, FaceGeometry, LayoutMode, TextBox, TextField, Unit, layout, layout_record,
};
pub use mapper::{map_row, map_rows, normalize_date, serial_to_date};
pub use pagination::{
    CardSlot, PAGE_CAPACITY, PageDescriptor, PrintSpacing, Rect, SheetLayout, paginate,
};
pub use record::{CardId, CardRecord, CardVariant, PhotoRef, RegularCard, SafetyCard};
pub use selection::{Branch, SelectionIndex, SelectionKey, detect_branch, filter_candidates};
pub use source::{Cell, SourceFormat, SourceRow, parse, parse_csv, parse_workbook};
pub use templates::{CardTemplate, Color, Template, TemplateOverrides, TemplateRegistry};
