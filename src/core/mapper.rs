//! Positional mapping of source rows onto card records.
//!
//! Columns are fixed per variant and never looked up by header name. Mapping
//! cannot fail: anything missing or malformed becomes an empty string.

use chrono::DateTime;

use crate::core::record::{
    CardId, CardRecord, CardVariant, DEFAULT_POSITION, RegularCard, SAFETY_EXPIRY_DATE,
    SafetyCard,
};
use crate::core::source::{Cell, SourceRow};

/// Serial day number of 1970-01-01 in the 1900 spreadsheet date system.
pub const SERIAL_UNIX_EPOCH: f64 = 25569.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

mod safety_col {
    pub const SAFETY_ID: usize = 1;
    pub const NAME: usize = 2;
    pub const ISSUE_DATE: usize = 3;
    pub const TRAINING_MODULE: usize = 4;
    pub const BACK_DETAILS: usize = 5;
}

mod regular_col {
    pub const BRANCH_CODE: usize = 3;
    pub const BRANCH_NAME: usize = 4;
    pub const EMPLOYEE_CODE: usize = 5;
    pub const FIRST_NAME: usize = 9;
    pub const LAST_NAME: usize = 10;
    pub const HAS_PRINTED: usize = 14;
}

/// Map one row using the column table of `variant`.
pub fn map_row(row: &SourceRow, variant: CardVariant) -> CardRecord {
    match variant {
        CardVariant::Regular => CardRecord::Regular(map_regular(row)),
        CardVariant::Safety => CardRecord::Safety(map_safety(row)),
    }
}

/// Map every row with the same variant.
pub fn map_rows(rows: &[SourceRow], variant: CardVariant) -> Vec<CardRecord> {
    rows.iter().map(|row| map_row(row, variant)).collect()
}

fn map_regular(row: &SourceRow) -> RegularCard {
    let branch_code = row.text(regular_col::BRANCH_CODE);
    let branch_name = row.text(regular_col::BRANCH_NAME);
    let employee_code = row.text(regular_col::EMPLOYEE_CODE);
    let name = format!(
        "{} {}",
        row.text(regular_col::FIRST_NAME),
        row.text(regular_col::LAST_NAME)
    )
    .trim()
    .to_string();
    let department = if !branch_name.is_empty() && !branch_code.is_empty() {
        format!("{branch_name} ({branch_code})")
    } else {
        String::new()
    };
    let has_printed = row
        .text(regular_col::HAS_PRINTED)
        .eq_ignore_ascii_case("TRUE");

    RegularCard {
        id: CardId::new(),
        name,
        position: DEFAULT_POSITION.to_string(),
        id_code: employee_code.clone(),
        department,
        branch_code,
        branch_name,
        employee_code,
        has_printed,
        photo: None,
    }
}

fn map_safety(row: &SourceRow) -> SafetyCard {
    SafetyCard {
        id: CardId::new(),
        safety_id: row.text(safety_col::SAFETY_ID),
        name: row.text(safety_col::NAME),
        issue_date: normalize_date(row.cell(safety_col::ISSUE_DATE)),
        training_module: normalize_date(row.cell(safety_col::TRAINING_MODULE)),
        back_details: row.text(safety_col::BACK_DETAILS),
        expiry_date: SAFETY_EXPIRY_DATE.to_string(),
        photo: None,
    }
}

/// Numeric cells are spreadsheet serial dates; text passes through untouched.
/// A zero serial counts as an empty cell.
pub fn normalize_date(cell: &Cell) -> String {
    match cell {
        Cell::Number(serial) if *serial == 0.0 => String::new(),
        Cell::Number(serial) => serial_to_date(*serial).unwrap_or_default(),
        other => other.as_text(),
    }
}

/// Format a spreadsheet serial day number as `DD/MM/YYYY` (UTC).
///
/// Only whole days survive; returns `None` when the value is outside the
/// representable calendar range.
pub fn serial_to_date(serial: f64) -> Option<String> {
    if !serial.is_finite() {
        return None;
    }
    let millis = ((serial - SERIAL_UNIX_EPOCH) * SECONDS_PER_DAY * 1000.0).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64).map(|dt| dt.format("%d/%m/%Y").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(cells: &[&str]) -> SourceRow {
        cells.iter().copied().collect()
    }

    #[test]
    fn safety_row_maps_by_position() {
        let record = map_row(
            &row(&["", "B001", "ชื่อ", "01/01/2024", "1/3/2025", "back text"]),
            CardVariant::Safety,
        );
        let CardRecord::Safety(card) = record else {
            panic!("expected safety record");
        };
        assert_eq!(card.safety_id, "B001");
        assert_eq!(card.name, "ชื่อ");
        assert_eq!(card.issue_date, "01/01/2024");
        assert_eq!(card.training_module, "1/3/2025");
        assert_eq!(card.back_details, "back text");
        assert_eq!(card.expiry_date, "28/02/2028");
    }

    #[test]
    fn regular_row_builds_name_and_department() {
        let mut cells = vec![""; 15];
        cells[3] = "B12";
        cells[4] = "Ratchada";
        cells[5] = "E0042";
        cells[9] = "Somchai";
        cells[10] = "Jaidee";
        cells[14] = "true";
        let CardRecord::Regular(card) = map_row(&row(&cells), CardVariant::Regular) else {
            panic!("expected regular record");
        };
        assert_eq!(card.name, "Somchai Jaidee");
        assert_eq!(card.position, DEFAULT_POSITION);
        assert_eq!(card.department, "Ratchada (B12)");
        assert_eq!(card.employee_code, "E0042");
        assert_eq!(card.id_code, "E0042");
        assert!(card.has_printed);
    }

    #[test]
    fn short_regular_row_degrades_to_empty_fields() {
        let CardRecord::Regular(card) = map_row(&row(&["x", "y"]), CardVariant::Regular) else {
            panic!("expected regular record");
        };
        assert_eq!(card.name, "");
        assert_eq!(card.department, "");
        assert_eq!(card.branch_code, "");
        assert!(!card.has_printed);
    }

    #[test]
    fn department_needs_both_branch_parts() {
        let mut cells = vec![""; 6];
        cells[4] = "Ratchada";
        let CardRecord::Regular(card) = map_row(&row(&cells), CardVariant::Regular) else {
            panic!("expected regular record");
        };
        assert_eq!(card.department, "");
        assert_eq!(card.branch_name, "Ratchada");
    }

    #[test]
    fn serial_dates_decode() {
        assert_eq!(serial_to_date(45292.0).as_deref(), Some("01/01/2024"));
        assert_eq!(serial_to_date(25569.0).as_deref(), Some("01/01/1970"));
        assert_eq!(serial_to_date(45717.0).as_deref(), Some("01/03/2025"));
        assert_eq!(serial_to_date(f64::NAN), None);
    }

    #[test]
    fn serial_decoding_is_deterministic() {
        for serial in [1.0, 36526.0, 45292.0, 45292.4, 60000.0] {
            assert_eq!(serial_to_date(serial), serial_to_date(serial));
        }
    }

    #[test]
    fn numeric_date_cells_are_normalized_text_is_not() {
        let mut cells = vec![Cell::Empty; 6];
        cells[3] = Cell::Number(45292.0);
        cells[4] = Cell::Text("45292".into());
        let CardRecord::Safety(card) = map_row(&SourceRow::new(cells), CardVariant::Safety)
        else {
            panic!("expected safety record");
        };
        assert_eq!(card.issue_date, "01/01/2024");
        assert_eq!(card.training_module, "45292");
    }

    #[test]
    fn zero_date_cell_is_blank() {
        assert_eq!(normalize_date(&Cell::Number(0.0)), "");
        let mut cells = vec![Cell::Empty; 6];
        cells[3] = Cell::Number(0.0);
        let CardRecord::Safety(card) = map_row(&SourceRow::new(cells), CardVariant::Safety)
        else {
            panic!("expected safety record");
        };
        assert_eq!(card.issue_date, "");
    }

    #[test]
    fn numeric_codes_keep_integer_form() {
        let mut cells = vec![Cell::Empty; 6];
        cells[5] = Cell::Number(10042.0);
        let CardRecord::Regular(card) = map_row(&SourceRow::new(cells), CardVariant::Regular)
        else {
            panic!("expected regular record");
        };
        assert_eq!(card.employee_code, "10042");
    }
}
