//! Workbook decoding against a small xlsx assembled in memory.

use std::io::{Cursor, Write};

use idcard::core::{SourceFormat, map_rows, parse, parse_workbook};
use idcard::{CardRecord, CardVariant, Cell};
use pretty_assertions::assert_eq;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
<Override PartName="/xl/worksheets/sheet2.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets>
<sheet name="Passports" sheetId="1" r:id="rId1"/>
<sheet name="Archive" sheetId="2" r:id="rId2"/>
</sheets>
</workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/>
</Relationships>"#;

// Column A stays empty. H3 widens the range past the end of row 2.
const PASSPORTS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<sheetData>
<row r="1">
<c r="B1" t="inlineStr"><is><t>id</t></is></c>
<c r="C1" t="inlineStr"><is><t>name</t></is></c>
<c r="D1" t="inlineStr"><is><t>issued</t></is></c>
<c r="E1" t="inlineStr"><is><t>module</t></is></c>
<c r="F1" t="inlineStr"><is><t>back</t></is></c>
</row>
<row r="2">
<c r="B2" t="inlineStr"><is><t>S-001</t></is></c>
<c r="C2" t="inlineStr"><is><t> Malee </t></is></c>
<c r="D2"><v>45292</v></c>
<c r="E2" t="inlineStr"><is><t>01/03/25</t></is></c>
<c r="F2" t="inlineStr"><is><t>Fire drill</t></is></c>
</row>
<row r="3">
<c r="B3"><v>1001</v></c>
<c r="C3" t="inlineStr"><is><t>Anan</t></is></c>
<c r="H3" t="b"><v>1</v></c>
</row>
</sheetData>
</worksheet>"#;

const ARCHIVE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<sheetData>
<row r="1"><c r="A1" t="inlineStr"><is><t>id</t></is></c></row>
<row r="2"><c r="A2" t="inlineStr"><is><t>OLD</t></is></c></row>
</sheetData>
</worksheet>"#;

fn passport_workbook() -> Vec<u8> {
    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("xl/workbook.xml", WORKBOOK),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ("xl/worksheets/sheet1.xml", PASSPORTS),
        ("xl/worksheets/sheet2.xml", ARCHIVE),
    ];
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in parts {
        zip.start_file(name, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

#[test]
fn first_sheet_keeps_absolute_columns() {
    let rows = parse_workbook(&passport_workbook()).unwrap();
    assert_eq!(rows.len(), 2);

    let first = &rows[0];
    assert_eq!(first.len(), 6);
    assert_eq!(first.cell(0), &Cell::Empty);
    assert_eq!(first.text(1), "S-001");
    assert_eq!(first.text(2), "Malee");
    assert_eq!(first.cell(3), &Cell::Number(45292.0));

    let second = &rows[1];
    assert_eq!(second.len(), 8);
    assert_eq!(second.cell(1), &Cell::Number(1001.0));
    assert_eq!(second.text(1), "1001");
    assert_eq!(second.text(7), "TRUE");
    assert!(rows.iter().all(|row| row.text(0) != "OLD"));
}

#[test]
fn serial_dates_map_to_calendar_dates() {
    let bytes = passport_workbook();
    assert_eq!(SourceFormat::detect(None, &bytes), SourceFormat::Workbook);
    let rows = parse(SourceFormat::Workbook, &bytes).unwrap();
    let cards = map_rows(&rows, CardVariant::Safety);

    let CardRecord::Safety(malee) = &cards[0] else {
        panic!("expected safety card");
    };
    assert_eq!(malee.safety_id, "S-001");
    assert_eq!(malee.name, "Malee");
    assert_eq!(malee.issue_date, "01/01/2024");
    assert_eq!(malee.training_module, "01/03/25");
    assert_eq!(malee.back_details, "Fire drill");

    let CardRecord::Safety(anan) = &cards[1] else {
        panic!("expected safety card");
    };
    assert_eq!(anan.safety_id, "1001");
    assert_eq!(anan.issue_date, "");
}
