//! Minimal SpreadsheetML writer: one worksheet per `ReportTable`, inline
//! strings, no shared string table or styles.

use super::report::{Cell, ReportTable};
use super::ReportSink;
use anyhow::{Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fs::{self, File};
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const SPREADSHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const RELATIONSHIP_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PACKAGE_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const WORKSHEET_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const DOCUMENT_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// Excel limits sheet names to 31 characters
const MAX_SHEET_NAME: usize = 31;

/// Writes the tables as `validation_report.xlsx` (or the configured name).
pub struct XlsxReportSink {
    path: PathBuf,
}

impl XlsxReportSink {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl ReportSink for XlsxReportSink {
    fn write_tables(&mut self, tables: &[ReportTable]) -> Result<Option<PathBuf>> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&self.path)
            .with_context(|| format!("Failed to create {}", self.path.display()))?;
        write_workbook(file, tables)
            .with_context(|| format!("Failed to write workbook {}", self.path.display()))?;

        info!(path = %self.path.display(), sheets = tables.len(), "wrote validation report");
        Ok(Some(self.path.clone()))
    }
}

/// Write a complete workbook package into `out`.
pub fn write_workbook<W: Write + Seek>(out: W, tables: &[ReportTable]) -> Result<()> {
    let mut zip = ZipWriter::new(out);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(&content_types_xml(tables.len())?)?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(&package_rels_xml()?)?;

    zip.start_file("xl/workbook.xml", options)?;
    zip.write_all(&workbook_xml(tables)?)?;

    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    zip.write_all(&workbook_rels_xml(tables.len())?)?;

    for (i, table) in tables.iter().enumerate() {
        zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
        zip.write_all(&sheet_xml(table)?)?;
    }

    zip.finish()?;
    Ok(())
}

fn new_document() -> Result<Writer<Vec<u8>>> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    Ok(writer)
}

fn content_types_xml(sheets: usize) -> Result<Vec<u8>> {
    let mut w = new_document()?;
    w.write_event(Event::Start(
        BytesStart::new("Types").with_attributes([("xmlns", CONTENT_TYPES_NS)]),
    ))?;
    w.write_event(Event::Empty(BytesStart::new("Default").with_attributes([
        ("Extension", "rels"),
        ("ContentType", "application/vnd.openxmlformats-package.relationships+xml"),
    ])))?;
    w.write_event(Event::Empty(
        BytesStart::new("Default").with_attributes([("Extension", "xml"), ("ContentType", "application/xml")]),
    ))?;
    w.write_event(Event::Empty(BytesStart::new("Override").with_attributes([
        ("PartName", "/xl/workbook.xml"),
        (
            "ContentType",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml",
        ),
    ])))?;
    for i in 1..=sheets {
        let part = format!("/xl/worksheets/sheet{i}.xml");
        w.write_event(Event::Empty(BytesStart::new("Override").with_attributes([
            ("PartName", part.as_str()),
            (
                "ContentType",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml",
            ),
        ])))?;
    }
    w.write_event(Event::End(BytesEnd::new("Types")))?;
    Ok(w.into_inner())
}

fn package_rels_xml() -> Result<Vec<u8>> {
    let mut w = new_document()?;
    w.write_event(Event::Start(
        BytesStart::new("Relationships").with_attributes([("xmlns", PACKAGE_REL_NS)]),
    ))?;
    w.write_event(Event::Empty(BytesStart::new("Relationship").with_attributes([
        ("Id", "rId1"),
        ("Type", DOCUMENT_REL_TYPE),
        ("Target", "xl/workbook.xml"),
    ])))?;
    w.write_event(Event::End(BytesEnd::new("Relationships")))?;
    Ok(w.into_inner())
}

fn workbook_xml(tables: &[ReportTable]) -> Result<Vec<u8>> {
    let mut w = new_document()?;
    w.write_event(Event::Start(BytesStart::new("workbook").with_attributes([
        ("xmlns", SPREADSHEET_NS),
        ("xmlns:r", RELATIONSHIP_NS),
    ])))?;
    w.write_event(Event::Start(BytesStart::new("sheets")))?;
    for (i, table) in tables.iter().enumerate() {
        let name: String = table.name.chars().take(MAX_SHEET_NAME).collect();
        let sheet_id = (i + 1).to_string();
        let rel_id = format!("rId{}", i + 1);
        w.write_event(Event::Empty(BytesStart::new("sheet").with_attributes([
            ("name", name.as_str()),
            ("sheetId", sheet_id.as_str()),
            ("r:id", rel_id.as_str()),
        ])))?;
    }
    w.write_event(Event::End(BytesEnd::new("sheets")))?;
    w.write_event(Event::End(BytesEnd::new("workbook")))?;
    Ok(w.into_inner())
}

fn workbook_rels_xml(sheets: usize) -> Result<Vec<u8>> {
    let mut w = new_document()?;
    w.write_event(Event::Start(
        BytesStart::new("Relationships").with_attributes([("xmlns", PACKAGE_REL_NS)]),
    ))?;
    for i in 1..=sheets {
        let rel_id = format!("rId{i}");
        let target = format!("worksheets/sheet{i}.xml");
        w.write_event(Event::Empty(BytesStart::new("Relationship").with_attributes([
            ("Id", rel_id.as_str()),
            ("Type", WORKSHEET_REL_TYPE),
            ("Target", target.as_str()),
        ])))?;
    }
    w.write_event(Event::End(BytesEnd::new("Relationships")))?;
    Ok(w.into_inner())
}

fn sheet_xml(table: &ReportTable) -> Result<Vec<u8>> {
    let mut w = new_document()?;
    w.write_event(Event::Start(
        BytesStart::new("worksheet").with_attributes([("xmlns", SPREADSHEET_NS)]),
    ))?;
    w.write_event(Event::Start(BytesStart::new("sheetData")))?;

    let header: Vec<Cell> = table.headers.iter().map(Cell::text).collect();
    write_row(&mut w, 1, &header)?;
    for (i, row) in table.rows.iter().enumerate() {
        write_row(&mut w, i + 2, row)?;
    }

    w.write_event(Event::End(BytesEnd::new("sheetData")))?;
    w.write_event(Event::End(BytesEnd::new("worksheet")))?;
    Ok(w.into_inner())
}

fn write_row(w: &mut Writer<Vec<u8>>, row_number: usize, cells: &[Cell]) -> Result<()> {
    let row_ref = row_number.to_string();
    w.write_event(Event::Start(
        BytesStart::new("row").with_attributes([("r", row_ref.as_str())]),
    ))?;

    for (col, cell) in cells.iter().enumerate() {
        let cell_ref = format!("{}{row_number}", column_name(col));
        let (kind, value) = match cell {
            Cell::Empty => continue,
            Cell::Text(text) => ("inlineStr", text.clone()),
            Cell::Int(n) => ("n", n.to_string()),
            Cell::Float(f) => ("n", f.to_string()),
            Cell::Bool(b) => ("b", if *b { "1" } else { "0" }.to_string()),
        };

        w.write_event(Event::Start(
            BytesStart::new("c").with_attributes([("r", cell_ref.as_str()), ("t", kind)]),
        ))?;
        if kind == "inlineStr" {
            w.write_event(Event::Start(BytesStart::new("is")))?;
            w.write_event(Event::Start(
                BytesStart::new("t").with_attributes([("xml:space", "preserve")]),
            ))?;
            w.write_event(Event::Text(BytesText::new(&value)))?;
            w.write_event(Event::End(BytesEnd::new("t")))?;
            w.write_event(Event::End(BytesEnd::new("is")))?;
        } else {
            w.write_event(Event::Start(BytesStart::new("v")))?;
            w.write_event(Event::Text(BytesText::new(&value)))?;
            w.write_event(Event::End(BytesEnd::new("v")))?;
        }
        w.write_event(Event::End(BytesEnd::new("c")))?;
    }

    w.write_event(Event::End(BytesEnd::new("row")))?;
    Ok(())
}

/// 0 -> "A", 25 -> "Z", 26 -> "AA"
fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}
