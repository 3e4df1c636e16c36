//! Minimal single-sheet `.xlsx` codec.
//!
//! An xlsx workbook is a zip container of XML parts. Writing produces the
//! smallest package spreadsheet editors accept (content types, package rels,
//! workbook, workbook rels, one worksheet) with inline-string and numeric
//! cells. Reading follows the workbook's first `<sheet>` through its
//! relationship, and understands shared strings, so a file re-saved by a
//! spreadsheet editor loads the same way as one written here.

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, Write};

use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const PART_WORKBOOK: &str = "xl/workbook.xml";
const PART_WORKBOOK_RELS: &str = "xl/_rels/workbook.xml.rels";
const PART_SHARED_STRINGS: &str = "xl/sharedStrings.xml";
const PART_FIRST_SHEET: &str = "xl/worksheets/sheet1.xml";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

#[derive(Debug, Error)]
pub enum XlsxError {
    #[error("zip container: {0}")]
    Zip(#[from] ZipError),
    #[error("xml: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Format(String),
}

/// A single cell value as seen by the ledger.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    /// Text cell, or `Empty` for the empty string.
    pub fn text(value: &str) -> Cell {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s,
            Cell::Number(n) => n.to_string(),
            Cell::Bool(true) => "TRUE".to_string(),
            Cell::Bool(false) => "FALSE".to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

/// One worksheet: a name plus its rows, header row included.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

/// `0 -> A`, `25 -> Z`, `26 -> AA`.
pub fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8(name).unwrap_or_default()
}

/// Columns per sheet; the last one is `XFD`.
pub const MAX_COLUMNS: usize = 16_384;

/// Zero-based column of a cell reference such as `"AB12"`. `None` when the
/// reference has no letters or points past the last column.
pub fn column_index(cell_ref: &str) -> Option<usize> {
    let letters: Vec<u8> = cell_ref
        .bytes()
        .take_while(u8::is_ascii_alphabetic)
        .map(|b| b.to_ascii_uppercase())
        .collect();
    if letters.is_empty() {
        return None;
    }
    let mut index = 0usize;
    for b in letters {
        index = index
            .checked_mul(26)?
            .checked_add(usize::from(b - b'A' + 1))?;
        if index > MAX_COLUMNS {
            return None;
        }
    }
    Some(index - 1)
}

// ---------------------------------------------------------------------------
// Write
// ---------------------------------------------------------------------------

/// Encode `sheet` as a complete single-sheet workbook.
pub fn write_workbook(sheet: &Sheet) -> Result<Vec<u8>, XlsxError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(CONTENT_TYPES.as_bytes())?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(PACKAGE_RELS.as_bytes())?;

    zip.start_file(PART_WORKBOOK, options)?;
    zip.write_all(workbook_xml(&sheet.name).as_bytes())?;

    zip.start_file(PART_WORKBOOK_RELS, options)?;
    zip.write_all(WORKBOOK_RELS.as_bytes())?;

    zip.start_file(PART_FIRST_SHEET, options)?;
    zip.write_all(&worksheet_xml(&sheet.rows)?)?;

    Ok(zip.finish()?.into_inner())
}

fn workbook_xml(sheet_name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{NS_MAIN}" xmlns:r="{NS_REL}"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        escape(xml_safe_text(sheet_name).as_ref())
    )
}

/// Drop characters XML 1.0 cannot carry even when escaped (most C0 controls
/// and the U+FFFE/U+FFFF noncharacters).
fn xml_safe_text(text: &str) -> Cow<'_, str> {
    fn allowed(c: char) -> bool {
        !matches!(
            c,
            '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}'
        )
    }
    if text.chars().all(allowed) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|c| allowed(*c)).collect())
    }
}

fn worksheet_xml(rows: &[Vec<Cell>]) -> Result<Vec<u8>, XlsxError> {
    let mut wr = Writer::new(Vec::new());
    wr.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

    let mut root = BytesStart::new("worksheet");
    root.push_attribute(("xmlns", NS_MAIN));
    wr.write_event(Event::Start(root))?;
    wr.write_event(Event::Start(BytesStart::new("sheetData")))?;

    for (row_idx, row) in rows.iter().enumerate() {
        let row_number = (row_idx + 1).to_string();
        wr.write_event(Event::Start(
            BytesStart::new("row").with_attributes([("r", row_number.as_str())]),
        ))?;
        for (col_idx, cell) in row.iter().enumerate() {
            let cell_ref = format!("{}{}", column_name(col_idx), row_number);
            write_cell(&mut wr, &cell_ref, cell)?;
        }
        wr.write_event(Event::End(BytesEnd::new("row")))?;
    }

    wr.write_event(Event::End(BytesEnd::new("sheetData")))?;
    wr.write_event(Event::End(BytesEnd::new("worksheet")))?;
    Ok(wr.into_inner())
}

fn write_cell<W: Write>(
    wr: &mut Writer<W>,
    cell_ref: &str,
    cell: &Cell,
) -> Result<(), quick_xml::Error> {
    match cell {
        Cell::Empty => Ok(()),
        Cell::Number(n) if n.is_finite() => {
            let value = n.to_string();
            write_value_cell(wr, cell_ref, None, &value)
        }
        Cell::Number(n) => write_inline_string(wr, cell_ref, &n.to_string()),
        Cell::Bool(b) => write_value_cell(wr, cell_ref, Some("b"), if *b { "1" } else { "0" }),
        Cell::Text(s) if s.is_empty() => Ok(()),
        Cell::Text(s) => write_inline_string(wr, cell_ref, s),
    }
}

fn write_value_cell<W: Write>(
    wr: &mut Writer<W>,
    cell_ref: &str,
    cell_type: Option<&str>,
    value: &str,
) -> Result<(), quick_xml::Error> {
    let mut c = BytesStart::new("c");
    c.push_attribute(("r", cell_ref));
    if let Some(t) = cell_type {
        c.push_attribute(("t", t));
    }
    wr.write_event(Event::Start(c))?;
    wr.write_event(Event::Start(BytesStart::new("v")))?;
    wr.write_event(Event::Text(BytesText::new(value)))?;
    wr.write_event(Event::End(BytesEnd::new("v")))?;
    wr.write_event(Event::End(BytesEnd::new("c")))?;
    Ok(())
}

fn write_inline_string<W: Write>(
    wr: &mut Writer<W>,
    cell_ref: &str,
    text: &str,
) -> Result<(), quick_xml::Error> {
    let text = xml_safe_text(text);
    let text = text.as_ref();
    let c = BytesStart::new("c").with_attributes([("r", cell_ref), ("t", "inlineStr")]);
    wr.write_event(Event::Start(c))?;
    wr.write_event(Event::Start(BytesStart::new("is")))?;
    let mut t = BytesStart::new("t");
    if text.trim() != text {
        t.push_attribute(("xml:space", "preserve"));
    }
    wr.write_event(Event::Start(t))?;
    wr.write_event(Event::Text(BytesText::new(text)))?;
    wr.write_event(Event::End(BytesEnd::new("t")))?;
    wr.write_event(Event::End(BytesEnd::new("is")))?;
    wr.write_event(Event::End(BytesEnd::new("c")))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

/// Decode the first worksheet of a workbook. Fully blank rows are dropped.
pub fn read_first_sheet(bytes: &[u8]) -> Result<Sheet, XlsxError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let (name, sheet_part) = match read_part(&mut archive, PART_WORKBOOK)? {
        Some(workbook) => {
            let (name, rel_id) = first_sheet_entry(&workbook)?;
            let target = match (rel_id, read_part(&mut archive, PART_WORKBOOK_RELS)?) {
                (Some(id), Some(rels)) => relationship_target(&rels, &id)?,
                _ => None,
            };
            (name, target.unwrap_or_else(|| PART_FIRST_SHEET.to_string()))
        }
        None => (String::new(), PART_FIRST_SHEET.to_string()),
    };

    let shared = match read_part(&mut archive, PART_SHARED_STRINGS)? {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };

    let sheet_xml = read_part(&mut archive, &sheet_part)?
        .ok_or_else(|| XlsxError::Format(format!("worksheet part {sheet_part} is missing")))?;
    let rows = parse_sheet_rows(&sheet_xml, &shared)?;

    Ok(Sheet { name, rows })
}

fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, XlsxError> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut xml = String::new();
    file.read_to_string(&mut xml)?;
    Ok(Some(xml))
}

fn attr(e: &BytesStart, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == local)
        .map(|a| match a.unescape_value() {
            Ok(v) => v.into_owned(),
            Err(_) => String::from_utf8_lossy(&a.value).into_owned(),
        })
}

/// Name and relationship id of the first `<sheet>` in `workbook.xml`.
fn first_sheet_entry(workbook: &str) -> Result<(String, Option<String>), XlsxError> {
    let mut reader = Reader::from_reader(workbook.as_bytes());
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let name = attr(&e, b"name").unwrap_or_default();
                return Ok((name, attr(&e, b"id")));
            }
            Event::Eof => return Err(XlsxError::Format("workbook has no sheets".into())),
            _ => {}
        }
        buf.clear();
    }
}

/// Zip part name that relationship `id` points at.
fn relationship_target(rels: &str, id: &str) -> Result<Option<String>, XlsxError> {
    let mut reader = Reader::from_reader(rels.as_bytes());
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e)
                if e.local_name().as_ref() == b"Relationship"
                    && attr(&e, b"Id").as_deref() == Some(id) =>
            {
                return Ok(attr(&e, b"Target").map(|target| match target.strip_prefix('/') {
                    Some(absolute) => absolute.to_string(),
                    None => format!("xl/{target}"),
                }));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

fn parse_shared_strings(xml: &str) -> Result<Vec<String>, XlsxError> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    let mut buf = Vec::new();
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_t = false;
    // Phonetic runs carry furigana, not cell text.
    let mut in_phonetic = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current.clear(),
                b"t" => in_t = true,
                b"rPh" => in_phonetic = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(t) if in_t && !in_phonetic => current.push_str(&t.unescape()?),
            Event::CData(c) if in_t && !in_phonetic => {
                current.push_str(&String::from_utf8_lossy(&c.into_inner()))
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => strings.push(std::mem::take(&mut current)),
                b"t" => in_t = false,
                b"rPh" => in_phonetic = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

#[derive(Default)]
struct PendingCell {
    column: usize,
    cell_type: Option<String>,
    value: String,
    inline: String,
}

impl PendingCell {
    fn resolve(self, shared: &[String]) -> Result<Cell, XlsxError> {
        let cell = match self.cell_type.as_deref() {
            Some("s") => {
                let idx: usize = self.value.trim().parse().map_err(|_| {
                    XlsxError::Format(format!("bad shared string index {:?}", self.value))
                })?;
                let text = shared.get(idx).ok_or_else(|| {
                    XlsxError::Format(format!("shared string {idx} out of range"))
                })?;
                Cell::text(text)
            }
            Some("inlineStr") => Cell::text(&self.inline),
            Some("b") => Cell::Bool(self.value.trim() == "1"),
            Some("str") | Some("e") | Some("d") => Cell::text(&self.value),
            _ => match self.value.trim() {
                "" => Cell::Empty,
                raw => raw
                    .parse::<f64>()
                    .map(Cell::Number)
                    .unwrap_or_else(|_| Cell::text(&self.value)),
            },
        };
        Ok(cell)
    }
}

fn parse_sheet_rows(xml: &str, shared: &[String]) -> Result<Vec<Vec<Cell>>, XlsxError> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    let mut buf = Vec::new();
    let mut rows: Vec<Vec<Cell>> = Vec::new();
    let mut row: Option<Vec<Cell>> = None;
    let mut cell: Option<PendingCell> = None;
    let mut in_v = false;
    let mut in_inline_t = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => row = Some(Vec::new()),
                b"c" => {
                    let column = match attr(&e, b"r") {
                        Some(r) => column_index(&r).ok_or_else(|| {
                            XlsxError::Format(format!("invalid cell reference {r:?}"))
                        })?,
                        None => row.as_ref().map(Vec::len).unwrap_or(0),
                    };
                    if column >= MAX_COLUMNS {
                        return Err(XlsxError::Format(format!(
                            "row has more than {MAX_COLUMNS} columns"
                        )));
                    }
                    cell = Some(PendingCell {
                        column,
                        cell_type: attr(&e, b"t"),
                        ..PendingCell::default()
                    });
                }
                b"v" => in_v = true,
                b"t" => in_inline_t = cell.is_some(),
                _ => {}
            },
            Event::Text(t) => {
                if let Some(pending) = cell.as_mut() {
                    if in_v {
                        pending.value.push_str(&t.unescape()?);
                    } else if in_inline_t {
                        pending.inline.push_str(&t.unescape()?);
                    }
                }
            }
            Event::CData(c) => {
                if let Some(pending) = cell.as_mut() {
                    let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                    if in_v {
                        pending.value.push_str(&text);
                    } else if in_inline_t {
                        pending.inline.push_str(&text);
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" => in_v = false,
                b"t" => in_inline_t = false,
                b"c" => {
                    if let (Some(pending), Some(current)) = (cell.take(), row.as_mut()) {
                        let column = pending.column;
                        let value = pending.resolve(shared)?;
                        if current.len() <= column {
                            current.resize(column + 1, Cell::Empty);
                        }
                        current[column] = value;
                    }
                }
                b"row" => {
                    if let Some(done) = row.take() {
                        if done.iter().any(|c| !c.is_empty()) {
                            rows.push(done);
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(rows)
}

#[cfg(test)]
pub(crate) fn package_from_parts(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, body) in parts {
        zip.start_file(*name, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// A package written by this module with its worksheet part swapped for
/// `sheet_xml`.
#[cfg(test)]
pub(crate) fn workbook_with_sheet_xml(sheet_xml: &str) -> Vec<u8> {
    let workbook = workbook_xml("Vendas");
    package_from_parts(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", PACKAGE_RELS),
        (PART_WORKBOOK, workbook.as_str()),
        (PART_WORKBOOK_RELS, WORKBOOK_RELS),
        (PART_FIRST_SHEET, sheet_xml),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_sheet() -> Sheet {
        Sheet {
            name: "Vendas".into(),
            rows: vec![
                vec![Cell::text("Data"), Cell::text("Valor"), Cell::text("Obs")],
                vec![
                    Cell::text("01/10/2026 08:00:00"),
                    Cell::Number(15.0),
                    Cell::text(" pão & café "),
                ],
                vec![Cell::text("02/10/2026 09:30:00"), Cell::Number(22.5), Cell::Empty],
            ],
        }
    }

    /// Build a workbook the way a spreadsheet editor would re-save it: shared
    /// strings, an absolute relationship target, and a non-default part name.
    fn editor_style_workbook() -> Vec<u8> {
        package_from_parts(&[
            (
                "xl/workbook.xml",
                r#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Vendas" sheetId="1" r:id="rId7"/></sheets></workbook>"#,
            ),
            (
                "xl/_rels/workbook.xml.rels",
                r#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId7" Type="worksheet" Target="/xl/worksheets/data.xml"/></Relationships>"#,
            ),
            (
                "xl/sharedStrings.xml",
                r#"<?xml version="1.0"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><si><t>Valor</t></si><si><t>Status</t></si><si><r><t>Pa</t></r><r><t>go</t></r></si></sst>"#,
            ),
            (
                "xl/worksheets/data.xml",
                r#"<?xml version="1.0"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="A1" t="s"><v>0</v></c><c r="C1" t="s"><v>1</v></c></row><row r="2"/><row r="3"><c r="A3" t="str"><v>1.234,56</v></c><c r="C3" t="s"><v>2</v></c></row><row r="4"><c r="A4"><v>7</v></c><c r="B4" t="b"><v>1</v></c></row></sheetData></worksheet>"#,
            ),
        ])
    }

    #[test]
    fn test_column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(5), "F");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn test_column_index() {
        assert_eq!(column_index("A1"), Some(0));
        assert_eq!(column_index("f12"), Some(5));
        assert_eq!(column_index("AA3"), Some(26));
        assert_eq!(column_index("12"), None);
        assert_eq!(column_index("XFD1"), Some(MAX_COLUMNS - 1));
        assert_eq!(column_index("XFE1"), None);
        assert_eq!(column_index("ZZZZZZZZZZZ1"), None);
        assert_eq!(column_index("ZZZZZZZZZZZZZZZ1"), None);
    }

    fn one_cell_sheet(cell_ref: &str) -> String {
        format!(
            r#"<?xml version="1.0"?><worksheet xmlns="{NS_MAIN}"><sheetData><row r="1"><c r="{cell_ref}"><v>1</v></c></row></sheetData></worksheet>"#
        )
    }

    #[test]
    fn test_out_of_range_cell_references_are_rejected() {
        // the first would overflow usize, the second would ask for a huge row
        for cell_ref in ["ZZZZZZZZZZZZZZZ1", "ZZZZZZZZZZZ1", "XFE1"] {
            let bytes = workbook_with_sheet_xml(&one_cell_sheet(cell_ref));
            let err = read_first_sheet(&bytes).unwrap_err();
            assert!(
                matches!(err, XlsxError::Format(ref msg) if msg.contains(cell_ref)),
                "{cell_ref}: {err}"
            );
        }
    }

    #[test]
    fn test_last_column_is_readable() {
        let bytes = workbook_with_sheet_xml(&one_cell_sheet("XFD1"));
        let sheet = read_first_sheet(&bytes).unwrap();
        assert_eq!(sheet.rows[0].len(), MAX_COLUMNS);
        assert_eq!(sheet.rows[0][MAX_COLUMNS - 1], Cell::Number(1.0));
    }

    #[test]
    fn test_control_characters_are_stripped_on_write() {
        let sheet = Sheet {
            name: "Ven\u{1}das".into(),
            rows: vec![vec![Cell::text("Cr\u{0}édito\u{1F} (Visa)\tx\u{FFFF}")]],
        };
        let bytes = write_workbook(&sheet).unwrap();

        let mut archive = ZipArchive::new(Cursor::new(bytes.clone())).unwrap();
        let worksheet = read_part(&mut archive, PART_FIRST_SHEET).unwrap().unwrap();
        assert!(!worksheet.contains('\u{0}'));
        assert!(!worksheet.contains('\u{1F}'));

        let back = read_first_sheet(&bytes).unwrap();
        assert_eq!(back.name, "Vendas");
        assert_eq!(back.rows[0][0], Cell::text("Crédito (Visa)\tx"));
    }

    #[test]
    fn test_write_then_read_keeps_cells() {
        let sheet = sample_sheet();
        let bytes = write_workbook(&sheet).unwrap();
        let back = read_first_sheet(&bytes).unwrap();

        assert_eq!(back.name, "Vendas");
        assert_eq!(back.rows.len(), 3);
        assert_eq!(back.rows[1][1], Cell::Number(15.0));
        assert_eq!(back.rows[1][2], Cell::text(" pão & café "));
        // trailing empty cell is not written
        assert_eq!(back.rows[2].len(), 2);
    }

    #[test]
    fn test_written_package_has_required_parts() {
        let bytes = write_workbook(&sample_sheet()).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "xl/workbook.xml",
            "xl/_rels/workbook.xml.rels",
            "xl/worksheets/sheet1.xml",
        ] {
            assert!(names.contains(&part), "missing {part}");
        }
    }

    #[test]
    fn test_reads_editor_style_workbook() {
        let sheet = read_first_sheet(&editor_style_workbook()).unwrap();
        assert_eq!(sheet.name, "Vendas");
        // blank row 2 is dropped
        assert_eq!(sheet.rows.len(), 3);
        assert_eq!(
            sheet.rows[0],
            vec![Cell::text("Valor"), Cell::Empty, Cell::text("Status")]
        );
        assert_eq!(sheet.rows[1][0], Cell::text("1.234,56"));
        assert_eq!(sheet.rows[1][2], Cell::text("Pago"));
        assert_eq!(sheet.rows[2], vec![Cell::Number(7.0), Cell::Bool(true)]);
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = read_first_sheet(b"definitely not a zip").unwrap_err();
        assert!(matches!(err, XlsxError::Zip(_)));
    }
}
