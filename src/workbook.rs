use std::collections::HashMap;
use std::io::Cursor;

use calamine::{Data, Range, Reader};
use chrono::{NaiveDate, NaiveDateTime};

use crate::error::Result;

// ---------------------------------------------------------------------------
// Raw cell values
// ---------------------------------------------------------------------------

/// A spreadsheet cell reduced to the three shapes the importer cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Absent,
    Number(f64),
    Text(String),
}

static ABSENT: Cell = Cell::Absent;

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            // Month-only cells that Excel reformatted as dates arrive here.
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
            Data::Bool(b) => Cell::Text(b.to_string()),
            // ODS keeps date-typed cells as ISO strings.
            Data::DateTimeIso(s) => iso_to_serial(s).map_or_else(|| text_cell(s), Cell::Number),
            Data::String(s) | Data::DurationIso(s) => text_cell(s),
            Data::Error(_) | Data::Empty => Cell::Absent,
        }
    }
}

impl Cell {
    pub fn is_absent(&self) -> bool {
        matches!(self, Cell::Absent)
    }

    /// Trimmed text for string-ish columns. Numbers are rendered without a
    /// trailing `.0` so a center named `12` reads back as "12".
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Absent => None,
            Cell::Number(n) => Some(format_number(*n)),
            Cell::Text(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
        }
    }

    /// Best-effort float; `None` when absent or unparseable.
    pub fn parse_float_opt(&self) -> Option<f64> {
        match self {
            Cell::Absent => None,
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Number(_) => None,
            Cell::Text(s) => parse_number(s),
        }
    }

    pub fn parse_float_or(&self, default: f64) -> f64 {
        self.parse_float_opt().unwrap_or(default)
    }

    /// Integer parse that truncates fractional input, falling back to `default`.
    pub fn parse_int_or(&self, default: i64) -> i64 {
        match self {
            Cell::Text(s) => {
                let t = s.trim();
                t.parse::<i64>()
                    .ok()
                    .or_else(|| parse_number(t).map(|f| f.trunc() as i64))
                    .unwrap_or(default)
            }
            other => other
                .parse_float_opt()
                .map(|f| f.trunc() as i64)
                .unwrap_or(default),
        }
    }
}

fn text_cell(s: &str) -> Cell {
    if s.trim().is_empty() {
        Cell::Absent
    } else {
        Cell::Text(s.to_string())
    }
}

/// Spreadsheet serial (days since 1899-12-30, time of day as the fraction)
/// of an ISO date or datetime.
fn iso_to_serial(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let dt = raw
        .parse::<NaiveDateTime>()
        .ok()
        .or_else(|| raw.parse::<NaiveDate>().ok()?.and_hms_opt(0, 0, 0))?;
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    Some((dt - epoch).num_seconds() as f64 / 86400.0)
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Parse a human-typed amount: thousands separators, currency markers and
/// parenthesized negatives are tolerated.
pub fn parse_number(raw: &str) -> Option<f64> {
    let mut s: String = raw
        .trim()
        .trim_end_matches("VND")
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '"' | '₫' | 'đ' | '\u{a0}'))
        .collect();
    // "50.000.000" style grouping
    if s.matches('.').count() > 1 {
        s.retain(|c| c != '.');
    }
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return inner.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| -f);
    }
    s.parse::<f64>().ok().filter(|f| f.is_finite())
}

// ---------------------------------------------------------------------------
// Rows and sheets
// ---------------------------------------------------------------------------

/// One data row keyed by its column header.
#[derive(Debug, Clone, Default)]
pub struct Row {
    cells: HashMap<String, Cell>,
}

impl Row {
    pub fn get(&self, header: &str) -> &Cell {
        self.cells.get(header).unwrap_or(&ABSENT)
    }

    pub fn text(&self, header: &str) -> Option<String> {
        self.get(header).as_text()
    }

    pub fn has(&self, header: &str) -> bool {
        !self.get(header).is_absent()
    }
}

impl<K: Into<String>> FromIterator<(K, Cell)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Cell)>>(iter: I) -> Self {
        Row {
            cells: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// One worksheet read into header-keyed rows.
#[derive(Debug, Default)]
pub struct Sheet {
    /// 1-based sheet line of the header row.
    header_line: usize,
    rows: Vec<Row>,
}

impl Sheet {
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// 1-based sheet line of the data row at `idx` (0-based).
    pub fn line_of(&self, idx: usize) -> usize {
        self.header_line + 1 + idx
    }
}

/// The first row of the range holds headers; columns with a blank header are
/// dropped. The range starts at the first non-empty cell, so its offset is
/// kept for line numbers.
fn range_to_sheet(range: &Range<Data>) -> Sheet {
    let header_line = range.start().map_or(1, |(row, _)| row as usize + 1);
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Sheet { header_line, rows: Vec::new() };
    };
    let headers: Vec<Option<String>> = header_row
        .iter()
        .map(|cell| Cell::from(cell).as_text())
        .collect();

    let rows = rows
        .map(|cells| {
            headers
                .iter()
                .zip(cells.iter())
                .filter_map(|(h, c)| h.as_ref().map(|h| (h.clone(), Cell::from(c))))
                .collect()
        })
        .collect();
    Sheet { header_line, rows }
}

/// The requested sheets of an opened workbook.
#[derive(Debug, Default)]
pub struct Workbook {
    sheets: HashMap<String, Sheet>,
}

impl Workbook {
    /// Parse a spreadsheet blob (xlsx, xls, xlsb or ods) and read the sheets
    /// named in `wanted`. Other sheets (chart sheets included) are never
    /// opened. Anything that is not a readable workbook is an error for the
    /// whole call.
    pub fn open(bytes: &[u8], wanted: &[&str]) -> Result<Self> {
        let mut reader = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
        let mut sheets = HashMap::new();
        for name in reader.sheet_names() {
            if !wanted.contains(&name.as_str()) {
                continue;
            }
            let range = reader.worksheet_range(&name)?;
            sheets.insert(name, range_to_sheet(&range));
        }
        Ok(Workbook { sheets })
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.get(name)
    }

    /// Rows of a sheet; a sheet that is not in the workbook has no rows.
    pub fn rows(&self, name: &str) -> &[Row] {
        self.sheet(name).map(Sheet::rows).unwrap_or(&[])
    }

    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheets.contains_key(name)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook as XlsxWorkbook;

    /// Build an xlsx blob: each sheet is (name, headers, rows of cells).
    pub(crate) fn build_xlsx(sheets: &[(&str, Vec<&str>, Vec<Vec<Cell>>)]) -> Vec<u8> {
        let mut wb = XlsxWorkbook::new();
        for (name, headers, rows) in sheets {
            let ws = wb.add_worksheet();
            ws.set_name(*name).unwrap();
            for (col, h) in headers.iter().enumerate() {
                ws.write_string(0, col as u16, *h).unwrap();
            }
            for (r, row) in rows.iter().enumerate() {
                for (col, cell) in row.iter().enumerate() {
                    let (r, c) = (r as u32 + 1, col as u16);
                    match cell {
                        Cell::Number(n) => {
                            ws.write_number(r, c, *n).unwrap();
                        }
                        Cell::Text(s) => {
                            ws.write_string(r, c, s).unwrap();
                        }
                        Cell::Absent => {}
                    }
                }
            }
        }
        wb.save_to_buffer().unwrap()
    }

    /// Build a minimal ODS blob with one sheet. Text cells are `Data::String`,
    /// numbers `Data::Float`, dates `Data::DateTimeIso`.
    pub(crate) fn build_ods(name: &str, headers: Vec<&str>, rows: Vec<Vec<Data>>) -> Vec<u8> {
        use std::io::Write;
        use zip::write::SimpleFileOptions;

        let cell = |d: &Data| match d {
            Data::Float(f) => format!(r#"<table:table-cell office:value-type="float" office:value="{f}"/>"#),
            Data::DateTimeIso(iso) => {
                format!(r#"<table:table-cell office:value-type="date" office:date-value="{iso}"/>"#)
            }
            Data::String(s) => {
                format!(r#"<table:table-cell office:value-type="string" office:string-value="{s}"/>"#)
            }
            _ => "<table:table-cell/>".to_string(),
        };
        let mut table = String::from("<table:table-row>");
        for h in headers {
            table.push_str(&cell(&Data::String(h.to_string())));
        }
        table.push_str("</table:table-row>");
        for row in &rows {
            table.push_str("<table:table-row>");
            row.iter().for_each(|d| table.push_str(&cell(d)));
            table.push_str("</table:table-row>");
        }
        let content = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" office:version="1.2"><office:body><office:spreadsheet><table:table table:name="{name}">{table}</table:table></office:spreadsheet></office:body></office:document-content>"#
        );
        let manifest = r#"<?xml version="1.0" encoding="UTF-8"?><manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0" manifest:version="1.2"><manifest:file-entry manifest:full-path="/" manifest:media-type="application/vnd.oasis.opendocument.spreadsheet"/><manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/></manifest:manifest>"#;

        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        zip.start_file("mimetype", stored).unwrap();
        zip.write_all(b"application/vnd.oasis.opendocument.spreadsheet").unwrap();
        zip.start_file("META-INF/manifest.xml", stored).unwrap();
        zip.write_all(manifest.as_bytes()).unwrap();
        zip.start_file("content.xml", stored).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    pub(crate) fn n(v: f64) -> Cell {
        Cell::Number(v)
    }

    pub(crate) fn t(v: &str) -> Cell {
        Cell::Text(v.to_string())
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("1,234.56"), Some(1234.56));
        assert_eq!(parse_number("50.000.000"), Some(50_000_000.0));
        assert_eq!(parse_number("20,000 ₫"), Some(20_000.0));
        assert_eq!(parse_number("(500)"), Some(-500.0));
        assert_eq!(parse_number("120000 VND"), Some(120_000.0));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_cell_parsers_declare_fallbacks() {
        assert_eq!(t("40").parse_int_or(0), 40);
        assert_eq!(t("3.7").parse_int_or(0), 3);
        assert_eq!(t("many").parse_int_or(0), 0);
        assert_eq!(Cell::Absent.parse_int_or(7), 7);
        assert_eq!(n(12.9).parse_int_or(0), 12);
        assert_eq!(t("1,500").parse_float_or(0.0), 1500.0);
        assert_eq!(Cell::Absent.parse_float_opt(), None);
        assert_eq!(t("n/a").parse_float_opt(), None);
        assert_eq!(n(0.0).parse_float_opt(), Some(0.0));
    }

    #[test]
    fn test_as_text() {
        assert_eq!(t("  Hanoi Center ").as_text().as_deref(), Some("Hanoi Center"));
        assert_eq!(t("   ").as_text(), None);
        assert_eq!(n(12.0).as_text().as_deref(), Some("12"));
        assert_eq!(n(1.5).as_text().as_deref(), Some("1.5"));
        assert_eq!(Cell::Absent.as_text(), None);
    }

    #[test]
    fn test_open_reads_rows_by_header() {
        let bytes = build_xlsx(&[(
            "Doanh thu",
            vec!["Tháng", " Trung tâm ", "Ignored"],
            vec![vec![n(3.0), t("Hanoi Center"), t("x")], vec![n(4.0)]],
        )]);
        let wb = Workbook::open(&bytes, &["Doanh thu"]).unwrap();
        let rows = wb.rows("Doanh thu");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Tháng"), &n(3.0));
        assert_eq!(rows[0].text("Trung tâm").as_deref(), Some("Hanoi Center"));
        assert!(!rows[1].has("Trung tâm"));
    }

    #[test]
    fn test_missing_sheet_is_empty() {
        let bytes = build_xlsx(&[("Other", vec!["A"], vec![vec![n(1.0)]])]);
        let wb = Workbook::open(&bytes, &["Chi phí", "Other"]).unwrap();
        assert!(wb.rows("Chi phí").is_empty());
        assert!(!wb.has_sheet("Chi phí"));
        assert!(wb.has_sheet("Other"));
    }

    #[test]
    fn test_unrequested_sheets_are_not_read() {
        let bytes = build_xlsx(&[
            ("Doanh thu", vec!["Tháng"], vec![vec![n(1.0)]]),
            ("Notes", vec!["A"], vec![vec![t("x")]]),
        ]);
        let wb = Workbook::open(&bytes, &["Doanh thu"]).unwrap();
        assert!(wb.has_sheet("Doanh thu"));
        assert!(!wb.has_sheet("Notes"));
    }

    #[test]
    fn test_chart_sheet_does_not_break_open() {
        use rust_xlsxwriter::{Chart, ChartType};

        let mut wb = XlsxWorkbook::new();
        let ws = wb.add_worksheet();
        ws.set_name("Doanh thu").unwrap();
        ws.write_string(0, 0, "Tháng").unwrap();
        ws.write_number(1, 0, 2.0).unwrap();
        let mut chart = Chart::new(ChartType::Column);
        chart.add_series().set_values(("Doanh thu", 1, 0, 1, 0));
        let chartsheet = wb.add_chartsheet();
        chartsheet.insert_chart(0, 0, &chart).unwrap();
        let bytes = wb.save_to_buffer().unwrap();

        let opened = Workbook::open(&bytes, &["Doanh thu", "Chi phí"]).unwrap();
        assert_eq!(opened.rows("Doanh thu").len(), 1);
    }

    #[test]
    fn test_line_numbers_follow_leading_blank_rows() {
        let mut wb = XlsxWorkbook::new();
        let ws = wb.add_worksheet();
        ws.set_name("Doanh thu").unwrap();
        // header on sheet line 3
        ws.write_string(2, 0, "Tháng").unwrap();
        ws.write_number(3, 0, 1.0).unwrap();
        ws.write_number(4, 0, 2.0).unwrap();
        let bytes = wb.save_to_buffer().unwrap();

        let opened = Workbook::open(&bytes, &["Doanh thu"]).unwrap();
        let sheet = opened.sheet("Doanh thu").unwrap();
        assert_eq!(sheet.rows().len(), 2);
        assert_eq!(sheet.line_of(0), 4);
        assert_eq!(sheet.line_of(1), 5);
    }

    #[test]
    fn test_iso_dates_become_serials() {
        // 2025-03-15 is serial 45731
        assert_eq!(Cell::from(&Data::DateTimeIso("2025-03-15".into())), n(45731.0));
        assert_eq!(
            Cell::from(&Data::DateTimeIso("2025-03-15T18:00:00".into())),
            n(45731.75)
        );
        assert_eq!(Cell::from(&Data::DateTimeIso("soon".into())), t("soon"));
    }

    #[test]
    fn test_ods_date_cells_read_as_serials() {
        let bytes = build_ods(
            "Doanh thu",
            vec!["Tháng", "Trung tâm"],
            vec![vec![
                Data::DateTimeIso("2025-03-15".into()),
                Data::String("Hanoi Center".into()),
            ]],
        );
        let wb = Workbook::open(&bytes, &["Doanh thu"]).unwrap();
        let rows = wb.rows("Doanh thu");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Tháng"), &n(45731.0));
        assert_eq!(rows[0].text("Trung tâm").as_deref(), Some("Hanoi Center"));
    }

    #[test]
    fn test_open_rejects_garbage() {
        assert!(Workbook::open(b"definitely not a spreadsheet", &["Doanh thu"]).is_err());
    }
}
