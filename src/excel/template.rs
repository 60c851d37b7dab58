//! Template workbooks - sheet and table scaffolding the exporter fills with data

use crate::error::{ExportError, ExportResult};
use crate::types::{CellValue, RawRecord};
use calamine::{open_workbook, CellType, Data, Range, Reader, Table as SheetTable, Xlsx};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Sheet holding every raw issue
pub const ISSUES_SHEET_NAME: &str = "ISSUES";
/// Table holding every raw issue
pub const ISSUES_TABLE_NAME: &str = "issues";
/// Sheet holding every security hotspot
pub const HOTSPOTS_SHEET_NAME: &str = "HOTSPOTS";
/// Table holding every security hotspot
pub const HOTSPOTS_TABLE_NAME: &str = "hotspots";

/// Column layout of the bundled `issues` table.
///
/// The issues pivot addresses `type` (0) and `severity` (20) by position.
pub const DEFAULT_ISSUE_COLUMNS: [&str; 21] = [
    "type",
    "key",
    "rule",
    "component",
    "project",
    "line",
    "hash",
    "textRange",
    "flows",
    "status",
    "message",
    "effort",
    "debt",
    "author",
    "tags",
    "creationDate",
    "updateDate",
    "resolution",
    "scope",
    "quickFixAvailable",
    "severity",
];

/// Column layout of the bundled `hotspots` table.
///
/// The hotspots pivot addresses `securityCategory` (1) and
/// `vulnerabilityProbability` (7) by position.
pub const DEFAULT_HOTSPOT_COLUMNS: [&str; 12] = [
    "key",
    "securityCategory",
    "component",
    "project",
    "line",
    "message",
    "status",
    "vulnerabilityProbability",
    "author",
    "creationDate",
    "updateDate",
    "ruleKey",
];

static BLANK: CellValue = CellValue::Blank;

/// Sheet area as `(first_row, first_col, last_row, last_col)`, inclusive
type Region = (u32, u32, u32, u32);

/// In-memory image of a template workbook
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub sheets: Vec<TemplateSheet>,
}

/// A worksheet of the template: loose cells plus named tables
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSheet {
    pub name: String,
    /// Cells outside of any table
    pub cells: Vec<TemplateCell>,
    pub tables: Vec<TemplateTable>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateCell {
    pub row: u32,
    pub col: u16,
    /// Cached value; for formula cells only what the template last computed
    pub value: CellValue,
    /// Formula text without the leading `=`
    pub formula: Option<String>,
}

/// A named worksheet table (ListObject)
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateTable {
    pub name: String,
    /// Zero-based row of the header
    pub header_row: u32,
    /// Zero-based column of the first table column
    pub first_col: u16,
    /// Column headers, in sheet order
    pub columns: Vec<String>,
    /// Data rows, each as wide as `columns`
    pub rows: Vec<Vec<CellValue>>,
}

impl Template {
    /// Layout used when no template file is available
    pub fn bundled() -> Self {
        Self {
            sheets: vec![
                TemplateSheet::with_table(
                    ISSUES_SHEET_NAME,
                    TemplateTable::new(ISSUES_TABLE_NAME, &DEFAULT_ISSUE_COLUMNS),
                ),
                TemplateSheet::with_table(
                    HOTSPOTS_SHEET_NAME,
                    TemplateTable::new(HOTSPOTS_TABLE_NAME, &DEFAULT_HOTSPOT_COLUMNS),
                ),
            ],
        }
    }

    /// Read a template workbook (.xlsx): every sheet's cells, formulas and table definitions
    pub fn load(path: &Path) -> ExportResult<Self> {
        let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e| {
            ExportError::Template(format!(
                "Failed to open template '{}': {}",
                path.display(),
                e
            ))
        })?;

        workbook
            .load_tables()
            .map_err(|e| ExportError::Template(format!("Failed to read tables: {}", e)))?;

        let sheet_names = workbook.sheet_names().to_vec();
        let mut sheets = Vec::with_capacity(sheet_names.len());

        for sheet_name in sheet_names {
            let table_names: Vec<String> = workbook
                .table_names_in_sheet(&sheet_name)
                .into_iter()
                .cloned()
                .collect();

            let mut tables = Vec::with_capacity(table_names.len());
            let mut regions = Vec::with_capacity(table_names.len());
            for table_name in table_names {
                let table = workbook.table_by_name(&table_name).map_err(|e| {
                    ExportError::Template(format!(
                        "Failed to read table '{}': {}",
                        table_name, e
                    ))
                })?;
                let (template_table, region) = TemplateTable::from_sheet_table(&table)?;
                tables.push(template_table);
                regions.push(region);
            }

            let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
                ExportError::Template(format!("Failed to read sheet '{}': {}", sheet_name, e))
            })?;
            let formulas = workbook.worksheet_formula(&sheet_name).ok();
            let cells = loose_cells(&range, formulas.as_ref(), &regions);

            debug!(
                sheet = %sheet_name,
                tables = tables.len(),
                cells = cells.len(),
                "Loaded template sheet"
            );

            sheets.push(TemplateSheet {
                name: sheet_name,
                cells,
                tables,
            });
        }

        Ok(Self { sheets })
    }

    pub fn sheet(&self, name: &str) -> Option<&TemplateSheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut TemplateSheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    /// Look up a table on a given sheet, failing with a typed error when absent
    pub fn table(&self, sheet: &str, table: &str) -> ExportResult<&TemplateTable> {
        self.sheet(sheet)
            .ok_or_else(|| ExportError::MissingSheet(sheet.to_string()))?
            .table(table)
            .ok_or_else(|| ExportError::MissingTable {
                sheet: sheet.to_string(),
                table: table.to_string(),
            })
    }

    pub fn table_mut(&mut self, sheet: &str, table: &str) -> ExportResult<&mut TemplateTable> {
        self.sheet_mut(sheet)
            .ok_or_else(|| ExportError::MissingSheet(sheet.to_string()))?
            .table_mut(table)
            .ok_or_else(|| ExportError::MissingTable {
                sheet: sheet.to_string(),
                table: table.to_string(),
            })
    }
}

impl TemplateSheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: Vec::new(),
            tables: Vec::new(),
        }
    }

    fn with_table(name: &str, table: TemplateTable) -> Self {
        let mut sheet = Self::new(name);
        sheet.tables.push(table);
        sheet
    }

    pub fn table(&self, name: &str) -> Option<&TemplateTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut TemplateTable> {
        self.tables.iter_mut().find(|t| t.name == name)
    }
}

impl TemplateTable {
    /// An empty table anchored at `A1`
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            header_row: 0,
            first_col: 0,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append one row per record, matching record keys to column headers.
    ///
    /// Keys without a matching column are ignored; columns without a matching
    /// key stay blank. Returns the number of rows appended.
    pub fn append_records(&mut self, records: &[RawRecord]) -> usize {
        for record in records {
            let row = self
                .columns
                .iter()
                .map(|header| {
                    record
                        .get(header)
                        .map(CellValue::from_json)
                        .unwrap_or(CellValue::Blank)
                })
                .collect();
            self.rows.push(row);
        }
        records.len()
    }

    /// Values of one column, top to bottom
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &CellValue> {
        self.rows
            .iter()
            .map(move |row| row.get(index).unwrap_or(&BLANK))
    }

    /// Sheet area of the table once written: header plus at least one data row
    pub fn region(&self) -> (u32, u16, u32, u16) {
        let height = self.rows.len().max(1) as u32;
        let width = self.columns.len().max(1) as u16;
        (
            self.header_row,
            self.first_col,
            self.header_row + height,
            self.first_col + width - 1,
        )
    }

    /// Whether the written table covers the given cell
    pub fn covers(&self, row: u32, col: u16) -> bool {
        let (r0, c0, r1, c1) = self.region();
        (r0..=r1).contains(&row) && (c0..=c1).contains(&col)
    }

    /// Convert a calamine table, returning it with the sheet region it covers
    fn from_sheet_table(table: &SheetTable<Data>) -> ExportResult<(Self, Region)> {
        let data = table.data();
        let (data_row, data_col) = data.start().ok_or_else(|| {
            ExportError::Template(format!("Table '{}' has no data range", table.name()))
        })?;
        let header_row = data_row.checked_sub(1).ok_or_else(|| {
            ExportError::Template(format!("Table '{}' has no header row", table.name()))
        })?;
        let first_col = u16::try_from(data_col).map_err(|_| {
            ExportError::Template(format!("Table '{}' starts past the last column", table.name()))
        })?;

        let width = table.columns().len();
        let mut rows: Vec<Vec<CellValue>> = data
            .rows()
            .map(|row| {
                (0..width)
                    .map(|i| row.get(i).map(cell_from_data).unwrap_or(CellValue::Blank))
                    .collect::<Vec<_>>()
            })
            .collect();
        // Excel keeps one placeholder row in an empty table
        if rows.len() == 1 && rows[0].iter().all(CellValue::is_blank) {
            rows.clear();
        }

        let (last_row, last_col) = data.end().unwrap_or((data_row, data_col));

        Ok((
            Self {
                name: table.name().to_string(),
                header_row,
                first_col,
                columns: table.columns().to_vec(),
                rows,
            },
            (header_row, data_col, last_row, last_col),
        ))
    }
}

/// Used cells of a range with sheet coordinates instead of range offsets
fn absolute_cells<T: CellType>(range: &Range<T>) -> impl Iterator<Item = (u32, u32, &T)> {
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    range
        .used_cells()
        .map(move |(r, c, value)| (start_row + r as u32, start_col + c as u32, value))
}

/// Non-empty cells and formulas of a sheet that fall outside every table region
fn loose_cells(
    range: &Range<Data>,
    formulas: Option<&Range<String>>,
    regions: &[Region],
) -> Vec<TemplateCell> {
    let outside = |row: u32, col: u32| {
        !regions
            .iter()
            .any(|&(r0, c0, r1, c1)| (r0..=r1).contains(&row) && (c0..=c1).contains(&col))
    };

    let mut formula_at: HashMap<(u32, u32), String> = formulas
        .map(|f| {
            absolute_cells(f)
                .map(|(row, col, text)| ((row, col), text.clone()))
                .collect()
        })
        .unwrap_or_default();

    let mut cells: Vec<TemplateCell> = absolute_cells(range)
        .filter(|&(row, col, _)| outside(row, col))
        .filter_map(|(row, col, data)| {
            Some(TemplateCell {
                row,
                col: u16::try_from(col).ok()?,
                value: cell_from_data(data),
                formula: formula_at.remove(&(row, col)),
            })
        })
        .collect();

    // Formulas saved without a cached value
    cells.extend(
        formula_at
            .into_iter()
            .filter(|&((row, col), _)| outside(row, col))
            .filter_map(|((row, col), formula)| {
                Some(TemplateCell {
                    row,
                    col: u16::try_from(col).ok()?,
                    value: CellValue::Blank,
                    formula: Some(formula),
                })
            }),
    );
    cells.sort_by_key(|cell| (cell.row, cell.col));
    cells
}

fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Blank,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> RawRecord {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("record must be an object"),
        }
    }

    #[test]
    fn test_bundled_layout() {
        let template = Template::bundled();
        let issues = template.table(ISSUES_SHEET_NAME, ISSUES_TABLE_NAME).unwrap();
        let hotspots = template
            .table(HOTSPOTS_SHEET_NAME, HOTSPOTS_TABLE_NAME)
            .unwrap();

        assert_eq!(issues.columns[0], "type");
        assert_eq!(issues.columns[20], "severity");
        assert_eq!(hotspots.columns[1], "securityCategory");
        assert_eq!(hotspots.columns[7], "vulnerabilityProbability");
        assert!(issues.rows.is_empty());
    }

    #[test]
    fn test_missing_sheet_and_table() {
        let template = Template::bundled();
        assert!(matches!(
            template.table("Metrics", "metrics"),
            Err(ExportError::MissingSheet(_))
        ));
        assert!(matches!(
            template.table(ISSUES_SHEET_NAME, "selected"),
            Err(ExportError::MissingTable { .. })
        ));
    }

    #[test]
    fn test_append_records_maps_by_header() {
        let mut table = TemplateTable::new("t", &["key", "line", "tags"]);
        let appended = table.append_records(&[
            record(json!({"key": "AX1", "line": 12, "tags": ["cwe"], "extra": "ignored"})),
            record(json!({"key": "AX2"})),
        ]);

        assert_eq!(appended, 2);
        assert_eq!(
            table.rows[0],
            vec![
                CellValue::Text("AX1".to_string()),
                CellValue::Number(12.0),
                CellValue::Text(r#"["cwe"]"#.to_string()),
            ]
        );
        assert_eq!(
            table.rows[1],
            vec![
                CellValue::Text("AX2".to_string()),
                CellValue::Blank,
                CellValue::Blank
            ]
        );
    }

    #[test]
    fn test_region_keeps_one_data_row() {
        let mut table = TemplateTable::new("t", &["a", "b", "c"]);
        table.header_row = 2;
        table.first_col = 1;
        assert_eq!(table.region(), (2, 1, 3, 3));
        assert!(table.covers(3, 3));
        assert!(!table.covers(4, 1));

        table.append_records(&[
            record(json!({"a": 1})),
            record(json!({"a": 2})),
            record(json!({"a": 3})),
        ]);
        assert_eq!(table.region(), (2, 1, 5, 3));
        assert!(table.covers(5, 1));
    }

    #[test]
    fn test_column_values_pads_short_rows() {
        let mut table = TemplateTable::new("t", &["a", "b"]);
        table.rows.push(vec![CellValue::Number(1.0)]);
        let values: Vec<_> = table.column_values(1).collect();
        assert_eq!(values, vec![&CellValue::Blank]);
    }
}
