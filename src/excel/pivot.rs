//! Pivot summaries over template tables
//!
//! The workbook writer has no pivot-cache support, so the summary is computed
//! here and laid out the way a spreadsheet renders a compact pivot table:
//! a header row, one bold row per outer label with its subtotal, indented
//! rows for the inner labels and a closing `Grand Total`.

use super::cell_ref::CellRef;
use super::template::TemplateTable;
use crate::error::{ExportError, ExportResult};
use crate::types::CellValue;
use rust_xlsxwriter::{Format, FormatBorder, Worksheet};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;

/// Where a pivot goes and which source columns it uses.
///
/// Fields are positional indices into the source table's columns; the
/// template's column order is the only schema.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotDefinition {
    pub anchor: CellRef,
    /// Column whose non-blank values are counted
    pub data_field: usize,
    /// One or two grouping columns, outermost first
    pub row_fields: Vec<usize>,
}

impl PivotDefinition {
    pub fn new(anchor: CellRef, data_field: usize, row_fields: Vec<usize>) -> Self {
        Self {
            anchor,
            data_field,
            row_fields,
        }
    }

    /// Issues by severity then type, anchored at `A2`
    pub fn issues() -> Self {
        Self::new(CellRef::new(1, 0), 0, vec![20, 0])
    }

    /// Hotspots by security category then probability, anchored at `D2`
    pub fn hotspots() -> Self {
        Self::new(CellRef::new(1, 3), 1, vec![1, 7])
    }

    /// Check the indices against the table width
    pub fn validate(&self, table: &TemplateTable) -> ExportResult<()> {
        if self.row_fields.is_empty() || self.row_fields.len() > 2 {
            return Err(ExportError::PivotField(format!(
                "pivot on '{}' needs one or two row fields, got {}",
                table.name,
                self.row_fields.len()
            )));
        }

        let width = table.columns.len();
        for &field in self.row_fields.iter().chain(std::iter::once(&self.data_field)) {
            if field >= width {
                return Err(ExportError::PivotField(format!(
                    "field {} is out of range for table '{}' ({} columns)",
                    field, table.name, width
                )));
            }
        }
        Ok(())
    }
}

/// Parses `ANCHOR:DATA:ROW[,ROW]`, e.g. `A2:0:20,0` for the issues pivot
impl FromStr for PivotDefinition {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            ExportError::PivotField(format!(
                "invalid pivot '{}', expected ANCHOR:DATA:ROW[,ROW] such as A2:0:20,0",
                s
            ))
        };
        let index = |part: &str| part.trim().parse::<usize>().map_err(|_| invalid());

        let mut parts = s.split(':');
        let (Some(anchor), Some(data), Some(rows), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let row_fields = rows.split(',').map(&index).collect::<ExportResult<Vec<_>>>()?;
        if row_fields.is_empty() || row_fields.len() > 2 {
            return Err(invalid());
        }

        Ok(Self::new(CellRef::parse(anchor)?, index(data)?, row_fields))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PivotGroup {
    pub label: String,
    pub count: usize,
    pub items: Vec<PivotItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PivotItem {
    pub label: String,
    pub count: usize,
}

/// One rendered line of a pivot, `level` 0 for groups and 1 for items
#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow {
    pub label: String,
    pub count: usize,
    pub level: u8,
}

/// Computed pivot: count of one field grouped by one or two others
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    /// Caption of the value column, e.g. `Count of severity`
    pub value_caption: String,
    pub groups: Vec<PivotGroup>,
    pub grand_total: usize,
}

struct Bucket {
    key: CellValue,
    count: usize,
    items: Vec<(CellValue, usize)>,
    item_index: HashMap<String, usize>,
}

impl PivotTable {
    /// Group the table's rows and count the non-blank data field values
    pub fn build(definition: &PivotDefinition, table: &TemplateTable) -> ExportResult<Self> {
        definition.validate(table)?;

        let outer = definition.row_fields[0];
        let inner = definition.row_fields.get(1).copied();
        let cell = |row: &[CellValue], i: usize| row.get(i).cloned().unwrap_or(CellValue::Blank);

        let mut buckets: Vec<Bucket> = Vec::new();
        let mut bucket_index: HashMap<String, usize> = HashMap::new();
        let mut grand_total = 0;

        for row in &table.rows {
            let row = row.as_slice();
            let counted = usize::from(!cell(row, definition.data_field).is_blank());
            grand_total += counted;

            let key = cell(row, outer);
            let idx = *bucket_index.entry(key.label()).or_insert_with(|| {
                buckets.push(Bucket {
                    key,
                    count: 0,
                    items: Vec::new(),
                    item_index: HashMap::new(),
                });
                buckets.len() - 1
            });
            let bucket = &mut buckets[idx];
            bucket.count += counted;

            if let Some(inner) = inner {
                let item_key = cell(row, inner);
                let items = &mut bucket.items;
                let item_idx = *bucket.item_index.entry(item_key.label()).or_insert_with(|| {
                    items.push((item_key, 0));
                    items.len() - 1
                });
                items[item_idx].1 += counted;
            }
        }

        buckets.sort_by(|a, b| compare_labels(&a.key, &b.key));
        let groups = buckets
            .into_iter()
            .map(|mut bucket| {
                bucket.items.sort_by(|a, b| compare_labels(&a.0, &b.0));
                PivotGroup {
                    label: bucket.key.label(),
                    count: bucket.count,
                    items: bucket
                        .items
                        .into_iter()
                        .map(|(key, count)| PivotItem {
                            label: key.label(),
                            count,
                        })
                        .collect(),
                }
            })
            .collect();

        Ok(Self {
            value_caption: format!("Count of {}", table.columns[definition.data_field]),
            groups,
            grand_total,
        })
    }

    /// Flattened body rows (without header and grand total)
    pub fn rows(&self) -> Vec<PivotRow> {
        let mut rows = Vec::new();
        for group in &self.groups {
            rows.push(PivotRow {
                label: group.label.clone(),
                count: group.count,
                level: 0,
            });
            rows.extend(group.items.iter().map(|item| PivotRow {
                label: item.label.clone(),
                count: item.count,
                level: 1,
            }));
        }
        rows
    }

    /// Write the pivot with its top-left corner at `anchor`
    pub fn write(&self, worksheet: &mut Worksheet, anchor: CellRef) -> ExportResult<()> {
        let header = Format::new()
            .set_bold()
            .set_border_bottom(FormatBorder::Thin);
        let bold = Format::new().set_bold();
        let indented = Format::new().set_indent(1);
        let total = Format::new().set_bold().set_border_top(FormatBorder::Thin);

        let (row, col) = (anchor.row, anchor.col);
        worksheet.write_string_with_format(row, col, "Row Labels", &header)?;
        worksheet.write_string_with_format(row, col + 1, &self.value_caption, &header)?;

        let mut current = row + 1;
        for line in self.rows() {
            let format = if line.level == 0 { &bold } else { &indented };
            worksheet.write_string_with_format(current, col, &line.label, format)?;
            worksheet.write_number_with_format(current, col + 1, line.count as f64, format)?;
            current += 1;
        }

        worksheet.write_string_with_format(current, col, "Grand Total", &total)?;
        worksheet.write_number_with_format(current, col + 1, self.grand_total as f64, &total)?;

        Ok(())
    }
}

/// Spreadsheet sort order for pivot labels: numbers, text, booleans, blanks
fn compare_labels(a: &CellValue, b: &CellValue) -> Ordering {
    fn rank(value: &CellValue) -> u8 {
        match value {
            _ if value.is_blank() => 3,
            CellValue::Number(_) => 0,
            CellValue::Text(_) => 1,
            CellValue::Boolean(_) => 2,
            CellValue::Blank => 3,
        }
    }

    match (a, b) {
        (CellValue::Number(x), CellValue::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (CellValue::Text(x), CellValue::Text(y)) => x
            .to_lowercase()
            .cmp(&y.to_lowercase())
            .then_with(|| x.cmp(y)),
        (CellValue::Boolean(x), CellValue::Boolean(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
