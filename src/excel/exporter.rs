//! XLSX exporter - report findings → template workbook with pivot summaries

use super::cell_ref::CellRef;
use super::pivot::{PivotDefinition, PivotTable};
use super::template::{
    Template, TemplateSheet, TemplateTable, HOTSPOTS_SHEET_NAME, HOTSPOTS_TABLE_NAME,
    ISSUES_SHEET_NAME, ISSUES_TABLE_NAME,
};
use crate::error::{ExportError, ExportResult};
use crate::types::{CellValue, ExportData, RawRecord};
use rust_xlsxwriter::{Formula, Table, TableColumn, TableStyle, Workbook, Worksheet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the sheet created to hold the pivot summaries
pub const SUMMARY_SHEET_NAME: &str = "SUMMARY";

/// Written next to a category label when it has nothing to summarize
pub const NO_FINDINGS_LABEL: &str = "NO FINDINGS!!!";

/// Something that renders export data to a file
pub trait Exporter {
    /// Render `data` to `output_path`, using `template_path` when the format
    /// has templates. Returns the path of the written file.
    fn export(
        &self,
        data: ExportData<'_>,
        output_path: &Path,
        template_path: &Path,
    ) -> ExportResult<PathBuf>;
}

/// One findings category: where its records go and how it is summarized
#[derive(Debug, Clone, PartialEq)]
struct Category {
    title: &'static str,
    sheet: &'static str,
    table: &'static str,
    pivot: PivotDefinition,
    /// `SUMMARY` row 1 cell of the title; the placeholder goes one column right
    label_cell: CellRef,
}

/// Exports a report's raw issues and hotspots into an .xlsx workbook
#[derive(Debug, Clone, PartialEq)]
pub struct XlsxExporter {
    issues: Category,
    hotspots: Category,
}

impl Default for XlsxExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl XlsxExporter {
    pub fn new() -> Self {
        Self {
            issues: Category {
                title: "ISSUES",
                sheet: ISSUES_SHEET_NAME,
                table: ISSUES_TABLE_NAME,
                pivot: PivotDefinition::issues(),
                label_cell: CellRef::new(0, 0),
            },
            hotspots: Category {
                title: "HOTSPOTS",
                sheet: HOTSPOTS_SHEET_NAME,
                table: HOTSPOTS_TABLE_NAME,
                pivot: PivotDefinition::hotspots(),
                label_cell: CellRef::new(0, 3),
            },
        }
    }

    /// Override the issues pivot, for templates with another column order
    pub fn with_issues_pivot(mut self, pivot: PivotDefinition) -> Self {
        self.issues.pivot = pivot;
        self
    }

    /// Override the hotspots pivot, for templates with another column order
    pub fn with_hotspots_pivot(mut self, pivot: PivotDefinition) -> Self {
        self.hotspots.pivot = pivot;
        self
    }

    /// Load the template, or the bundled layout when the file is missing
    pub fn resolve_template(template_path: &Path) -> ExportResult<Template> {
        if template_path.exists() {
            info!(template = %template_path.display(), "Using XLSX template");
            return Template::load(template_path);
        }

        if !template_path.as_os_str().is_empty() {
            let absolute = std::path::absolute(template_path)
                .unwrap_or_else(|_| template_path.to_path_buf());
            warn!(
                "Unable to find provided XLSX template file (using default one instead) : {}",
                absolute.display()
            );
        }
        Ok(Template::bundled())
    }

    fn populate(
        template: &mut Template,
        category: &Category,
        records: &[RawRecord],
    ) -> ExportResult<()> {
        let table = template.table_mut(category.sheet, category.table)?;
        let appended = table.append_records(records);
        debug!(
            table = category.table,
            appended,
            total = table.rows.len(),
            "Filled table"
        );
        Ok(())
    }

    fn write_summary(
        worksheet: &mut Worksheet,
        category: &Category,
        table: &TemplateTable,
        record_count: usize,
    ) -> ExportResult<()> {
        let CellRef { row, col } = category.label_cell;
        worksheet.write_string(row, col, category.title)?;

        // Only a pivot over actual findings; template rows alone do not count
        if record_count > 0 {
            let pivot = PivotTable::build(&category.pivot, table)?;
            pivot.write(worksheet, category.pivot.anchor)?;
            debug!(
                table = category.table,
                anchor = %category.pivot.anchor,
                groups = pivot.groups.len(),
                "Built pivot"
            );
        } else {
            worksheet.write_string(row, col + 1, NO_FINDINGS_LABEL)?;
        }
        Ok(())
    }
}

impl Exporter for XlsxExporter {
    fn export(
        &self,
        data: ExportData<'_>,
        output_path: &Path,
        template_path: &Path,
    ) -> ExportResult<PathBuf> {
        let report = match data {
            ExportData::Report(report) => report,
            other => {
                return Err(ExportError::BadExportationDataType {
                    found: other.kind(),
                })
            }
        };

        let mut template = Self::resolve_template(template_path)?;

        Self::populate(&mut template, &self.issues, &report.raw_issues)?;
        Self::populate(&mut template, &self.hotspots, &report.raw_hotspots)?;

        let mut workbook = Workbook::new();
        for sheet in &template.sheets {
            write_sheet(&mut workbook, sheet)?;
        }

        let summary = workbook.add_worksheet();
        summary.set_name(SUMMARY_SHEET_NAME)?;
        Self::write_summary(
            summary,
            &self.issues,
            template.table(self.issues.sheet, self.issues.table)?,
            report.raw_issues.len(),
        )?;
        Self::write_summary(
            summary,
            &self.hotspots,
            template.table(self.hotspots.sheet, self.hotspots.table)?,
            report.raw_hotspots.len(),
        )?;

        workbook.save(output_path)?;

        info!(
            output = %output_path.display(),
            issues = report.raw_issues.len(),
            hotspots = report.raw_hotspots.len(),
            "Exported XLSX report"
        );

        Ok(output_path.to_path_buf())
    }
}

/// Re-emit a template sheet: its loose cells, then its tables.
///
/// Appended rows take precedence over template cells below a table; each
/// covered cell is logged and left out.
fn write_sheet(workbook: &mut Workbook, sheet: &TemplateSheet) -> ExportResult<()> {
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&sheet.name)?;

    for cell in &sheet.cells {
        if let Some(table) = sheet.tables.iter().find(|t| t.covers(cell.row, cell.col)) {
            warn!(
                "Table '{}' grows over template cell {}!{}, which is dropped",
                table.name,
                sheet.name,
                CellRef::new(cell.row, cell.col)
            );
            continue;
        }
        match &cell.formula {
            Some(formula) => {
                worksheet.write_formula(cell.row, cell.col, Formula::new(formula))?;
            }
            None => write_cell(worksheet, cell.row, cell.col, &cell.value)?,
        }
    }
    for table in &sheet.tables {
        write_table(worksheet, table)?;
    }
    Ok(())
}

fn write_table(worksheet: &mut Worksheet, table: &TemplateTable) -> ExportResult<()> {
    if table.columns.is_empty() {
        return Err(ExportError::Template(format!(
            "Table '{}' has no columns",
            table.name
        )));
    }

    let width = u16::try_from(table.columns.len()).map_err(|_| {
        ExportError::Export(format!("Table '{}' has too many columns", table.name))
    })?;
    // A table keeps at least one (blank) data row
    let height = u32::try_from(table.rows.len().max(1)).map_err(|_| {
        ExportError::Export(format!("Table '{}' has too many rows", table.name))
    })?;

    for (r, row) in table.rows.iter().enumerate() {
        let excel_row = table.header_row + 1 + r as u32;
        for (c, value) in row.iter().enumerate() {
            write_cell(worksheet, excel_row, table.first_col + c as u16, value)?;
        }
    }

    let columns: Vec<TableColumn> = table
        .columns
        .iter()
        .map(|header| TableColumn::new().set_header(header))
        .collect();
    let xlsx_table = Table::new()
        .set_name(&table.name)
        .set_columns(&columns)
        .set_style(TableStyle::Medium2);

    worksheet.add_table(
        table.header_row,
        table.first_col,
        table.header_row + height,
        table.first_col + width - 1,
        &xlsx_table,
    )?;
    Ok(())
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, value: &CellValue) -> ExportResult<()> {
    match value {
        CellValue::Blank => {}
        CellValue::Text(s) => {
            worksheet.write_string(row, col, s)?;
        }
        CellValue::Number(n) => {
            worksheet.write_number(row, col, *n)?;
        }
        CellValue::Boolean(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Report;
    use serde_json::json;

    #[test]
    fn test_document_is_rejected_before_any_io() {
        let doc = json!({"qualityProfiles": []});
        let output = Path::new("/nonexistent-dir/never-written.xlsx");

        let err = XlsxExporter::new()
            .export(ExportData::Document(&doc), output, Path::new(""))
            .unwrap_err();

        assert!(matches!(
            err,
            ExportError::BadExportationDataType { found: "document" }
        ));
    }

    #[test]
    fn test_empty_template_path_uses_bundled() {
        let template = XlsxExporter::resolve_template(Path::new("")).unwrap();
        assert_eq!(template, Template::bundled());
    }

    #[test]
    fn test_pivot_override_is_validated_at_export() {
        let mut report = Report::new();
        report.add_issue(json!({"type": "BUG"}).as_object().cloned().unwrap());

        let exporter = XlsxExporter::new()
            .with_issues_pivot(PivotDefinition::new(CellRef::new(1, 0), 0, vec![99]));
        let output = std::env::temp_dir().join("sonar-report-xlsx-pivot-override.xlsx");

        let err = exporter
            .export(ExportData::Report(&report), &output, Path::new(""))
            .unwrap_err();
        assert!(matches!(err, ExportError::PivotField(_)));
    }
}
