//! Excel export module
//!
//! - Template: .xlsx template workbook → sheets, cells and named tables
//! - Export: report findings → template tables + `SUMMARY` pivot sheet

mod cell_ref;
mod exporter;
mod pivot;
mod template;

pub use cell_ref::CellRef;
pub use exporter::{Exporter, XlsxExporter, NO_FINDINGS_LABEL, SUMMARY_SHEET_NAME};
pub use pivot::{PivotDefinition, PivotGroup, PivotItem, PivotRow, PivotTable};
pub use template::{
    Template, TemplateCell, TemplateSheet, TemplateTable, DEFAULT_HOTSPOT_COLUMNS,
    DEFAULT_ISSUE_COLUMNS, HOTSPOTS_SHEET_NAME, HOTSPOTS_TABLE_NAME, ISSUES_SHEET_NAME,
    ISSUES_TABLE_NAME,
};
