//! Sonar Report XLSX - static-analysis findings to Excel
//!
//! This library fills a template workbook with a report's raw issues and
//! security hotspots, then adds a `SUMMARY` sheet with two pivot summaries.
//!
//! # Features
//!
//! - Template workbooks read from .xlsx (sheets, cells, named tables)
//! - Bundled default layout when no template is available
//! - Records mapped onto table columns by header name
//! - Count pivots grouped by one or two positional fields
//!
//! # Example
//!
//! ```no_run
//! use sonar_report_xlsx::excel::{Exporter, XlsxExporter};
//! use sonar_report_xlsx::parser::load_report;
//! use std::path::Path;
//!
//! let document = load_report(Path::new("report.json"))?;
//! let written = XlsxExporter::new().export(
//!     document.as_export_data(),
//!     Path::new("analysis.xlsx"),
//!     Path::new("issues-template.xlsx"),
//! )?;
//!
//! println!("Wrote {}", written.display());
//! # Ok::<(), sonar_report_xlsx::error::ExportError>(())
//! ```

pub mod cli;
pub mod error;
pub mod excel;
pub mod parser;
pub mod types;

// Re-export commonly used types
pub use error::{ExportError, ExportResult};
pub use types::{CellValue, ExportData, RawRecord, Report};
