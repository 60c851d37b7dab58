use thiserror::Error;

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Bad exportation data type: expected a report, got {found}")]
    BadExportationDataType { found: &'static str },

    #[error("Template error: {0}")]
    Template(String),

    #[error("Sheet '{0}' not found in template")]
    MissingSheet(String),

    #[error("Table '{table}' not found on sheet '{sheet}'")]
    MissingTable { sheet: String, table: String },

    #[error("Pivot field error: {0}")]
    PivotField(String),

    #[error("Export error: {0}")]
    Export(String),
}
