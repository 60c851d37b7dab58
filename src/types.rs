use serde::{Deserialize, Serialize};
use serde_json::Value;

//==============================================================================
// Report Model
//==============================================================================

/// One finding as pre-extracted from the analysis results (issue or hotspot).
///
/// Keys are the raw field names reported by the analysis server, so two records
/// of the same kind may not carry the same set of keys.
pub type RawRecord = serde_json::Map<String, Value>;

/// Pre-fetched analysis results for one project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_key: Option<String>,

    /// Every issue reported for the project, in server order
    #[serde(default)]
    pub raw_issues: Vec<RawRecord>,

    /// Every security hotspot reported for the project, in server order
    #[serde(default)]
    pub raw_hotspots: Vec<RawRecord>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = Some(name.into());
        self
    }

    pub fn add_issue(&mut self, record: RawRecord) {
        self.raw_issues.push(record);
    }

    pub fn add_hotspot(&mut self, record: RawRecord) {
        self.raw_hotspots.push(record);
    }
}

/// Data handed to an exporter
///
/// Exporters accept only the payload kind they know how to render and reject
/// the others with [`crate::ExportError::BadExportationDataType`].
#[derive(Debug, Clone, Copy)]
pub enum ExportData<'a> {
    Report(&'a Report),
    /// Any other structured payload (configuration dumps, raw API answers, ...)
    Document(&'a Value),
}

impl ExportData<'_> {
    /// Short name of the payload kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            ExportData::Report(_) => "report",
            ExportData::Document(_) => "document",
        }
    }
}

impl<'a> From<&'a Report> for ExportData<'a> {
    fn from(report: &'a Report) -> Self {
        ExportData::Report(report)
    }
}

//==============================================================================
// Cell Values
//==============================================================================

/// A single worksheet cell value, as read from a template or mapped from a record
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Blank,
    Text(String),
    Number(f64),
    Boolean(bool),
}

impl CellValue {
    /// Map a raw record field onto a cell.
    ///
    /// Arrays and objects (flows, text ranges, tags) are kept as compact JSON.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Blank,
            Value::Bool(b) => CellValue::Boolean(*b),
            Value::Number(n) => match n.as_f64() {
                Some(f) => CellValue::Number(f),
                None => CellValue::Text(n.to_string()),
            },
            Value::String(s) => CellValue::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => CellValue::Text(value.to_string()),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Blank => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Display text for this value, the way a spreadsheet shows it in a pivot label
    pub fn label(&self) -> String {
        match self {
            CellValue::Blank => "(blank)".to_string(),
            CellValue::Text(s) if s.is_empty() => "(blank)".to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Boolean(true) => "TRUE".to_string(),
            CellValue::Boolean(false) => "FALSE".to_string(),
        }
    }
}

/// Format a number without a trailing `.0` for integral values
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
