use crate::error::ExportResult;
use crate::types::{ExportData, Report};
use serde_json::Value;
use std::path::Path;

/// A loaded input document: either a findings report or some other payload
#[derive(Debug, Clone, PartialEq)]
pub enum ReportDocument {
    Report(Report),
    Other(Value),
}

impl ReportDocument {
    pub fn as_export_data(&self) -> ExportData<'_> {
        match self {
            ReportDocument::Report(report) => ExportData::Report(report),
            ReportDocument::Other(value) => ExportData::Document(value),
        }
    }
}

/// Load a report from a JSON or YAML file (chosen by extension)
pub fn load_report(path: &Path) -> ExportResult<ReportDocument> {
    let content = std::fs::read_to_string(path)?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    let value: Value = if is_yaml {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };

    parse_report_value(value)
}

/// Classify a parsed document.
///
/// An object carrying a `rawIssues` or `rawHotspots` array is a report; anything
/// else is kept as-is for the exporter to reject.
pub fn parse_report_value(value: Value) -> ExportResult<ReportDocument> {
    let is_report = value.as_object().is_some_and(|map| {
        ["rawIssues", "rawHotspots"]
            .iter()
            .any(|key| map.get(*key).is_some_and(Value::is_array))
    });

    if is_report {
        Ok(ReportDocument::Report(serde_json::from_value(value)?))
    } else {
        Ok(ReportDocument::Other(value))
    }
}
