use crate::error::ExportResult;
use crate::excel::{
    Exporter, PivotDefinition, Template, XlsxExporter, HOTSPOTS_SHEET_NAME, HOTSPOTS_TABLE_NAME,
    ISSUES_SHEET_NAME, ISSUES_TABLE_NAME,
};
use crate::parser::{self, ReportDocument};
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Output path used when none is given: `<project>-analysis.xlsx` next to the report
pub fn default_output_path(report_path: &Path, project_name: Option<&str>) -> PathBuf {
    let stem = project_name
        .map(|name| {
            name.chars()
                .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
                .collect::<String>()
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "report".to_string());

    let dir = report_path.parent().unwrap_or_else(|| Path::new("."));
    dir.join(format!("{}-analysis.xlsx", stem))
}

/// Execute the export command
///
/// `issues_pivot` and `hotspots_pivot` replace the default pivot layout, for
/// templates whose column order differs from the bundled one.
pub fn export(
    report: PathBuf,
    output: Option<PathBuf>,
    template: Option<PathBuf>,
    issues_pivot: Option<PivotDefinition>,
    hotspots_pivot: Option<PivotDefinition>,
) -> ExportResult<PathBuf> {
    println!("{}", "📊 Sonar Report - XLSX Export".bold().green());
    println!("   Report:   {}", report.display());

    let document = parser::load_report(&report)?;

    let output = output.unwrap_or_else(|| {
        let project = match &document {
            ReportDocument::Report(r) => r.project_name.as_deref(),
            ReportDocument::Other(_) => None,
        };
        default_output_path(&report, project)
    });
    let template = template.unwrap_or_default();

    if template.as_os_str().is_empty() {
        println!("   Template: {}", "(bundled)".dimmed());
    } else {
        println!("   Template: {}", template.display());
    }
    println!("   Output:   {}\n", output.display());

    if let ReportDocument::Report(r) = &document {
        println!(
            "   Found {} issues, {} hotspots",
            r.raw_issues.len(),
            r.raw_hotspots.len()
        );
    }

    let mut exporter = XlsxExporter::new();
    if let Some(pivot) = issues_pivot {
        exporter = exporter.with_issues_pivot(pivot);
    }
    if let Some(pivot) = hotspots_pivot {
        exporter = exporter.with_hotspots_pivot(pivot);
    }

    let written = exporter.export(document.as_export_data(), &output, &template)?;

    println!("{}", "✅ Export Complete!".bold().green());
    println!("   Excel file: {}\n", written.display());

    Ok(written)
}

/// Execute the inspect command: list sheets, tables and column indices
pub fn inspect(template: Option<PathBuf>) -> ExportResult<()> {
    let loaded = match &template {
        Some(path) => {
            println!("{}", "🔎 Sonar Report - Template".bold().green());
            println!("   File: {}\n", path.display());
            Template::load(path)?
        }
        None => {
            println!("{}", "🔎 Sonar Report - Bundled Template".bold().green());
            println!();
            Template::bundled()
        }
    };

    for sheet in &loaded.sheets {
        println!("{}", format!("Sheet {}", sheet.name).bold().cyan());
        if sheet.tables.is_empty() {
            println!("   {}", "(no tables)".dimmed());
        }
        for table in &sheet.tables {
            println!(
                "   Table {} ({} columns, {} rows)",
                table.name,
                table.columns.len(),
                table.rows.len()
            );
            for (idx, column) in table.columns.iter().enumerate() {
                println!("     {:>3}  {}", idx, column);
            }
        }
        println!();
    }

    report_pivot_fields(
        &loaded,
        ISSUES_SHEET_NAME,
        ISSUES_TABLE_NAME,
        &PivotDefinition::issues(),
    );
    report_pivot_fields(
        &loaded,
        HOTSPOTS_SHEET_NAME,
        HOTSPOTS_TABLE_NAME,
        &PivotDefinition::hotspots(),
    );

    Ok(())
}

/// Print which columns the default pivot indices land on for this template
fn report_pivot_fields(template: &Template, sheet: &str, table: &str, pivot: &PivotDefinition) {
    let table = match template.table(sheet, table) {
        Ok(table) => table,
        Err(e) => {
            println!("{} {}", "⚠️ ".yellow(), e.to_string().yellow());
            return;
        }
    };

    if let Err(e) = pivot.validate(table) {
        println!("{} {}", "⚠️ ".yellow(), e.to_string().yellow());
        return;
    }

    let rows: Vec<&str> = pivot
        .row_fields
        .iter()
        .map(|&i| table.columns[i].as_str())
        .collect();
    println!(
        "Pivot on {}: count of {} by {}",
        table.name.bold(),
        table.columns[pivot.data_field],
        rows.join(" → ")
    );
}
