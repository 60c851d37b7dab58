use clap::{Parser, Subcommand};
use colored::Colorize;
use sonar_report_xlsx::cli;
use sonar_report_xlsx::excel::PivotDefinition;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "sonar-report-xlsx")]
#[command(about = "Export static-analysis findings to an Excel workbook with pivot summaries")]
#[command(long_about = "Sonar Report XLSX - findings spreadsheet exporter

Fills the 'issues' and 'hotspots' tables of an XLSX template with the raw
findings of a report and adds a SUMMARY sheet with two pivot summaries:
  ISSUES   - count by severity, then type
  HOTSPOTS - count by security category, then vulnerability probability

COMMANDS:
  export   - Report (JSON/YAML) to Excel (.xlsx)
  inspect  - Show sheets, tables and column indices of a template

EXAMPLES:
  sonar-report-xlsx export report.json
  sonar-report-xlsx export report.json -o out.xlsx -t issues-template.xlsx
  sonar-report-xlsx inspect issues-template.xlsx")]
#[command(version)]
struct Cli {
    /// Show debug logs
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only show warnings and errors in logs
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Export a report's issues and hotspots to an .xlsx workbook.

The report is a JSON (or .yaml/.yml) document with 'rawIssues' and
'rawHotspots' arrays of key/value records. Record keys are matched against
the template table headers; unknown keys are ignored.

TEMPLATE:
  The template must provide sheets ISSUES and HOTSPOTS holding tables
  'issues' and 'hotspots'. Pivot fields are column positions, so keep the
  bundled column order (check with 'inspect') or pass --issues-pivot and
  --hotspots-pivot. A missing template file is not an error: the bundled
  layout is used and a warning is logged.

PIVOTS:
  ANCHOR:DATA:ROW[,ROW] with zero-based column positions.
  Defaults: issues A2:0:20,0  hotspots D2:1:1,7

EXAMPLE:
  sonar-report-xlsx export report.json -o analysis.xlsx")]
    /// Export a report to Excel .xlsx
    Export {
        /// Path to the report (JSON, or YAML by extension)
        report: PathBuf,

        /// Output Excel file path (default: <project>-analysis.xlsx next to the report)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// XLSX template file (default: bundled layout)
        #[arg(short, long, env = "SONAR_REPORT_XLSX_TEMPLATE")]
        template: Option<PathBuf>,

        /// Issues pivot as ANCHOR:DATA:ROW[,ROW] (default: A2:0:20,0)
        #[arg(long, value_parser = parse_pivot)]
        issues_pivot: Option<PivotDefinition>,

        /// Hotspots pivot as ANCHOR:DATA:ROW[,ROW] (default: D2:1:1,7)
        #[arg(long, value_parser = parse_pivot)]
        hotspots_pivot: Option<PivotDefinition>,
    },

    /// Show sheets, tables and column indices of a template
    Inspect {
        /// Template file to inspect
        #[arg(required_unless_present = "bundled")]
        template: Option<PathBuf>,

        /// Inspect the bundled layout instead of a file
        #[arg(long, conflicts_with = "template")]
        bundled: bool,
    },
}

fn parse_pivot(value: &str) -> Result<PivotDefinition, String> {
    value.parse().map_err(|e: sonar_report_xlsx::ExportError| e.to_string())
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default_filter = if verbose {
        "sonar_report_xlsx=debug"
    } else if quiet {
        "sonar_report_xlsx=warn"
    } else {
        "sonar_report_xlsx=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Export {
            report,
            output,
            template,
            issues_pivot,
            hotspots_pivot,
        } => {
            cli::export(report, output, template, issues_pivot, hotspots_pivot)?;
        }

        Commands::Inspect { template, bundled } => {
            cli::inspect(if bundled { None } else { template })?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "❌ Error:".bold().red(), e);
            ExitCode::FAILURE
        }
    }
}
