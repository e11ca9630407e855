use crate::commands::{connect, print_totals, resolve_orgs, scan_languages, RunConfig, ScanSummary, ScopeArgs};
use crate::config::load_config;
use crate::display;
use crate::error::Result;
use crate::github::{GithubClient, Transport};
use crate::language::{select, ByteUnit, LanguageRow, Tally, TallyMode};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DataRow {
    pub language: String,
    /// Raw bytes; `scaled` is the same amount in `unit`.
    pub value: u64,
    pub scaled: f64,
    pub unit: ByteUnit,
    pub percentage: u64,
}

impl DataRow {
    fn new(row: &LanguageRow, unit: ByteUnit) -> Self {
        Self {
            language: row.language.clone(),
            value: row.value,
            scaled: unit.scale(row.value),
            unit,
            percentage: row.percentage,
        }
    }
}

#[derive(Debug)]
pub struct DataReport {
    pub summary: ScanSummary,
    pub rows: Vec<LanguageRow>,
}

pub async fn run(args: &ScopeArgs, unit: ByteUnit, json: bool, verbose: bool) -> Result<()> {
    let config = load_config()?;
    let run = RunConfig::resolve(args, &config.defaults, json, verbose)?;
    let client = connect(&config)?;

    display::info(&format!("{}, Unit: {}", run.describe(), unit.label()));
    let report = analyze(&run, &client).await?;
    print_totals(&report.summary);

    let rows: Vec<DataRow> = report.rows.iter().map(|r| DataRow::new(r, unit)).collect();
    display::output(run.json, &rows, |_| {
        render_bytes(&report.rows, unit);
    });

    client.report_rate_limit_if_verbose(run.verbose);

    Ok(())
}

/// Byte mode: sum every repository's language sizes across the scope.
pub async fn analyze<T: Transport>(run: &RunConfig, client: &GithubClient<T>) -> Result<DataReport> {
    let orgs = resolve_orgs(run, client).await?;
    let mut tally = Tally::new(TallyMode::Bytes);

    let summary = scan_languages(run, client, &orgs, |_, languages| {
        tally.accumulate(languages);
    })
    .await?;

    Ok(DataReport {
        summary,
        rows: select(&tally, &run.selection),
    })
}

fn render_bytes(rows: &[LanguageRow], unit: ByteUnit) {
    display::section_header("Language Data");
    let table = display::language_table(unit.label(), rows, |bytes| unit.format(bytes));
    println!("{table}");
}
