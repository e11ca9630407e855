use crate::commands::{connect, print_totals, resolve_orgs, scan_languages, RunConfig, ScanSummary, ScopeArgs};
use crate::config::load_config;
use crate::display;
use crate::error::Result;
use crate::github::{GithubClient, Transport};
use crate::language::{select, LanguageRow, TallyMode, YearBuckets};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct YearReport {
    pub year: i32,
    pub repositories: usize,
    pub rows: Vec<LanguageRow>,
}

#[derive(Debug)]
pub struct TrendReport {
    pub summary: ScanSummary,
    /// Analyzed but left out of every year because the creation date did not parse.
    pub undated: usize,
    pub years: Vec<YearReport>,
}

pub async fn run(args: &ScopeArgs, json: bool, verbose: bool) -> Result<()> {
    let config = load_config()?;
    let run = RunConfig::resolve(args, &config.defaults, json, verbose)?;
    let client = connect(&config)?;

    display::info(&run.describe());
    let report = analyze(&run, &client).await?;
    print_totals(&report.summary);
    if let Some(notice) = undated_notice(report.undated) {
        display::warn(&notice);
    }

    display::output(run.json, &report.years, |years| {
        render_years(years);
    });

    client.report_rate_limit_if_verbose(run.verbose);

    Ok(())
}

/// Count mode, bucketed by creation year. Each year's percentages are
/// relative to the repositories created that year.
pub async fn analyze<T: Transport>(run: &RunConfig, client: &GithubClient<T>) -> Result<TrendReport> {
    let orgs = resolve_orgs(run, client).await?;
    let mut buckets = YearBuckets::new(TallyMode::Count);
    let mut undated = 0;

    let summary = scan_languages(run, client, &orgs, |repo, languages| {
        if let Err(e) = buckets.add(&repo.created_at, languages) {
            undated += 1;
            display::warn(&format!(
                "Skipping repository {} due to invalid creation date: {e}",
                repo.name
            ));
        }
    })
    .await?;

    let years = buckets
        .iter_desc()
        .map(|(year, tally)| YearReport {
            year,
            repositories: tally.repositories(),
            rows: select(tally, &run.selection),
        })
        .collect();

    Ok(TrendReport {
        summary,
        undated,
        years,
    })
}

fn undated_notice(undated: usize) -> Option<String> {
    (undated > 0).then(|| {
        format!("{undated} repository(ies) left out of the year tables because of invalid creation dates")
    })
}

fn render_years(years: &[YearReport]) {
    if years.is_empty() {
        display::warn("No repositories with a valid creation date were analyzed");
        return;
    }
    for year in years {
        display::section_header(&format!("Year: {}", year.year));
        let table = display::language_table("Count", &year.rows, |v| v.to_string());
        println!("{table}");
    }
}
