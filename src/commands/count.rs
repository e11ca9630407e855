use crate::commands::{
    connect, org_listing_failed, print_totals, resolve_orgs, RunConfig, ScanSummary, ScopeArgs,
};
use crate::config::load_config;
use crate::display;
use crate::error::Result;
use crate::github::{GithubClient, Transport};
use crate::language::{select, LanguageRow, Tally, TallyMode};

#[derive(Debug)]
pub struct CountReport {
    pub summary: ScanSummary,
    pub rows: Vec<LanguageRow>,
}

pub async fn run(args: &ScopeArgs, json: bool, verbose: bool) -> Result<()> {
    let config = load_config()?;
    let run = RunConfig::resolve(args, &config.defaults, json, verbose)?;
    let client = connect(&config)?;

    display::info(&run.describe());
    let report = analyze(&run, &client).await?;
    print_totals(&report.summary);

    display::output(run.json, &report.rows, |rows| {
        render_counts(rows);
    });

    client.report_rate_limit_if_verbose(run.verbose);

    Ok(())
}

/// Count mode over the GraphQL listing: each repository arrives with its
/// languages, so no per-repository request is needed.
pub async fn analyze<T: Transport>(run: &RunConfig, client: &GithubClient<T>) -> Result<CountReport> {
    let orgs = resolve_orgs(run, client).await?;
    let mut tally = Tally::new(TallyMode::Count);
    let mut summary = ScanSummary::default();

    for org in &orgs {
        match client.count_repositories(org).await {
            Ok(total) => display::info(&format!(
                "Analyzing {} of {total} repositories in organization: {org}",
                total.min(run.repo_limit)
            )),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => tracing::debug!(%org, "repository count unavailable: {e}"),
        }

        let repos = match client
            .list_repositories_with_languages(org, run.repo_limit)
            .await
        {
            Ok(repos) => repos,
            Err(e) => {
                org_listing_failed(run, org, e)?;
                continue;
            }
        };
        summary.organizations += 1;

        if repos.is_empty() {
            display::warn(&format!("No repositories found for organization: {org}"));
            continue;
        }
        for repo in &repos {
            tracing::debug!(repo = %repo.repository.name, languages = repo.languages.len(), "tallied");
            tally.accumulate(&repo.languages);
        }
    }

    summary.analyzed = tally.repositories();
    Ok(CountReport {
        summary,
        rows: select(&tally, &run.selection),
    })
}

fn render_counts(rows: &[LanguageRow]) {
    display::section_header("Language Usage");
    let table = display::language_table("Count", rows, |v| v.to_string());
    println!("{table}");
}
