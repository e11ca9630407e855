pub mod count;
pub mod data;
pub mod trend;

use crate::config::{Config, DefaultsConfig};
use crate::display;
use crate::error::{OrglangError, Result};
use crate::github::{GithubClient, Repository, Transport};
use crate::language::{LanguageByteMap, Selection};
use clap::Args;

pub const DEFAULT_REPO_LIMIT: usize = 100;
pub const DEFAULT_ORG_LIMIT: usize = 5;
pub const DEFAULT_TOP: usize = 10;

/// Flags shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ScopeArgs {
    /// Organization to analyze
    #[arg(long, conflicts_with = "enterprise")]
    pub org: Option<String>,

    /// Enterprise whose organizations should be analyzed
    #[arg(long)]
    pub enterprise: Option<String>,

    /// Maximum number of repositories to evaluate per organization [default: 100]
    #[arg(long, value_parser = positive)]
    pub repo_limit: Option<usize>,

    /// Maximum number of organizations to evaluate for an enterprise [default: 5]
    #[arg(long, value_parser = positive)]
    pub org_limit: Option<usize>,

    /// Return the top N languages [default: 10]
    #[arg(long, value_parser = positive, conflicts_with = "language")]
    pub top: Option<usize>,

    /// Only report this language
    #[arg(long)]
    pub language: Option<String>,

    /// Only report languages supported by CodeQL
    #[arg(long, conflicts_with = "language")]
    pub codeql: bool,
}

fn positive(s: &str) -> std::result::Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be greater than 0".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Organization(String),
    Enterprise(String),
}

/// Everything one invocation needs, resolved once from flags and config.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub scope: Scope,
    pub repo_limit: usize,
    pub org_limit: usize,
    pub selection: Selection,
    pub json: bool,
    pub verbose: bool,
}

impl RunConfig {
    /// Flags win over config defaults. Fails before any network activity when
    /// no usable scope is available.
    pub fn resolve(
        args: &ScopeArgs,
        defaults: &DefaultsConfig,
        json: bool,
        verbose: bool,
    ) -> Result<Self> {
        let scope = match (&args.org, &args.enterprise) {
            (Some(org), _) => Scope::Organization(non_empty(org, "organization")?),
            (None, Some(ent)) => Scope::Enterprise(non_empty(ent, "enterprise")?),
            (None, None) => match (&defaults.org, &defaults.enterprise) {
                (Some(org), _) => Scope::Organization(non_empty(org, "organization")?),
                (None, Some(ent)) => Scope::Enterprise(non_empty(ent, "enterprise")?),
                (None, None) => return Err(OrglangError::MissingScope),
            },
        };

        let selection = match &args.language {
            Some(language) => Selection::Language(non_empty(language, "language")?),
            None => Selection::Top {
                limit: limit(args.top, defaults.top, DEFAULT_TOP, "top")?,
                codeql_only: args.codeql,
            },
        };

        Ok(Self {
            scope,
            repo_limit: limit(args.repo_limit, defaults.repo_limit, DEFAULT_REPO_LIMIT, "repo_limit")?,
            org_limit: limit(args.org_limit, defaults.org_limit, DEFAULT_ORG_LIMIT, "org_limit")?,
            selection,
            json,
            verbose,
        })
    }

    pub fn describe(&self) -> String {
        match &self.scope {
            Scope::Enterprise(_) => format!(
                "Organization limit: {}, Repository limit: {}, {}",
                self.org_limit,
                self.repo_limit,
                self.selection.describe()
            ),
            Scope::Organization(_) => format!(
                "Repository limit: {}, {}",
                self.repo_limit,
                self.selection.describe()
            ),
        }
    }

    pub fn is_enterprise(&self) -> bool {
        matches!(self.scope, Scope::Enterprise(_))
    }
}

fn non_empty(value: &str, what: &'static str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(OrglangError::EmptyIdentifier(what));
    }
    Ok(trimmed.to_string())
}

fn limit(flag: Option<usize>, default: Option<usize>, fallback: usize, name: &str) -> Result<usize> {
    match flag.or(default).unwrap_or(fallback) {
        0 => Err(OrglangError::Config(format!("{name} must be greater than 0"))),
        n => Ok(n),
    }
}

/// Build the live client from the token and API URL in `config`.
pub fn connect(config: &Config) -> Result<GithubClient> {
    let token = config.token()?;
    GithubClient::new(&token, config.api_url().as_deref())
}

/// Organizations covered by this run. For an enterprise this is the call that
/// establishes the scope, so its failure ends the run.
pub async fn resolve_orgs<T: Transport>(
    run: &RunConfig,
    client: &GithubClient<T>,
) -> Result<Vec<String>> {
    match &run.scope {
        Scope::Organization(org) => Ok(vec![org.clone()]),
        Scope::Enterprise(enterprise) => {
            display::info(&format!("Indexing organizations for enterprise: {enterprise}"));
            let orgs = client.list_organizations(enterprise, run.org_limit).await?;
            display::info(&format!("Total number of organizations found: {}", orgs.len()));
            Ok(orgs)
        }
    }
}

/// Listing one organization failed. Fatal when that organization is the whole
/// scope or the run was interrupted, a warning when it is one member of an
/// enterprise.
pub fn org_listing_failed(run: &RunConfig, org: &str, err: OrglangError) -> Result<()> {
    if run.is_enterprise() && !err.is_fatal() {
        display::warn(&format!("Failed to fetch repositories for {org}: {err}"));
        Ok(())
    } else {
        Err(err)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub organizations: usize,
    pub analyzed: usize,
    pub skipped: usize,
}

/// Walk every repository of every organization, one request at a time, and
/// hand each successfully fetched language map to `on_repository`.
/// Repositories whose languages cannot be fetched or decoded are skipped.
pub async fn scan_languages<T, F>(
    run: &RunConfig,
    client: &GithubClient<T>,
    orgs: &[String],
    mut on_repository: F,
) -> Result<ScanSummary>
where
    T: Transport,
    F: FnMut(&Repository, &LanguageByteMap),
{
    let mut summary = ScanSummary::default();

    for org in orgs {
        tracing::debug!(%org, limit = run.repo_limit, "listing repositories");
        let repos = match client.list_repositories(org, run.repo_limit).await {
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
        display::info(&format!(
            "Analyzing {} repositories in organization: {org}",
            repos.len()
        ));

        for repo in &repos {
            match client.get_languages(org, &repo.name).await {
                Ok(languages) => {
                    summary.analyzed += 1;
                    on_repository(repo, &languages);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    summary.skipped += 1;
                    display::warn(&format!(
                        "Skipping repository {} due to error: {e}",
                        repo.name
                    ));
                }
            }
        }
    }

    Ok(summary)
}

pub fn print_totals(summary: &ScanSummary) {
    display::info(&format!(
        "Total number of repositories analyzed: {}",
        summary.analyzed
    ));
    if summary.skipped > 0 {
        display::warn(&format!(
            "{} repository(ies) skipped because of errors",
            summary.skipped
        ));
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::github::testing::{error_response, json_response, InterruptOn, ScriptedTransport};
    use crate::github::transport::ApiResponse;
    use serde_json::{json, Value};

    pub fn org_run(org: &str) -> RunConfig {
        RunConfig {
            scope: Scope::Organization(org.to_string()),
            repo_limit: 100,
            org_limit: 5,
            selection: Selection::Top {
                limit: 10,
                codeql_only: false,
            },
            json: false,
            verbose: false,
        }
    }

    pub fn enterprise_run(enterprise: &str) -> RunConfig {
        RunConfig {
            scope: Scope::Enterprise(enterprise.to_string()),
            ..org_run("unused")
        }
    }

    pub fn repo_list(repos: &[(&str, &str)]) -> ApiResponse {
        json_response(Value::Array(
            repos
                .iter()
                .map(|(name, created)| json!({ "name": name, "created_at": created }))
                .collect(),
        ))
    }

    fn args() -> ScopeArgs {
        ScopeArgs::default()
    }

    #[test]
    fn resolve_requires_a_scope() {
        let err = RunConfig::resolve(&args(), &DefaultsConfig::default(), false, false);
        assert!(matches!(err, Err(OrglangError::MissingScope)));
    }

    #[test]
    fn resolve_rejects_blank_org() {
        let args = ScopeArgs {
            org: Some("   ".into()),
            ..args()
        };
        assert!(matches!(
            RunConfig::resolve(&args, &DefaultsConfig::default(), false, false),
            Err(OrglangError::EmptyIdentifier("organization"))
        ));
    }

    #[test]
    fn resolve_applies_defaults_and_fallbacks() {
        let args = ScopeArgs {
            org: Some("acme".into()),
            ..args()
        };
        let run = RunConfig::resolve(&args, &DefaultsConfig::default(), true, false).unwrap();
        assert_eq!(run.scope, Scope::Organization("acme".into()));
        assert_eq!(run.repo_limit, DEFAULT_REPO_LIMIT);
        assert_eq!(run.org_limit, DEFAULT_ORG_LIMIT);
        assert_eq!(
            run.selection,
            Selection::Top {
                limit: DEFAULT_TOP,
                codeql_only: false
            }
        );
        assert!(run.json);
    }

    #[test]
    fn flags_override_config_defaults() {
        let defaults = DefaultsConfig {
            org: Some("from-config".into()),
            repo_limit: Some(20),
            top: Some(3),
            ..DefaultsConfig::default()
        };
        let args = ScopeArgs {
            enterprise: Some("octo-corp".into()),
            repo_limit: Some(7),
            codeql: true,
            ..args()
        };
        let run = RunConfig::resolve(&args, &defaults, false, false).unwrap();
        assert_eq!(run.scope, Scope::Enterprise("octo-corp".into()));
        assert_eq!(run.repo_limit, 7);
        assert_eq!(
            run.selection,
            Selection::Top {
                limit: 3,
                codeql_only: true
            }
        );
    }

    #[test]
    fn config_scope_used_when_no_flags() {
        let defaults = DefaultsConfig {
            enterprise: Some("octo-corp".into()),
            ..DefaultsConfig::default()
        };
        let run = RunConfig::resolve(&args(), &defaults, false, false).unwrap();
        assert!(run.is_enterprise());
        assert!(run.describe().starts_with("Organization limit: 5, Repository limit: 100"));
    }

    #[test]
    fn zero_limit_from_config_is_rejected() {
        let defaults = DefaultsConfig {
            org: Some("acme".into()),
            top: Some(0),
            ..DefaultsConfig::default()
        };
        assert!(matches!(
            RunConfig::resolve(&args(), &defaults, false, false),
            Err(OrglangError::Config(_))
        ));
    }

    #[test]
    fn language_flag_selects_single_language() {
        let args = ScopeArgs {
            org: Some("acme".into()),
            language: Some("Go".into()),
            ..args()
        };
        let run = RunConfig::resolve(&args, &DefaultsConfig::default(), false, false).unwrap();
        assert_eq!(run.selection, Selection::Language("Go".into()));
        assert_eq!(run.describe(), "Repository limit: 100, Language filter: Go");
    }

    #[test]
    fn positive_parser_rejects_zero_and_garbage() {
        assert_eq!(positive("15"), Ok(15));
        assert!(positive("0").is_err());
        assert!(positive("-3").is_err());
        assert!(positive("ten").is_err());
    }

    #[tokio::test]
    async fn scan_skips_repositories_whose_languages_fail() {
        let client = GithubClient::with_transport(ScriptedTransport::new(vec![
            repo_list(&[
                ("good", "2022-01-01T00:00:00Z"),
                ("broken", "2022-01-01T00:00:00Z"),
                ("garbled", "2022-01-01T00:00:00Z"),
            ]),
            json_response(json!({ "Go": 10 })),
            error_response(500, "boom"),
            json_response(json!(["not", "a", "map"])),
        ]));

        let mut seen = Vec::new();
        let summary = scan_languages(&org_run("acme"), &client, &["acme".into()], |repo, langs| {
            seen.push((repo.name.clone(), langs.clone()));
        })
        .await
        .unwrap();

        assert_eq!(summary.analyzed, 1);
        assert_eq!(summary.skipped, 2);
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "good");
    }

    #[tokio::test]
    async fn single_org_listing_failure_is_fatal() {
        let client =
            GithubClient::with_transport(ScriptedTransport::new(vec![error_response(404, "Not Found")]));
        let result = scan_languages(&org_run("ghost"), &client, &["ghost".into()], |_, _| {}).await;
        assert!(matches!(result, Err(OrglangError::Api { status: 404, .. })));
    }

    #[tokio::test]
    async fn enterprise_member_listing_failure_is_skipped() {
        let client = GithubClient::with_transport(ScriptedTransport::new(vec![
            error_response(403, "Resource protected by organization SAML enforcement"),
            repo_list(&[("svc", "2021-01-01T00:00:00Z")]),
            json_response(json!({ "Rust": 5 })),
        ]));
        let orgs = vec!["locked".to_string(), "open".to_string()];

        let mut count = 0;
        let summary = scan_languages(&enterprise_run("corp"), &client, &orgs, |_, _| count += 1)
            .await
            .unwrap();

        assert_eq!(summary.organizations, 1);
        assert_eq!(summary.analyzed, 1);
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn interrupted_language_fetch_stops_the_scan() {
        let client = GithubClient::with_transport(InterruptOn {
            trigger: "/repos/acme/a/languages",
            inner: ScriptedTransport::new(vec![
                repo_list(&[
                    ("b", "2022-01-01T00:00:00Z"),
                    ("a", "2022-01-01T00:00:00Z"),
                    ("c", "2022-01-01T00:00:00Z"),
                ]),
                json_response(json!({ "Go": 1 })),
                json_response(json!({ "Go": 1 })),
            ]),
        });

        let mut seen = Vec::new();
        let result = scan_languages(&org_run("acme"), &client, &["acme".into()], |repo, _| {
            seen.push(repo.name.clone())
        })
        .await;

        assert!(matches!(result, Err(OrglangError::Interrupted)));
        assert_eq!(seen, vec!["b"]);
    }

    #[tokio::test]
    async fn interrupted_enterprise_listing_is_not_downgraded() {
        let client = GithubClient::with_transport(InterruptOn {
            trigger: "/orgs/",
            inner: ScriptedTransport::new(vec![]),
        });
        let orgs = vec!["north".to_string(), "south".to_string()];

        let result = scan_languages(&enterprise_run("corp"), &client, &orgs, |_, _| {}).await;

        assert!(matches!(result, Err(OrglangError::Interrupted)));
        assert!(OrglangError::Interrupted.is_fatal());
        assert!(!OrglangError::NotFound("x".into()).is_fatal());
    }

    #[tokio::test]
    async fn empty_organization_is_reported_not_failed() {
        let client = GithubClient::with_transport(ScriptedTransport::new(vec![repo_list(&[])]));
        let summary = scan_languages(&org_run("empty"), &client, &["empty".into()], |_, _| {})
            .await
            .unwrap();
        assert_eq!(summary, ScanSummary { organizations: 1, analyzed: 0, skipped: 0 });
    }

    #[tokio::test]
    async fn resolve_orgs_for_enterprise_lists_members() {
        let client = GithubClient::with_transport(ScriptedTransport::new(vec![json_response(json!({
            "data": { "enterprise": { "organizations": {
                "nodes": [{ "login": "one" }, { "login": "two" }],
                "pageInfo": { "hasNextPage": false, "endCursor": null }
            }}}
        }))]));
        let orgs = resolve_orgs(&enterprise_run("corp"), &client).await.unwrap();
        assert_eq!(orgs, vec!["one", "two"]);

        let single = GithubClient::with_transport(ScriptedTransport::new(vec![]));
        assert_eq!(
            resolve_orgs(&org_run("acme"), &single).await.unwrap(),
            vec!["acme"]
        );
    }
}
