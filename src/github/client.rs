use super::graphql::{self, EnterpriseData, OrganizationData, RepositoryCountData};
use super::pagination::{collect_up_to, next_link, path_and_query, Page, PageSource, PAGE_SIZE};
use super::rate_limit::RateLimitStatus;
use super::transport::{ApiRequest, OctocrabTransport, RateLimited, Transport};
use crate::error::{OrglangError, Result};
use crate::language::LanguageByteMap;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Repository {
    pub name: String,
    /// Kept as sent by the API; parsed only where a year is needed.
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLanguages {
    pub repository: Repository,
    pub languages: LanguageByteMap,
}

pub struct GithubClient<T = OctocrabTransport> {
    transport: RateLimited<T>,
}

impl GithubClient<OctocrabTransport> {
    pub fn new(token: &str, api_url: Option<&str>) -> Result<Self> {
        Ok(Self::with_transport(OctocrabTransport::new(token, api_url)?))
    }
}

impl<T: Transport> GithubClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport: RateLimited::new(transport),
        }
    }

    /// Member organizations of an enterprise, at most `max` of them.
    pub async fn list_organizations(&self, enterprise: &str, max: usize) -> Result<Vec<String>> {
        if enterprise.trim().is_empty() {
            return Err(OrglangError::EmptyIdentifier("enterprise"));
        }
        let mut pages = OrganizationPages {
            transport: &self.transport,
            enterprise,
            cursor: None,
        };
        collect_up_to(&mut pages, max).await
    }

    /// Repositories of an organization, newest first, via REST link-header
    /// pagination. An organization without repositories yields an empty list.
    pub async fn list_repositories(&self, org: &str, max: usize) -> Result<Vec<Repository>> {
        if org.trim().is_empty() {
            return Err(OrglangError::EmptyIdentifier("organization"));
        }
        let mut pages = LinkPages {
            transport: &self.transport,
            next: Some(format!(
                "/orgs/{org}/repos?per_page={PAGE_SIZE}&sort=created&direction=desc"
            )),
        };
        collect_up_to(&mut pages, max).await
    }

    /// Repositories together with their languages in one GraphQL walk, newest
    /// first.
    pub async fn list_repositories_with_languages(
        &self,
        org: &str,
        max: usize,
    ) -> Result<Vec<RepositoryLanguages>> {
        if org.trim().is_empty() {
            return Err(OrglangError::EmptyIdentifier("organization"));
        }
        let mut pages = RepositoryLanguagePages {
            transport: &self.transport,
            org,
            cursor: None,
        };
        collect_up_to(&mut pages, max).await
    }

    pub async fn count_repositories(&self, org: &str) -> Result<usize> {
        if org.trim().is_empty() {
            return Err(OrglangError::EmptyIdentifier("organization"));
        }
        let body = graphql::request_body(graphql::ORGANIZATION_REPOSITORY_COUNT, json!({ "org": org }));
        let response = self
            .transport
            .send(&ApiRequest::post(graphql::ENDPOINT, body))
            .await?;
        let data: RepositoryCountData = graphql::parse(&response.body)?;
        data.organization
            .map(|o| o.repositories.total_count)
            .ok_or_else(|| OrglangError::NotFound(format!("organization '{org}'")))
    }

    /// Language breakdown of a single repository. The API answers in one page.
    pub async fn get_languages(&self, org: &str, repo: &str) -> Result<LanguageByteMap> {
        if org.trim().is_empty() || repo.trim().is_empty() {
            return Err(OrglangError::EmptyIdentifier("organization and repository"));
        }
        let response = self
            .transport
            .send(&ApiRequest::get(format!("/repos/{org}/{repo}/languages")))
            .await?;
        Ok(serde_json::from_str(&response.body)?)
    }

    pub fn last_rate_limit(&self) -> Option<RateLimitStatus> {
        self.transport.last_seen()
    }

    pub fn report_rate_limit_if_verbose(&self, verbose: bool) {
        if !verbose {
            return;
        }
        match self.last_rate_limit() {
            Some(rl) => eprintln!(
                "Rate limit: {}/{} remaining (resets at {})",
                rl.remaining,
                rl.limit
                    .map(|l| l.to_string())
                    .unwrap_or_else(|| "?".to_string()),
                rl.describe_reset()
            ),
            None => eprintln!("Rate limit: no rate limit headers seen"),
        }
    }
}

struct LinkPages<'a, T> {
    transport: &'a RateLimited<T>,
    next: Option<String>,
}

#[async_trait]
impl<'a, T: Transport> PageSource for LinkPages<'a, T> {
    type Item = Repository;

    async fn fetch_page(&mut self, _want: usize) -> Result<Page<Repository>> {
        let Some(path) = self.next.take() else {
            return Ok(Page {
                items: Vec::new(),
                has_next: false,
            });
        };
        let response = self.transport.send(&ApiRequest::get(path)).await?;
        let items: Vec<Repository> = serde_json::from_str(&response.body)?;
        self.next = response
            .link
            .as_deref()
            .and_then(next_link)
            .map(|url| path_and_query(url).to_string());
        Ok(Page {
            items,
            has_next: self.next.is_some(),
        })
    }
}

struct OrganizationPages<'a, T> {
    transport: &'a RateLimited<T>,
    enterprise: &'a str,
    cursor: Option<String>,
}

#[async_trait]
impl<'a, T: Transport> PageSource for OrganizationPages<'a, T> {
    type Item = String;

    async fn fetch_page(&mut self, want: usize) -> Result<Page<String>> {
        let body = graphql::request_body(
            graphql::ENTERPRISE_ORGANIZATIONS,
            json!({ "enterprise": self.enterprise, "first": want, "after": self.cursor }),
        );
        let response = self
            .transport
            .send(&ApiRequest::post(graphql::ENDPOINT, body))
            .await?;
        let data: EnterpriseData = graphql::parse(&response.body)?;
        let connection = data
            .enterprise
            .ok_or_else(|| OrglangError::NotFound(format!("enterprise '{}'", self.enterprise)))?
            .organizations;

        self.cursor = connection.page_info.end_cursor;
        Ok(Page {
            items: connection.nodes.into_iter().flatten().map(|o| o.login).collect(),
            has_next: connection.page_info.has_next_page && self.cursor.is_some(),
        })
    }
}

struct RepositoryLanguagePages<'a, T> {
    transport: &'a RateLimited<T>,
    org: &'a str,
    cursor: Option<String>,
}

#[async_trait]
impl<'a, T: Transport> PageSource for RepositoryLanguagePages<'a, T> {
    type Item = RepositoryLanguages;

    async fn fetch_page(&mut self, want: usize) -> Result<Page<RepositoryLanguages>> {
        let body = graphql::request_body(
            graphql::ORGANIZATION_REPOSITORIES,
            json!({ "org": self.org, "first": want, "after": self.cursor }),
        );
        let response = self
            .transport
            .send(&ApiRequest::post(graphql::ENDPOINT, body))
            .await?;
        let data: OrganizationData = graphql::parse(&response.body)?;
        let connection = data
            .organization
            .ok_or_else(|| OrglangError::NotFound(format!("organization '{}'", self.org)))?
            .repositories;

        self.cursor = connection.page_info.end_cursor;
        let items = connection
            .nodes
            .into_iter()
            .flatten()
            .map(|node| RepositoryLanguages {
                languages: node
                    .languages
                    .map(|l| {
                        l.edges
                            .into_iter()
                            .map(|edge| (edge.node.name, edge.size))
                            .collect()
                    })
                    .unwrap_or_default(),
                repository: Repository {
                    name: node.name,
                    created_at: node.created_at,
                },
            })
            .collect();
        Ok(Page {
            items,
            has_next: connection.page_info.has_next_page && self.cursor.is_some(),
        })
    }
}
