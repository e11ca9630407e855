//! The fixed GraphQL query shapes the client needs and their response types.

use crate::error::{OrglangError, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

pub const ENDPOINT: &str = "/graphql";

pub const ENTERPRISE_ORGANIZATIONS: &str = r#"
query($enterprise: String!, $first: Int!, $after: String) {
  enterprise(slug: $enterprise) {
    organizations(first: $first, after: $after) {
      nodes { login }
      pageInfo { hasNextPage endCursor }
    }
  }
}"#;

pub const ORGANIZATION_REPOSITORIES: &str = r#"
query($org: String!, $first: Int!, $after: String) {
  organization(login: $org) {
    repositories(first: $first, after: $after, orderBy: {field: CREATED_AT, direction: DESC}) {
      nodes {
        name
        createdAt
        languages(first: 100) {
          edges { size node { name } }
        }
      }
      pageInfo { hasNextPage endCursor }
    }
  }
}"#;

pub const ORGANIZATION_REPOSITORY_COUNT: &str = r#"
query($org: String!) {
  organization(login: $org) {
    repositories { totalCount }
  }
}"#;

pub fn request_body(query: &str, variables: Value) -> Value {
    json!({ "query": query, "variables": variables })
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    message: String,
}

/// Decode a GraphQL response, turning an `errors` array into an error.
pub fn parse<T: DeserializeOwned>(body: &str) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_str(body)?;
    if !envelope.errors.is_empty() {
        let messages: Vec<String> = envelope.errors.into_iter().map(|e| e.message).collect();
        return Err(OrglangError::GraphQl(messages.join("; ")));
    }
    envelope
        .data
        .ok_or_else(|| OrglangError::Parse("GraphQL response has no data".into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<Option<T>>,
    pub page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
pub struct EnterpriseData {
    pub enterprise: Option<EnterpriseNode>,
}

#[derive(Debug, Deserialize)]
pub struct EnterpriseNode {
    pub organizations: Connection<OrganizationNode>,
}

#[derive(Debug, Deserialize)]
pub struct OrganizationNode {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct OrganizationData {
    pub organization: Option<RepositoriesNode>,
}

#[derive(Debug, Deserialize)]
pub struct RepositoriesNode {
    pub repositories: Connection<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryNode {
    pub name: String,
    #[serde(default)]
    pub created_at: String,
    pub languages: Option<LanguageConnection>,
}

#[derive(Debug, Deserialize)]
pub struct LanguageConnection {
    #[serde(default)]
    pub edges: Vec<LanguageEdge>,
}

#[derive(Debug, Deserialize)]
pub struct LanguageEdge {
    pub size: u64,
    pub node: LanguageName,
}

#[derive(Debug, Deserialize)]
pub struct LanguageName {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryCountData {
    pub organization: Option<RepositoryCountNode>,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryCountNode {
    pub repositories: TotalCount,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalCount {
    pub total_count: usize,
}
