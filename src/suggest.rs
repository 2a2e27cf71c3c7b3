//! Organization suggestions for affiliation tagging.
//!
//! The engine itself only consumes already-fetched [`AffiliationSuggestion`] lists; the
//! client here is the adapter the command line uses to fetch them.

use anyhow::{anyhow, Context, Result};
use clap::Args;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};
use urlencoding::encode;

use crate::normalize::serialize_affiliations;
use crate::{AffiliationSuggestion, AffiliationTag};

#[derive(Debug, Deserialize)]
struct OrganizationName {
    value: String,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Organization {
    id: String,
    #[serde(default)]
    names: Vec<OrganizationName>,
}

#[derive(Debug, Deserialize)]
struct OrganizationsResponse {
    #[serde(default)]
    items: Vec<Organization>,
}

impl Organization {
    /// Prefers the `ror_display` name, falling back to the first one listed.
    fn into_suggestion(self) -> AffiliationSuggestion {
        let name = self
            .names
            .iter()
            .find(|n| n.types.iter().any(|t| t == "ror_display"))
            .or_else(|| self.names.first())
            .map(|n| n.value.clone())
            .unwrap_or_default();

        AffiliationSuggestion {
            name,
            ror_id: Some(self.id).filter(|id| !id.is_empty()),
        }
    }
}

/// Suggestions as affiliation tags, with the same cleanup as any outbound affiliation list.
pub fn suggestion_tags(suggestions: &[AffiliationSuggestion]) -> Vec<AffiliationTag> {
    let tags: Vec<AffiliationTag> = suggestions
        .iter()
        .map(|s| AffiliationTag::new(s.name.clone(), s.ror_id.clone()))
        .collect();
    serialize_affiliations(&tags)
}

pub struct SuggestionClient {
    client: Client,
    base_url: String,
}

impl SuggestionClient {
    pub fn new(base_url: String, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self { client, base_url })
    }

    pub async fn suggest(&self, query: &str) -> Result<Vec<AffiliationSuggestion>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/v2/organizations?query={}", self.base_url, encode(query));
        let max_retries = 3;

        for attempt in 0..max_retries {
            let response = self.client.get(&url).send().await?;
            let status = response.status();

            if status.is_success() {
                let body: OrganizationsResponse = response.json().await?;
                return Ok(body
                    .items
                    .into_iter()
                    .map(Organization::into_suggestion)
                    .collect());
            } else if status.as_u16() == 429 {
                let wait = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(2u64.pow(attempt as u32));
                warn!("Rate limited, waiting {}s", wait);
                tokio::time::sleep(Duration::from_secs(wait)).await;
            } else {
                return Err(anyhow!("HTTP {}", status));
            }
        }

        Err(anyhow!("Max retries exceeded"))
    }
}

#[derive(Args)]
pub struct SuggestArgs {
    /// Organization name to look up
    pub query: String,

    /// Suggestion service base URL
    #[arg(short = 'u', long, default_value = "https://api.ror.org")]
    pub base_url: String,

    /// Request timeout in seconds
    #[arg(short, long, default_value = "30")]
    pub timeout: u64,

    /// Maximum number of suggestions to print
    #[arg(short, long, default_value = "10")]
    pub limit: usize,
}

pub fn run(args: SuggestArgs) -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_async(args))
}

pub async fn run_async(args: SuggestArgs) -> Result<()> {
    let client = SuggestionClient::new(args.base_url, args.timeout)?;
    let mut suggestions = client
        .suggest(&args.query)
        .await
        .context("Suggestion lookup failed")?;
    suggestions.truncate(args.limit);
    info!("{} suggestions for {:?}", suggestions.len(), args.query);

    let tags = suggestion_tags(&suggestions);
    println!("{}", serde_json::to_string_pretty(&tags)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_is_preferred() {
        let org: Organization = serde_json::from_str(
            r#"{
                "id": "https://ror.org/052gg0110",
                "names": [
                    {"value": "Oxford", "types": ["acronym"]},
                    {"value": "University of Oxford", "types": ["ror_display", "label"]}
                ]
            }"#,
        )
        .unwrap();
        let suggestion = org.into_suggestion();
        assert_eq!(suggestion.name, "University of Oxford");
        assert_eq!(suggestion.ror_id.as_deref(), Some("https://ror.org/052gg0110"));
    }

    #[test]
    fn falls_back_to_first_name() {
        let org: Organization = serde_json::from_str(
            r#"{"id": "https://ror.org/test123", "names": [{"value": "Test Org", "types": ["alias"]}]}"#,
        )
        .unwrap();
        assert_eq!(org.into_suggestion().name, "Test Org");
    }

    #[test]
    fn nameless_suggestion_is_labelled_by_ror_id() {
        let tags = suggestion_tags(&[AffiliationSuggestion {
            name: String::new(),
            ror_id: Some("https://ror.org/x".into()),
        }]);
        assert_eq!(tags[0].value, "https://ror.org/x");
    }
}
