//! Hand-off of a finished form to the storage service.
//!
//! Preparing the request and reading the response are pure; [`StorageClient`] only moves
//! the bytes. A save is never sent without a CSRF token or while a contact person lacks
//! an email address.

use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info};

use crate::entry::map_initial_resource;
use crate::form::{FormLimits, ResourceForm};
use crate::serialize::SavePayload;

mod client;
pub use client::StorageClient;

pub const CSRF_MISSING_MESSAGE: &str = "CSRF token not found. Please reload the page and try again.";

const META_TOKEN_HEADER: &str = "X-CSRF-TOKEN";
const COOKIE_TOKEN_HEADER: &str = "X-XSRF-TOKEN";
const COOKIE_TOKEN_NAME: &str = "XSRF-TOKEN";

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("CSRF token not found. Please reload the page and try again.")]
    MissingCsrfToken,

    #[error("A contact person needs an email address before the resource can be saved")]
    NotSubmitReady,

    #[error("{message}")]
    Validation {
        message: String,
        errors: BTreeMap<String, Vec<String>>,
    },

    #[error("Network error while saving: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

impl SaveError {
    /// Only transport failures are worth retrying; nothing retries automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SaveError::Transport(_))
    }
}

/// Where a CSRF token may be found: the page meta tag, then the raw `Cookie` header.
#[derive(Debug, Clone, Default)]
pub struct CsrfSources {
    pub meta_token: Option<String>,
    pub cookie_header: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken {
    pub header: &'static str,
    pub value: String,
}

fn cookie_token(cookie_header: &str) -> Option<String> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| name.trim() == COOKIE_TOKEN_NAME)
        .and_then(|(_, value)| urlencoding::decode(value.trim()).ok())
        .map(|value| value.into_owned())
        .filter(|value| !value.is_empty())
}

pub fn resolve_csrf_token(sources: &CsrfSources) -> Result<CsrfToken, SaveError> {
    if let Some(meta) = sources
        .meta_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        return Ok(CsrfToken {
            header: META_TOKEN_HEADER,
            value: meta.to_string(),
        });
    }

    sources
        .cookie_header
        .as_deref()
        .and_then(cookie_token)
        .map(|value| CsrfToken {
            header: COOKIE_TOKEN_HEADER,
            value,
        })
        .ok_or(SaveError::MissingCsrfToken)
}

#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub payload: SavePayload,
    pub body: String,
}

/// Runs the save gates and builds the request; fails before anything could be sent.
pub fn prepare_save_request(
    form: &ResourceForm,
    url: &str,
    sources: &CsrfSources,
) -> Result<SaveRequest, SaveError> {
    if !form.is_submit_ready() {
        return Err(SaveError::NotSubmitReady);
    }
    let token = resolve_csrf_token(sources)?;
    let payload = form.to_payload();
    let body = serde_json::to_string(&payload)?;

    Ok(SaveRequest {
        url: url.to_string(),
        headers: vec![
            ("Content-Type", "application/json".to_string()),
            ("Accept", "application/json".to_string()),
            (token.header, token.value),
        ],
        payload,
        body,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    #[serde(default, deserialize_with = "lenient_id")]
    pub resource_id: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Accepts `42` or `"42"`; anything else reads as no id.
fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Number(n)) => n.as_u64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[derive(Debug, Default, Deserialize)]
struct ValidationBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: BTreeMap<String, Vec<String>>,
}

pub fn interpret_response(status: u16, body: &str) -> Result<SaveOutcome, SaveError> {
    match status {
        200..=299 => Ok(serde_json::from_str(body).unwrap_or_default()),
        422 => {
            let parsed: ValidationBody = serde_json::from_str(body).unwrap_or_default();
            Err(SaveError::Validation {
                message: parsed
                    .message
                    .unwrap_or_else(|| "The given data was invalid.".to_string()),
                errors: parsed.errors,
            })
        }
        _ => Err(SaveError::Status {
            status,
            body: body.to_string(),
        }),
    }
}

#[derive(Args)]
pub struct SubmitArgs {
    /// Stored resource record (JSON)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Storage endpoint receiving the save payload
    #[arg(short, long)]
    pub url: String,

    /// CSRF token from the page meta tag
    #[arg(long)]
    pub meta_token: Option<String>,

    /// Raw Cookie header, searched for XSRF-TOKEN when no meta token is given
    #[arg(long)]
    pub cookie: Option<String>,

    /// Request timeout in seconds
    #[arg(short, long, default_value = "30")]
    pub timeout: u64,

    #[command(flatten)]
    pub limits: FormLimits,
}

pub fn run(args: SubmitArgs) -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_async(args))
}

pub async fn run_async(args: SubmitArgs) -> Result<()> {
    let file = File::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let record: serde_json::Value =
        serde_json::from_reader(file).context("Failed to parse resource record")?;
    let form = map_initial_resource(&record, args.limits);

    let sources = CsrfSources {
        meta_token: args.meta_token,
        cookie_header: args.cookie,
    };
    let client = StorageClient::new(args.url, args.timeout)?;

    match client.save(&form, &sources).await {
        Ok(outcome) => {
            info!("Saved resource {:?}", outcome.resource_id);
            Ok(())
        }
        Err(SaveError::Validation { message, errors }) => {
            for (field, messages) in &errors {
                error!("{}: {}", field, messages.join("; "));
            }
            Err(anyhow::anyhow!(message))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_token_wins_over_cookie() {
        let token = resolve_csrf_token(&CsrfSources {
            meta_token: Some("meta".into()),
            cookie_header: Some("XSRF-TOKEN=cookie".into()),
        })
        .unwrap();
        assert_eq!(token.header, "X-CSRF-TOKEN");
        assert_eq!(token.value, "meta");
    }

    #[test]
    fn cookie_token_is_decoded() {
        let token = resolve_csrf_token(&CsrfSources {
            meta_token: Some("  ".into()),
            cookie_header: Some("session=abc; XSRF-TOKEN=eyJpdiI6%3D%3D; other=1".into()),
        })
        .unwrap();
        assert_eq!(token.header, "X-XSRF-TOKEN");
        assert_eq!(token.value, "eyJpdiI6==");
    }

    #[test]
    fn no_token_is_fatal() {
        let err = resolve_csrf_token(&CsrfSources {
            meta_token: None,
            cookie_header: Some("session=abc".into()),
        })
        .unwrap_err();
        assert!(matches!(err, SaveError::MissingCsrfToken));
        assert_eq!(err.to_string(), CSRF_MISSING_MESSAGE);
        assert!(!err.is_retryable());
    }

    #[test]
    fn validation_errors_are_structured() {
        let body = r#"{"message":"Invalid","errors":{"titles.0.title":["Required"]}}"#;
        match interpret_response(422, body) {
            Err(SaveError::Validation { message, errors }) => {
                assert_eq!(message, "Invalid");
                assert_eq!(errors["titles.0.title"], vec!["Required".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn success_reads_resource_id() {
        let outcome = interpret_response(200, r#"{"resourceId": 42}"#).unwrap();
        assert_eq!(outcome.resource_id, Some(42));
        assert_eq!(interpret_response(204, "").unwrap(), SaveOutcome::default());
    }

    #[test]
    fn success_reads_string_resource_id() {
        let outcome = interpret_response(201, r#"{"resourceId": "42", "message": "ok"}"#).unwrap();
        assert_eq!(outcome.resource_id, Some(42));
        assert_eq!(outcome.message.as_deref(), Some("ok"));

        let outcome = interpret_response(200, r#"{"resourceId": "draft"}"#).unwrap();
        assert_eq!(outcome.resource_id, None);
    }
}
