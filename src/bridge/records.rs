// ABOUTME: Typed records for the deploy CLI's JSON output (list, status, status <name>).
// ABOUTME: Optional fields tolerate absence; numeric-or-string metrics are read leniently.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{ProjectName, ProjectStatus};

/// One entry of `list --json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEntry {
    pub name: ProjectName,
    pub status: ProjectStatus,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub public_url: Option<String>,
    #[serde(default)]
    pub tunnel_active: bool,
    #[serde(default)]
    pub auto_deploy: Option<AutoDeploy>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoDeploy {
    pub repo: String,
    pub branch: String,
}

/// Output of `status --json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    #[serde(default, deserialize_with = "usable_entries")]
    pub projects: Vec<StatusEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub name: ProjectName,
    #[serde(default)]
    pub framework: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub local_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cpu: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub memory: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub uptime: Option<String>,
}

/// Output of `status <name> --json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDetail {
    pub name: ProjectName,
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default)]
    pub framework: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub container_id: Option<String>,
    #[serde(default)]
    pub container_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub uptime: Option<String>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub local_url: Option<String>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub public_url: Option<String>,
    #[serde(default)]
    pub tunnel_active: bool,
    #[serde(default)]
    pub resources: Option<Resources>,
    #[serde(default)]
    pub deploys: Vec<DeployRecord>,
    #[serde(default, deserialize_with = "domain_list")]
    pub custom_domains: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    #[serde(default, deserialize_with = "lenient_string")]
    pub cpu: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub memory: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub net: Option<String>,
}

/// One past deploy of a project, newest first as the CLI reports them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployRecord {
    #[serde(deserialize_with = "required_lenient_string")]
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub commit_sha: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
    pub created_at: String,
}

impl DeployRecord {
    /// `created_at` as a UTC timestamp, when it is RFC 3339.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// First seven characters of the commit, git-style.
    pub fn short_sha(&self) -> Option<&str> {
        self.commit_sha
            .as_deref()
            .map(|sha| sha.get(..7).unwrap_or(sha))
    }
}

/// Project array as the CLI prints it, minus entries we cannot address by name.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ProjectList<T>(pub Vec<T>);

impl<'de, T: DeserializeOwned> Deserialize<'de> for ProjectList<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        usable_entries(deserializer).map(ProjectList)
    }
}

/// Decode each entry on its own, skipping those whose name is not a valid
/// [`ProjectName`]. Any other malformed entry still fails the whole array.
fn usable_entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let values = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    let mut entries = Vec::with_capacity(values.len());
    for value in values {
        if let Some(name) = value.get("name").and_then(serde_json::Value::as_str)
            && let Err(e) = ProjectName::new(name)
        {
            tracing::warn!("Ignoring project {:?} reported by the deploy CLI: {}", name, e);
            continue;
        }
        entries.push(serde_json::from_value(value).map_err(serde::de::Error::custom)?);
    }
    Ok(entries)
}

/// Strings, numbers, and booleans are all kept as text; null and empty become None.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn required_lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    lenient_string(deserializer)?.ok_or_else(|| serde::de::Error::custom("expected a string or number"))
}

fn non_empty_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Accepts `["a.com"]` as well as `[{"domain": "a.com"}]`.
fn domain_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let values = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(values
        .into_iter()
        .filter_map(|v| match v {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Object(map) => map
                .get("domain")
                .or_else(|| map.get("name"))
                .and_then(|d| d.as_str())
                .map(str::to_string),
            _ => None,
        })
        .collect())
}
