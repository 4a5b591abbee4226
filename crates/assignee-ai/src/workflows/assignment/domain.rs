use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Validated `<PROJECT>-<NUMBER>` issue identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IssueKey(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid issue key '{0}': expected <PROJECT>-<NUMBER>")]
pub struct InvalidIssueKey(pub String);

impl IssueKey {
    pub fn parse(raw: &str) -> Result<Self, InvalidIssueKey> {
        let trimmed = raw.trim();
        let invalid = || InvalidIssueKey(raw.to_string());

        let (project, number) = trimmed.split_once('-').ok_or_else(invalid)?;
        let mut chars = project.chars();
        let leads_with_letter = chars
            .next()
            .map(|first| first.is_ascii_alphabetic())
            .unwrap_or(false);
        if !leads_with_letter || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(invalid());
        }

        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        match number.parse::<u64>() {
            Ok(value) if value > 0 => {}
            _ => return Err(invalid()),
        }

        Ok(Self(format!(
            "{}-{}",
            project.to_ascii_uppercase(),
            number.trim_start_matches('0')
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Namespace prefix used to resolve the assignable roster.
    pub fn project_key(&self) -> ProjectKey {
        let prefix = self.0.split_once('-').map(|(project, _)| project);
        ProjectKey(prefix.unwrap_or(self.0.as_str()).to_string())
    }
}

impl TryFrom<String> for IssueKey {
    type Error = InvalidIssueKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<IssueKey> for String {
    fn from(value: IssueKey) -> Self {
        value.0
    }
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectKey(pub String);

impl fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tracker account identifier. Ordered so declined sets round-trip in a stable order.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalized snapshot of an issue as produced by the ingestion collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueProfile {
    pub key: IssueKey,
    #[serde(default, deserialize_with = "lenient::metadata_list")]
    pub labels: Vec<String>,
    #[serde(default, deserialize_with = "lenient::metadata_list")]
    pub components: Vec<String>,
    #[serde(default, deserialize_with = "lenient::metadata_value")]
    pub issue_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::metadata_value")]
    pub epic_key: Option<String>,
    #[serde(default, deserialize_with = "lenient::metadata_value")]
    pub parent_key: Option<String>,
    #[serde(default)]
    pub historical_assignees: Vec<HistoricalAssignee>,
    #[serde(default)]
    pub worklog_contributors: Vec<WorklogContribution>,
    #[serde(default)]
    pub comment_contributors: Vec<CommentContribution>,
}

impl IssueProfile {
    pub fn new(key: IssueKey) -> Self {
        Self {
            key,
            labels: Vec::new(),
            components: Vec::new(),
            issue_type: None,
            epic_key: None,
            parent_key: None,
            historical_assignees: Vec::new(),
            worklog_contributors: Vec::new(),
            comment_contributors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalAssignee {
    pub account_id: AccountId,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklogContribution {
    pub account_id: AccountId,
    #[serde(default, deserialize_with = "lenient::count")]
    pub time_spent_seconds: f64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub log_count: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentContribution {
    pub account_id: AccountId,
    #[serde(default, deserialize_with = "lenient::count")]
    pub comment_count: f64,
}

/// Per-user aggregate of historical activity. Read-only to the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateProfile {
    #[serde(default)]
    pub account_id: AccountId,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::count_map")]
    pub labels: BTreeMap<String, f64>,
    #[serde(default, deserialize_with = "lenient::count_map")]
    pub components: BTreeMap<String, f64>,
    #[serde(default, deserialize_with = "lenient::count_map")]
    pub issue_types: BTreeMap<String, f64>,
    #[serde(default, deserialize_with = "lenient::count_map")]
    pub epics: BTreeMap<String, f64>,
    #[serde(default, deserialize_with = "lenient::count_map")]
    pub parents: BTreeMap<String, f64>,
    #[serde(default, deserialize_with = "lenient::metadata_list")]
    pub assigned_issues: Vec<String>,
    #[serde(default, deserialize_with = "lenient::metadata_list")]
    pub worklog_issues: Vec<String>,
    #[serde(default, deserialize_with = "lenient::metadata_list")]
    pub commented_issues: Vec<String>,
}

/// Current load of a candidate at scoring time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadSnapshot {
    #[serde(default, deserialize_with = "lenient::count")]
    pub total_open_issues: f64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub total_estimate_seconds: f64,
}

/// Roster entry for a user who may be assigned within a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignableUser {
    pub account_id: AccountId,
    pub display_name: String,
}

/// Display data for an issue referenced from a candidate's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSummary {
    pub key: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<String>,
}

pub type IssueLookup = BTreeMap<String, IssueSummary>;

/// Clamp a count to a finite, non-negative value.
pub fn coerce_count(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Deserializers that degrade malformed tracker payloads to empty or zero values.
mod lenient {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::coerce_count;

    fn count_from(value: &Value) -> f64 {
        match value {
            Value::Number(number) => number.as_f64().map(coerce_count).unwrap_or(0.0),
            Value::String(raw) => raw.trim().parse::<f64>().map(coerce_count).unwrap_or(0.0),
            _ => 0.0,
        }
    }

    fn scalar_text(value: &Value) -> Option<String> {
        match value {
            Value::String(raw) => {
                let trimmed = raw.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            _ => None,
        }
    }

    fn text_from(value: &Value) -> Option<String> {
        match value {
            Value::Object(fields) => ["name", "key", "value"]
                .iter()
                .find_map(|field| fields.get(*field).and_then(scalar_text)),
            other => scalar_text(other),
        }
    }

    pub(super) fn count<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(count_from(&value))
    }

    pub(super) fn count_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let Value::Object(entries) = value else {
            return Ok(BTreeMap::new());
        };
        Ok(entries
            .iter()
            .map(|(name, count)| (name.clone(), count_from(count)))
            .collect())
    }

    pub(super) fn metadata_value<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(text_from(&value))
    }

    pub(super) fn metadata_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Array(items) => items.iter().filter_map(text_from).collect(),
            Value::Null => Vec::new(),
            single => text_from(&single).into_iter().collect(),
        })
    }
}
