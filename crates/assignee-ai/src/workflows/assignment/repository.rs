use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    AccountId, AssignableUser, CandidateProfile, IssueKey, IssueLookup, IssueProfile, ProjectKey,
    WorkloadSnapshot,
};
use super::state::AssignmentState;

/// Read side of the ingestion collaborator for issues.
#[async_trait]
pub trait IssueDirectory: Send + Sync {
    async fn issue_profile(
        &self,
        issue_key: &IssueKey,
    ) -> Result<Option<IssueProfile>, DirectoryError>;

    /// Ask the ingestion collaborator to re-harvest a single issue.
    async fn refresh_issue(&self, issue_key: &IssueKey) -> Result<(), DirectoryError>;

    /// Issue key to summary map used for candidate profile summaries.
    async fn issue_lookup(&self) -> Result<IssueLookup, DirectoryError>;
}

/// Read side of the ingestion collaborator for people.
#[async_trait]
pub trait PeopleDirectory: Send + Sync {
    async fn candidate_profile(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<CandidateProfile>, DirectoryError>;

    async fn workload(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<WorkloadSnapshot>, DirectoryError>;

    async fn assignable_roster(
        &self,
        project_key: &ProjectKey,
    ) -> Result<Vec<AssignableUser>, DirectoryError>;
}

/// External write that sets the issue's assignee in the tracker.
#[async_trait]
pub trait AssignmentGateway: Send + Sync {
    async fn apply_assignment(
        &self,
        issue_key: &IssueKey,
        account_id: &AccountId,
    ) -> Result<(), AssignmentRejection>;
}

/// Outbound comment hook on the tracked issue.
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    async fn post_notification(
        &self,
        issue_key: &IssueKey,
        message: &str,
    ) -> Result<NotificationRecord, NotificationError>;
}

/// Durable per-issue storage for assignment state.
#[async_trait]
pub trait StateRepository: Send + Sync {
    async fn load_state(
        &self,
        issue_key: &IssueKey,
    ) -> Result<Option<AssignmentState>, StateError>;
    async fn save_state(
        &self,
        issue_key: &IssueKey,
        state: &AssignmentState,
    ) -> Result<(), StateError>;
    async fn delete_state(&self, issue_key: &IssueKey) -> Result<(), StateError>;
}

/// Tracker response for a refused assignment write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("assignment rejected with status {status}: {body}")]
pub struct AssignmentRejection {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: String,
    pub issue_key: IssueKey,
    pub body: String,
    pub posted_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory unavailable: {0}")]
    Unavailable(String),
    #[error("refresh failed for {issue_key}: {reason}")]
    RefreshFailed { issue_key: IssueKey, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("state storage unavailable: {0}")]
    Unavailable(String),
    #[error("stored state for {issue_key} is unreadable: {reason}")]
    Corrupt { issue_key: IssueKey, reason: String },
}
