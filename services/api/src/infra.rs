use assignee_ai::config::AssignmentSettings;
use assignee_ai::error::AppError;
use assignee_ai::workflows::assignment::{
    AccountId, AssignableUser, AssignmentCollaborators, AssignmentGateway, AssignmentRejection,
    AssignmentService, AssignmentState, CandidateProfile, DirectoryError, IssueDirectory,
    IssueKey, IssueLookup, IssueProfile, IssueSummary, NotificationError, NotificationPublisher,
    NotificationRecord, PeopleDirectory, ProjectKey, ScoringWeights, StateError, StateRepository,
    WorkloadSnapshot,
};
use async_trait::async_trait;
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Tracker snapshot used to seed the in-memory collaborators.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct DemoFixture {
    pub(crate) issues: Vec<IssueProfile>,
    pub(crate) profiles: Vec<CandidateProfile>,
    pub(crate) workloads: BTreeMap<AccountId, WorkloadSnapshot>,
    pub(crate) rosters: BTreeMap<String, Vec<AssignableUser>>,
    pub(crate) summaries: Vec<IssueSummary>,
}

impl DemoFixture {
    pub(crate) fn from_path(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        let fixture = serde_json::from_str(&raw).map_err(std::io::Error::from)?;
        Ok(fixture)
    }

    /// Payments team snapshot with one open bug and three assignable engineers.
    pub(crate) fn sample() -> Result<Self, AppError> {
        let payload = json!({
            "issues": [{
                "key": "PAY-101",
                "labels": ["payments", { "name": "backend" }],
                "components": [{ "name": "ledger" }],
                "issueType": { "name": "Bug" },
                "epicKey": "PAY-1",
                "historicalAssignees": [{ "accountId": "acc-mei" }],
                "worklogContributors": [
                    { "accountId": "acc-mei", "timeSpentSeconds": 5400, "logCount": 2 },
                    { "accountId": "acc-omar", "timeSpentSeconds": 1800, "logCount": 1 }
                ],
                "commentContributors": [
                    { "accountId": "acc-omar", "commentCount": 3 },
                    { "accountId": "acc-rita", "commentCount": 1 }
                ]
            }],
            "profiles": [
                {
                    "accountId": "acc-mei",
                    "displayName": "Mei Chen",
                    "labels": { "payments": 14, "backend": 9 },
                    "components": { "ledger": 11 },
                    "issueTypes": { "Bug": 22 },
                    "epics": { "PAY-1": 4 },
                    "assignedIssues": ["PAY-7", "PAY-12", "PAY-31", "PAY-44", "PAY-58", "PAY-60"],
                    "worklogIssues": ["PAY-7", "PAY-12"],
                    "commentedIssues": ["PAY-31"]
                },
                {
                    "accountId": "acc-omar",
                    "displayName": "Omar Haddad",
                    "labels": { "payments": 6, "backend": 12 },
                    "components": { "ledger": 2 },
                    "issueTypes": { "Bug": 15 },
                    "assignedIssues": ["PAY-12", "PAY-20"],
                    "commentedIssues": ["PAY-7", "PAY-20", "PAY-31"]
                },
                {
                    "accountId": "acc-rita",
                    "displayName": "Rita Alves",
                    "labels": { "frontend": 18, "payments": 1 },
                    "issueTypes": { "Story": 30 },
                    "assignedIssues": ["PAY-33"]
                }
            ],
            "workloads": {
                "acc-mei": { "totalOpenIssues": 7, "totalEstimateSeconds": 86400 },
                "acc-omar": { "totalOpenIssues": 2, "totalEstimateSeconds": 14400 },
                "acc-rita": { "totalOpenIssues": 1 }
            },
            "rosters": {
                "PAY": [
                    { "accountId": "acc-mei", "displayName": "Mei Chen" },
                    { "accountId": "acc-omar", "displayName": "Omar Haddad" },
                    { "accountId": "acc-rita", "displayName": "Rita Alves" }
                ]
            },
            "summaries": [
                { "key": "PAY-7", "summary": "Ledger drift on refunds", "status": "Done" },
                { "key": "PAY-12", "summary": "Duplicate settlement rows", "status": "Done" },
                { "key": "PAY-20", "summary": "Retry storm on card declines", "status": "Done" },
                { "key": "PAY-31", "summary": "Currency rounding in payouts", "status": "Done" },
                { "key": "PAY-44", "summary": "Backfill ledger checksums", "status": "Done" },
                { "key": "PAY-58", "summary": "Idempotency keys for captures", "status": "Done" }
            ]
        });

        Self::from_value(payload)
    }

    pub(crate) fn from_value(payload: serde_json::Value) -> Result<Self, AppError> {
        let fixture = serde_json::from_value(payload).map_err(std::io::Error::from)?;
        Ok(fixture)
    }

    pub(crate) fn first_issue_key(&self) -> Option<&IssueKey> {
        self.issues.first().map(|issue| &issue.key)
    }
}

/// Read model over a fixture: issues, people, rosters, and issue summaries.
#[derive(Default)]
pub(crate) struct InMemoryDirectory {
    issues: HashMap<IssueKey, IssueProfile>,
    profiles: HashMap<AccountId, CandidateProfile>,
    workloads: BTreeMap<AccountId, WorkloadSnapshot>,
    rosters: BTreeMap<String, Vec<AssignableUser>>,
    lookup: IssueLookup,
}

impl InMemoryDirectory {
    pub(crate) fn from_fixture(fixture: DemoFixture) -> Self {
        let DemoFixture {
            issues,
            profiles,
            workloads,
            rosters,
            summaries,
        } = fixture;

        Self {
            issues: issues
                .into_iter()
                .map(|issue| (issue.key.clone(), issue))
                .collect(),
            profiles: profiles
                .into_iter()
                .map(|profile| (profile.account_id.clone(), profile))
                .collect(),
            workloads,
            rosters: rosters
                .into_iter()
                .map(|(project, roster)| (project.to_ascii_uppercase(), roster))
                .collect(),
            lookup: summaries
                .into_iter()
                .map(|summary| (summary.key.clone(), summary))
                .collect(),
        }
    }
}

#[async_trait]
impl IssueDirectory for InMemoryDirectory {
    async fn issue_profile(
        &self,
        issue_key: &IssueKey,
    ) -> Result<Option<IssueProfile>, DirectoryError> {
        Ok(self.issues.get(issue_key).cloned())
    }

    async fn refresh_issue(&self, issue_key: &IssueKey) -> Result<(), DirectoryError> {
        debug!(issue_key = %issue_key, "fixture directory has nothing to refresh");
        Ok(())
    }

    async fn issue_lookup(&self) -> Result<IssueLookup, DirectoryError> {
        Ok(self.lookup.clone())
    }
}

#[async_trait]
impl PeopleDirectory for InMemoryDirectory {
    async fn candidate_profile(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<CandidateProfile>, DirectoryError> {
        Ok(self.profiles.get(account_id).cloned())
    }

    async fn workload(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<WorkloadSnapshot>, DirectoryError> {
        Ok(self.workloads.get(account_id).copied())
    }

    async fn assignable_roster(
        &self,
        project_key: &ProjectKey,
    ) -> Result<Vec<AssignableUser>, DirectoryError> {
        Ok(self.rosters.get(&project_key.0).cloned().unwrap_or_default())
    }
}

/// Assignment writes kept in memory. Accounts listed in `refused` are rejected with a 400.
#[derive(Default)]
pub(crate) struct InMemoryGateway {
    refused: BTreeSet<AccountId>,
    assignees: Mutex<HashMap<IssueKey, AccountId>>,
}

impl InMemoryGateway {
    pub(crate) fn refusing(refused: impl IntoIterator<Item = AccountId>) -> Self {
        Self {
            refused: refused.into_iter().collect(),
            assignees: Mutex::default(),
        }
    }

    pub(crate) fn assignee(&self, issue_key: &IssueKey) -> Option<AccountId> {
        self.assignees
            .lock()
            .ok()
            .and_then(|assignees| assignees.get(issue_key).cloned())
    }
}

#[async_trait]
impl AssignmentGateway for InMemoryGateway {
    async fn apply_assignment(
        &self,
        issue_key: &IssueKey,
        account_id: &AccountId,
    ) -> Result<(), AssignmentRejection> {
        if self.refused.contains(account_id) {
            return Err(AssignmentRejection {
                status: 400,
                body: format!("User '{account_id}' cannot be assigned issues."),
            });
        }

        let mut assignees = self.assignees.lock().map_err(|_| AssignmentRejection {
            status: 503,
            body: "assignment store unavailable".to_string(),
        })?;
        assignees.insert(issue_key.clone(), account_id.clone());
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryNotifications {
    posted: Mutex<Vec<NotificationRecord>>,
}

impl InMemoryNotifications {
    pub(crate) fn posted(&self) -> Vec<NotificationRecord> {
        self.posted
            .lock()
            .map(|posted| posted.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl NotificationPublisher for InMemoryNotifications {
    async fn post_notification(
        &self,
        issue_key: &IssueKey,
        message: &str,
    ) -> Result<NotificationRecord, NotificationError> {
        let mut posted = self
            .posted
            .lock()
            .map_err(|_| NotificationError::Transport("notification log poisoned".to_string()))?;
        let record = NotificationRecord {
            id: format!("comment-{}", posted.len() + 1),
            issue_key: issue_key.clone(),
            body: message.to_string(),
            posted_at: Utc::now(),
        };
        posted.push(record.clone());
        Ok(record)
    }
}

#[derive(Default)]
pub(crate) struct InMemoryStateRepository {
    states: Mutex<HashMap<IssueKey, AssignmentState>>,
}

impl InMemoryStateRepository {
    fn guard(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<IssueKey, AssignmentState>>, StateError> {
        self.states
            .lock()
            .map_err(|_| StateError::Unavailable("state store poisoned".to_string()))
    }
}

#[async_trait]
impl StateRepository for InMemoryStateRepository {
    async fn load_state(
        &self,
        issue_key: &IssueKey,
    ) -> Result<Option<AssignmentState>, StateError> {
        Ok(self.guard()?.get(issue_key).cloned())
    }

    async fn save_state(
        &self,
        issue_key: &IssueKey,
        state: &AssignmentState,
    ) -> Result<(), StateError> {
        self.guard()?.insert(issue_key.clone(), state.clone());
        Ok(())
    }

    async fn delete_state(&self, issue_key: &IssueKey) -> Result<(), StateError> {
        self.guard()?.remove(issue_key);
        Ok(())
    }
}

/// Handles to the in-memory collaborators behind a wired service.
pub(crate) struct InMemoryTracker {
    pub(crate) service: Arc<AssignmentService>,
    pub(crate) gateway: Arc<InMemoryGateway>,
    pub(crate) notifications: Arc<InMemoryNotifications>,
}

impl InMemoryTracker {
    pub(crate) fn new(
        fixture: DemoFixture,
        refused: impl IntoIterator<Item = AccountId>,
        settings: AssignmentSettings,
    ) -> Self {
        let directory = Arc::new(InMemoryDirectory::from_fixture(fixture));
        let gateway = Arc::new(InMemoryGateway::refusing(refused));
        let notifications = Arc::new(InMemoryNotifications::default());

        let service = AssignmentService::new(
            AssignmentCollaborators {
                issues: directory.clone(),
                people: directory,
                gateway: gateway.clone(),
                notifications: notifications.clone(),
                states: Arc::new(InMemoryStateRepository::default()),
            },
            ScoringWeights::default(),
            settings,
        );

        Self {
            service: Arc::new(service),
            gateway,
            notifications,
        }
    }
}
