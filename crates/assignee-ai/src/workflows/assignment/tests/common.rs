use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::config::AssignmentSettings;
use crate::workflows::assignment::domain::{
    AccountId, AssignableUser, CandidateProfile, CommentContribution, HistoricalAssignee,
    IssueKey, IssueLookup, IssueProfile, IssueSummary, ProjectKey, WorkloadSnapshot,
    WorklogContribution,
};
use crate::workflows::assignment::repository::{
    AssignmentGateway, AssignmentRejection, DirectoryError, IssueDirectory, NotificationError,
    NotificationPublisher, NotificationRecord, PeopleDirectory, StateError, StateRepository,
};
use crate::workflows::assignment::scoring::ScoringWeights;
use crate::workflows::assignment::service::{AssignmentCollaborators, AssignmentService};
use crate::workflows::assignment::state::AssignmentState;

pub(super) fn key(raw: &str) -> IssueKey {
    IssueKey::parse(raw).expect("valid issue key")
}

pub(super) fn account(raw: &str) -> AccountId {
    AccountId::new(raw)
}

pub(super) fn user(id: &str, name: &str) -> AssignableUser {
    AssignableUser {
        account_id: account(id),
        display_name: name.to_string(),
    }
}

pub(super) fn counts(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries
        .iter()
        .map(|(name, count)| (name.to_string(), *count))
        .collect()
}

pub(super) fn frontend_issue() -> IssueProfile {
    let mut issue = IssueProfile::new(key("WEB-42"));
    issue.labels = vec!["frontend".to_string()];
    issue
}

pub(super) fn rich_issue() -> IssueProfile {
    IssueProfile {
        key: key("WEB-7"),
        labels: vec!["frontend".to_string(), "accessibility".to_string()],
        components: vec!["checkout".to_string()],
        issue_type: Some("Bug".to_string()),
        epic_key: Some("WEB-1".to_string()),
        parent_key: Some("WEB-2".to_string()),
        historical_assignees: vec![HistoricalAssignee {
            account_id: account("acc-ada"),
            occurred_at: Some(Utc::now()),
        }],
        worklog_contributors: vec![WorklogContribution {
            account_id: account("acc-ada"),
            time_spent_seconds: 7200.0,
            log_count: 2.0,
        }],
        comment_contributors: vec![CommentContribution {
            account_id: account("acc-ada"),
            comment_count: 3.0,
        }],
    }
}

pub(super) fn ada_profile() -> CandidateProfile {
    CandidateProfile {
        account_id: account("acc-ada"),
        display_name: Some("Ada Lovelace".to_string()),
        labels: counts(&[("frontend", 5.0), ("accessibility", 2.0)]),
        components: counts(&[("checkout", 4.0)]),
        issue_types: counts(&[("Bug", 9.0)]),
        epics: counts(&[("WEB-1", 1.0)]),
        parents: counts(&[("WEB-2", 3.0)]),
        assigned_issues: vec![
            "WEB-1".to_string(),
            "WEB-2".to_string(),
            "WEB-3".to_string(),
        ],
        worklog_issues: vec!["WEB-1".to_string(), "WEB-2".to_string()],
        commented_issues: vec!["WEB-3".to_string()],
    }
}

pub(super) fn lookup(keys: &[&str]) -> IssueLookup {
    keys.iter()
        .map(|key| {
            (
                key.to_string(),
                IssueSummary {
                    key: key.to_string(),
                    summary: format!("Summary of {key}"),
                    status: Some("Done".to_string()),
                    issue_type: Some("Task".to_string()),
                },
            )
        })
        .collect()
}

#[derive(Default)]
pub(super) struct MemoryIssues {
    profiles: Mutex<HashMap<IssueKey, IssueProfile>>,
    hydrate_on_refresh: Mutex<HashMap<IssueKey, IssueProfile>>,
    lookup: Mutex<IssueLookup>,
    refreshes: Mutex<Vec<IssueKey>>,
    fail_refresh: bool,
}

impl MemoryIssues {
    pub(super) fn with_issue(issue: IssueProfile) -> Self {
        let issues = Self::default();
        issues.insert(issue);
        issues
    }

    pub(super) fn with_history(issue: IssueProfile, summaries: IssueLookup) -> Self {
        let issues = Self::with_issue(issue);
        *issues.lookup.lock().expect("issues mutex poisoned") = summaries;
        issues
    }

    pub(super) fn failing_refresh(issue: IssueProfile) -> Self {
        let issues = Self {
            fail_refresh: true,
            ..Self::default()
        };
        issues.insert(issue);
        issues
    }

    pub(super) fn insert(&self, issue: IssueProfile) {
        self.profiles
            .lock()
            .expect("issues mutex poisoned")
            .insert(issue.key.clone(), issue);
    }

    /// Profile that only becomes visible after a refresh of its key.
    pub(super) fn insert_after_refresh(&self, issue: IssueProfile) {
        self.hydrate_on_refresh
            .lock()
            .expect("issues mutex poisoned")
            .insert(issue.key.clone(), issue);
    }

    pub(super) fn refreshes(&self) -> Vec<IssueKey> {
        self.refreshes
            .lock()
            .expect("issues mutex poisoned")
            .clone()
    }
}

#[async_trait]
impl IssueDirectory for MemoryIssues {
    async fn issue_profile(
        &self,
        issue_key: &IssueKey,
    ) -> Result<Option<IssueProfile>, DirectoryError> {
        Ok(self
            .profiles
            .lock()
            .expect("issues mutex poisoned")
            .get(issue_key)
            .cloned())
    }

    async fn refresh_issue(&self, issue_key: &IssueKey) -> Result<(), DirectoryError> {
        if self.fail_refresh {
            return Err(DirectoryError::RefreshFailed {
                issue_key: issue_key.clone(),
                reason: "ingestion offline".to_string(),
            });
        }
        self.refreshes
            .lock()
            .expect("issues mutex poisoned")
            .push(issue_key.clone());
        let hydrated = self
            .hydrate_on_refresh
            .lock()
            .expect("issues mutex poisoned")
            .remove(issue_key);
        if let Some(issue) = hydrated {
            self.insert(issue);
        }
        Ok(())
    }

    async fn issue_lookup(&self) -> Result<IssueLookup, DirectoryError> {
        Ok(self.lookup.lock().expect("issues mutex poisoned").clone())
    }
}

#[derive(Default)]
pub(super) struct MemoryPeople {
    profiles: Mutex<HashMap<AccountId, CandidateProfile>>,
    workloads: Mutex<HashMap<AccountId, WorkloadSnapshot>>,
    rosters: Mutex<HashMap<String, Vec<AssignableUser>>>,
    roster_reads: AtomicUsize,
}

impl MemoryPeople {
    pub(super) fn with_roster(project: &str, roster: Vec<AssignableUser>) -> Self {
        let people = Self::default();
        people.set_roster(project, roster);
        people
    }

    pub(super) fn set_roster(&self, project: &str, roster: Vec<AssignableUser>) {
        self.rosters
            .lock()
            .expect("people mutex poisoned")
            .insert(project.to_string(), roster);
    }

    pub(super) fn insert_profile(&self, profile: CandidateProfile) {
        self.profiles
            .lock()
            .expect("people mutex poisoned")
            .insert(profile.account_id.clone(), profile);
    }

    pub(super) fn insert_workload(&self, account_id: &str, workload: WorkloadSnapshot) {
        self.workloads
            .lock()
            .expect("people mutex poisoned")
            .insert(account(account_id), workload);
    }

    pub(super) fn roster_reads(&self) -> usize {
        self.roster_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PeopleDirectory for MemoryPeople {
    async fn candidate_profile(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<CandidateProfile>, DirectoryError> {
        Ok(self
            .profiles
            .lock()
            .expect("people mutex poisoned")
            .get(account_id)
            .cloned())
    }

    async fn workload(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<WorkloadSnapshot>, DirectoryError> {
        Ok(self
            .workloads
            .lock()
            .expect("people mutex poisoned")
            .get(account_id)
            .copied())
    }

    async fn assignable_roster(
        &self,
        project_key: &ProjectKey,
    ) -> Result<Vec<AssignableUser>, DirectoryError> {
        self.roster_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .rosters
            .lock()
            .expect("people mutex poisoned")
            .get(&project_key.0)
            .cloned()
            .unwrap_or_default())
    }
}

struct RosterSwap {
    trigger: AccountId,
    people: Arc<MemoryPeople>,
    project: String,
    roster: Vec<AssignableUser>,
}

/// Gateway that rejects a configured set of accounts and records every attempt.
#[derive(Default)]
pub(super) struct ScriptedGateway {
    rejections: Mutex<HashMap<AccountId, AssignmentRejection>>,
    attempts: Mutex<Vec<AccountId>>,
    roster_swap: Mutex<Option<RosterSwap>>,
}

impl ScriptedGateway {
    pub(super) fn reject(&self, account_id: &str, status: u16, body: &str) {
        self.rejections
            .lock()
            .expect("gateway mutex poisoned")
            .insert(
                account(account_id),
                AssignmentRejection {
                    status,
                    body: body.to_string(),
                },
            );
    }

    /// Replaces the project roster the first time `trigger` is rejected.
    pub(super) fn swap_roster_on_rejection(
        &self,
        trigger: &str,
        people: Arc<MemoryPeople>,
        project: &str,
        roster: Vec<AssignableUser>,
    ) {
        *self.roster_swap.lock().expect("gateway mutex poisoned") = Some(RosterSwap {
            trigger: account(trigger),
            people,
            project: project.to_string(),
            roster,
        });
    }

    pub(super) fn attempts(&self) -> Vec<AccountId> {
        self.attempts
            .lock()
            .expect("gateway mutex poisoned")
            .clone()
    }
}

#[async_trait]
impl AssignmentGateway for ScriptedGateway {
    async fn apply_assignment(
        &self,
        _issue_key: &IssueKey,
        account_id: &AccountId,
    ) -> Result<(), AssignmentRejection> {
        self.attempts
            .lock()
            .expect("gateway mutex poisoned")
            .push(account_id.clone());
        let rejection = self
            .rejections
            .lock()
            .expect("gateway mutex poisoned")
            .get(account_id)
            .cloned();
        let Some(rejection) = rejection else {
            return Ok(());
        };

        let mut swap = self.roster_swap.lock().expect("gateway mutex poisoned");
        if swap.as_ref().is_some_and(|swap| &swap.trigger == account_id) {
            if let Some(swap) = swap.take() {
                swap.people.set_roster(&swap.project, swap.roster);
            }
        }
        Err(rejection)
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifications {
    posted: Mutex<Vec<NotificationRecord>>,
    offline: bool,
}

impl MemoryNotifications {
    pub(super) fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub(super) fn bodies(&self) -> Vec<String> {
        self.posted
            .lock()
            .expect("notifications mutex poisoned")
            .iter()
            .map(|record| record.body.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationPublisher for MemoryNotifications {
    async fn post_notification(
        &self,
        issue_key: &IssueKey,
        message: &str,
    ) -> Result<NotificationRecord, NotificationError> {
        if self.offline {
            return Err(NotificationError::Transport("comment API down".to_string()));
        }
        let mut posted = self.posted.lock().expect("notifications mutex poisoned");
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
pub(super) struct MemoryStates {
    states: Mutex<HashMap<IssueKey, AssignmentState>>,
    deletes: AtomicUsize,
}

impl MemoryStates {
    pub(super) fn seeded(issue_key: &IssueKey, state: AssignmentState) -> Self {
        let states = Self::default();
        states
            .states
            .lock()
            .expect("state mutex poisoned")
            .insert(issue_key.clone(), state);
        states
    }

    pub(super) fn stored(&self, issue_key: &IssueKey) -> Option<AssignmentState> {
        self.states
            .lock()
            .expect("state mutex poisoned")
            .get(issue_key)
            .cloned()
    }

    pub(super) fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateRepository for MemoryStates {
    async fn load_state(
        &self,
        issue_key: &IssueKey,
    ) -> Result<Option<AssignmentState>, StateError> {
        Ok(self.stored(issue_key))
    }

    async fn save_state(
        &self,
        issue_key: &IssueKey,
        state: &AssignmentState,
    ) -> Result<(), StateError> {
        self.states
            .lock()
            .expect("state mutex poisoned")
            .insert(issue_key.clone(), state.clone());
        Ok(())
    }

    async fn delete_state(&self, issue_key: &IssueKey) -> Result<(), StateError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.states
            .lock()
            .expect("state mutex poisoned")
            .remove(issue_key);
        Ok(())
    }
}

pub(super) struct UnavailableStates;

#[async_trait]
impl StateRepository for UnavailableStates {
    async fn load_state(
        &self,
        _issue_key: &IssueKey,
    ) -> Result<Option<AssignmentState>, StateError> {
        Err(StateError::Unavailable("cache offline".to_string()))
    }

    async fn save_state(
        &self,
        _issue_key: &IssueKey,
        _state: &AssignmentState,
    ) -> Result<(), StateError> {
        Err(StateError::Unavailable("cache offline".to_string()))
    }

    async fn delete_state(&self, _issue_key: &IssueKey) -> Result<(), StateError> {
        Err(StateError::Unavailable("cache offline".to_string()))
    }
}

pub(super) struct Harness {
    pub(super) service: Arc<AssignmentService>,
    pub(super) issues: Arc<MemoryIssues>,
    pub(super) people: Arc<MemoryPeople>,
    pub(super) gateway: Arc<ScriptedGateway>,
    pub(super) notifications: Arc<MemoryNotifications>,
    pub(super) states: Arc<MemoryStates>,
}

impl Harness {
    pub(super) fn new(
        issues: MemoryIssues,
        people: MemoryPeople,
        gateway: ScriptedGateway,
        states: MemoryStates,
    ) -> Self {
        Self::with_notifications(issues, people, gateway, states, MemoryNotifications::default())
    }

    pub(super) fn with_notifications(
        issues: MemoryIssues,
        people: MemoryPeople,
        gateway: ScriptedGateway,
        states: MemoryStates,
        notifications: MemoryNotifications,
    ) -> Self {
        let issues = Arc::new(issues);
        let people = Arc::new(people);
        let gateway = Arc::new(gateway);
        let notifications = Arc::new(notifications);
        let states = Arc::new(states);

        let service = AssignmentService::new(
            AssignmentCollaborators {
                issues: issues.clone(),
                people: people.clone(),
                gateway: gateway.clone(),
                notifications: notifications.clone(),
                states: states.clone(),
            },
            ScoringWeights::default(),
            AssignmentSettings::default(),
        );

        Self {
            service: Arc::new(service),
            issues,
            people,
            gateway,
            notifications,
            states,
        }
    }
}

/// Two-person WEB roster where Ada clearly outranks Grace on a frontend issue.
pub(super) fn web_harness() -> Harness {
    let people = MemoryPeople::with_roster(
        "WEB",
        vec![user("acc-ada", "Ada Lovelace"), user("acc-grace", "Grace Hopper")],
    );
    people.insert_profile(CandidateProfile {
        account_id: account("acc-ada"),
        labels: counts(&[("frontend", 8.0)]),
        ..CandidateProfile::default()
    });
    people.insert_profile(CandidateProfile {
        account_id: account("acc-grace"),
        labels: counts(&[("frontend", 2.0)]),
        ..CandidateProfile::default()
    });

    Harness::new(
        MemoryIssues::with_issue(frontend_issue()),
        people,
        ScriptedGateway::default(),
        MemoryStates::default(),
    )
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn approx_eq(left: f64, right: f64) -> bool {
    (left - right).abs() < 1e-9
}
