use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AssignmentSettings;

use super::criteria::Criteria;
use super::domain::{AccountId, InvalidIssueKey, IssueKey, IssueProfile};
use super::fallback::{AttemptError, FallbackOutcome, FallbackRequest, FallbackRetryLoop};
use super::locks::IssueLocks;
use super::notifications::{assignment_summary, decline_acknowledgement};
use super::ranking::CandidateRanker;
use super::repository::{
    AssignmentGateway, DirectoryError, IssueDirectory, NotificationPublisher, PeopleDirectory,
    StateError, StateRepository,
};
use super::scoring::{CandidateScore, ScoreCalculator, ScoringWeights};
use super::state::{AssignmentState, AssignmentStateStore};

/// Caller supplied switches for a single recommendation call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommendOptions {
    pub declined_account_id: Option<AccountId>,
    pub skip_assignment: bool,
    pub post_decline_comment: Option<bool>,
    pub post_assignment_comment: Option<bool>,
    pub actor_display_name: Option<String>,
    pub criteria: Option<Criteria>,
}

/// Terminal disposition of a recommendation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecommendationStatus {
    Assigned,
    RecommendationOnly,
    AssignmentFailed,
    NoCandidateFound,
    DeclinedExhausted,
}

impl RecommendationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RecommendationStatus::Assigned => "assigned",
            RecommendationStatus::RecommendationOnly => "recommendation-only",
            RecommendationStatus::AssignmentFailed => "assignment-failed",
            RecommendationStatus::NoCandidateFound => "no-candidate-found",
            RecommendationStatus::DeclinedExhausted => "declined-exhausted",
        }
    }

    pub const fn is_success(self) -> bool {
        matches!(
            self,
            RecommendationStatus::Assigned | RecommendationStatus::RecommendationOnly
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResult {
    pub success: bool,
    pub status: RecommendationStatus,
    pub issue_key: IssueKey,
    pub candidate: Option<CandidateScore>,
    pub alternatives: Vec<CandidateScore>,
    pub declined_account_ids: Vec<AccountId>,
    pub attempt_errors: Vec<AttemptError>,
    pub message: String,
}

impl RecommendationResult {
    fn terminal(
        status: RecommendationStatus,
        issue_key: IssueKey,
        state: &AssignmentState,
        message: String,
    ) -> Self {
        Self {
            success: status.is_success(),
            status,
            issue_key,
            candidate: None,
            alternatives: Vec::new(),
            declined_account_ids: state.declined_list(),
            attempt_errors: Vec::new(),
            message,
        }
    }
}

/// External collaborators the service depends on.
pub struct AssignmentCollaborators {
    pub issues: Arc<dyn IssueDirectory>,
    pub people: Arc<dyn PeopleDirectory>,
    pub gateway: Arc<dyn AssignmentGateway>,
    pub notifications: Arc<dyn NotificationPublisher>,
    pub states: Arc<dyn StateRepository>,
}

/// Orchestrates decline registration, ranking, the fallback write loop, and state persistence.
pub struct AssignmentService {
    issues: Arc<dyn IssueDirectory>,
    people: Arc<dyn PeopleDirectory>,
    notifications: Arc<dyn NotificationPublisher>,
    ranker: Arc<CandidateRanker>,
    fallback: FallbackRetryLoop,
    states: AssignmentStateStore,
    settings: AssignmentSettings,
    locks: IssueLocks,
}

impl AssignmentService {
    pub fn new(
        collaborators: AssignmentCollaborators,
        weights: ScoringWeights,
        settings: AssignmentSettings,
    ) -> Self {
        let AssignmentCollaborators {
            issues,
            people,
            gateway,
            notifications,
            states,
        } = collaborators;

        let ranker = Arc::new(CandidateRanker::new(
            ScoreCalculator::new(weights),
            issues.clone(),
            people.clone(),
        ));
        let fallback =
            FallbackRetryLoop::new(ranker.clone(), issues.clone(), people.clone(), gateway);

        Self {
            issues,
            people,
            notifications,
            ranker,
            fallback,
            states: AssignmentStateStore::new(states),
            settings,
            locks: IssueLocks::default(),
        }
    }

    pub fn settings(&self) -> &AssignmentSettings {
        &self.settings
    }

    /// Recommend, and unless previewing apply, the best-fit assignee for an issue.
    pub async fn recommend(
        &self,
        issue_key: &str,
        options: RecommendOptions,
    ) -> Result<RecommendationResult, AssignmentServiceError> {
        let issue_key = IssueKey::parse(issue_key)?;
        let _guard = self.locks.acquire(&issue_key).await;

        let criteria = options.criteria.unwrap_or(self.settings.default_criteria);
        let post_decline = options
            .post_decline_comment
            .unwrap_or(self.settings.post_decline_comments);
        let post_assignment = options
            .post_assignment_comment
            .unwrap_or(self.settings.post_assignment_comments);

        let mut state = self.states.load(&issue_key).await?;

        if let Some(declined) = options.declined_account_id.clone() {
            info!(issue_key = %issue_key, account_id = %declined, "registering decline");
            state = state.register_decline(declined.clone(), Utc::now());
            if post_decline {
                let message =
                    decline_acknowledgement(options.actor_display_name.as_deref(), &declined);
                self.notify(&issue_key, &message).await;
            }
        }

        if !options.skip_assignment {
            self.issues.refresh_issue(&issue_key).await?;
        }

        let issue = self.resolve_issue(&issue_key).await?;
        let project_key = issue_key.project_key();
        let roster = self.people.assignable_roster(&project_key).await?;
        let ranked = self
            .ranker
            .rank(&issue, &roster, &state.declined_account_ids, &criteria)
            .await?;

        if ranked.is_empty() {
            let declined = state.declined_account_ids.len();
            let distinct = roster
                .iter()
                .map(|user| &user.account_id)
                .collect::<BTreeSet<_>>()
                .len();
            if distinct > 0 && declined >= distinct {
                info!(
                    issue_key = %issue_key,
                    declined,
                    roster = distinct,
                    status = RecommendationStatus::DeclinedExhausted.label(),
                    "every assignable candidate has declined"
                );
                return Ok(RecommendationResult::terminal(
                    RecommendationStatus::DeclinedExhausted,
                    issue_key,
                    &state,
                    format!(
                        "All {} assignable users have declined; reset declines to continue.",
                        distinct
                    ),
                ));
            }

            self.states.clear(&issue_key).await?;
            info!(
                issue_key = %issue_key,
                roster = roster.len(),
                status = RecommendationStatus::NoCandidateFound.label(),
                "no candidate available"
            );
            return Ok(RecommendationResult::terminal(
                RecommendationStatus::NoCandidateFound,
                issue_key,
                &state,
                format!("No assignable candidate found for project {project_key}."),
            ));
        }

        let (status, winner, alternatives, attempt_errors) = if options.skip_assignment {
            let mut alternatives = ranked;
            let winner = alternatives.remove(0);
            (
                RecommendationStatus::RecommendationOnly,
                winner,
                alternatives,
                Vec::new(),
            )
        } else {
            let outcome = self
                .fallback
                .run(FallbackRequest {
                    issue: &issue,
                    project_key: &project_key,
                    queue: ranked,
                    baseline_declined: &state.declined_account_ids,
                    criteria: &criteria,
                })
                .await?;

            match outcome {
                FallbackOutcome::Assigned {
                    winner,
                    remaining,
                    attempt_errors,
                } => (
                    RecommendationStatus::Assigned,
                    winner,
                    remaining,
                    attempt_errors,
                ),
                FallbackOutcome::Exhausted { attempt_errors } => {
                    info!(
                        issue_key = %issue_key,
                        attempts = attempt_errors.len(),
                        status = RecommendationStatus::AssignmentFailed.label(),
                        "assignment writes exhausted"
                    );
                    let message = format!(
                        "Assignment failed for all {} attempted candidate(s).",
                        attempt_errors.len()
                    );
                    let mut result = RecommendationResult::terminal(
                        RecommendationStatus::AssignmentFailed,
                        issue_key,
                        &state,
                        message,
                    );
                    result.attempt_errors = attempt_errors;
                    return Ok(result);
                }
            }
        };

        let state = state.with_selection(winner.account_id().clone(), Utc::now());
        self.states.persist(&issue_key, &state).await?;
        let declined_account_ids = state.declined_list();

        if status == RecommendationStatus::Assigned && post_assignment {
            let summary = assignment_summary(&winner, &alternatives, &declined_account_ids);
            self.notify(&issue_key, &summary).await;
        }

        info!(
            issue_key = %issue_key,
            account_id = %winner.account_id(),
            score = winner.final_score(),
            alternatives = alternatives.len(),
            status = status.label(),
            "recommendation complete"
        );

        let message = match status {
            RecommendationStatus::Assigned => format!(
                "Assigned to {} (score {:.2}).",
                winner.display_name(),
                winner.final_score()
            ),
            _ => format!(
                "Recommended {} (score {:.2}).",
                winner.display_name(),
                winner.final_score()
            ),
        };

        Ok(RecommendationResult {
            success: status.is_success(),
            status,
            issue_key,
            candidate: Some(winner),
            alternatives,
            declined_account_ids,
            attempt_errors,
            message,
        })
    }

    pub async fn get_state(
        &self,
        issue_key: &str,
    ) -> Result<AssignmentState, AssignmentServiceError> {
        let issue_key = IssueKey::parse(issue_key)?;
        Ok(self.states.load(&issue_key).await?)
    }

    pub async fn clear_state(&self, issue_key: &str) -> Result<(), AssignmentServiceError> {
        let issue_key = IssueKey::parse(issue_key)?;
        let _guard = self.locks.acquire(&issue_key).await;
        self.states.clear(&issue_key).await?;
        info!(issue_key = %issue_key, "assignment state cleared");
        Ok(())
    }

    async fn resolve_issue(
        &self,
        issue_key: &IssueKey,
    ) -> Result<IssueProfile, AssignmentServiceError> {
        if let Some(issue) = self.issues.issue_profile(issue_key).await? {
            return Ok(issue);
        }

        warn!(issue_key = %issue_key, "issue profile missing, requesting targeted refresh");
        self.issues.refresh_issue(issue_key).await?;
        self.issues
            .issue_profile(issue_key)
            .await?
            .ok_or_else(|| AssignmentServiceError::IssueUnavailable(issue_key.clone()))
    }

    async fn notify(&self, issue_key: &IssueKey, message: &str) {
        match self.notifications.post_notification(issue_key, message).await {
            Ok(record) => {
                debug!(issue_key = %issue_key, notification = %record.id, "notification posted")
            }
            Err(err) => warn!(issue_key = %issue_key, error = %err, "notification failed"),
        }
    }
}

/// Fatal errors; every other failure folds into a terminal status.
#[derive(Debug, thiserror::Error)]
pub enum AssignmentServiceError {
    #[error(transparent)]
    InvalidIssueKey(#[from] InvalidIssueKey),
    #[error("issue {0} could not be resolved after a targeted refresh")]
    IssueUnavailable(IssueKey),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    State(#[from] StateError),
}
