use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::criteria::Criteria;
use super::domain::{AccountId, IssueProfile, ProjectKey};
use super::ranking::CandidateRanker;
use super::repository::{AssignmentGateway, DirectoryError, IssueDirectory, PeopleDirectory};
use super::scoring::CandidateScore;

/// Rejected write recorded for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptError {
    pub account_id: AccountId,
    pub status: u16,
    pub message: String,
}

pub struct FallbackRequest<'a> {
    pub issue: &'a IssueProfile,
    pub project_key: &'a ProjectKey,
    pub queue: Vec<CandidateScore>,
    pub baseline_declined: &'a BTreeSet<AccountId>,
    pub criteria: &'a Criteria,
}

#[derive(Debug)]
pub enum FallbackOutcome {
    Assigned {
        winner: CandidateScore,
        remaining: Vec<CandidateScore>,
        attempt_errors: Vec<AttemptError>,
    },
    Exhausted {
        attempt_errors: Vec<AttemptError>,
    },
}

/// Walks a ranked queue until the tracker accepts an assignment.
///
/// A rejected candidate joins a call-scoped exclusion set and the queue is rebuilt from a
/// fresh roster, so each candidate is tried at most once and the loop ends when the rebuilt
/// queue comes back empty.
pub struct FallbackRetryLoop {
    ranker: Arc<CandidateRanker>,
    issues: Arc<dyn IssueDirectory>,
    people: Arc<dyn PeopleDirectory>,
    gateway: Arc<dyn AssignmentGateway>,
}

impl FallbackRetryLoop {
    pub fn new(
        ranker: Arc<CandidateRanker>,
        issues: Arc<dyn IssueDirectory>,
        people: Arc<dyn PeopleDirectory>,
        gateway: Arc<dyn AssignmentGateway>,
    ) -> Self {
        Self {
            ranker,
            issues,
            people,
            gateway,
        }
    }

    pub async fn run(
        &self,
        request: FallbackRequest<'_>,
    ) -> Result<FallbackOutcome, DirectoryError> {
        let FallbackRequest {
            issue,
            project_key,
            queue,
            baseline_declined,
            criteria,
        } = request;

        let issue_key = &issue.key;
        let mut queue: VecDeque<CandidateScore> = queue.into();
        let mut rejected: BTreeSet<AccountId> = BTreeSet::new();
        let mut attempt_errors: Vec<AttemptError> = Vec::new();

        while let Some(candidate) = queue.pop_front() {
            let attempt = attempt_errors.len() + 1;
            debug!(
                issue_key = %issue_key,
                account_id = %candidate.account_id(),
                attempt,
                "attempting assignment write"
            );

            match self
                .gateway
                .apply_assignment(issue_key, candidate.account_id())
                .await
            {
                Ok(()) => {
                    info!(
                        issue_key = %issue_key,
                        account_id = %candidate.account_id(),
                        attempt,
                        "assignment accepted"
                    );
                    if let Err(err) = self.issues.refresh_issue(issue_key).await {
                        warn!(
                            issue_key = %issue_key,
                            error = %err,
                            "post-assignment refresh failed"
                        );
                    }
                    return Ok(FallbackOutcome::Assigned {
                        winner: candidate,
                        remaining: queue.into(),
                        attempt_errors,
                    });
                }
                Err(rejection) => {
                    warn!(
                        issue_key = %issue_key,
                        account_id = %candidate.account_id(),
                        status = rejection.status,
                        attempt,
                        "assignment rejected"
                    );
                    attempt_errors.push(AttemptError {
                        account_id: candidate.account_id().clone(),
                        status: rejection.status,
                        message: rejection.body,
                    });
                    rejected.insert(candidate.account_id().clone());

                    let roster = self.people.assignable_roster(project_key).await?;
                    let excluded: BTreeSet<AccountId> =
                        baseline_declined.union(&rejected).cloned().collect();
                    let reranked = self
                        .ranker
                        .rank(issue, &roster, &excluded, criteria)
                        .await?;
                    queue = reranked.into();
                }
            }
        }

        info!(
            issue_key = %issue_key,
            attempts = attempt_errors.len(),
            "no candidate accepted the assignment"
        );
        Ok(FallbackOutcome::Exhausted { attempt_errors })
    }
}
