use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use super::criteria::Criteria;
use super::domain::{AccountId, AssignableUser, IssueProfile};
use super::repository::{DirectoryError, IssueDirectory, PeopleDirectory};
use super::scoring::{CandidateScore, ScoreCalculator, ScoreInput};

/// Scores every eligible roster entry and orders the results.
pub struct CandidateRanker {
    calculator: ScoreCalculator,
    issues: Arc<dyn IssueDirectory>,
    people: Arc<dyn PeopleDirectory>,
}

impl CandidateRanker {
    pub fn new(
        calculator: ScoreCalculator,
        issues: Arc<dyn IssueDirectory>,
        people: Arc<dyn PeopleDirectory>,
    ) -> Self {
        Self {
            calculator,
            issues,
            people,
        }
    }

    pub fn calculator(&self) -> &ScoreCalculator {
        &self.calculator
    }

    pub async fn rank(
        &self,
        issue: &IssueProfile,
        roster: &[AssignableUser],
        excluded: &BTreeSet<AccountId>,
        criteria: &Criteria,
    ) -> Result<Vec<CandidateScore>, DirectoryError> {
        let mut seen: BTreeSet<&AccountId> = BTreeSet::new();
        let mut eligible: Vec<&AssignableUser> = Vec::new();
        for user in roster {
            if !excluded.contains(&user.account_id) && seen.insert(&user.account_id) {
                eligible.push(user);
            }
        }

        if eligible.is_empty() {
            return Ok(Vec::new());
        }

        let issue_lookup = self.issues.issue_lookup().await?;
        let mut scores = Vec::with_capacity(eligible.len());

        for user in eligible {
            let profile = self.people.candidate_profile(&user.account_id).await?;
            let workload = self.people.workload(&user.account_id).await?;

            scores.push(self.calculator.score(
                ScoreInput {
                    issue,
                    account_id: &user.account_id,
                    display_name: Some(user.display_name.as_str()),
                    profile: profile.as_ref(),
                    workload: workload.as_ref(),
                    issue_lookup: &issue_lookup,
                },
                criteria,
            ));
        }

        sort_candidates(&mut scores);
        debug!(
            issue_key = %issue.key,
            candidates = scores.len(),
            excluded = excluded.len(),
            "ranked candidates"
        );
        Ok(scores)
    }
}

/// Descending final score, then descending raw score, then ascending display name.
pub fn compare_candidates(left: &CandidateScore, right: &CandidateScore) -> Ordering {
    right
        .final_score()
        .total_cmp(&left.final_score())
        .then_with(|| right.raw_score().total_cmp(&left.raw_score()))
        .then_with(|| left.display_name().cmp(right.display_name()))
        .then_with(|| left.account_id().cmp(right.account_id()))
}

pub fn sort_candidates(scores: &mut [CandidateScore]) {
    scores.sort_by(compare_candidates);
}
