mod rules;
mod weights;

pub use weights::ScoringWeights;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::criteria::{Criteria, Criterion};
use super::domain::{
    AccountId, CandidateProfile, IssueLookup, IssueProfile, IssueSummary, WorkloadSnapshot,
};

const UNKNOWN_DISPLAY_NAME: &str = "Unknown";

/// Everything the calculator needs to score one candidate against one issue.
#[derive(Debug, Clone, Copy)]
pub struct ScoreInput<'a> {
    pub issue: &'a IssueProfile,
    pub account_id: &'a AccountId,
    pub display_name: Option<&'a str>,
    pub profile: Option<&'a CandidateProfile>,
    pub workload: Option<&'a WorkloadSnapshot>,
    pub issue_lookup: &'a IssueLookup,
}

/// Pure, total scorer. Malformed or missing inputs contribute nothing.
#[derive(Debug, Clone, Default)]
pub struct ScoreCalculator {
    weights: ScoringWeights,
}

impl ScoreCalculator {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn score(&self, input: ScoreInput<'_>, criteria: &Criteria) -> CandidateScore {
        let (evidence, totals) = rules::score_signals(
            input.issue,
            input.account_id,
            input.profile,
            input.workload,
            &self.weights,
            criteria,
        );

        let display_name = resolve_display_name(input.display_name, input.profile);
        let profile_summary =
            ProfileSummary::build(input.profile, input.issue_lookup, self.weights.summary_limit);

        CandidateScore::from_parts(
            input.account_id.clone(),
            display_name,
            totals.raw_score,
            totals.workload_penalty,
            evidence,
            profile_summary,
        )
    }
}

fn resolve_display_name(explicit: Option<&str>, profile: Option<&CandidateProfile>) -> String {
    explicit
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .or_else(|| {
            profile
                .and_then(|profile| profile.display_name.as_deref())
                .map(str::trim)
                .filter(|name| !name.is_empty())
        })
        .unwrap_or(UNKNOWN_DISPLAY_NAME)
        .to_string()
}

/// Single scoring contribution kept for display and audit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceEntry {
    pub criterion: Criterion,
    pub key: String,
    pub count: f64,
    pub contribution: f64,
}

/// Itemized explanation of a candidate's score.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEvidence {
    pub signals: BTreeMap<Criterion, Vec<EvidenceEntry>>,
    pub interactions: Vec<EvidenceEntry>,
    pub penalties: BTreeMap<Criterion, f64>,
}

impl ScoreEvidence {
    fn record(&mut self, entry: EvidenceEntry) {
        if is_direct_interaction(entry.criterion) {
            self.interactions.push(entry.clone());
        }
        self.signals.entry(entry.criterion).or_default().push(entry);
    }

    pub fn entries(&self, criterion: Criterion) -> &[EvidenceEntry] {
        self.signals
            .get(&criterion)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn contribution_total(&self) -> f64 {
        self.signals
            .values()
            .flatten()
            .map(|entry| entry.contribution)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty() && self.penalties.is_empty()
    }
}

fn is_direct_interaction(criterion: Criterion) -> bool {
    matches!(
        criterion,
        Criterion::PreviousAssignee | Criterion::Worklogs | Criterion::Comments
    )
}

/// Bounded sample of a candidate's past work.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub example_issues: Vec<IssueSummary>,
    pub assigned_issue_count: usize,
    pub worklog_issue_count: usize,
    pub commented_issue_count: usize,
}

impl ProfileSummary {
    fn build(profile: Option<&CandidateProfile>, lookup: &IssueLookup, limit: usize) -> Self {
        let Some(profile) = profile else {
            return Self::default();
        };

        let mut seen = BTreeSet::new();
        let example_issues = profile
            .assigned_issues
            .iter()
            .filter(|key| seen.insert(key.as_str()))
            .filter_map(|key| lookup.get(key).cloned())
            .take(limit)
            .collect();

        Self {
            example_issues,
            assigned_issue_count: profile.assigned_issues.len(),
            worklog_issue_count: profile.worklog_issues.len(),
            commented_issue_count: profile.commented_issues.len(),
        }
    }
}

/// Scored candidate. `final_score` is always `raw_score - workload_penalty`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateScore {
    account_id: AccountId,
    display_name: String,
    raw_score: f64,
    workload_penalty: f64,
    final_score: f64,
    evidence: ScoreEvidence,
    profile_summary: ProfileSummary,
}

impl CandidateScore {
    pub fn from_parts(
        account_id: AccountId,
        display_name: String,
        raw_score: f64,
        workload_penalty: f64,
        evidence: ScoreEvidence,
        profile_summary: ProfileSummary,
    ) -> Self {
        Self {
            account_id,
            display_name,
            raw_score,
            workload_penalty,
            final_score: raw_score - workload_penalty,
            evidence,
            profile_summary,
        }
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn raw_score(&self) -> f64 {
        self.raw_score
    }

    pub fn workload_penalty(&self) -> f64 {
        self.workload_penalty
    }

    pub fn final_score(&self) -> f64 {
        self.final_score
    }

    pub fn evidence(&self) -> &ScoreEvidence {
        &self.evidence
    }

    pub fn profile_summary(&self) -> &ProfileSummary {
        &self.profile_summary
    }
}
