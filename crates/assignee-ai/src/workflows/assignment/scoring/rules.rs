use std::collections::{BTreeMap, BTreeSet};

use super::super::criteria::{Criteria, Criterion};
use super::super::domain::{
    coerce_count, AccountId, CandidateProfile, IssueProfile, WorkloadSnapshot,
};
use super::weights::ScoringWeights;
use super::{EvidenceEntry, ScoreEvidence};

const SECONDS_PER_HOUR: f64 = 3600.0;

pub(crate) struct SignalTotals {
    pub raw_score: f64,
    pub workload_penalty: f64,
}

pub(crate) fn score_signals(
    issue: &IssueProfile,
    account_id: &AccountId,
    profile: Option<&CandidateProfile>,
    workload: Option<&WorkloadSnapshot>,
    weights: &ScoringWeights,
    criteria: &Criteria,
) -> (ScoreEvidence, SignalTotals) {
    let mut evidence = ScoreEvidence::default();

    if let Some(profile) = profile {
        let metadata: [(Criterion, f64, Vec<&str>, &BTreeMap<String, f64>); 5] = [
            (
                Criterion::Labels,
                weights.label,
                issue.labels.iter().map(String::as_str).collect(),
                &profile.labels,
            ),
            (
                Criterion::Components,
                weights.component,
                issue.components.iter().map(String::as_str).collect(),
                &profile.components,
            ),
            (
                Criterion::IssueType,
                weights.issue_type,
                issue.issue_type.as_deref().into_iter().collect(),
                &profile.issue_types,
            ),
            (
                Criterion::Epic,
                weights.epic,
                issue.epic_key.as_deref().into_iter().collect(),
                &profile.epics,
            ),
            (
                Criterion::Parent,
                weights.parent,
                issue.parent_key.as_deref().into_iter().collect(),
                &profile.parents,
            ),
        ];

        for (criterion, weight, keys, counts) in metadata {
            if criteria.is_enabled(criterion) {
                for entry in metadata_matches(criterion, weight, keys, counts) {
                    evidence.record(entry);
                }
            }
        }
    }

    for entry in direct_interactions(issue, account_id, weights, criteria) {
        evidence.record(entry);
    }

    if let Some(profile) = profile {
        let history = [
            (
                Criterion::OverallAssignments,
                weights.overall_assignment,
                "assignedIssues",
                &profile.assigned_issues,
            ),
            (
                Criterion::OverallWorklogs,
                weights.overall_worklog,
                "worklogIssues",
                &profile.worklog_issues,
            ),
            (
                Criterion::OverallComments,
                weights.overall_comment,
                "commentedIssues",
                &profile.commented_issues,
            ),
        ];

        for (criterion, weight, source, keys) in history {
            if !criteria.is_enabled(criterion) {
                continue;
            }
            let total = distinct_count(keys) as f64;
            if let Some(entry) = logarithmic(criterion, weight, source.to_string(), total) {
                evidence.record(entry);
            }
        }
    }

    let workload_penalty = workload_penalty(workload, weights, criteria, &mut evidence);
    let raw_score = evidence.contribution_total();

    (
        evidence,
        SignalTotals {
            raw_score,
            workload_penalty,
        },
    )
}

fn logarithmic(
    criterion: Criterion,
    weight: f64,
    key: String,
    count: f64,
) -> Option<EvidenceEntry> {
    let count = coerce_count(count);
    if count <= 0.0 {
        return None;
    }

    Some(EvidenceEntry {
        criterion,
        key,
        count,
        contribution: weight * count.ln_1p(),
    })
}

fn metadata_matches(
    criterion: Criterion,
    weight: f64,
    keys: Vec<&str>,
    counts: &BTreeMap<String, f64>,
) -> Vec<EvidenceEntry> {
    let mut seen = BTreeSet::new();
    keys.into_iter()
        .filter(|key| seen.insert(*key))
        .filter_map(|key| {
            let count = counts.get(key).copied().unwrap_or(0.0);
            logarithmic(criterion, weight, key.to_string(), count)
        })
        .collect()
}

fn direct_interactions(
    issue: &IssueProfile,
    account_id: &AccountId,
    weights: &ScoringWeights,
    criteria: &Criteria,
) -> Vec<EvidenceEntry> {
    let mut entries = Vec::new();
    let issue_key = issue.key.to_string();

    if criteria.previous_assignee {
        let occurrences = issue
            .historical_assignees
            .iter()
            .filter(|entry| &entry.account_id == account_id)
            .count();
        if occurrences > 0 {
            entries.push(EvidenceEntry {
                criterion: Criterion::PreviousAssignee,
                key: issue_key.clone(),
                count: occurrences as f64,
                contribution: weights.previous_assignee,
            });
        }
    }

    if criteria.worklogs {
        let (seconds, logs) = issue
            .worklog_contributors
            .iter()
            .filter(|entry| &entry.account_id == account_id)
            .fold((0.0, 0.0), |(seconds, logs), entry| {
                (
                    seconds + coerce_count(entry.time_spent_seconds),
                    logs + coerce_count(entry.log_count),
                )
            });
        let activity = seconds / SECONDS_PER_HOUR + logs;
        if let Some(entry) = logarithmic(
            Criterion::Worklogs,
            weights.direct_worklog,
            issue_key.clone(),
            activity,
        ) {
            entries.push(entry);
        }
    }

    if criteria.comments {
        let comments: f64 = issue
            .comment_contributors
            .iter()
            .filter(|entry| &entry.account_id == account_id)
            .map(|entry| coerce_count(entry.comment_count))
            .sum();
        if let Some(entry) = logarithmic(
            Criterion::Comments,
            weights.direct_comment,
            issue_key,
            comments,
        ) {
            entries.push(entry);
        }
    }

    entries
}

fn distinct_count(keys: &[String]) -> usize {
    keys.iter()
        .map(|key| key.trim())
        .filter(|key| !key.is_empty())
        .collect::<BTreeSet<_>>()
        .len()
}

fn workload_penalty(
    workload: Option<&WorkloadSnapshot>,
    weights: &ScoringWeights,
    criteria: &Criteria,
    evidence: &mut ScoreEvidence,
) -> f64 {
    let Some(workload) = workload else {
        return 0.0;
    };

    let mut total = 0.0;

    if criteria.workload_open_issues {
        let penalty = weights.open_issue_penalty * coerce_count(workload.total_open_issues);
        if penalty > 0.0 {
            evidence.penalties.insert(Criterion::WorkloadOpenIssues, penalty);
            total += penalty;
        }
    }

    if criteria.workload_estimate_hours {
        let hours = coerce_count(workload.total_estimate_seconds) / SECONDS_PER_HOUR;
        let penalty = weights.estimate_hour_penalty * hours;
        if penalty > 0.0 {
            evidence
                .penalties
                .insert(Criterion::WorkloadEstimateHours, penalty);
            total += penalty;
        }
    }

    total
}
