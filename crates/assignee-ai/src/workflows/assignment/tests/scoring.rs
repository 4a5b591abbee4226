use super::common::*;
use crate::workflows::assignment::criteria::{Criteria, Criterion};
use crate::workflows::assignment::domain::{
    AccountId, CandidateProfile, IssueLookup, IssueProfile, WorkloadSnapshot,
};
use crate::workflows::assignment::scoring::{CandidateScore, ScoreCalculator, ScoreInput};

fn score_with(
    issue: &IssueProfile,
    account_id: &AccountId,
    profile: Option<&CandidateProfile>,
    workload: Option<&WorkloadSnapshot>,
    criteria: &Criteria,
) -> CandidateScore {
    let lookup = IssueLookup::new();
    ScoreCalculator::default().score(
        ScoreInput {
            issue,
            account_id,
            display_name: None,
            profile,
            workload,
            issue_lookup: &lookup,
        },
        criteria,
    )
}

#[test]
fn single_label_match_uses_log_damped_weight() {
    let issue = frontend_issue();
    let profile = CandidateProfile {
        account_id: account("acc-ada"),
        labels: counts(&[("frontend", 5.0)]),
        ..CandidateProfile::default()
    };

    let score = score_with(
        &issue,
        &account("acc-ada"),
        Some(&profile),
        None,
        &Criteria::all(),
    );

    assert!(approx_eq(score.raw_score(), 3.2 * 6f64.ln()));
    assert_eq!(score.workload_penalty(), 0.0);
    assert_eq!(score.final_score(), score.raw_score());

    let labels = score.evidence().entries(Criterion::Labels);
    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].key, "frontend");
    assert_eq!(labels[0].count, 5.0);
}

#[test]
fn every_signal_contributes_to_the_raw_score() {
    let issue = rich_issue();
    let profile = ada_profile();

    let score = score_with(
        &issue,
        &account("acc-ada"),
        Some(&profile),
        None,
        &Criteria::all(),
    );

    let expected = 3.2 * 6f64.ln()
        + 3.2 * 3f64.ln()
        + 2.4 * 5f64.ln()
        + 2.8 * 10f64.ln()
        + 1.4 * 2f64.ln()
        + 1.6 * 4f64.ln()
        + 5.0
        + 2.5 * 5f64.ln()
        + 1.2 * 4f64.ln()
        + 0.9 * 4f64.ln()
        + 0.7 * 3f64.ln()
        + 0.5 * 2f64.ln();
    assert!(approx_eq(score.raw_score(), expected));

    let evidence = score.evidence();
    assert_eq!(evidence.interactions.len(), 3);
    assert_eq!(evidence.entries(Criterion::PreviousAssignee)[0].contribution, 5.0);
    assert_eq!(evidence.entries(Criterion::Worklogs)[0].count, 4.0);
    assert_eq!(
        evidence.entries(Criterion::OverallAssignments)[0].key,
        "assignedIssues"
    );
    assert!(approx_eq(evidence.contribution_total(), score.raw_score()));
}

#[test]
fn disabled_criteria_contribute_nothing() {
    let issue = rich_issue();
    let profile = ada_profile();
    let labels_only = Criteria::none().with(Criterion::Labels, true);

    let score = score_with(
        &issue,
        &account("acc-ada"),
        Some(&profile),
        Some(&WorkloadSnapshot {
            total_open_issues: 12.0,
            total_estimate_seconds: 72_000.0,
        }),
        &labels_only,
    );

    assert!(approx_eq(
        score.raw_score(),
        3.2 * 6f64.ln() + 3.2 * 3f64.ln()
    ));
    assert_eq!(score.workload_penalty(), 0.0);
    assert_eq!(score.evidence().signals.len(), 1);
    assert!(score.evidence().interactions.is_empty());
    assert!(score.evidence().penalties.is_empty());
}

#[test]
fn workload_penalty_reduces_final_score() {
    let issue = frontend_issue();
    let profile = CandidateProfile {
        account_id: account("acc-ada"),
        labels: counts(&[("frontend", 5.0)]),
        ..CandidateProfile::default()
    };
    let workload = WorkloadSnapshot {
        total_open_issues: 4.0,
        total_estimate_seconds: 36_000.0,
    };

    let score = score_with(
        &issue,
        &account("acc-ada"),
        Some(&profile),
        Some(&workload),
        &Criteria::all(),
    );

    assert!(approx_eq(score.workload_penalty(), 0.85 * 4.0 + 0.12 * 10.0));
    assert!(approx_eq(
        score.final_score(),
        score.raw_score() - score.workload_penalty()
    ));
    let penalties = &score.evidence().penalties;
    assert!(approx_eq(penalties[&Criterion::WorkloadOpenIssues], 3.4));
    assert!(approx_eq(penalties[&Criterion::WorkloadEstimateHours], 1.2));
}

#[test]
fn non_positive_and_non_finite_counts_are_ignored() {
    let issue = rich_issue();
    let profile = CandidateProfile {
        account_id: account("acc-zed"),
        labels: counts(&[("frontend", 0.0), ("accessibility", -2.0)]),
        components: counts(&[("checkout", f64::NAN)]),
        issue_types: counts(&[("Bug", f64::INFINITY)]),
        assigned_issues: vec!["  ".to_string(), String::new()],
        ..CandidateProfile::default()
    };
    let workload = WorkloadSnapshot {
        total_open_issues: -3.0,
        total_estimate_seconds: f64::NAN,
    };

    let score = score_with(
        &issue,
        &account("acc-zed"),
        Some(&profile),
        Some(&workload),
        &Criteria::all(),
    );

    assert!(score.evidence().is_empty(), "{:?}", score.evidence());
    assert_eq!(score.raw_score(), 0.0);
    assert_eq!(score.workload_penalty(), 0.0);
    assert_eq!(score.final_score(), 0.0);
}

#[test]
fn missing_profile_scores_only_direct_interactions() {
    let issue = rich_issue();

    let score = score_with(&issue, &account("acc-ada"), None, None, &Criteria::all());

    let expected = 5.0 + 2.5 * 5f64.ln() + 1.2 * 4f64.ln();
    assert!(approx_eq(score.raw_score(), expected));
    assert_eq!(score.display_name(), "Unknown");
    assert!(score.profile_summary().example_issues.is_empty());
}

#[test]
fn duplicate_issue_labels_count_once() {
    let mut issue = frontend_issue();
    issue.labels.push("frontend".to_string());
    let profile = CandidateProfile {
        account_id: account("acc-ada"),
        labels: counts(&[("frontend", 5.0)]),
        ..CandidateProfile::default()
    };

    let score = score_with(
        &issue,
        &account("acc-ada"),
        Some(&profile),
        None,
        &Criteria::all(),
    );

    assert_eq!(score.evidence().entries(Criterion::Labels).len(), 1);
}

#[test]
fn display_name_prefers_roster_then_profile() {
    let issue = frontend_issue();
    let profile = ada_profile();
    let lookup = IssueLookup::new();
    let calculator = ScoreCalculator::default();
    let id = account("acc-ada");

    let named = |display_name: Option<&str>, profile: Option<&CandidateProfile>| {
        calculator
            .score(
                ScoreInput {
                    issue: &issue,
                    account_id: &id,
                    display_name,
                    profile,
                    workload: None,
                    issue_lookup: &lookup,
                },
                &Criteria::all(),
            )
            .display_name()
            .to_string()
    };

    assert_eq!(named(Some("Countess"), Some(&profile)), "Countess");
    assert_eq!(named(Some("   "), Some(&profile)), "Ada Lovelace");
    assert_eq!(named(None, None), "Unknown");
}

#[test]
fn profile_summary_is_bounded_and_skips_unresolved_keys() {
    let issue = frontend_issue();
    let profile = CandidateProfile {
        account_id: account("acc-ada"),
        assigned_issues: [
            "WEB-1", "WEB-1", "WEB-2", "WEB-3", "GONE-1", "WEB-4", "WEB-5", "WEB-6", "WEB-7",
        ]
        .iter()
        .map(|key| key.to_string())
        .collect(),
        worklog_issues: vec!["WEB-1".to_string()],
        ..CandidateProfile::default()
    };
    let issue_lookup = lookup(&["WEB-1", "WEB-2", "WEB-4", "WEB-5", "WEB-6", "WEB-7"]);

    let score = ScoreCalculator::default().score(
        ScoreInput {
            issue: &issue,
            account_id: &account("acc-ada"),
            display_name: Some("Ada"),
            profile: Some(&profile),
            workload: None,
            issue_lookup: &issue_lookup,
        },
        &Criteria::all(),
    );

    let summary = score.profile_summary();
    let keys: Vec<&str> = summary
        .example_issues
        .iter()
        .map(|issue| issue.key.as_str())
        .collect();
    assert_eq!(keys, vec!["WEB-1", "WEB-2", "WEB-4", "WEB-5", "WEB-6"]);
    assert_eq!(summary.worklog_issue_count, 1);
    assert_eq!(summary.commented_issue_count, 0);
}

#[test]
fn candidate_score_serializes_evidence_by_criterion_name() {
    let issue = frontend_issue();
    let profile = CandidateProfile {
        account_id: account("acc-ada"),
        labels: counts(&[("frontend", 5.0)]),
        ..CandidateProfile::default()
    };

    let score = score_with(
        &issue,
        &account("acc-ada"),
        Some(&profile),
        None,
        &Criteria::all(),
    );
    let payload = serde_json::to_value(&score).expect("serializable score");

    assert_eq!(payload["accountId"], "acc-ada");
    assert_eq!(payload["evidence"]["signals"]["labels"][0]["key"], "frontend");
    assert_eq!(payload["evidence"]["signals"]["labels"][0]["criterion"], "labels");
    assert_eq!(payload["finalScore"], payload["rawScore"]);
}
