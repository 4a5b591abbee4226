use crate::infra::{DemoFixture, InMemoryTracker};
use assignee_ai::config::AssignmentSettings;
use assignee_ai::error::AppError;
use assignee_ai::workflows::assignment::{
    AccountId, CandidateScore, IssueKey, RecommendOptions, RecommendationResult,
};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// JSON tracker snapshot to load instead of the bundled payments sample.
    #[arg(long)]
    pub(crate) fixture: Option<PathBuf>,
    /// Issue to recommend for. Defaults to the first issue in the fixture.
    #[arg(long)]
    pub(crate) issue: Option<String>,
    /// Account that declined the current assignee before this run.
    #[arg(long)]
    pub(crate) decline: Option<String>,
    /// Display name reported in the decline acknowledgement.
    #[arg(long)]
    pub(crate) actor: Option<String>,
    /// Rank candidates without writing the assignment.
    #[arg(long)]
    pub(crate) preview: bool,
    /// Accounts whose assignment writes the tracker should refuse (repeatable).
    #[arg(long)]
    pub(crate) reject: Vec<String>,
    /// Print the raw JSON result instead of the formatted summary.
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        fixture,
        issue,
        decline,
        actor,
        preview,
        reject,
        json,
    } = args;

    let fixture = match fixture {
        Some(path) => DemoFixture::from_path(&path)?,
        None => DemoFixture::sample()?,
    };
    let issue_key = match issue {
        Some(issue) => issue,
        None => match fixture.first_issue_key() {
            Some(key) => key.to_string(),
            None => {
                println!("Fixture contains no issues; nothing to recommend.");
                return Ok(());
            }
        },
    };

    let tracker = InMemoryTracker::new(
        fixture,
        reject.into_iter().map(AccountId::new),
        AssignmentSettings::default(),
    );

    let options = RecommendOptions {
        declined_account_id: decline.map(AccountId::new),
        skip_assignment: preview,
        actor_display_name: actor,
        ..RecommendOptions::default()
    };
    let result = tracker.service.recommend(&issue_key, options).await?;

    if json {
        match serde_json::to_string_pretty(&result) {
            Ok(payload) => println!("{payload}"),
            Err(err) => println!("Result payload unavailable: {err}"),
        }
        return Ok(());
    }

    render_result(&result);

    if let Some(assignee) = tracker.gateway.assignee(&result.issue_key) {
        println!("\nTracker assignee for {}: {}", result.issue_key, assignee);
    }

    let posted = tracker.notifications.posted();
    if posted.is_empty() {
        println!("Comments: none posted");
    } else {
        println!("Comments:");
        for record in posted {
            println!("  - [{}] {}", record.id, record.body);
        }
    }

    render_state(&tracker, &result.issue_key).await
}

fn render_result(result: &RecommendationResult) {
    println!("Assignment recommendation for {}", result.issue_key);
    println!(
        "- status: {} ({})",
        result.status.label(),
        if result.success { "success" } else { "no assignee" }
    );
    println!("- {}", result.message);

    if let Some(candidate) = &result.candidate {
        println!("\nSelected candidate");
        render_candidate(candidate, true);
    }

    if !result.alternatives.is_empty() {
        println!("\nAlternatives");
        for candidate in &result.alternatives {
            render_candidate(candidate, false);
        }
    }

    if !result.attempt_errors.is_empty() {
        println!("\nRejected assignment writes");
        for error in &result.attempt_errors {
            println!(
                "  - {} -> HTTP {}: {}",
                error.account_id, error.status, error.message
            );
        }
    }

    if result.declined_account_ids.is_empty() {
        println!("\nDeclined: none");
    } else {
        let declined: Vec<&str> = result
            .declined_account_ids
            .iter()
            .map(AccountId::as_str)
            .collect();
        println!("\nDeclined: {}", declined.join(", "));
    }
}

fn render_candidate(candidate: &CandidateScore, detailed: bool) {
    println!(
        "  {} <{}> final {:.2} = raw {:.2} - workload {:.2}",
        candidate.display_name(),
        candidate.account_id(),
        candidate.final_score(),
        candidate.raw_score(),
        candidate.workload_penalty()
    );

    if !detailed {
        return;
    }

    let evidence = candidate.evidence();
    for (criterion, entries) in &evidence.signals {
        for entry in entries {
            println!(
                "    + {:<22} {:<16} x{:<6.1} {:>6.2}",
                criterion.name(),
                entry.key,
                entry.count,
                entry.contribution
            );
        }
    }
    for (criterion, penalty) in &evidence.penalties {
        println!("    - {:<22} {:>30.2}", criterion.name(), penalty);
    }

    let summary = candidate.profile_summary();
    println!(
        "    history: {} assigned | {} with worklogs | {} commented",
        summary.assigned_issue_count, summary.worklog_issue_count, summary.commented_issue_count
    );
    for issue in &summary.example_issues {
        let status = issue.status.as_deref().unwrap_or("unknown");
        println!("      {} [{}] {}", issue.key, status, issue.summary);
    }
}

async fn render_state(tracker: &InMemoryTracker, issue_key: &IssueKey) -> Result<(), AppError> {
    let state = tracker.service.get_state(issue_key.as_str()).await?;
    match serde_json::to_string_pretty(&state) {
        Ok(json) => println!("Stored assignment state:\n{json}"),
        Err(err) => println!("Stored assignment state unavailable: {err}"),
    }
    Ok(())
}
