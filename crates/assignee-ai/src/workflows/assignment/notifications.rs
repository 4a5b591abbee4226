use std::fmt::Write as _;

use super::domain::AccountId;
use super::scoring::CandidateScore;

const SUMMARY_ALTERNATIVES: usize = 3;

pub(crate) fn decline_acknowledgement(actor: Option<&str>, declined: &AccountId) -> String {
    let actor = actor
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or("Someone");
    format!("{actor} declined {declined}. Looking for another assignee.")
}

pub(crate) fn assignment_summary(
    winner: &CandidateScore,
    alternatives: &[CandidateScore],
    declined: &[AccountId],
) -> String {
    let mut message = format!(
        "Assigned to {} (score {:.2}).",
        winner.display_name(),
        winner.final_score()
    );

    if !alternatives.is_empty() {
        let listed: Vec<String> = alternatives
            .iter()
            .take(SUMMARY_ALTERNATIVES)
            .map(|candidate| {
                format!(
                    "{} ({:.2})",
                    candidate.display_name(),
                    candidate.final_score()
                )
            })
            .collect();
        let _ = write!(message, " Alternatives: {}.", listed.join(", "));
    }

    let declined = if declined.is_empty() {
        "none".to_string()
    } else {
        declined
            .iter()
            .map(AccountId::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };
    let _ = write!(message, " Declined: {declined}.");

    message
}
