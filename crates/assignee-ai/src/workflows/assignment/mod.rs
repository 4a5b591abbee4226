//! Assignment recommendation: weighted candidate scoring, deterministic ranking, per-issue
//! decline state, and the fallback write loop that applies the best accepted candidate.

pub mod criteria;
pub mod domain;
pub mod fallback;
mod locks;
mod notifications;
pub mod ranking;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod state;

#[cfg(test)]
mod tests;

pub use criteria::{Criteria, CriteriaError, Criterion};
pub use domain::{
    AccountId, AssignableUser, CandidateProfile, CommentContribution, HistoricalAssignee,
    InvalidIssueKey, IssueKey, IssueLookup, IssueProfile, IssueSummary, ProjectKey,
    WorkloadSnapshot, WorklogContribution,
};
pub use fallback::{AttemptError, FallbackOutcome, FallbackRequest, FallbackRetryLoop};
pub use locks::IssueLocks;
pub use ranking::{compare_candidates, sort_candidates, CandidateRanker};
pub use repository::{
    AssignmentGateway, AssignmentRejection, DirectoryError, IssueDirectory, NotificationError,
    NotificationPublisher, NotificationRecord, PeopleDirectory, StateError, StateRepository,
};
pub use router::assignment_router;
pub use scoring::{
    CandidateScore, EvidenceEntry, ProfileSummary, ScoreCalculator, ScoreEvidence, ScoreInput,
    ScoringWeights,
};
pub use service::{
    AssignmentCollaborators, AssignmentService, AssignmentServiceError, RecommendOptions,
    RecommendationResult, RecommendationStatus,
};
pub use state::{AssignmentState, AssignmentStateStore};
