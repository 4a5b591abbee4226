use serde::{Deserialize, Serialize};

/// One switch per scoring signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Criterion {
    Labels,
    Components,
    IssueType,
    Epic,
    Parent,
    PreviousAssignee,
    Worklogs,
    Comments,
    OverallAssignments,
    OverallWorklogs,
    OverallComments,
    WorkloadOpenIssues,
    WorkloadEstimateHours,
}

impl Criterion {
    pub const ALL: [Criterion; 13] = [
        Criterion::Labels,
        Criterion::Components,
        Criterion::IssueType,
        Criterion::Epic,
        Criterion::Parent,
        Criterion::PreviousAssignee,
        Criterion::Worklogs,
        Criterion::Comments,
        Criterion::OverallAssignments,
        Criterion::OverallWorklogs,
        Criterion::OverallComments,
        Criterion::WorkloadOpenIssues,
        Criterion::WorkloadEstimateHours,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Criterion::Labels => "labels",
            Criterion::Components => "components",
            Criterion::IssueType => "issueType",
            Criterion::Epic => "epic",
            Criterion::Parent => "parent",
            Criterion::PreviousAssignee => "previousAssignee",
            Criterion::Worklogs => "worklogs",
            Criterion::Comments => "comments",
            Criterion::OverallAssignments => "overallAssignments",
            Criterion::OverallWorklogs => "overallWorklogs",
            Criterion::OverallComments => "overallComments",
            Criterion::WorkloadOpenIssues => "workloadOpenIssues",
            Criterion::WorkloadEstimateHours => "workloadEstimateHours",
        }
    }

    /// Accepts the camelCase wire name, ignoring case and underscores.
    pub fn from_name(raw: &str) -> Result<Self, CriteriaError> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect();
        Criterion::ALL
            .into_iter()
            .find(|criterion| criterion.name().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| CriteriaError::UnknownCriterion(raw.trim().to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CriteriaError {
    #[error("unknown scoring criterion '{0}'")]
    UnknownCriterion(String),
}

/// Enabled scoring signals. Missing keys default to enabled; unknown keys are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Criteria {
    pub labels: bool,
    pub components: bool,
    pub issue_type: bool,
    pub epic: bool,
    pub parent: bool,
    pub previous_assignee: bool,
    pub worklogs: bool,
    pub comments: bool,
    pub overall_assignments: bool,
    pub overall_worklogs: bool,
    pub overall_comments: bool,
    pub workload_open_issues: bool,
    pub workload_estimate_hours: bool,
}

impl Default for Criteria {
    fn default() -> Self {
        Self::all()
    }
}

impl Criteria {
    pub const fn all() -> Self {
        Self::uniform(true)
    }

    pub const fn none() -> Self {
        Self::uniform(false)
    }

    const fn uniform(enabled: bool) -> Self {
        Self {
            labels: enabled,
            components: enabled,
            issue_type: enabled,
            epic: enabled,
            parent: enabled,
            previous_assignee: enabled,
            worklogs: enabled,
            comments: enabled,
            overall_assignments: enabled,
            overall_worklogs: enabled,
            overall_comments: enabled,
            workload_open_issues: enabled,
            workload_estimate_hours: enabled,
        }
    }

    pub fn is_enabled(&self, criterion: Criterion) -> bool {
        match criterion {
            Criterion::Labels => self.labels,
            Criterion::Components => self.components,
            Criterion::IssueType => self.issue_type,
            Criterion::Epic => self.epic,
            Criterion::Parent => self.parent,
            Criterion::PreviousAssignee => self.previous_assignee,
            Criterion::Worklogs => self.worklogs,
            Criterion::Comments => self.comments,
            Criterion::OverallAssignments => self.overall_assignments,
            Criterion::OverallWorklogs => self.overall_worklogs,
            Criterion::OverallComments => self.overall_comments,
            Criterion::WorkloadOpenIssues => self.workload_open_issues,
            Criterion::WorkloadEstimateHours => self.workload_estimate_hours,
        }
    }

    pub fn with(mut self, criterion: Criterion, enabled: bool) -> Self {
        let slot = match criterion {
            Criterion::Labels => &mut self.labels,
            Criterion::Components => &mut self.components,
            Criterion::IssueType => &mut self.issue_type,
            Criterion::Epic => &mut self.epic,
            Criterion::Parent => &mut self.parent,
            Criterion::PreviousAssignee => &mut self.previous_assignee,
            Criterion::Worklogs => &mut self.worklogs,
            Criterion::Comments => &mut self.comments,
            Criterion::OverallAssignments => &mut self.overall_assignments,
            Criterion::OverallWorklogs => &mut self.overall_worklogs,
            Criterion::OverallComments => &mut self.overall_comments,
            Criterion::WorkloadOpenIssues => &mut self.workload_open_issues,
            Criterion::WorkloadEstimateHours => &mut self.workload_estimate_hours,
        };
        *slot = enabled;
        self
    }

    /// Start from all-enabled and apply named overrides.
    pub fn from_flags<I, S>(flags: I) -> Result<Self, CriteriaError>
    where
        I: IntoIterator<Item = (S, bool)>,
        S: AsRef<str>,
    {
        flags
            .into_iter()
            .try_fold(Self::all(), |criteria, (name, enabled)| {
                Ok(criteria.with(Criterion::from_name(name.as_ref())?, enabled))
            })
    }

    pub fn disabling<I, S>(names: I) -> Result<Self, CriteriaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_flags(names.into_iter().map(|name| (name, false)))
    }

    pub fn enabled_count(&self) -> usize {
        Criterion::ALL
            .into_iter()
            .filter(|criterion| self.is_enabled(*criterion))
            .count()
    }
}
