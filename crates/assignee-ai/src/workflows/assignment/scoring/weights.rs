use serde::{Deserialize, Serialize};

/// Signal weights and penalty coefficients applied by the score calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringWeights {
    pub label: f64,
    pub component: f64,
    pub issue_type: f64,
    pub epic: f64,
    pub parent: f64,
    pub previous_assignee: f64,
    pub direct_worklog: f64,
    pub direct_comment: f64,
    pub overall_assignment: f64,
    pub overall_worklog: f64,
    pub overall_comment: f64,
    pub open_issue_penalty: f64,
    pub estimate_hour_penalty: f64,
    pub summary_limit: usize,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            label: 3.2,
            component: 2.4,
            issue_type: 2.8,
            epic: 1.4,
            parent: 1.6,
            previous_assignee: 5.0,
            direct_worklog: 2.5,
            direct_comment: 1.2,
            overall_assignment: 0.9,
            overall_worklog: 0.7,
            overall_comment: 0.5,
            open_issue_penalty: 0.85,
            estimate_hour_penalty: 0.12,
            summary_limit: 5,
        }
    }
}
