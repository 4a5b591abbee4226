use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{AccountId, IssueKey};
use super::repository::{StateError, StateRepository};

/// Persisted per-issue record of the current pick and every declined candidate.
///
/// `declined_account_ids` only grows until the whole state is cleared. It serializes as an
/// ordered list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentState {
    #[serde(default)]
    pub current_account_id: Option<AccountId>,
    #[serde(default)]
    pub declined_account_ids: BTreeSet<AccountId>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl AssignmentState {
    /// Record a decline. Idempotent for an account that was already declined.
    pub fn register_decline(&self, account_id: AccountId, now: DateTime<Utc>) -> Self {
        let mut declined_account_ids = self.declined_account_ids.clone();
        declined_account_ids.insert(account_id);

        Self {
            current_account_id: None,
            declined_account_ids,
            last_updated: Some(now),
        }
    }

    /// Adopt a selected candidate, keeping the declined set intact.
    pub fn with_selection(&self, account_id: AccountId, now: DateTime<Utc>) -> Self {
        Self {
            current_account_id: Some(account_id),
            declined_account_ids: self.declined_account_ids.clone(),
            last_updated: Some(now),
        }
    }

    pub fn is_declined(&self, account_id: &AccountId) -> bool {
        self.declined_account_ids.contains(account_id)
    }

    pub fn declined_list(&self) -> Vec<AccountId> {
        self.declined_account_ids.iter().cloned().collect()
    }
}

/// Load/persist/clear wrapper over the state repository.
pub struct AssignmentStateStore {
    repository: Arc<dyn StateRepository>,
}

impl AssignmentStateStore {
    pub fn new(repository: Arc<dyn StateRepository>) -> Self {
        Self { repository }
    }

    pub async fn load(&self, issue_key: &IssueKey) -> Result<AssignmentState, StateError> {
        let state = self.repository.load_state(issue_key).await?;
        Ok(state.unwrap_or_default())
    }

    pub async fn persist(
        &self,
        issue_key: &IssueKey,
        state: &AssignmentState,
    ) -> Result<(), StateError> {
        debug!(
            issue_key = %issue_key,
            current = ?state.current_account_id,
            declined = state.declined_account_ids.len(),
            "persisting assignment state"
        );
        self.repository.save_state(issue_key, state).await
    }

    pub async fn clear(&self, issue_key: &IssueKey) -> Result<(), StateError> {
        debug!(issue_key = %issue_key, "clearing assignment state");
        self.repository.delete_state(issue_key).await
    }
}
