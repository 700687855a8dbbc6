//! Account service contract consumed by the schedule reconciler.
//!
//! Authentication itself lives outside this crate. What the reconciler needs
//! is a snapshot of who (if anyone) is signed in, and a way to push partial
//! updates to that user's stored record.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, info};

use crate::schedule::Schedule;

/// A signed-in user as stored by the account service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub saved_schedule: Schedule,
    #[serde(default)]
    pub saved_searches: Vec<String>,
}

/// Partial update sent to the account service. `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_schedule: Option<Schedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_searches: Option<Vec<String>>,
}

impl UserPatch {
    pub fn schedule(schedule: Schedule) -> Self {
        Self {
            saved_schedule: Some(schedule),
            ..Self::default()
        }
    }

    pub fn searches(searches: Vec<String>) -> Self {
        Self {
            saved_searches: Some(searches),
            ..Self::default()
        }
    }

    fn apply(self, user: &mut UserAccount) {
        if let Some(schedule) = self.saved_schedule {
            user.saved_schedule = schedule;
        }
        if let Some(searches) = self.saved_searches {
            user.saved_searches = searches;
        }
    }
}

/// Authentication state at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSnapshot {
    /// True until the account service knows whether anyone is signed in
    pub is_loading: bool,
    pub user: Option<UserAccount>,
}

impl AuthSnapshot {
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            user: None,
        }
    }

    pub fn guest() -> Self {
        Self::default()
    }

    pub fn signed_in(user: UserAccount) -> Self {
        Self {
            is_loading: false,
            user: Some(user),
        }
    }
}

/// Errors reported by the account service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    /// The operation needs a signed-in user
    #[error("No user is signed in")]
    NotAuthenticated,

    /// The remote update did not go through
    #[error("Account update failed: {message}")]
    Remote { message: String },
}

impl AccountError {
    /// Returns true if retrying the same update may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AccountError::Remote { .. })
    }
}

/// The remote side of user accounts.
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Current authentication state.
    fn snapshot(&self) -> AuthSnapshot;

    /// Persists a partial update of the signed-in user and returns the
    /// updated record.
    async fn update_user(&self, patch: UserPatch) -> Result<UserAccount, AccountError>;
}

#[async_trait]
impl<T: AccountService + ?Sized> AccountService for Arc<T> {
    fn snapshot(&self) -> AuthSnapshot {
        (**self).snapshot()
    }

    async fn update_user(&self, patch: UserPatch) -> Result<UserAccount, AccountError> {
        (**self).update_user(patch).await
    }
}

/// Result of [`save_search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveSearchOutcome {
    Saved,
    AlreadySaved,
    Empty,
}

/// Saves a search query to the signed-in user's account.
///
/// The query is trimmed; blank queries and queries already saved are left
/// alone. New queries go to the front of the list.
pub async fn save_search<A: AccountService + ?Sized>(
    account: &A,
    query: &str,
) -> Result<SaveSearchOutcome, AccountError> {
    let snapshot = account.snapshot();
    let user = match snapshot.user {
        Some(user) if !snapshot.is_loading => user,
        _ => return Err(AccountError::NotAuthenticated),
    };

    let query = query.trim();
    if query.is_empty() {
        return Ok(SaveSearchOutcome::Empty);
    }
    if user.saved_searches.iter().any(|s| s == query) {
        debug!(user = %user.id, query, "Search already saved");
        return Ok(SaveSearchOutcome::AlreadySaved);
    }

    let mut searches = Vec::with_capacity(user.saved_searches.len() + 1);
    searches.push(query.to_string());
    searches.extend(user.saved_searches);

    account.update_user(UserPatch::searches(searches)).await?;
    info!(user = %user.id, query, "Saved search");
    Ok(SaveSearchOutcome::Saved)
}

/// In-process account service.
///
/// Backs the development server and the tests. Sign-in state is switched
/// explicitly, and updates can be made to fail on demand.
#[derive(Debug, Default)]
pub struct MemoryAccountService {
    snapshot: RwLock<AuthSnapshot>,
    update_calls: AtomicU32,
    fail_updates: AtomicBool,
}

impl MemoryAccountService {
    pub fn new(snapshot: AuthSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
            ..Self::default()
        }
    }

    /// A service with no one signed in.
    pub fn guest() -> Self {
        Self::new(AuthSnapshot::guest())
    }

    pub fn sign_in(&self, user: UserAccount) {
        info!(user = %user.id, "User signed in");
        self.replace(AuthSnapshot::signed_in(user));
    }

    pub fn sign_out(&self) {
        info!("User signed out");
        self.replace(AuthSnapshot::guest());
    }

    pub fn set_loading(&self, is_loading: bool) {
        let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        guard.is_loading = is_loading;
    }

    /// Makes every later `update_user` call fail (or succeed again).
    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::Relaxed);
    }

    /// Number of `update_user` calls received, failed ones included.
    pub fn update_calls(&self) -> u32 {
        self.update_calls.load(Ordering::Relaxed)
    }

    fn replace(&self, snapshot: AuthSnapshot) {
        let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        *guard = snapshot;
    }
}

#[async_trait]
impl AccountService for MemoryAccountService {
    fn snapshot(&self) -> AuthSnapshot {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn update_user(&self, patch: UserPatch) -> Result<UserAccount, AccountError> {
        self.update_calls.fetch_add(1, Ordering::Relaxed);

        if self.fail_updates.load(Ordering::Relaxed) {
            return Err(AccountError::Remote {
                message: "account service unavailable".to_string(),
            });
        }

        let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        let user = guard.user.as_mut().ok_or(AccountError::NotAuthenticated)?;
        patch.apply(user);
        Ok(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserAccount {
        UserAccount {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            saved_schedule: Schedule::default(),
            saved_searches: vec!["MATH".to_string()],
        }
    }

    #[tokio::test]
    async fn test_save_search_prepends_trimmed_query() {
        let account = MemoryAccountService::new(AuthSnapshot::signed_in(user()));

        let outcome = save_search(&account, "  COMP202, MATH133 ").await.unwrap();

        assert_eq!(outcome, SaveSearchOutcome::Saved);
        let saved = account.snapshot().user.unwrap().saved_searches;
        assert_eq!(saved, vec!["COMP202, MATH133".to_string(), "MATH".to_string()]);
    }

    #[tokio::test]
    async fn test_save_search_skips_duplicates_and_blanks() {
        let account = MemoryAccountService::new(AuthSnapshot::signed_in(user()));

        assert_eq!(
            save_search(&account, " MATH ").await.unwrap(),
            SaveSearchOutcome::AlreadySaved
        );
        assert_eq!(
            save_search(&account, "   ").await.unwrap(),
            SaveSearchOutcome::Empty
        );
        assert_eq!(account.update_calls(), 0);
    }

    #[tokio::test]
    async fn test_save_search_requires_user() {
        let account = MemoryAccountService::guest();
        let err = save_search(&account, "COMP").await.unwrap_err();
        assert_eq!(err, AccountError::NotAuthenticated);
    }

    #[tokio::test]
    async fn test_update_failure_leaves_user_untouched() {
        let account = MemoryAccountService::new(AuthSnapshot::signed_in(user()));
        account.set_fail_updates(true);

        let err = account
            .update_user(UserPatch::searches(vec![]))
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(account.update_calls(), 1);
        assert_eq!(account.snapshot().user.unwrap().saved_searches.len(), 1);
    }

    #[test]
    fn test_patch_serializes_only_present_fields() {
        let json = serde_json::to_value(UserPatch::searches(vec!["A".to_string()])).unwrap();
        assert_eq!(json, serde_json::json!({ "savedSearches": ["A"] }));
    }
}
