//! Keeps the in-memory schedule in step with exactly one backing store.
//!
//! Guests persist to the local store; signed-in users persist to their
//! account. Whenever the authentication state changes, the schedule is
//! replaced wholesale by whatever the newly authoritative store holds. Guest
//! selections are never merged into an account on sign-in.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::store::LocalStore;
use super::{ReconcileError, Schedule};
use crate::account::{AccountService, AuthSnapshot, UserPatch};
use crate::catalog::{ExamId, ExamRecord};

/// Which store currently owns the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconcilerState {
    /// Authentication hasn't resolved yet; nothing is read or written
    Uninitialized,
    /// Local storage is authoritative
    Guest,
    /// The given user's account is authoritative
    Authenticated { user_id: String },
}

impl ReconcilerState {
    fn from_snapshot(snapshot: &AuthSnapshot) -> Option<Self> {
        if snapshot.is_loading {
            return None;
        }
        Some(match &snapshot.user {
            Some(user) => ReconcilerState::Authenticated {
                user_id: user.id.clone(),
            },
            None => ReconcilerState::Guest,
        })
    }
}

/// What a mutation did to the backing stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistOutcome {
    /// No authoritative store yet, kept in memory only
    Deferred,
    /// Written to local storage
    WroteLocal,
    /// Written to the account
    WroteRemote,
    /// Store already held this exact schedule
    Unchanged,
}

/// Owner of the authoritative schedule.
pub struct ScheduleReconciler<L, A> {
    local: L,
    account: A,
    storage_key: String,
    state: ReconcilerState,
    schedule: Schedule,
    initialized: bool,
    load_warning: Option<ReconcileError>,
}

impl<L: LocalStore, A: AccountService> ScheduleReconciler<L, A> {
    /// Creates a reconciler over the given stores.
    ///
    /// Starts uninitialized; call [`sync_auth`](Self::sync_auth) once the
    /// account service has finished loading.
    pub fn new(local: L, account: A, storage_key: impl Into<String>) -> Self {
        Self {
            local,
            account,
            storage_key: storage_key.into(),
            state: ReconcilerState::Uninitialized,
            schedule: Schedule::new(),
            initialized: false,
            load_warning: None,
        }
    }

    pub fn state(&self) -> &ReconcilerState {
        &self.state
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// True once the schedule has been read from an authoritative store.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Why the last local load fell back to an empty schedule, if it did.
    pub fn load_warning(&self) -> Option<&ReconcileError> {
        self.load_warning.as_ref()
    }

    pub fn account(&self) -> &A {
        &self.account
    }

    pub fn local_store(&self) -> &L {
        &self.local
    }

    /// Re-reads the authentication state and switches source of truth if it
    /// changed.
    ///
    /// Does nothing while the account service is still loading. On a switch
    /// the in-memory schedule is discarded and replaced by the new source's
    /// stored value.
    pub fn sync_auth(&mut self) -> &ReconcilerState {
        let snapshot = self.account.snapshot();
        let Some(target) = ReconcilerState::from_snapshot(&snapshot) else {
            debug!("Authentication still loading, schedule not resolved");
            return &self.state;
        };

        if target == self.state {
            return &self.state;
        }

        self.load_warning = None;
        self.schedule = match snapshot.user {
            Some(user) => user.saved_schedule.rebuilt(),
            None => self.load_local(),
        };

        info!(
            from = ?self.state,
            to = ?target,
            exams = self.schedule.len(),
            "Schedule source of truth switched"
        );

        self.state = target;
        self.initialized = true;
        &self.state
    }

    /// Adds the exam, or removes it if already scheduled, then writes through.
    pub async fn toggle(&mut self, record: ExamRecord) -> Result<PersistOutcome, ReconcileError> {
        let id = record.id.clone();
        let added = self.schedule.toggle(record);
        debug!(exam = %id, added, "Toggled exam");
        self.persist().await
    }

    /// Removes the exam with this id, if present, then writes through.
    pub async fn remove(&mut self, id: &ExamId) -> Result<PersistOutcome, ReconcileError> {
        if !self.schedule.remove(id) {
            return Ok(PersistOutcome::Unchanged);
        }
        debug!(exam = %id, "Removed exam");
        self.persist().await
    }

    /// Replaces the whole schedule, then writes through.
    pub async fn set_schedule(
        &mut self,
        schedule: Schedule,
    ) -> Result<PersistOutcome, ReconcileError> {
        self.schedule = Schedule::from_records(schedule.exams().iter().cloned());
        self.persist().await
    }

    /// Writes the current schedule to the authoritative store.
    ///
    /// Account writes are skipped when the account already holds an equal
    /// schedule. On failure the in-memory schedule is kept as is.
    pub async fn persist(&mut self) -> Result<PersistOutcome, ReconcileError> {
        if !self.initialized {
            debug!("Schedule not initialized, deferring write");
            return Ok(PersistOutcome::Deferred);
        }

        let snapshot = self.account.snapshot();
        if ReconcilerState::from_snapshot(&snapshot).as_ref() != Some(&self.state) {
            // Auth moved under us; the destination is whatever sync_auth decides
            debug!(state = ?self.state, "Authentication changed since last sync, deferring write");
            return Ok(PersistOutcome::Deferred);
        }

        match snapshot.user {
            Some(user) => {
                if user.saved_schedule == self.schedule {
                    return Ok(PersistOutcome::Unchanged);
                }

                self.account
                    .update_user(UserPatch::schedule(self.schedule.clone()))
                    .await
                    .map_err(|e| {
                        warn!(user = %user.id, "Failed to persist schedule to account: {}", e);
                        ReconcileError::RemotePersist(e)
                    })?;

                debug!(user = %user.id, exams = self.schedule.len(), "Schedule saved to account");
                Ok(PersistOutcome::WroteRemote)
            }
            None => {
                let json = serde_json::to_string(&self.schedule).map_err(|e| {
                    ReconcileError::LocalPersist(super::store::StoreError::Io {
                        message: e.to_string(),
                    })
                })?;
                self.local.set(&self.storage_key, &json).map_err(|e| {
                    warn!(key = %self.storage_key, "Failed to persist schedule locally: {}", e);
                    ReconcileError::from(e)
                })?;

                debug!(exams = self.schedule.len(), "Schedule saved locally");
                Ok(PersistOutcome::WroteLocal)
            }
        }
    }

    /// Reads the guest schedule. Absent or unreadable data yields an empty
    /// schedule.
    fn load_local(&mut self) -> Schedule {
        let raw = match self.local.get(&self.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Schedule::new(),
            Err(e) => {
                warn!(key = %self.storage_key, "Failed to read local schedule: {}", e);
                return Schedule::new();
            }
        };

        match serde_json::from_str::<Schedule>(&raw) {
            Ok(schedule) => schedule.rebuilt(),
            Err(e) => {
                let err = ReconcileError::StorageCorrupt {
                    message: e.to_string(),
                };
                warn!(key = %self.storage_key, "{}; starting with an empty schedule", err);
                self.load_warning = Some(err);
                Schedule::new()
            }
        }
    }
}
