/// Shared server state
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::account::AccountService;
use crate::catalog::Catalog;
use crate::schedule::store::LocalStore;
use crate::schedule::ScheduleReconciler;
use crate::search::TermPartition;

pub type AppReconciler = ScheduleReconciler<Arc<dyn LocalStore>, Arc<dyn AccountService>>;

pub struct AppState {
    /// Every parsed exam, current term first
    pub catalog: Catalog,
    pub partition: TermPartition,
    /// Serializes schedule mutations the way a single UI event loop would
    pub reconciler: Mutex<AppReconciler>,
    pub account: Arc<dyn AccountService>,
}

impl AppState {
    pub fn new(
        catalog: Catalog,
        partition: TermPartition,
        local: Arc<dyn LocalStore>,
        account: Arc<dyn AccountService>,
        storage_key: &str,
    ) -> Self {
        let reconciler = ScheduleReconciler::new(local, account.clone(), storage_key);
        Self {
            catalog,
            partition,
            reconciler: Mutex::new(reconciler),
            account,
        }
    }
}
