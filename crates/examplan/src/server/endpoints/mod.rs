pub mod exams;
pub mod schedule;
pub mod status;

#[cfg(test)]
pub(crate) mod tests {
    use axum::response::Response;
    use std::sync::Arc;

    use crate::account::{AccountService, MemoryAccountService};
    use crate::catalog::Catalog;
    use crate::schedule::store::{LocalStore, MemoryLocalStore};
    use crate::search::TermPartition;
    use crate::types::AppState;

    const CURRENT: &str = "\
Course,Section,Year,Exam Type,Start,End,Building,Room,Title
COMP202,1,W2026,Final,09:00,12:00,ENGMC,304,Foundations of Programming
COMP250,1,W2026,Final,14:00,17:00,Trottier,1100,Intro to Computer Science
MATH133,1,W2026,Final,09:00,12:00,Leacock,132,Linear Algebra and Geometry
";

    const HISTORICAL: &str = "COMP202,1,F2024,Final,09:00,12:00,ENGMC,304\n";

    pub(crate) fn test_state_with(account: Arc<MemoryAccountService>) -> Arc<AppState> {
        let local: Arc<dyn LocalStore> = Arc::new(MemoryLocalStore::new());
        let account: Arc<dyn AccountService> = account;
        Arc::new(AppState::new(
            Catalog::load(CURRENT, HISTORICAL),
            TermPartition::default(),
            local,
            account,
            "mcgill-exam-schedule",
        ))
    }

    pub(crate) fn test_state() -> Arc<AppState> {
        test_state_with(Arc::new(MemoryAccountService::guest()))
    }

    pub(crate) async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
