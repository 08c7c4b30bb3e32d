use crate::config::BalanceTrackerConfig;
use crate::services::balance_history::BalanceHistoryStore;
use axum::extract::FromRef;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub config: BalanceTrackerConfig,
    pub db: PgPool,
    pub history: BalanceHistoryStore,
}

impl AppState {
    pub fn new(config: BalanceTrackerConfig, db: PgPool) -> Self {
        let history = BalanceHistoryStore::new(db.clone(), &config);
        Self {
            config,
            db,
            history,
        }
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> PgPool {
        state.db.clone()
    }
}
