use crate::config::BalanceTrackerConfig;
use crate::db;
use crate::services::resample::DEFAULT_TARGET_POINTS;
use crate::state::AppState;

pub fn test_config() -> BalanceTrackerConfig {
    BalanceTrackerConfig {
        database_url: "postgresql://postgres@localhost/postgres".to_string(),
        app_schema: "btracker_app".to_string(),
        hive_schema: "hive".to_string(),
        target_points: DEFAULT_TARGET_POINTS,
        db_max_connections: 1,
        db_acquire_timeout_seconds: 1,
        max_block_span: 0,
        max_time_span_days: 0,
    }
}

pub fn test_state() -> AppState {
    let config = test_config();
    let pool = db::connect_lazy(&config).expect("connect_lazy");
    AppState::new(config, pool)
}
