use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::routes::{accounts, balances, health};
use crate::services::special_balances::{HiveHbdAmounts, SpecialBalances};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "balance-tracker-rs",
        description = "Fixed-cardinality account balance history over blocks or wall-clock time"
    ),
    paths(
        health::healthz_handler,
        balances::balance_by_block,
        balances::balance_by_block_post,
        balances::balance_by_time,
        balances::balance_by_time_post,
        balances::account_special_balances,
        balances::account_special_balances_post,
        accounts::find_matching_accounts,
        accounts::find_matching_accounts_post
    ),
    components(schemas(
        health::HealthResponse,
        balances::BlockBalanceResponse,
        balances::TimeBalanceResponse,
        SpecialBalances,
        HiveHbdAmounts
    )),
    tags(
        (name = "health"),
        (name = "balances"),
        (name = "accounts")
    )
)]
pub struct ApiDoc;

pub fn openapi_json() -> serde_json::Value {
    serde_json::to_value(ApiDoc::openapi()).unwrap_or_else(|err| {
        tracing::error!(error = %err, "failed to serialize openapi document");
        serde_json::Value::Null
    })
}

async fn openapi_handler() -> Json<serde_json::Value> {
    Json(openapi_json())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_handler))
}
