use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use super::params::RpcParams;
use crate::error::map_db_error;
use crate::services::accounts;
use crate::state::AppState;

/// An empty prefix matches every account, so the first fifty names come back.
async fn matching_accounts(
    state: &AppState,
    params: RpcParams,
) -> Result<Json<Vec<String>>, (StatusCode, String)> {
    let prefix = params.present("_partial_account_name")?;
    let names = accounts::find_matching_accounts(&state.db, &state.config.hive_schema, prefix)
        .await
        .map_err(map_db_error)?;
    Ok(Json(names))
}

#[utoipa::path(
    get,
    path = "/rpc/find_matching_accounts",
    tag = "accounts",
    params(("_partial_account_name" = String, Query, description = "Account name prefix, may be empty")),
    responses(
        (status = 200, description = "Up to 50 account names, shortest first", body = Vec<String>),
        (status = 400, description = "Invalid request")
    )
)]
pub(crate) async fn find_matching_accounts(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Vec<String>>, (StatusCode, String)> {
    matching_accounts(&state, RpcParams::parse(raw.as_deref())).await
}

#[utoipa::path(
    post,
    path = "/rpc/find_matching_accounts",
    tag = "accounts",
    request_body(content = Object, description = "`_partial_account_name`"),
    responses(
        (status = 200, description = "Up to 50 account names, shortest first", body = Vec<String>),
        (status = 400, description = "Invalid request")
    )
)]
pub(crate) async fn find_matching_accounts_post(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<Vec<String>>, (StatusCode, String)> {
    matching_accounts(&state, RpcParams::from_json(body)?).await
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/rpc/find_matching_accounts",
        get(find_matching_accounts).post(find_matching_accounts_post),
    )
}
