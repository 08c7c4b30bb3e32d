use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Duration, NaiveDateTime};
use tokio_util::sync::CancellationToken;

use super::params::RpcParams;
use crate::error::{map_db_error, map_history_error};
use crate::services::balance_history::HistoryQuery;
use crate::services::special_balances::{self, SpecialBalances};
use crate::state::AppState;

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct BlockBalanceResponse {
    block: Vec<i64>,
    balance: Vec<i64>,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct TimeBalanceResponse {
    #[schema(value_type = Vec<String>)]
    time: Vec<NaiveDateTime>,
    balance: Vec<i64>,
}

fn check_block_span(start: i64, end: i64, max_span: i64) -> Result<(), (StatusCode, String)> {
    if max_span > 0 && end.saturating_sub(start) > max_span {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Requested block range too large (max {max_span} blocks)"),
        ));
    }
    Ok(())
}

fn check_time_span(
    start: NaiveDateTime,
    end: NaiveDateTime,
    max_days: i64,
) -> Result<(), (StatusCode, String)> {
    if max_days > 0 && end - start > Duration::days(max_days) {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Requested time range too large (max {max_days} days)"),
        ));
    }
    Ok(())
}

async fn block_balances(
    state: &AppState,
    params: RpcParams,
) -> Result<Json<BlockBalanceResponse>, (StatusCode, String)> {
    let query = HistoryQuery {
        account_name: params.required("_account_name")?.to_string(),
        asset: params.required_asset("_coin_type")?,
        start: params.required_i64("_start_block")?,
        end: params.required_i64("_end_block")?,
    };
    check_block_span(query.start, query.end, state.config.max_block_span)?;

    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();
    let series = state
        .history
        .resample_by_block(&query, cancel)
        .await
        .map_err(map_history_error)?;

    Ok(Json(BlockBalanceResponse {
        block: series.steps,
        balance: series.balances,
    }))
}

async fn time_balances(
    state: &AppState,
    params: RpcParams,
) -> Result<Json<TimeBalanceResponse>, (StatusCode, String)> {
    let query = HistoryQuery {
        account_name: params.required("_account_name")?.to_string(),
        asset: params.required_asset("_coin_type")?,
        start: params.required_time("_start_time")?,
        end: params.required_time("_end_time")?,
    };
    check_time_span(query.start, query.end, state.config.max_time_span_days)?;

    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();
    let series = state
        .history
        .resample_by_time(&query, cancel)
        .await
        .map_err(map_history_error)?;

    Ok(Json(TimeBalanceResponse {
        time: series.steps,
        balance: series.balances,
    }))
}

async fn special_balances_for(
    state: &AppState,
    params: RpcParams,
) -> Result<Json<SpecialBalances>, (StatusCode, String)> {
    let account_name = params.required("_account_name")?;
    let balances = special_balances::fetch_special_balances(
        &state.db,
        &state.config.app_schema,
        &state.config.hive_schema,
        account_name,
    )
    .await
    .map_err(map_db_error)?;
    Ok(Json(balances))
}

#[utoipa::path(
    get,
    path = "/rpc/get_balance_for_coin_by_block",
    tag = "balances",
    params(
        ("_account_name" = String, Query, description = "Account name"),
        ("_coin_type" = String, Query, description = "NAI (13 HBD, 21 HIVE, 37 VESTS) or symbol"),
        ("_start_block" = i64, Query, description = "First block of the range"),
        ("_end_block" = i64, Query, description = "Last block of the range")
    ),
    responses(
        (status = 200, description = "Resampled balance history", body = BlockBalanceResponse),
        (status = 400, description = "Invalid request"),
        (status = 503, description = "Database unavailable or query cancelled")
    )
)]
pub(crate) async fn balance_by_block(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<BlockBalanceResponse>, (StatusCode, String)> {
    block_balances(&state, RpcParams::parse(raw.as_deref())).await
}

#[utoipa::path(
    post,
    path = "/rpc/get_balance_for_coin_by_block",
    tag = "balances",
    request_body(
        content = Object,
        description = "`_account_name`, `_coin_type`, `_start_block` and `_end_block`; numbers may be JSON numbers or strings"
    ),
    responses(
        (status = 200, description = "Resampled balance history", body = BlockBalanceResponse),
        (status = 400, description = "Invalid request"),
        (status = 503, description = "Database unavailable or query cancelled")
    )
)]
pub(crate) async fn balance_by_block_post(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<BlockBalanceResponse>, (StatusCode, String)> {
    block_balances(&state, RpcParams::from_json(body)?).await
}

#[utoipa::path(
    get,
    path = "/rpc/get_balance_for_coin_by_time",
    tag = "balances",
    params(
        ("_account_name" = String, Query, description = "Account name"),
        ("_coin_type" = String, Query, description = "NAI (13 HBD, 21 HIVE, 37 VESTS) or symbol"),
        ("_start_time" = String, Query, description = "Range start, YYYY-MM-DD HH:MM:SS (UTC) or RFC3339"),
        ("_end_time" = String, Query, description = "Range end, YYYY-MM-DD HH:MM:SS (UTC) or RFC3339")
    ),
    responses(
        (status = 200, description = "Resampled balance history", body = TimeBalanceResponse),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Block missing from the time index"),
        (status = 503, description = "Database unavailable or query cancelled")
    )
)]
pub(crate) async fn balance_by_time(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<TimeBalanceResponse>, (StatusCode, String)> {
    time_balances(&state, RpcParams::parse(raw.as_deref())).await
}

#[utoipa::path(
    post,
    path = "/rpc/get_balance_for_coin_by_time",
    tag = "balances",
    request_body(
        content = Object,
        description = "`_account_name`, `_coin_type`, `_start_time` and `_end_time`"
    ),
    responses(
        (status = 200, description = "Resampled balance history", body = TimeBalanceResponse),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Block missing from the time index"),
        (status = 503, description = "Database unavailable or query cancelled")
    )
)]
pub(crate) async fn balance_by_time_post(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<TimeBalanceResponse>, (StatusCode, String)> {
    time_balances(&state, RpcParams::from_json(body)?).await
}

#[utoipa::path(
    get,
    path = "/rpc/get_account_special_balances",
    tag = "balances",
    params(("_account_name" = String, Query, description = "Account name")),
    responses(
        (status = 200, description = "Balances held in orders, escrow, conversions and savings", body = SpecialBalances),
        (status = 400, description = "Invalid request")
    )
)]
pub(crate) async fn account_special_balances(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<SpecialBalances>, (StatusCode, String)> {
    special_balances_for(&state, RpcParams::parse(raw.as_deref())).await
}

#[utoipa::path(
    post,
    path = "/rpc/get_account_special_balances",
    tag = "balances",
    request_body(content = Object, description = "`_account_name`"),
    responses(
        (status = 200, description = "Balances held in orders, escrow, conversions and savings", body = SpecialBalances),
        (status = 400, description = "Invalid request")
    )
)]
pub(crate) async fn account_special_balances_post(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<SpecialBalances>, (StatusCode, String)> {
    special_balances_for(&state, RpcParams::from_json(body)?).await
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/rpc/get_balance_for_coin_by_block",
            get(balance_by_block).post(balance_by_block_post),
        )
        .route(
            "/rpc/get_balance_for_coin_by_time",
            get(balance_by_time).post(balance_by_time_post),
        )
        .route(
            "/rpc/get_account_special_balances",
            get(account_special_balances).post(account_special_balances_post),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn block_span_limit_is_optional() {
        assert!(check_block_span(0, 10_000_000, 0).is_ok());
        assert!(check_block_span(0, 1000, 1000).is_ok());
        let (status, message) = check_block_span(0, 1001, 1000).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message.contains("1000 blocks"));
    }

    #[test]
    fn time_span_limit_counts_days() {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert!(check_time_span(start, start + Duration::days(30), 30).is_ok());
        assert!(check_time_span(start, start + Duration::days(31), 30).is_err());
        assert!(check_time_span(start, start + Duration::days(3650), 0).is_ok());
    }

    #[test]
    fn time_response_uses_iso_timestamps() {
        let response = TimeBalanceResponse {
            time: vec![NaiveDate::from_ymd_opt(2016, 3, 24)
                .unwrap()
                .and_hms_opt(16, 0, 0)
                .unwrap()],
            balance: vec![5],
        };
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value["time"][0], "2016-03-24T16:00:00");
        assert_eq!(value["balance"][0], 5);
    }
}
