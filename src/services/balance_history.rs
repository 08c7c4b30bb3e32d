//! Postgres-backed event store and block time index feeding the resampler.
//!
//! Every query reads its events (and, for time queries, block timestamps) inside one
//! repeatable-read transaction, so blocks appended by the ingestion pipeline mid-query are not
//! seen. The resample itself runs on the blocking pool.

use chrono::NaiveDateTime;
use sqlx::{PgConnection, PgPool};
use std::collections::BTreeMap;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::assets::AssetCode;
use crate::config::BalanceTrackerConfig;
use crate::db;
use crate::services::resample::{self, BalanceEvent, Grid, ResampleError, ResampledSeries};

#[derive(Debug, thiserror::Error)]
pub enum BalanceHistoryError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Resample(#[from] ResampleError),
    #[error("resample worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery<T> {
    pub account_name: String,
    pub asset: AssetCode,
    pub start: T,
    pub end: T,
}

#[derive(sqlx::FromRow)]
struct EventRow {
    account_id: i32,
    asset_code: i32,
    source_order: i64,
    position: i64,
    balance: i64,
}

impl From<EventRow> for BalanceEvent {
    fn from(row: EventRow) -> Self {
        Self {
            account_id: row.account_id,
            asset_code: row.asset_code,
            source_order: row.source_order,
            position: row.position,
            balance: row.balance,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TimedEventRow {
    account_id: i32,
    asset_code: i32,
    source_order: i64,
    position: i64,
    balance: i64,
    created_at: Option<NaiveDateTime>,
}

#[derive(Clone)]
pub struct BalanceHistoryStore {
    pool: PgPool,
    app_schema: String,
    hive_schema: String,
    target_points: i64,
}

impl BalanceHistoryStore {
    pub fn new(pool: PgPool, config: &BalanceTrackerConfig) -> Self {
        Self {
            pool,
            app_schema: config.app_schema.clone(),
            hive_schema: config.hive_schema.clone(),
            target_points: config.target_points,
        }
    }

    pub async fn resample_by_block(
        &self,
        query: &HistoryQuery<i64>,
        cancel: CancellationToken,
    ) -> Result<ResampledSeries<i64>, BalanceHistoryError> {
        // Reject bad ranges before touching the database.
        Grid::new(query.start, query.end, self.target_points)?;
        let started = Instant::now();

        let mut tx = db::begin_snapshot(&self.pool).await?;
        let events = self
            .block_events(&mut tx, query)
            .await?;
        tx.commit().await?;

        let event_count = events.len();
        let (start, end, target_points) = (query.start, query.end, self.target_points);
        let series = tokio::task::spawn_blocking(move || {
            resample::resample_by_block(&events, start, end, target_points, &cancel)
        })
        .await
        .map_err(|err| BalanceHistoryError::Worker(err.to_string()))??;

        tracing::debug!(
            account = %query.account_name,
            asset = %query.asset,
            start,
            end,
            increment = series.increment,
            events = event_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "resampled balance history by block"
        );
        Ok(series)
    }

    pub async fn resample_by_time(
        &self,
        query: &HistoryQuery<NaiveDateTime>,
        cancel: CancellationToken,
    ) -> Result<ResampledSeries<NaiveDateTime>, BalanceHistoryError> {
        if query.end <= query.start {
            return Err(ResampleError::InvalidRange {
                start: query.start.to_string(),
                end: query.end.to_string(),
            }
            .into());
        }
        let started = Instant::now();

        let mut tx = db::begin_snapshot(&self.pool).await?;
        let (events, index) = match self.block_window(&mut tx, query).await? {
            Some((first_block, last_block)) => {
                self.timed_events(&mut tx, query, first_block, last_block)
                    .await?
            }
            None => (Vec::new(), BTreeMap::new()),
        };
        tx.commit().await?;

        let event_count = events.len();
        let (start, end, target_points) = (query.start, query.end, self.target_points);
        let series = tokio::task::spawn_blocking(move || {
            resample::resample_by_time(&events, &index, start, end, target_points, &cancel)
        })
        .await
        .map_err(|err| BalanceHistoryError::Worker(err.to_string()))??;

        tracing::debug!(
            account = %query.account_name,
            asset = %query.asset,
            start = %start,
            end = %end,
            increment_micros = series.increment,
            events = event_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "resampled balance history by time"
        );
        Ok(series)
    }

    async fn block_events(
        &self,
        conn: &mut PgConnection,
        query: &HistoryQuery<i64>,
    ) -> Result<Vec<BalanceEvent>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT
              abh.account::INT AS account_id,
              abh.nai::INT AS asset_code,
              abh.source_op::BIGINT AS source_order,
              abh.source_op_block::BIGINT AS position,
              abh.balance::BIGINT AS balance
            FROM {app}.account_balance_history abh
            JOIN {hive}.accounts_view av ON av.id = abh.account
            WHERE av.name = $1
              AND abh.nai = $2
              AND abh.source_op_block >= $3
              AND abh.source_op_block <= $4
            ORDER BY abh.source_op ASC
            "#,
            app = self.app_schema,
            hive = self.hive_schema,
        );
        let rows: Vec<EventRow> = sqlx::query_as(&sql)
            .bind(&query.account_name)
            .bind(query.asset.nai())
            .bind(query.start)
            .bind(query.end)
            .fetch_all(conn)
            .await?;
        Ok(rows.into_iter().map(BalanceEvent::from).collect())
    }

    /// First and last block produced inside the requested time window, if any.
    async fn block_window(
        &self,
        conn: &mut PgConnection,
        query: &HistoryQuery<NaiveDateTime>,
    ) -> Result<Option<(i64, i64)>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT MIN(bv.num)::BIGINT, MAX(bv.num)::BIGINT
            FROM {hive}.blocks_view bv
            WHERE bv.created_at >= $1
              AND bv.created_at <= $2
            "#,
            hive = self.hive_schema,
        );
        let (first, last): (Option<i64>, Option<i64>) = sqlx::query_as(&sql)
            .bind(query.start)
            .bind(query.end)
            .fetch_one(conn)
            .await?;
        Ok(first.zip(last))
    }

    async fn timed_events(
        &self,
        conn: &mut PgConnection,
        query: &HistoryQuery<NaiveDateTime>,
        first_block: i64,
        last_block: i64,
    ) -> Result<(Vec<BalanceEvent>, BTreeMap<i64, NaiveDateTime>), sqlx::Error> {
        let sql = format!(
            r#"
            SELECT
              abh.account::INT AS account_id,
              abh.nai::INT AS asset_code,
              abh.source_op::BIGINT AS source_order,
              abh.source_op_block::BIGINT AS position,
              abh.balance::BIGINT AS balance,
              bv.created_at::TIMESTAMP AS created_at
            FROM {app}.account_balance_history abh
            JOIN {hive}.accounts_view av ON av.id = abh.account
            LEFT JOIN {hive}.blocks_view bv ON bv.num = abh.source_op_block
            WHERE av.name = $1
              AND abh.nai = $2
              AND abh.source_op_block >= $3
              AND abh.source_op_block <= $4
            ORDER BY abh.source_op ASC
            "#,
            app = self.app_schema,
            hive = self.hive_schema,
        );
        let rows: Vec<TimedEventRow> = sqlx::query_as(&sql)
            .bind(&query.account_name)
            .bind(query.asset.nai())
            .bind(first_block)
            .bind(last_block)
            .fetch_all(conn)
            .await?;

        let mut index = BTreeMap::new();
        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(created_at) = row.created_at {
                index.insert(row.position, created_at);
            }
            events.push(BalanceEvent {
                account_id: row.account_id,
                asset_code: row.asset_code,
                source_order: row.source_order,
                position: row.position,
                balance: row.balance,
            });
        }
        Ok((events, index))
    }
}
