//! Balances parked outside the liquid wallet: open market orders, escrows, pending HBD
//! conversions and savings withdrawals that have not completed yet.

use sqlx::PgPool;

use crate::assets::{NAI_HBD, NAI_HIVE};
use crate::db;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, utoipa::ToSchema)]
pub struct HiveHbdAmounts {
    pub hive: i64,
    pub hbd: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, utoipa::ToSchema)]
pub struct SpecialBalances {
    pub open_orders: HiveHbdAmounts,
    pub escrow_transfers: HiveHbdAmounts,
    pub pending_conversions: i64,
    pub pending_savings_withdrawals: HiveHbdAmounts,
}

#[derive(sqlx::FromRow)]
struct SpecialBalancesRow {
    hive_in_orders: i64,
    hbd_in_orders: i64,
    hive_in_escrow: i64,
    hbd_in_escrow: i64,
    pending_conversions: i64,
    hive_pending_savings: i64,
    hbd_pending_savings: i64,
}

impl From<SpecialBalancesRow> for SpecialBalances {
    fn from(row: SpecialBalancesRow) -> Self {
        Self {
            open_orders: HiveHbdAmounts {
                hive: row.hive_in_orders,
                hbd: row.hbd_in_orders,
            },
            escrow_transfers: HiveHbdAmounts {
                hive: row.hive_in_escrow,
                hbd: row.hbd_in_escrow,
            },
            pending_conversions: row.pending_conversions,
            pending_savings_withdrawals: HiveHbdAmounts {
                hive: row.hive_pending_savings,
                hbd: row.hbd_pending_savings,
            },
        }
    }
}

fn special_balances_sql(app_schema: &str, hive_schema: &str) -> String {
    format!(
        r#"
        WITH account_id AS (
          SELECT id FROM {hive}.accounts_view WHERE name = $1
        ),
        open_orders AS (
          SELECT
            SUM(CASE WHEN nai = $2 THEN amount END) AS hive_in_orders,
            SUM(CASE WHEN nai = $3 THEN amount END) AS hbd_in_orders
          FROM {app}.account_open_orders
          WHERE account = (SELECT id FROM account_id)
        ),
        escrow_transfers AS (
          SELECT
            SUM(hive_amount) AS hive_in_escrow,
            SUM(hbd_amount) AS hbd_in_escrow
          FROM {app}.account_escrow_transfers
          WHERE account = (SELECT id FROM account_id)
        ),
        pending_conversions AS (
          SELECT SUM(amount) AS pending_conversion_amount
          FROM {app}.account_pending_conversions
          WHERE account = (SELECT id FROM account_id)
        ),
        pending_savings AS (
          SELECT
            SUM(CASE WHEN nai = $2 THEN balance END) AS hive_pending_savings,
            SUM(CASE WHEN nai = $3 THEN balance END) AS hbd_pending_savings
          FROM {app}.transfer_saving_id
          WHERE account = (SELECT id FROM account_id)
            AND complete_date IS NULL
        )
        SELECT
          COALESCE(o.hive_in_orders, 0)::BIGINT AS hive_in_orders,
          COALESCE(o.hbd_in_orders, 0)::BIGINT AS hbd_in_orders,
          COALESCE(e.hive_in_escrow, 0)::BIGINT AS hive_in_escrow,
          COALESCE(e.hbd_in_escrow, 0)::BIGINT AS hbd_in_escrow,
          COALESCE(p.pending_conversion_amount, 0)::BIGINT AS pending_conversions,
          COALESCE(s.hive_pending_savings, 0)::BIGINT AS hive_pending_savings,
          COALESCE(s.hbd_pending_savings, 0)::BIGINT AS hbd_pending_savings
        FROM open_orders o
        CROSS JOIN escrow_transfers e
        CROSS JOIN pending_conversions p
        CROSS JOIN pending_savings s
        "#,
        app = app_schema,
        hive = hive_schema,
    )
}

/// Unknown accounts report all zeroes rather than an error.
pub async fn fetch_special_balances(
    pool: &PgPool,
    app_schema: &str,
    hive_schema: &str,
    account_name: &str,
) -> Result<SpecialBalances, sqlx::Error> {
    let sql = special_balances_sql(app_schema, hive_schema);
    let mut tx = db::begin_snapshot(pool).await?;
    let row: SpecialBalancesRow = sqlx::query_as(&sql)
        .bind(account_name)
        .bind(NAI_HIVE)
        .bind(NAI_HBD)
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(row.into())
}
