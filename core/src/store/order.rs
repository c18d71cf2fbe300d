use super::Store;
use crate::{error::DropshipResult, types::RecordId};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Purchased,
    Shipped,
    Delivered,
    Issue,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Purchased => "purchased",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Issue => "issue",
        }
    }

    fn parse(s: &str) -> Self {
        match s {
            "purchased" => Self::Purchased,
            "shipped" => Self::Shipped,
            "delivered" => Self::Delivered,
            "issue" => Self::Issue,
            _ => Self::Pending,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub listing_id: Option<RecordId>,
    pub platform: String,
    pub platform_order_id: String,
    pub buyer_country: Option<String>,
    pub sale_price_usd: f64,
    pub platform_fees_usd: Option<f64>,
    pub shipping_cost_usd: Option<f64>,
    pub wholesale_cost_jpy: Option<i64>,
    pub profit_usd: Option<f64>,
    pub ordered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: RecordId,
    pub listing_id: Option<RecordId>,
    pub platform: String,
    pub platform_order_id: String,
    pub buyer_country: Option<String>,
    pub sale_price_usd: Option<f64>,
    pub platform_fees_usd: Option<f64>,
    pub shipping_cost_usd: Option<f64>,
    pub wholesale_cost_jpy: Option<i64>,
    pub profit_usd: Option<f64>,
    pub status: OrderStatus,
    pub supplier_order_id: Option<String>,
    pub tracking_number: Option<String>,
    pub ordered_at: String,
}

/// One day of operations, for the report command and notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: String,
    pub orders_count: i64,
    pub revenue_usd: f64,
    pub profit_usd: f64,
    pub active_listings: i64,
    pub stock_changes: i64,
}

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<OrderRecord> {
    let status: String = row.get(10)?;
    Ok(OrderRecord {
        id: row.get(0)?,
        listing_id: row.get(1)?,
        platform: row.get(2)?,
        platform_order_id: row.get(3)?,
        buyer_country: row.get(4)?,
        sale_price_usd: row.get(5)?,
        platform_fees_usd: row.get(6)?,
        shipping_cost_usd: row.get(7)?,
        wholesale_cost_jpy: row.get(8)?,
        profit_usd: row.get(9)?,
        status: OrderStatus::parse(&status),
        supplier_order_id: row.get(11)?,
        tracking_number: row.get(12)?,
        ordered_at: row.get(13)?,
    })
}

const ORDER_COLUMNS: &str = "id, listing_id, platform, platform_order_id, buyer_country, \
     sale_price_usd, platform_fees_usd, shipping_cost_usd, wholesale_cost_jpy, \
     profit_usd, status, supplier_order_id, tracking_number, ordered_at";

impl Store {
    // ── Orders ────────────────────────────────────────────────────

    pub fn create_order(&self, o: &NewOrder) -> DropshipResult<RecordId> {
        self.conn.execute(
            "INSERT INTO orders (
                listing_id, platform, platform_order_id, buyer_country,
                sale_price_usd, platform_fees_usd, shipping_cost_usd,
                wholesale_cost_jpy, profit_usd, status, ordered_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'pending', ?10)",
            params![
                o.listing_id,
                &o.platform,
                &o.platform_order_id,
                &o.buyer_country,
                o.sale_price_usd,
                o.platform_fees_usd,
                o.shipping_cost_usd,
                o.wholesale_cost_jpy,
                o.profit_usd,
                o.ordered_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn order(&self, id: RecordId) -> DropshipResult<Option<OrderRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"),
                params![id],
                order_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Duplicate detection for order ingestion: an order already recorded
    /// under this platform id is never inserted twice.
    pub fn order_by_platform_id(
        &self,
        platform: &str,
        platform_order_id: &str,
    ) -> DropshipResult<Option<OrderRecord>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {ORDER_COLUMNS} FROM orders
                     WHERE platform = ?1 AND platform_order_id = ?2"
                ),
                params![platform, platform_order_id],
                order_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn set_order_status(&self, id: RecordId, status: OrderStatus) -> DropshipResult<bool> {
        let changed = self.conn.execute(
            "UPDATE orders SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        Ok(changed > 0)
    }

    pub fn daily_summary(&self, date: NaiveDate) -> DropshipResult<DailySummary> {
        let date = date.format("%Y-%m-%d").to_string();
        let (orders_count, revenue_usd, profit_usd) = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(sale_price_usd), 0),
                    COALESCE(SUM(profit_usd), 0)
             FROM orders WHERE date(ordered_at) = ?1",
            params![date],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        let active_listings: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM listings WHERE status = 'active'",
            [],
            |row| row.get(0),
        )?;
        let stock_changes: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(items_changed), 0) FROM sync_log
             WHERE sync_type = 'inventory' AND date(started_at) = ?1",
            params![date],
            |row| row.get(0),
        )?;
        Ok(DailySummary {
            date,
            orders_count,
            revenue_usd,
            profit_usd,
            active_listings,
            stock_changes,
        })
    }
}
