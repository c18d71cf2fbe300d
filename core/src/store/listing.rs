use super::{Store, StockStatus};
use crate::{
    error::DropshipResult,
    risk::RiskIssue,
    types::{CountryCode, RecordId},
};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Draft,
    Active,
    Paused,
    Sold,
    Removed,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Sold => "sold",
            Self::Removed => "removed",
        }
    }

    fn parse(s: &str) -> Self {
        match s {
            "active" => Self::Active,
            "paused" => Self::Paused,
            "sold" => Self::Sold,
            "removed" => Self::Removed,
            _ => Self::Draft,
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewListing {
    pub product_id: RecordId,
    pub platform: String,
    pub platform_listing_id: Option<String>,
    pub title_en: Option<String>,
    pub description_en: Option<String>,
    pub tags: Vec<String>,
    pub price_usd: Option<f64>,
    pub shipping_cost_usd: Option<f64>,
    pub status: Option<ListingStatus>,
    pub ban_check_passed: bool,
    pub ban_check_issues: Vec<RiskIssue>,
    pub excluded_countries: BTreeSet<CountryCode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingRecord {
    pub id: RecordId,
    pub product_id: RecordId,
    pub platform: String,
    pub platform_listing_id: Option<String>,
    pub title_en: Option<String>,
    pub description_en: Option<String>,
    pub tags: Vec<String>,
    pub price_usd: Option<f64>,
    pub shipping_cost_usd: Option<f64>,
    pub status: ListingStatus,
    pub ban_check_passed: bool,
    pub ban_check_issues: Vec<RiskIssue>,
    pub excluded_countries: BTreeSet<CountryCode>,
    pub views: i64,
    pub favorites: i64,
    pub sales: i64,
}

/// Active listing joined with the product fields the sync engines need.
#[derive(Debug, Clone)]
pub struct ActiveListing {
    pub listing_id: RecordId,
    pub product_id: RecordId,
    pub platform: String,
    pub platform_listing_id: Option<String>,
    pub name_ja: String,
    pub category: Option<String>,
    pub stock_status: StockStatus,
    pub wholesale_price_jpy: Option<i64>,
    pub weight_g: Option<u32>,
}

fn listing_from_row(row: &Row<'_>) -> rusqlite::Result<ListingRecord> {
    let tags: Option<String> = row.get(6)?;
    let status: String = row.get(9)?;
    let issues: Option<String> = row.get(11)?;
    let excluded: Option<String> = row.get(12)?;
    Ok(ListingRecord {
        id: row.get(0)?,
        product_id: row.get(1)?,
        platform: row.get(2)?,
        platform_listing_id: row.get(3)?,
        title_en: row.get(4)?,
        description_en: row.get(5)?,
        tags: tags
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default(),
        price_usd: row.get(7)?,
        shipping_cost_usd: row.get(8)?,
        status: ListingStatus::parse(&status),
        ban_check_passed: row.get::<_, i64>(10)? != 0,
        ban_check_issues: issues
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default(),
        excluded_countries: excluded
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default(),
        views: row.get(13)?,
        favorites: row.get(14)?,
        sales: row.get(15)?,
    })
}

const LISTING_COLUMNS: &str = "id, product_id, platform, platform_listing_id, title_en, \
     description_en, tags, price_usd, shipping_cost_usd, status, ban_check_passed, \
     ban_check_issues, excluded_countries, views, favorites, sales";

impl Store {
    // ── Listings ──────────────────────────────────────────────────

    pub fn create_listing(&self, l: &NewListing) -> DropshipResult<RecordId> {
        let tags = serde_json::to_string(&l.tags)?;
        let issues = serde_json::to_string(&l.ban_check_issues)?;
        let excluded = serde_json::to_string(&l.excluded_countries)?;
        self.conn.execute(
            "INSERT INTO listings (
                product_id, platform, platform_listing_id, title_en,
                description_en, tags, price_usd, shipping_cost_usd, status,
                ban_check_passed, ban_check_issues, excluded_countries
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                l.product_id,
                &l.platform,
                &l.platform_listing_id,
                &l.title_en,
                &l.description_en,
                tags,
                l.price_usd,
                l.shipping_cost_usd,
                l.status.unwrap_or(ListingStatus::Draft).as_str(),
                l.ban_check_passed as i64,
                issues,
                excluded,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn listing(&self, id: RecordId) -> DropshipResult<Option<ListingRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {LISTING_COLUMNS} FROM listings WHERE id = ?1"),
                params![id],
                listing_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn listing_by_platform_id(
        &self,
        platform: &str,
        platform_listing_id: &str,
    ) -> DropshipResult<Option<ListingRecord>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {LISTING_COLUMNS} FROM listings
                     WHERE platform = ?1 AND platform_listing_id = ?2"
                ),
                params![platform, platform_listing_id],
                listing_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn set_listing_status(
        &self,
        id: RecordId,
        status: ListingStatus,
    ) -> DropshipResult<bool> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE listings SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), now, id],
        )?;
        Ok(changed > 0)
    }

    pub fn set_platform_listing_id(
        &self,
        id: RecordId,
        platform_listing_id: &str,
    ) -> DropshipResult<bool> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE listings SET platform_listing_id = ?1, updated_at = ?2 WHERE id = ?3",
            params![platform_listing_id, now, id],
        )?;
        Ok(changed > 0)
    }

    pub fn bump_listing_sales(&self, id: RecordId) -> DropshipResult<bool> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE listings SET sales = sales + 1, updated_at = ?1 WHERE id = ?2",
            params![now, id],
        )?;
        Ok(changed > 0)
    }

    /// Active listings joined with product stock data, optionally limited
    /// to one platform. This is the inventory sync work list.
    pub fn active_listings_with_products(
        &self,
        platform: Option<&str>,
    ) -> DropshipResult<Vec<ActiveListing>> {
        let mut sql = String::from(
            "SELECT l.id, l.product_id, l.platform, l.platform_listing_id,
                    p.name_ja, p.category, p.stock_status,
                    p.wholesale_price_jpy, p.weight_g
             FROM listings l
             JOIN products p ON l.product_id = p.id
             WHERE l.status = 'active'",
        );
        if platform.is_some() {
            sql.push_str(" AND l.platform = ?1");
        }
        let mut stmt = self.conn.prepare(&sql)?;
        let map_row = |row: &Row<'_>| -> rusqlite::Result<ActiveListing> {
            let stock: String = row.get(6)?;
            Ok(ActiveListing {
                listing_id: row.get(0)?,
                product_id: row.get(1)?,
                platform: row.get(2)?,
                platform_listing_id: row.get(3)?,
                name_ja: row.get(4)?,
                category: row.get(5)?,
                stock_status: StockStatus::parse(&stock),
                wholesale_price_jpy: row.get(7)?,
                weight_g: row.get(8)?,
            })
        };
        let rows = match platform {
            Some(p) => stmt.query_map(params![p], map_row)?,
            None => stmt.query_map([], map_row)?,
        };
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn listings_by_status(
        &self,
        status: ListingStatus,
        platform: Option<&str>,
    ) -> DropshipResult<Vec<ListingRecord>> {
        let mut sql =
            format!("SELECT {LISTING_COLUMNS} FROM listings WHERE status = ?1");
        if platform.is_some() {
            sql.push_str(" AND platform = ?2");
        }
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = match platform {
            Some(p) => stmt.query_map(params![status.as_str(), p], listing_from_row)?,
            None => stmt.query_map(params![status.as_str()], listing_from_row)?,
        };
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
