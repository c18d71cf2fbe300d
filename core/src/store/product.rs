use super::Store;
use crate::{error::DropshipResult, risk::ProductCandidate, types::RecordId};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    OutOfStock,
    Discontinued,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InStock => "in_stock",
            Self::OutOfStock => "out_of_stock",
            Self::Discontinued => "discontinued",
        }
    }

    pub(crate) fn parse(s: &str) -> Self {
        match s {
            "out_of_stock" => Self::OutOfStock,
            "discontinued" => Self::Discontinued,
            _ => Self::InStock,
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input to the upsert — identity is `supplier_product_id`, not the rowid.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub supplier: String,
    pub supplier_product_id: String,
    pub name_ja: String,
    pub name_en: Option<String>,
    pub description_ja: Option<String>,
    pub description_en: Option<String>,
    pub category: Option<String>,
    pub wholesale_price_jpy: Option<i64>,
    /// None means unknown weight — stored as NULL, never coerced to 0.
    pub weight_g: Option<u32>,
    pub image_urls: Vec<String>,
    pub stock_status: Option<StockStatus>,
    pub product_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: RecordId,
    pub supplier: String,
    pub supplier_product_id: String,
    pub name_ja: String,
    pub name_en: Option<String>,
    pub description_ja: Option<String>,
    pub description_en: Option<String>,
    pub category: Option<String>,
    pub wholesale_price_jpy: Option<i64>,
    pub weight_g: Option<u32>,
    pub image_urls: Vec<String>,
    pub stock_status: StockStatus,
    pub product_url: Option<String>,
}

impl From<&ProductRecord> for ProductCandidate {
    fn from(p: &ProductRecord) -> Self {
        Self {
            name_ja: p.name_ja.clone(),
            name_en: p.name_en.clone(),
            description_ja: p.description_ja.clone(),
            description_en: p.description_en.clone(),
            category: p.category.clone(),
            wholesale_price_jpy: p.wholesale_price_jpy,
            weight_g: p.weight_g,
        }
    }
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<ProductRecord> {
    let image_urls: Option<String> = row.get(10)?;
    let stock_status: String = row.get(11)?;
    Ok(ProductRecord {
        id: row.get(0)?,
        supplier: row.get(1)?,
        supplier_product_id: row.get(2)?,
        name_ja: row.get(3)?,
        name_en: row.get(4)?,
        description_ja: row.get(5)?,
        description_en: row.get(6)?,
        category: row.get(7)?,
        wholesale_price_jpy: row.get(8)?,
        weight_g: row.get(9)?,
        image_urls: image_urls
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default(),
        stock_status: StockStatus::parse(&stock_status),
        product_url: row.get(12)?,
    })
}

const PRODUCT_COLUMNS: &str = "id, supplier, supplier_product_id, name_ja, name_en, \
     description_ja, description_en, category, wholesale_price_jpy, weight_g, \
     image_urls, stock_status, product_url";

impl Store {
    // ── Products ──────────────────────────────────────────────────

    /// Insert or update a product, keyed on `supplier_product_id`.
    /// Returns the product rowid. Idempotent: importing the same feed
    /// twice leaves one row.
    pub fn upsert_product(&self, p: &NewProduct) -> DropshipResult<RecordId> {
        let image_urls = serde_json::to_string(&p.image_urls)?;
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO products (
                supplier, supplier_product_id, name_ja, name_en,
                description_ja, description_en, category,
                wholesale_price_jpy, weight_g, image_urls,
                stock_status, product_url, last_stock_check, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
            ON CONFLICT(supplier_product_id) DO UPDATE SET
                name_ja = excluded.name_ja,
                name_en = excluded.name_en,
                description_ja = excluded.description_ja,
                description_en = excluded.description_en,
                category = excluded.category,
                wholesale_price_jpy = excluded.wholesale_price_jpy,
                weight_g = excluded.weight_g,
                image_urls = excluded.image_urls,
                stock_status = excluded.stock_status,
                product_url = excluded.product_url,
                last_stock_check = excluded.last_stock_check,
                updated_at = excluded.updated_at",
            params![
                &p.supplier,
                &p.supplier_product_id,
                &p.name_ja,
                &p.name_en,
                &p.description_ja,
                &p.description_en,
                &p.category,
                p.wholesale_price_jpy,
                p.weight_g,
                image_urls,
                p.stock_status.unwrap_or(StockStatus::InStock).as_str(),
                &p.product_url,
                now,
            ],
        )?;
        let id = self.conn.query_row(
            "SELECT id FROM products WHERE supplier_product_id = ?1",
            params![&p.supplier_product_id],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn product(&self, id: RecordId) -> DropshipResult<Option<ProductRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"),
                params![id],
                product_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn products(
        &self,
        supplier: Option<&str>,
        category: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> DropshipResult<Vec<ProductRecord>> {
        let mut sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE 1=1");
        let mut args: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        if let Some(supplier) = supplier {
            sql.push_str(" AND supplier = ?");
            args.push(Box::new(supplier.to_string()));
        }
        if let Some(category) = category {
            sql.push_str(" AND category = ?");
            args.push(Box::new(category.to_string()));
        }
        sql.push_str(" ORDER BY updated_at DESC LIMIT ? OFFSET ?");
        args.push(Box::new(limit));
        args.push(Box::new(offset));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(args.iter().map(|a| a.as_ref())),
            product_from_row,
        )?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn set_stock_status(&self, id: RecordId, status: StockStatus) -> DropshipResult<bool> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE products SET stock_status = ?1, last_stock_check = ?2, updated_at = ?2
             WHERE id = ?3",
            params![status.as_str(), now, id],
        )?;
        Ok(changed > 0)
    }
}
