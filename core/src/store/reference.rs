use super::Store;
use crate::{
    error::DropshipResult,
    risk::{BrandDenyEntry, CountryRestriction, ReferenceData, Severity},
};
use rusqlite::params;

/// Country restriction seed: UK and Irish knife import bans.
const SEED_COUNTRY_RESTRICTIONS: &[(&str, &str, &str)] = &[
    ("knife", "GB", "UK bladed-article import rules - Offensive Weapons Act 2019"),
    ("knife", "IE", "Irish bladed-article import restrictions"),
];

/// VeRO brand deny-list seed: Japanese knife and character brands that
/// actively pursue takedowns.
const SEED_BRAND_BLACKLIST: &[(&str, &str, &str, &str)] = &[
    ("Shun", "ebay", "high", "Kai's knife brand, VeRO enrolled"),
    ("Global", "ebay", "high", "Yoshida Metal Industry, VeRO enrolled"),
    ("Miyabi", "ebay", "high", "Zwilling subsidiary, VeRO enrolled"),
    ("Kai", "ebay", "high", "Kai Corporation, VeRO enrolled"),
    ("Zwilling", "all", "high", "frequent VeRO filer"),
    ("Wüsthof", "all", "high", "frequent VeRO filer"),
    ("Victorinox", "all", "high", "frequent VeRO filer"),
    ("Sanrio", "all", "high", "character rights holder"),
    ("Studio Ghibli", "all", "high", "character rights holder"),
    ("Nintendo", "all", "high", "game merchandise rights holder"),
];

fn severity_from_str(s: &str) -> Severity {
    match s {
        "high" => Severity::High,
        "low" => Severity::Low,
        _ => Severity::Medium,
    }
}

impl Store {
    // ── Reference data ────────────────────────────────────────────

    /// Seed the deny-list and restriction tables. Idempotent: INSERT OR
    /// IGNORE, so operator-added rows survive re-runs. Returns
    /// (restrictions added, brands added).
    pub fn seed_reference_data(&self) -> DropshipResult<(usize, usize)> {
        let mut restrictions = 0;
        for (category, country_code, reason) in SEED_COUNTRY_RESTRICTIONS {
            restrictions += self.conn.execute(
                "INSERT OR IGNORE INTO country_restrictions (category, country_code, reason)
                 VALUES (?1, ?2, ?3)",
                params![category, country_code, reason],
            )?;
        }

        let mut brands = 0;
        for (brand, marketplace, risk, notes) in SEED_BRAND_BLACKLIST {
            brands += self.conn.execute(
                "INSERT OR IGNORE INTO brand_blacklist (brand_name, marketplace, risk_level, notes)
                 VALUES (?1, ?2, ?3, ?4)",
                params![brand, marketplace, risk, notes],
            )?;
        }

        Ok((restrictions, brands))
    }

    pub fn add_denied_brand(
        &self,
        brand_name: &str,
        marketplace: &str,
        risk_level: Severity,
        notes: Option<&str>,
    ) -> DropshipResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO brand_blacklist (brand_name, marketplace, risk_level, notes)
             VALUES (?1, ?2, ?3, ?4)",
            params![brand_name, marketplace, risk_level.to_string(), notes],
        )?;
        Ok(())
    }

    pub fn add_country_restriction(
        &self,
        category: &str,
        country_code: &str,
        reason: Option<&str>,
    ) -> DropshipResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO country_restrictions (category, country_code, reason)
             VALUES (?1, ?2, ?3)",
            params![category, country_code, reason],
        )?;
        Ok(())
    }
}

impl ReferenceData for Store {
    /// The deny-list is small (tens of rows), so matching walks every
    /// brand against the lowercased text, like the original operator
    /// tooling did.
    fn denied_brands(&self, text: &str) -> DropshipResult<Vec<BrandDenyEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT brand_name, marketplace, risk_level, notes FROM brand_blacklist")?;
        let entries = stmt
            .query_map([], |row| {
                let risk: String = row.get(2)?;
                Ok(BrandDenyEntry {
                    brand_name: row.get(0)?,
                    marketplace: row.get(1)?,
                    risk_level: severity_from_str(&risk),
                    notes: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let text_lower = text.to_lowercase();
        Ok(entries
            .into_iter()
            .filter(|entry| text_lower.contains(&entry.brand_name.to_lowercase()))
            .collect())
    }

    fn country_restrictions(&self, category: &str) -> DropshipResult<Vec<CountryRestriction>> {
        let mut stmt = self.conn.prepare(
            "SELECT category, country_code, reason FROM country_restrictions
             WHERE category = ?1",
        )?;
        let rows = stmt.query_map(params![category], |row| {
            Ok(CountryRestriction {
                category: row.get(0)?,
                country_code: row.get(1)?,
                reason: row.get(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
