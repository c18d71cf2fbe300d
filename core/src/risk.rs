//! BAN-risk scorer — rule-based screening of candidate listings.
//!
//! Deliberately deterministic: the VeRO brand deny-list, the prohibited
//! keyword list, and the country restriction table catch what actually
//! gets sellers suspended. No model calls, no network.
//!
//! Reference data (brand deny-list, country restrictions) comes in through
//! the [`ReferenceData`] trait so the scorer runs against the SQLite store
//! in production and an in-memory table in tests.

use crate::{
    error::DropshipResult,
    profit::ProfitEngine,
    types::CountryCode,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ── Prohibited keywords ──────────────────────────────────────────────────

/// Phrases that must never appear in listing text. The high-severity
/// subset is fixed at definition time, not computed.
const PROHIBITED_KEYWORDS: &[(&str, Severity)] = &[
    // Drop-shipping disclosure terms marketplaces penalize
    ("dropship", Severity::High),
    ("dropshipping", Severity::High),
    ("drop ship", Severity::Medium),
    ("wholesale", Severity::Medium),
    ("bulk order", Severity::Medium),
    // Counterfeit / replica terms
    ("replica", Severity::High),
    ("counterfeit", Severity::High),
    ("fake", Severity::High),
    ("knockoff", Severity::Medium),
    ("imitation", Severity::Medium),
    ("bootleg", Severity::Medium),
    // Exaggerated authenticity claims
    ("guaranteed authentic", Severity::Medium),
    ("100% genuine", Severity::Medium),
];

// ── Verdict vocabulary ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    BrandBlacklist,
    CountryRestriction,
    ProhibitedKeyword,
    LowMargin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskIssue {
    #[serde(rename = "type")]
    pub kind: IssueType,
    pub detail: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KeywordHit {
    pub keyword: &'static str,
    pub severity: Severity,
}

/// Outcome of a full BAN-risk check. Derived fresh on every call; inputs
/// are never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskVerdict {
    /// True only for risk levels none and low. Medium blocks publication
    /// too — that placement is a business decision, not an accident.
    pub safe: bool,
    pub risk_level: RiskLevel,
    pub issues: Vec<RiskIssue>,
    /// Sorted, de-duplicated union of every restricted country, reported
    /// independently of `safe`: a safe listing may still be barred from
    /// shipping to some destinations.
    pub excluded_countries: BTreeSet<CountryCode>,
}

// ── Reference data ───────────────────────────────────────────────────────

/// One deny-listed brand (VeRO program members and similar).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandDenyEntry {
    pub brand_name: String,
    /// "all" or a specific marketplace identifier.
    pub marketplace: String,
    pub risk_level: Severity,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRestriction {
    pub category: String,
    pub country_code: CountryCode,
    pub reason: Option<String>,
}

/// Lookup interface the scorer needs. Implemented by
/// [`crate::store::Store`] and by in-memory fakes in tests.
pub trait ReferenceData {
    /// Every deny-listed brand whose name occurs (case-insensitively) in
    /// `text`.
    fn denied_brands(&self, text: &str) -> DropshipResult<Vec<BrandDenyEntry>>;

    /// Shipping restrictions configured for a product category.
    fn country_restrictions(&self, category: &str) -> DropshipResult<Vec<CountryRestriction>>;
}

// ── Product input ────────────────────────────────────────────────────────

/// Transient input to the scorer — built by the caller per invocation,
/// never persisted here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductCandidate {
    pub name_ja: String,
    pub name_en: Option<String>,
    pub description_ja: Option<String>,
    pub description_en: Option<String>,
    pub category: Option<String>,
    pub wholesale_price_jpy: Option<i64>,
    /// None means unknown — never zero.
    pub weight_g: Option<u32>,
}

impl ProductCandidate {
    /// All available name/description text, both languages, joined for
    /// substring matching.
    fn combined_text(&self) -> String {
        let mut parts = vec![self.name_ja.as_str()];
        for field in [&self.name_en, &self.description_ja, &self.description_en] {
            if let Some(text) = field {
                parts.push(text.as_str());
            }
        }
        parts.join(" ")
    }
}

// ── Scanning ─────────────────────────────────────────────────────────────

/// Case-insensitive substring scan for prohibited phrases. Empty text
/// yields an empty vec.
pub fn check_prohibited_keywords(text: &str) -> Vec<KeywordHit> {
    if text.is_empty() {
        return Vec::new();
    }
    let lower = text.to_lowercase();
    PROHIBITED_KEYWORDS
        .iter()
        .filter(|(keyword, _)| lower.contains(keyword))
        .map(|&(keyword, severity)| KeywordHit { keyword, severity })
        .collect()
}

pub struct RiskScorer<'a> {
    engine: &'a ProfitEngine,
}

impl<'a> RiskScorer<'a> {
    pub fn new(engine: &'a ProfitEngine) -> Self {
        Self { engine }
    }

    /// Run all four checks and union their findings. No check
    /// short-circuits another — a verdict lists every issue found.
    ///
    ///   1. brand deny-list over the concatenated listing text
    ///   2. country restrictions for the product category (always high)
    ///   3. prohibited keywords over the same text
    ///   4. margin check, only when a sale price and wholesale cost exist
    ///
    /// Only reference-data failures propagate as errors; every business
    /// condition lands in the verdict.
    pub fn check_ban_risk(
        &self,
        product: &ProductCandidate,
        reference: &dyn ReferenceData,
        sale_usd: Option<f64>,
        marketplace: &str,
    ) -> DropshipResult<RiskVerdict> {
        let mut issues: Vec<RiskIssue> = Vec::new();
        let mut excluded_countries: BTreeSet<CountryCode> = BTreeSet::new();

        let text = product.combined_text();

        // 1. Brand deny-list
        for brand in reference.denied_brands(&text)? {
            issues.push(RiskIssue {
                kind: IssueType::BrandBlacklist,
                detail: format!(
                    "VeRO brand detected: {} (risk: {})",
                    brand.brand_name, brand.risk_level
                ),
                severity: brand.risk_level,
            });
        }

        // 2. Country restrictions — always high severity, unlike brands
        if let Some(category) = product.category.as_deref() {
            for restriction in reference.country_restrictions(category)? {
                issues.push(RiskIssue {
                    kind: IssueType::CountryRestriction,
                    detail: format!(
                        "Shipping to {} prohibited: {}",
                        restriction.country_code,
                        restriction.reason.as_deref().unwrap_or("restricted category")
                    ),
                    severity: Severity::High,
                });
                excluded_countries.insert(restriction.country_code);
            }
        }

        // 3. Prohibited keywords
        for hit in check_prohibited_keywords(&text) {
            issues.push(RiskIssue {
                kind: IssueType::ProhibitedKeyword,
                detail: format!("Prohibited phrase detected: '{}'", hit.keyword),
                severity: hit.severity,
            });
        }

        // 4. Margin check — only when both price and cost are known.
        // A thin margin is an economics signal, not a compliance one, but
        // it shares the gate so one verdict decides publication.
        if let (Some(sale), Some(wholesale)) = (sale_usd, product.wholesale_price_jpy) {
            let breakdown = self.engine.calculate_profit(
                wholesale,
                sale,
                product.weight_g,
                None,
                marketplace,
            )?;
            if !breakdown.profitable {
                let margin_pct = (breakdown.profit_margin * 1000.0).round() / 10.0;
                let threshold_pct = self.engine.config().profitable_margin * 100.0;
                issues.push(RiskIssue {
                    kind: IssueType::LowMargin,
                    detail: format!(
                        "Profit margin {margin_pct}% (threshold: {threshold_pct}% or more)"
                    ),
                    severity: Severity::Medium,
                });
            }
        }

        let risk_level = if issues.is_empty() {
            RiskLevel::None
        } else if issues.iter().any(|i| i.severity == Severity::High) {
            RiskLevel::High
        } else if issues.iter().any(|i| i.severity == Severity::Medium) {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };
        let safe = matches!(risk_level, RiskLevel::None | RiskLevel::Low);

        if !safe {
            log::debug!(
                "ban risk for '{}': level {risk_level}, {} issue(s)",
                product.name_ja,
                issues.len()
            );
        }

        Ok(RiskVerdict {
            safe,
            risk_level,
            issues,
            excluded_countries,
        })
    }
}
