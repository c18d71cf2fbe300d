//! BAN-risk scorer tests, run against the seeded SQLite reference data
//! and against an in-memory fake to exercise the trait seam.

use dropship_core::{
    config::EngineConfig,
    error::DropshipResult,
    profit::ProfitEngine,
    risk::{
        check_prohibited_keywords, BrandDenyEntry, CountryRestriction, IssueType,
        ProductCandidate, ReferenceData, RiskLevel, RiskScorer, Severity,
    },
    store::Store,
};

fn engine() -> ProfitEngine {
    ProfitEngine::new(EngineConfig::default())
}

fn seeded_store() -> Store {
    let store = Store::in_memory().unwrap();
    store.migrate().unwrap();
    store.seed_reference_data().unwrap();
    store
}

fn tenugui() -> ProductCandidate {
    ProductCandidate {
        name_ja: "日本製 手ぬぐい 富士山柄".to_string(),
        name_en: Some("Japanese Cotton Tenugui Towel Mt Fuji".to_string()),
        category: Some("tenugui".to_string()),
        wholesale_price_jpy: Some(300),
        weight_g: Some(50),
        ..ProductCandidate::default()
    }
}

// ── keyword scan ─────────────────────────────────────────────────────────

/// Empty text matches nothing.
#[test]
fn empty_text_has_no_keyword_hits() {
    assert!(check_prohibited_keywords("").is_empty());
}

/// Matching is case-insensitive substring matching.
#[test]
fn keyword_scan_is_case_insensitive() {
    let hits = check_prohibited_keywords("WHOLESALE lot of 10");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].keyword, "wholesale");
    assert_eq!(hits[0].severity, Severity::Medium);

    let hits = check_prohibited_keywords("Replica katana stand");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].severity, Severity::High);
}

// ── full checks against seeded reference data ────────────────────────────

/// Clean tenugui at a healthy price: no issues, level none, safe, no
/// excluded countries.
#[test]
fn clean_product_is_safe() {
    let engine = engine();
    let store = seeded_store();
    let verdict = RiskScorer::new(&engine)
        .check_ban_risk(&tenugui(), &store, Some(15.00), "ebay")
        .unwrap();
    assert!(verdict.safe);
    assert_eq!(verdict.risk_level, RiskLevel::None);
    assert!(verdict.issues.is_empty());
    assert!(verdict.excluded_countries.is_empty());
}

/// A VeRO-enrolled brand name anywhere in the listing text blocks it.
#[test]
fn denied_brand_blocks_listing() {
    let engine = engine();
    let store = seeded_store();
    let product = ProductCandidate {
        name_ja: "Shun Classic 三徳".to_string(),
        ..ProductCandidate::default()
    };
    let verdict = RiskScorer::new(&engine)
        .check_ban_risk(&product, &store, None, "ebay")
        .unwrap();
    assert!(!verdict.safe);
    assert_eq!(verdict.risk_level, RiskLevel::High);
    assert!(verdict
        .issues
        .iter()
        .any(|i| i.kind == IssueType::BrandBlacklist && i.detail.contains("Shun")));
}

/// Brand matching covers the English description too, not just names.
#[test]
fn brand_in_description_is_caught() {
    let engine = engine();
    let store = seeded_store();
    let product = ProductCandidate {
        name_ja: "キッチン雑貨".to_string(),
        description_en: Some("Same quality as Zwilling at half the price".to_string()),
        ..ProductCandidate::default()
    };
    let verdict = RiskScorer::new(&engine)
        .check_ban_risk(&product, &store, None, "ebay")
        .unwrap();
    assert_eq!(verdict.risk_level, RiskLevel::High);
}

/// Knives collect the UK and Irish exclusions. The exclusions are high
/// severity, so the listing is also unsafe.
#[test]
fn knife_category_excludes_gb_and_ie() {
    let engine = engine();
    let store = seeded_store();
    let product = ProductCandidate {
        name_ja: "堺打刃物 三徳包丁".to_string(),
        category: Some("knife".to_string()),
        ..ProductCandidate::default()
    };
    let verdict = RiskScorer::new(&engine)
        .check_ban_risk(&product, &store, None, "ebay")
        .unwrap();
    assert!(!verdict.safe);
    assert_eq!(verdict.risk_level, RiskLevel::High);
    let excluded: Vec<&str> = verdict
        .excluded_countries
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(excluded, ["GB", "IE"]);
}

/// A product with no category skips the restriction lookup entirely.
#[test]
fn no_category_means_no_exclusions() {
    let engine = engine();
    let store = seeded_store();
    let product = ProductCandidate {
        name_ja: "風呂敷".to_string(),
        ..ProductCandidate::default()
    };
    let verdict = RiskScorer::new(&engine)
        .check_ban_risk(&product, &store, None, "ebay")
        .unwrap();
    assert!(verdict.excluded_countries.is_empty());
}

/// A thin margin alone lands at medium — which still blocks publication.
#[test]
fn low_margin_is_medium_and_unsafe() {
    let engine = engine();
    let store = seeded_store();
    let product = ProductCandidate {
        wholesale_price_jpy: Some(1500),
        ..tenugui()
    };
    let verdict = RiskScorer::new(&engine)
        .check_ban_risk(&product, &store, Some(15.00), "ebay")
        .unwrap();
    assert!(!verdict.safe);
    assert_eq!(verdict.risk_level, RiskLevel::Medium);
    assert_eq!(verdict.issues.len(), 1);
    assert_eq!(verdict.issues[0].kind, IssueType::LowMargin);
}

/// No sale price means no margin check — unknown economics is not an
/// issue, it is an absence of information.
#[test]
fn margin_check_skipped_without_price() {
    let engine = engine();
    let store = seeded_store();
    let product = ProductCandidate {
        wholesale_price_jpy: Some(1500),
        ..tenugui()
    };
    let verdict = RiskScorer::new(&engine)
        .check_ban_risk(&product, &store, None, "ebay")
        .unwrap();
    assert!(verdict.safe);
    assert!(verdict.issues.is_empty());
}

/// Nothing short-circuits: a listing that trips the brand list, the
/// country table, the keyword scan, and the margin check reports all four.
#[test]
fn all_checks_report_together() {
    let engine = engine();
    let store = seeded_store();
    let product = ProductCandidate {
        name_ja: "Shun 包丁".to_string(),
        description_en: Some("replica of the famous design".to_string()),
        category: Some("knife".to_string()),
        wholesale_price_jpy: Some(8000),
        weight_g: Some(300),
        ..ProductCandidate::default()
    };
    let verdict = RiskScorer::new(&engine)
        .check_ban_risk(&product, &store, Some(15.00), "ebay")
        .unwrap();
    assert_eq!(verdict.risk_level, RiskLevel::High);
    let kinds: Vec<IssueType> = verdict.issues.iter().map(|i| i.kind).collect();
    assert!(kinds.contains(&IssueType::BrandBlacklist));
    assert!(kinds.contains(&IssueType::CountryRestriction));
    assert!(kinds.contains(&IssueType::ProhibitedKeyword));
    assert!(kinds.contains(&IssueType::LowMargin));
    assert_eq!(verdict.excluded_countries.len(), 2);
}

/// Operator additions behave exactly like seed rows.
#[test]
fn operator_added_brand_is_enforced() {
    let engine = engine();
    let store = seeded_store();
    store
        .add_denied_brand("Casio", "all", Severity::Medium, Some("watch takedowns"))
        .unwrap();
    let product = ProductCandidate {
        name_ja: "Casio 腕時計".to_string(),
        ..ProductCandidate::default()
    };
    let verdict = RiskScorer::new(&engine)
        .check_ban_risk(&product, &store, None, "ebay")
        .unwrap();
    assert_eq!(verdict.risk_level, RiskLevel::Medium);
    assert!(!verdict.safe);
}

// ── trait seam ───────────────────────────────────────────────────────────

/// Fixed-table reference data, no database.
struct FixedReference {
    brands: Vec<BrandDenyEntry>,
    restrictions: Vec<CountryRestriction>,
}

impl ReferenceData for FixedReference {
    fn denied_brands(&self, text: &str) -> DropshipResult<Vec<BrandDenyEntry>> {
        let lower = text.to_lowercase();
        Ok(self
            .brands
            .iter()
            .filter(|b| lower.contains(&b.brand_name.to_lowercase()))
            .cloned()
            .collect())
    }

    fn country_restrictions(&self, category: &str) -> DropshipResult<Vec<CountryRestriction>> {
        Ok(self
            .restrictions
            .iter()
            .filter(|r| r.category == category)
            .cloned()
            .collect())
    }
}

/// The scorer runs against any [`ReferenceData`] implementation, not just
/// the store.
#[test]
fn scorer_accepts_custom_reference_data() {
    let engine = engine();
    let reference = FixedReference {
        brands: vec![BrandDenyEntry {
            brand_name: "Seiko".to_string(),
            marketplace: "all".to_string(),
            risk_level: Severity::High,
            notes: None,
        }],
        restrictions: vec![CountryRestriction {
            category: "watch".to_string(),
            country_code: "BR".to_string(),
            reason: None,
        }],
    };
    let product = ProductCandidate {
        name_ja: "Seiko 5 自動巻き".to_string(),
        category: Some("watch".to_string()),
        ..ProductCandidate::default()
    };
    let verdict = RiskScorer::new(&engine)
        .check_ban_risk(&product, &reference, None, "ebay")
        .unwrap();
    assert_eq!(verdict.risk_level, RiskLevel::High);
    assert!(verdict.excluded_countries.contains("BR"));
}
