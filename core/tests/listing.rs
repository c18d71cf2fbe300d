//! Publication gate tests: every publish runs the BAN-risk check, and a
//! refused draft leaves no trace in the listings table.

use dropship_core::{
    config::EngineConfig,
    error::DropshipError,
    listing::{ListingDraft, ListingService, PublishOutcome},
    profit::ProfitEngine,
    risk::RiskLevel,
    store::{ListingStatus, NewProduct, Store},
};

fn setup() -> (Store, ProfitEngine) {
    let store = Store::in_memory().unwrap();
    store.migrate().unwrap();
    store.seed_reference_data().unwrap();
    (store, ProfitEngine::new(EngineConfig::default()))
}

fn draft(product_id: i64, price_usd: f64) -> ListingDraft {
    ListingDraft {
        product_id,
        platform: "ebay".to_string(),
        title_en: "Japanese Tenugui Towel Mt Fuji".to_string(),
        description_en: Some("Traditional cotton hand towel from Japan".to_string()),
        tags: vec!["japan".to_string(), "tenugui".to_string()],
        price_usd,
    }
}

/// Safe product publishes active, with the verdict recorded on the row
/// and the tier shipping estimate filled in.
#[test]
fn safe_draft_publishes_active() {
    let (store, engine) = setup();
    let product_id = store
        .upsert_product(&NewProduct {
            supplier: "rakuten".to_string(),
            supplier_product_id: "rk-1001".to_string(),
            name_ja: "手ぬぐい 富士山柄".to_string(),
            category: Some("tenugui".to_string()),
            wholesale_price_jpy: Some(300),
            weight_g: Some(50),
            ..NewProduct::default()
        })
        .unwrap();

    let service = ListingService::new(&store, &engine);
    let outcome = service.publish(&draft(product_id, 15.00)).unwrap();

    let PublishOutcome::Published { listing_id, verdict } = outcome else {
        panic!("expected publication");
    };
    assert!(verdict.safe);

    let row = store.listing(listing_id).unwrap().unwrap();
    assert_eq!(row.status, ListingStatus::Active);
    assert!(row.ban_check_passed);
    assert!(row.ban_check_issues.is_empty());
    assert_eq!(row.price_usd, Some(15.00));
    assert_eq!(row.shipping_cost_usd, Some(3.87));
}

/// A deny-listed brand in a restricted category is refused, and nothing
/// is written.
#[test]
fn risky_draft_is_refused_without_a_row() {
    let (store, engine) = setup();
    let product_id = store
        .upsert_product(&NewProduct {
            supplier: "rakuten".to_string(),
            supplier_product_id: "rk-9001".to_string(),
            name_ja: "Shun Classic 三徳包丁".to_string(),
            category: Some("knife".to_string()),
            wholesale_price_jpy: Some(8000),
            weight_g: Some(300),
            ..NewProduct::default()
        })
        .unwrap();

    let service = ListingService::new(&store, &engine);
    let outcome = service.publish(&draft(product_id, 95.00)).unwrap();

    let PublishOutcome::Refused { verdict } = outcome else {
        panic!("expected refusal");
    };
    assert_eq!(verdict.risk_level, RiskLevel::High);
    assert!(verdict.excluded_countries.contains("GB"));

    assert!(store
        .listings_by_status(ListingStatus::Active, None)
        .unwrap()
        .is_empty());
    assert!(store
        .listings_by_status(ListingStatus::Draft, None)
        .unwrap()
        .is_empty());
}

/// A clean product priced too low to clear the margin floor is refused
/// too — the gate covers economics, not just compliance.
#[test]
fn thin_margin_draft_is_refused() {
    let (store, engine) = setup();
    let product_id = store
        .upsert_product(&NewProduct {
            supplier: "rakuten".to_string(),
            supplier_product_id: "rk-1002".to_string(),
            name_ja: "手ぬぐい 波柄".to_string(),
            category: Some("tenugui".to_string()),
            wholesale_price_jpy: Some(1500),
            weight_g: Some(50),
            ..NewProduct::default()
        })
        .unwrap();

    let service = ListingService::new(&store, &engine);
    let outcome = service.publish(&draft(product_id, 15.00)).unwrap();
    let PublishOutcome::Refused { verdict } = outcome else {
        panic!("expected refusal");
    };
    assert_eq!(verdict.risk_level, RiskLevel::Medium);
}

/// Unknown product id is a caller error, not a refusal.
#[test]
fn unknown_product_is_an_error() {
    let (store, engine) = setup();
    let service = ListingService::new(&store, &engine);
    let err = service.publish(&draft(777, 15.00)).unwrap_err();
    assert!(matches!(
        err,
        DropshipError::ProductNotFound { product_id: 777 }
    ));
}
