//! Listing publication gate.
//!
//! RULE: nothing gets published without a BAN-risk check, and the
//! verdict's country exclusions are carried onto the listing even when
//! the check passes — a safe listing can still be barred from shipping
//! to some destinations.

use crate::{
    error::{DropshipError, DropshipResult},
    profit::ProfitEngine,
    risk::{ProductCandidate, RiskScorer, RiskVerdict},
    store::{ListingStatus, NewListing, Store},
    types::RecordId,
};

/// Caller-supplied listing content. Price is required — the margin check
/// is part of the gate.
#[derive(Debug, Clone)]
pub struct ListingDraft {
    pub product_id: RecordId,
    pub platform: String,
    pub title_en: String,
    pub description_en: Option<String>,
    pub tags: Vec<String>,
    pub price_usd: f64,
}

/// Publication is refused as a value, not an error — batch publishers
/// continue with the next draft.
#[derive(Debug, Clone)]
pub enum PublishOutcome {
    Published {
        listing_id: RecordId,
        verdict: RiskVerdict,
    },
    Refused {
        verdict: RiskVerdict,
    },
}

pub struct ListingService<'a> {
    store: &'a Store,
    engine: &'a ProfitEngine,
}

impl<'a> ListingService<'a> {
    pub fn new(store: &'a Store, engine: &'a ProfitEngine) -> Self {
        Self { store, engine }
    }

    /// Score the draft's product and either persist an active listing or
    /// refuse. The stored row records the full ban-check outcome
    /// (passed flag, issues, excluded countries).
    pub fn publish(&self, draft: &ListingDraft) -> DropshipResult<PublishOutcome> {
        let product = self
            .store
            .product(draft.product_id)?
            .ok_or(DropshipError::ProductNotFound {
                product_id: draft.product_id,
            })?;

        let candidate = ProductCandidate::from(&product);
        let scorer = RiskScorer::new(self.engine);
        let verdict = scorer.check_ban_risk(
            &candidate,
            self.store,
            Some(draft.price_usd),
            &draft.platform,
        )?;

        if !verdict.safe {
            log::warn!(
                "refusing to publish product {} on {}: risk level {}",
                draft.product_id,
                draft.platform,
                verdict.risk_level
            );
            return Ok(PublishOutcome::Refused { verdict });
        }

        let shipping = self.engine.estimate_shipping(product.weight_g);
        let listing_id = self.store.create_listing(&NewListing {
            product_id: draft.product_id,
            platform: draft.platform.clone(),
            platform_listing_id: None,
            title_en: Some(draft.title_en.clone()),
            description_en: draft.description_en.clone(),
            tags: draft.tags.clone(),
            price_usd: Some(draft.price_usd),
            shipping_cost_usd: Some(shipping.cost_usd),
            status: Some(ListingStatus::Active),
            ban_check_passed: true,
            ban_check_issues: verdict.issues.clone(),
            excluded_countries: verdict.excluded_countries.clone(),
        })?;

        log::info!(
            "published listing {} ({} on {}) at ${:.2}",
            listing_id,
            draft.title_en,
            draft.platform,
            draft.price_usd
        );
        Ok(PublishOutcome::Published {
            listing_id,
            verdict,
        })
    }
}
