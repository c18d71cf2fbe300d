//! Engine configuration — exchange rate, shipping tiers, and marketplace
//! fee models.
//!
//! Everything here is injected into [`crate::profit::ProfitEngine`] at
//! construction. Nothing in the crate reads module-level mutable state, so
//! tests can substitute alternate fee schedules or exchange rates without
//! touching globals.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Marketplace used when an unrecognized identifier is requested.
pub const FALLBACK_MARKETPLACE: &str = "ebay";

/// eBay reference fee model: 13.25% Final Value Fee + $0.30 per-order
/// payment fee. Last resort when a config carries no usable fee table.
const EBAY_REFERENCE_FEES: FeeModel = FeeModel {
    final_value_fee_rate: 0.1325,
    fixed_payment_fee_usd: 0.30,
    variable_payment_fee_rate: 0.0,
    listing_fee_usd: 0.0,
};

/// One Japan Post shipping tier (Japan → US).
///
/// Tiers are evaluated in ascending max-weight order; the first tier whose
/// limit covers the item wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingTier {
    pub max_weight_g: u32,
    pub method: String,
    pub cost_jpy: i64,
    pub cost_usd: f64,
}

/// Per-marketplace fee model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeModel {
    /// Percentage commission on the completed sale (eBay FVF, Etsy
    /// transaction fee).
    pub final_value_fee_rate: f64,
    /// Flat per-order payment processing fee in USD.
    pub fixed_payment_fee_usd: f64,
    /// Percentage payment processing fee on the sale price.
    pub variable_payment_fee_rate: f64,
    /// Flat per-listing fee in USD (Etsy's $0.20).
    pub listing_fee_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fixed JPY per USD conversion rate.
    pub usd_jpy_rate: f64,
    /// Ordered by ascending `max_weight_g`.
    pub shipping_tiers: Vec<ShippingTier>,
    /// Flat fallback for items heavier than the last tier.
    pub excess_weight_cost_jpy: i64,
    pub excess_weight_method: String,
    /// Keyed by marketplace identifier ("ebay", "etsy", "base").
    pub fee_models: HashMap<String, FeeModel>,
    /// Minimum margin for a listing to count as profitable.
    pub profitable_margin: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut fee_models = HashMap::new();
        fee_models.insert("ebay".to_string(), EBAY_REFERENCE_FEES);
        fee_models.insert(
            "etsy".to_string(),
            FeeModel {
                final_value_fee_rate: 0.065,
                fixed_payment_fee_usd: 0.25,
                variable_payment_fee_rate: 0.03,
                listing_fee_usd: 0.20,
            },
        );
        fee_models.insert(
            "base".to_string(),
            FeeModel {
                final_value_fee_rate: 0.036,
                fixed_payment_fee_usd: 0.0,
                variable_payment_fee_rate: 0.0,
                listing_fee_usd: 0.0,
            },
        );

        Self {
            usd_jpy_rate: 150.0,
            shipping_tiers: vec![
                ShippingTier {
                    max_weight_g: 50,
                    method: "ePacket Lite".to_string(),
                    cost_jpy: 580,
                    cost_usd: 3.87,
                },
                ShippingTier {
                    max_weight_g: 300,
                    method: "EMS".to_string(),
                    cost_jpy: 3600,
                    cost_usd: 24.00,
                },
                ShippingTier {
                    max_weight_g: 2000,
                    method: "EMS".to_string(),
                    cost_jpy: 5000,
                    cost_usd: 33.33,
                },
            ],
            excess_weight_cost_jpy: 8000,
            excess_weight_method: "EMS (excess weight)".to_string(),
            fee_models,
            profitable_margin: 0.25,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> crate::error::DropshipResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolve the fee model for a marketplace, falling back to "ebay" for
    /// unknown identifiers. Returns the resolved identifier alongside the
    /// model so breakdowns can report which schedule was applied.
    pub fn resolve_fee_model<'a>(&'a self, marketplace: &'a str) -> (&'a str, &'a FeeModel) {
        if let Some(model) = self.fee_models.get(marketplace) {
            return (marketplace, model);
        }
        match self.fee_models.get(FALLBACK_MARKETPLACE) {
            Some(model) => (FALLBACK_MARKETPLACE, model),
            None => (FALLBACK_MARKETPLACE, &EBAY_REFERENCE_FEES),
        }
    }
}
