//! Profit engine — landed-cost breakdowns and target-margin price
//! suggestion.
//!
//! Money convention: wholesale costs are integer JPY; every USD amount is
//! rounded to 2 decimals at each computation boundary (not just at output)
//! so figures match the operator's reference sheets digit for digit.
//! Margins are rounded to 4 decimals.

use crate::{
    config::EngineConfig,
    error::{DropshipError, DropshipResult},
};
use serde::{Deserialize, Serialize};

/// Default target margin for price suggestion (30%).
pub const DEFAULT_TARGET_MARGIN: f64 = 0.30;

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// Shipping cost resolved for an item weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingEstimate {
    pub method: String,
    pub cost_jpy: i64,
    pub cost_usd: f64,
    /// True when the weight was unknown and the lightest tier was assumed.
    pub assumed: bool,
}

/// Full cost decomposition for one sale. Downstream consumers (CLI, risk
/// scorer, reports) rely on every intermediate, not just `profit_usd`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitBreakdown {
    /// Fee schedule actually applied (after the "ebay" fallback).
    pub marketplace: String,
    pub sale_usd: f64,
    pub wholesale_jpy: i64,
    pub wholesale_usd: f64,
    pub shipping: ShippingEstimate,
    /// Shipping charged to the cost side; differs from `shipping.cost_usd`
    /// only when an override was supplied.
    pub shipping_usd: f64,
    pub final_value_fee_usd: f64,
    pub fixed_payment_fee_usd: f64,
    pub variable_payment_fee_usd: f64,
    pub listing_fee_usd: f64,
    pub total_fees_usd: f64,
    pub total_cost_usd: f64,
    pub profit_usd: f64,
    /// profit / sale, 0.0 when the sale price is zero.
    pub profit_margin: f64,
    pub profitable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSuggestion {
    pub suggested_price_usd: f64,
    pub target_margin: f64,
    /// Verification run of `calculate_profit` at the suggested price.
    pub breakdown: ProfitBreakdown,
}

pub struct ProfitEngine {
    config: EngineConfig,
}

impl ProfitEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Estimate shipping from item weight.
    ///
    /// Unknown weight assumes the lightest tier (light goods dominate the
    /// catalog) and is labeled as an assumption — it never collapses to a
    /// zero weight. Items heavier than every tier get the flat
    /// excess-weight fallback.
    pub fn estimate_shipping(&self, weight_g: Option<u32>) -> ShippingEstimate {
        let Some(weight) = weight_g else {
            if let Some(tier) = self.config.shipping_tiers.first() {
                return ShippingEstimate {
                    method: format!("{} (assumed)", tier.method),
                    cost_jpy: tier.cost_jpy,
                    cost_usd: tier.cost_usd,
                    assumed: true,
                };
            }
            return self.excess_weight_estimate();
        };

        for tier in &self.config.shipping_tiers {
            if weight <= tier.max_weight_g {
                return ShippingEstimate {
                    method: tier.method.clone(),
                    cost_jpy: tier.cost_jpy,
                    cost_usd: tier.cost_usd,
                    assumed: false,
                };
            }
        }

        self.excess_weight_estimate()
    }

    fn excess_weight_estimate(&self) -> ShippingEstimate {
        let cost_jpy = self.config.excess_weight_cost_jpy;
        ShippingEstimate {
            method: self.config.excess_weight_method.clone(),
            cost_jpy,
            cost_usd: round2(cost_jpy as f64 / self.config.usd_jpy_rate),
            assumed: false,
        }
    }

    /// Compute the full landed-cost breakdown for one sale.
    ///
    /// Errs only on truly invalid arguments (negative or non-finite sale
    /// price). Business conditions — excess weight, zero price, thin
    /// margin — are ordinary fields of the breakdown.
    pub fn calculate_profit(
        &self,
        wholesale_jpy: i64,
        sale_usd: f64,
        weight_g: Option<u32>,
        shipping_override_usd: Option<f64>,
        marketplace: &str,
    ) -> DropshipResult<ProfitBreakdown> {
        if sale_usd < 0.0 || !sale_usd.is_finite() {
            return Err(DropshipError::InvalidSalePrice { price: sale_usd });
        }

        let (resolved, fees) = self.config.resolve_fee_model(marketplace);

        let wholesale_usd = round2(wholesale_jpy as f64 / self.config.usd_jpy_rate);

        let shipping = self.estimate_shipping(weight_g);
        let shipping_usd = shipping_override_usd.unwrap_or(shipping.cost_usd);

        let final_value_fee = round2(sale_usd * fees.final_value_fee_rate);
        let variable_payment_fee = round2(sale_usd * fees.variable_payment_fee_rate);
        let total_fees = round2(
            final_value_fee
                + fees.fixed_payment_fee_usd
                + variable_payment_fee
                + fees.listing_fee_usd,
        );

        let total_cost = round2(wholesale_usd + shipping_usd + total_fees);
        let profit = round2(sale_usd - total_cost);
        let margin = if sale_usd > 0.0 {
            round4(profit / sale_usd)
        } else {
            0.0
        };

        Ok(ProfitBreakdown {
            marketplace: resolved.to_string(),
            sale_usd,
            wholesale_jpy,
            wholesale_usd,
            shipping,
            shipping_usd,
            final_value_fee_usd: final_value_fee,
            fixed_payment_fee_usd: fees.fixed_payment_fee_usd,
            variable_payment_fee_usd: variable_payment_fee,
            listing_fee_usd: fees.listing_fee_usd,
            total_fees_usd: total_fees,
            total_cost_usd: total_cost,
            profit_usd: profit,
            profit_margin: margin,
            profitable: margin >= self.config.profitable_margin,
        })
    }

    /// Invert the profit formula: the price at which `target_margin` is
    /// reached, derived analytically.
    ///
    ///   price × (1 − fee_rate − margin) = wholesale + shipping + fixed fees
    ///
    /// Errs with [`DropshipError::InfeasibleMargin`] when the percentage
    /// fees plus the target margin reach 100% — there is no finite price.
    /// The result embeds a verification breakdown computed at the
    /// suggested price.
    pub fn suggest_price(
        &self,
        wholesale_jpy: i64,
        weight_g: Option<u32>,
        target_margin: f64,
        marketplace: &str,
    ) -> DropshipResult<PriceSuggestion> {
        let (resolved, fees) = self.config.resolve_fee_model(marketplace);

        let total_fee_rate = fees.final_value_fee_rate + fees.variable_payment_fee_rate;
        let denominator = 1.0 - total_fee_rate - target_margin;
        if denominator <= 0.0 {
            return Err(DropshipError::InfeasibleMargin {
                target_margin,
                fee_rate: total_fee_rate,
            });
        }

        let wholesale_usd = wholesale_jpy as f64 / self.config.usd_jpy_rate;
        let shipping = self.estimate_shipping(weight_g);
        let fixed_costs = wholesale_usd
            + shipping.cost_usd
            + fees.fixed_payment_fee_usd
            + fees.listing_fee_usd;
        let suggested = round2(fixed_costs / denominator);

        let breakdown =
            self.calculate_profit(wholesale_jpy, suggested, weight_g, None, resolved)?;
        log::debug!(
            "suggest_price: wholesale {wholesale_jpy} JPY, target {:.1}% on {resolved} \
             -> ${suggested:.2} (verified margin {:.1}%)",
            target_margin * 100.0,
            breakdown.profit_margin * 100.0
        );

        Ok(PriceSuggestion {
            suggested_price_usd: suggested,
            target_margin,
            breakdown,
        })
    }
}
