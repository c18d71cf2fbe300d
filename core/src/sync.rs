//! Inventory sync and order ingestion.
//!
//! Both engines are stateless: they read the store, call the marketplace
//! clients, and write back — built to run from a cron loop. Per-item
//! failures are collected into the run's error list; a single bad listing
//! never aborts a sweep. Every run is bracketed by a sync_log record.
//!
//! Marketplace clients and the notifier are traits so the engines stay
//! testable with in-memory fakes; the HTTP adapters live outside this
//! crate.

use crate::{
    error::DropshipResult,
    profit::ProfitEngine,
    store::{ListingStatus, NewOrder, StockStatus, Store, SyncKind},
    types::RecordId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ── External seams ───────────────────────────────────────────────────────

/// One order as reported by a marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformOrder {
    pub platform_order_id: String,
    pub buyer_country: Option<String>,
    pub sale_price_usd: f64,
    pub platform_fees_usd: Option<f64>,
    pub shipping_cost_usd: Option<f64>,
    pub ordered_at: DateTime<Utc>,
    pub items: Vec<PlatformOrderItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformOrderItem {
    pub platform_listing_id: String,
    pub title: String,
}

/// The marketplace operations the sync engines need.
pub trait MarketplaceClient {
    /// Unpublish a listing on the marketplace (stock ran out).
    fn deactivate_listing(&self, platform_listing_id: &str) -> DropshipResult<()>;

    /// Republish a paused listing (stock came back).
    fn activate_listing(&self, platform_listing_id: &str) -> DropshipResult<()>;

    /// Orders placed since `since` (all available orders when None).
    fn fetch_orders(&self, since: Option<DateTime<Utc>>) -> DropshipResult<Vec<PlatformOrder>>;
}

/// Outbound notifications. Failures are logged by the engines and never
/// fail a run.
pub trait Notifier {
    fn notify_order(&self, note: &OrderNotification) -> DropshipResult<()>;
    fn notify_stock_changes(&self, changes: &[StockChange]) -> DropshipResult<()>;
    fn notify_error(&self, context: &str, message: &str) -> DropshipResult<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderNotification {
    pub platform: String,
    pub platform_order_id: String,
    pub product_name: String,
    pub sale_price_usd: f64,
    pub profit_usd: f64,
    pub buyer_country: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StockAction {
    Deactivated,
    Reactivated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockChange {
    pub listing_id: RecordId,
    pub platform: String,
    pub product_name: String,
    pub action: StockAction,
}

/// Notifier that routes everything through the log. Stands in when no
/// push channel is configured.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_order(&self, note: &OrderNotification) -> DropshipResult<()> {
        log::info!(
            "[order] {} on {}: {} ${:.2} (profit ${:.2}) -> {}",
            note.platform_order_id,
            note.platform,
            note.product_name,
            note.sale_price_usd,
            note.profit_usd,
            note.buyer_country
        );
        Ok(())
    }

    fn notify_stock_changes(&self, changes: &[StockChange]) -> DropshipResult<()> {
        for change in changes {
            log::info!(
                "[stock] listing {} ({}) {:?}: {}",
                change.listing_id,
                change.platform,
                change.action,
                change.product_name
            );
        }
        Ok(())
    }

    fn notify_error(&self, context: &str, message: &str) -> DropshipResult<()> {
        log::error!("[{context}] {message}");
        Ok(())
    }
}

// ── Inventory sync ───────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct SyncOutcome {
    pub sync_log_id: RecordId,
    pub items_checked: usize,
    pub items_changed: usize,
    pub deactivated: Vec<StockChange>,
    pub reactivated: Vec<StockChange>,
    pub errors: Vec<String>,
}

pub struct InventorySync<'a> {
    store: &'a Store,
    clients: &'a HashMap<String, Box<dyn MarketplaceClient>>,
    notifier: Option<&'a dyn Notifier>,
}

impl<'a> InventorySync<'a> {
    pub fn new(
        store: &'a Store,
        clients: &'a HashMap<String, Box<dyn MarketplaceClient>>,
        notifier: Option<&'a dyn Notifier>,
    ) -> Self {
        Self {
            store,
            clients,
            notifier,
        }
    }

    /// One sweep: pause active listings whose product ran out of stock,
    /// reactivate paused listings whose product came back. A run-level
    /// failure is recorded as a failed sync before it propagates — the
    /// sync_log row is never left at 'running'.
    pub fn sync(&self, platform: Option<&str>) -> DropshipResult<SyncOutcome> {
        let sync_log_id = self.store.start_sync(SyncKind::Inventory, platform.unwrap_or("all"))?;
        let mut outcome = SyncOutcome {
            sync_log_id,
            ..SyncOutcome::default()
        };

        if let Err(e) = self.sweep(platform, &mut outcome) {
            log::error!("inventory sync failed: {e}");
            outcome.errors.push(e.to_string());
            self.store.complete_sync(
                sync_log_id,
                outcome.items_checked,
                outcome.items_changed,
                &outcome.errors,
                false,
            )?;
            return Err(e);
        }

        self.store.complete_sync(
            sync_log_id,
            outcome.items_checked,
            outcome.items_changed,
            &outcome.errors,
            true,
        )?;

        self.notify(&outcome);
        Ok(outcome)
    }

    fn sweep(&self, platform: Option<&str>, outcome: &mut SyncOutcome) -> DropshipResult<()> {
        let active = self.store.active_listings_with_products(platform)?;
        outcome.items_checked = active.len();

        for listing in &active {
            if let Err(e) = self.pause_if_out_of_stock(listing, outcome) {
                let msg = format!("sync error (listing={}): {e}", listing.listing_id);
                log::error!("{msg}");
                outcome.errors.push(msg);
            }
        }

        let paused = self.store.listings_by_status(ListingStatus::Paused, platform)?;
        for listing in &paused {
            if let Err(e) = self.reactivate_if_restocked(listing, outcome) {
                let msg = format!("reactivation error (listing={}): {e}", listing.id);
                log::error!("{msg}");
                outcome.errors.push(msg);
            }
        }
        Ok(())
    }

    fn pause_if_out_of_stock(
        &self,
        listing: &crate::store::ActiveListing,
        outcome: &mut SyncOutcome,
    ) -> DropshipResult<()> {
        let Some(platform_listing_id) = listing.platform_listing_id.as_deref() else {
            return Ok(());
        };
        let Some(client) = self.clients.get(&listing.platform) else {
            return Ok(());
        };
        if matches!(
            listing.stock_status,
            StockStatus::OutOfStock | StockStatus::Discontinued
        ) {
            client.deactivate_listing(platform_listing_id)?;
            self.store
                .set_listing_status(listing.listing_id, ListingStatus::Paused)?;
            outcome.items_changed += 1;
            outcome.deactivated.push(StockChange {
                listing_id: listing.listing_id,
                platform: listing.platform.clone(),
                product_name: listing.name_ja.clone(),
                action: StockAction::Deactivated,
            });
            log::info!("paused: {} ({})", listing.name_ja, listing.platform);
        }
        Ok(())
    }

    fn reactivate_if_restocked(
        &self,
        listing: &crate::store::ListingRecord,
        outcome: &mut SyncOutcome,
    ) -> DropshipResult<()> {
        let Some(platform_listing_id) = listing.platform_listing_id.as_deref() else {
            return Ok(());
        };
        let Some(client) = self.clients.get(&listing.platform) else {
            return Ok(());
        };
        let Some(product) = self.store.product(listing.product_id)? else {
            return Ok(());
        };
        if product.stock_status == StockStatus::InStock {
            client.activate_listing(platform_listing_id)?;
            self.store
                .set_listing_status(listing.id, ListingStatus::Active)?;
            outcome.items_changed += 1;
            outcome.reactivated.push(StockChange {
                listing_id: listing.id,
                platform: listing.platform.clone(),
                product_name: product.name_ja.clone(),
                action: StockAction::Reactivated,
            });
            log::info!("reactivated: {} ({})", product.name_ja, listing.platform);
        }
        Ok(())
    }

    fn notify(&self, outcome: &SyncOutcome) {
        let Some(notifier) = self.notifier else {
            return;
        };
        let changes: Vec<StockChange> = outcome
            .deactivated
            .iter()
            .chain(outcome.reactivated.iter())
            .cloned()
            .collect();
        if !changes.is_empty() {
            if let Err(e) = notifier.notify_stock_changes(&changes) {
                log::error!("stock notification failed: {e}");
            }
        }
        if let Some(first) = outcome.errors.first() {
            let message = format!("{} error(s): {first}", outcome.errors.len());
            if let Err(e) = notifier.notify_error("INVENTORY_SYNC", &message) {
                log::error!("error notification failed: {e}");
            }
        }
    }
}

// ── Order ingestion ──────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct OrderOutcome {
    pub sync_log_id: RecordId,
    pub new_orders: usize,
    pub total_revenue_usd: f64,
    pub total_profit_usd: f64,
    pub errors: Vec<String>,
}

pub struct OrderProcessor<'a> {
    store: &'a Store,
    engine: &'a ProfitEngine,
    clients: &'a HashMap<String, Box<dyn MarketplaceClient>>,
    notifier: Option<&'a dyn Notifier>,
}

impl<'a> OrderProcessor<'a> {
    pub fn new(
        store: &'a Store,
        engine: &'a ProfitEngine,
        clients: &'a HashMap<String, Box<dyn MarketplaceClient>>,
        notifier: Option<&'a dyn Notifier>,
    ) -> Self {
        Self {
            store,
            engine,
            clients,
            notifier,
        }
    }

    /// Pull new orders from every client (or one platform), record them
    /// idempotently, and compute realized profit where the wholesale cost
    /// is known. As with the inventory sweep, a run-level failure closes
    /// the sync_log record as failed before propagating.
    pub fn process(
        &self,
        platform: Option<&str>,
        since: Option<DateTime<Utc>>,
    ) -> DropshipResult<OrderOutcome> {
        let sync_log_id = self.store.start_sync(SyncKind::Orders, platform.unwrap_or("all"))?;
        let mut outcome = OrderOutcome {
            sync_log_id,
            ..OrderOutcome::default()
        };

        if let Err(e) = self.ingest(platform, since, &mut outcome) {
            log::error!("order ingestion failed: {e}");
            outcome.errors.push(e.to_string());
            self.store.complete_sync(
                sync_log_id,
                outcome.new_orders,
                outcome.new_orders,
                &outcome.errors,
                false,
            )?;
            return Err(e);
        }

        self.store.complete_sync(
            sync_log_id,
            outcome.new_orders,
            outcome.new_orders,
            &outcome.errors,
            true,
        )?;
        Ok(outcome)
    }

    fn ingest(
        &self,
        platform: Option<&str>,
        since: Option<DateTime<Utc>>,
        outcome: &mut OrderOutcome,
    ) -> DropshipResult<()> {
        for (name, client) in self.clients {
            if platform.is_some_and(|p| p != name) {
                continue;
            }
            match client.fetch_orders(since) {
                Ok(orders) => {
                    for order in orders {
                        if let Err(e) = self.record_order(name, &order, outcome) {
                            let msg = format!(
                                "order error ({name}/{}): {e}",
                                order.platform_order_id
                            );
                            log::error!("{msg}");
                            outcome.errors.push(msg);
                        }
                    }
                }
                Err(e) => {
                    let msg = format!("order fetch error ({name}): {e}");
                    log::error!("{msg}");
                    outcome.errors.push(msg);
                }
            }
        }
        Ok(())
    }

    fn record_order(
        &self,
        platform: &str,
        order: &PlatformOrder,
        outcome: &mut OrderOutcome,
    ) -> DropshipResult<()> {
        // Already recorded in an earlier run.
        if self
            .store
            .order_by_platform_id(platform, &order.platform_order_id)?
            .is_some()
        {
            return Ok(());
        }

        // Link back to our listing and product through the line items.
        let mut listing = None;
        let mut product = None;
        for item in &order.items {
            if let Some(found) = self
                .store
                .listing_by_platform_id(platform, &item.platform_listing_id)?
            {
                product = self.store.product(found.product_id)?;
                listing = Some(found);
                break;
            }
        }

        let mut profit_usd = 0.0;
        let mut wholesale_cost_jpy = None;
        if let Some(product) = &product {
            if let Some(wholesale) = product.wholesale_price_jpy {
                wholesale_cost_jpy = Some(wholesale);
                let breakdown = self.engine.calculate_profit(
                    wholesale,
                    order.sale_price_usd,
                    product.weight_g,
                    None,
                    platform,
                )?;
                profit_usd = breakdown.profit_usd;
            }
        }

        self.store.create_order(&NewOrder {
            listing_id: listing.as_ref().map(|l| l.id),
            platform: platform.to_string(),
            platform_order_id: order.platform_order_id.clone(),
            buyer_country: order.buyer_country.clone(),
            sale_price_usd: order.sale_price_usd,
            platform_fees_usd: order.platform_fees_usd,
            shipping_cost_usd: order.shipping_cost_usd,
            wholesale_cost_jpy,
            profit_usd: Some(profit_usd),
            ordered_at: order.ordered_at,
        })?;

        if let Some(listing) = &listing {
            self.store.bump_listing_sales(listing.id)?;
        }

        outcome.new_orders += 1;
        outcome.total_revenue_usd += order.sale_price_usd;
        outcome.total_profit_usd += profit_usd;

        if let Some(notifier) = self.notifier {
            let product_name = product
                .as_ref()
                .map(|p| p.name_ja.clone())
                .or_else(|| order.items.first().map(|i| i.title.clone()))
                .unwrap_or_default();
            let note = OrderNotification {
                platform: platform.to_string(),
                platform_order_id: order.platform_order_id.clone(),
                product_name,
                sale_price_usd: order.sale_price_usd,
                profit_usd,
                buyer_country: order
                    .buyer_country
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string()),
            };
            if let Err(e) = notifier.notify_order(&note) {
                log::error!("order notification failed: {e}");
            }
        }

        log::info!(
            "new order: {} ({platform}) ${:.2}",
            order.platform_order_id,
            order.sale_price_usd
        );
        Ok(())
    }
}
