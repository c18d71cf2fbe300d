//! dropship-core — the business core of a small drop-shipping operation
//! selling Japanese wholesale goods on overseas marketplaces.
//!
//! Two engines sit at the center:
//!   - [`profit::ProfitEngine`] — landed-cost breakdowns (wholesale JPY →
//!     sale USD) and target-margin price suggestion
//!   - [`risk::RiskScorer`] — rule-based BAN-risk screening against the
//!     brand deny-list, prohibited keywords, and country restrictions
//!
//! Both are pure functions of their inputs plus injected configuration and
//! reference data. Around them: the SQLite [`store::Store`] (products,
//! listings, orders, reference tables), the [`listing`] publish gate, and
//! the [`sync`] engines for inventory and order ingestion.

pub mod config;
pub mod error;
pub mod listing;
pub mod profit;
pub mod risk;
pub mod store;
pub mod sync;
pub mod types;
