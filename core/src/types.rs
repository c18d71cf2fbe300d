//! Shared primitive types used across the entire crate.

/// ISO 3166-1 alpha-2 country code (e.g. "GB").
pub type CountryCode = String;

/// SQLite rowid of a persisted entity.
pub type RecordId = i64;
