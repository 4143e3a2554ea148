//! # Discovery Reconciliation
//!
//! Pulls deployment facts from provider discovery sources and merges them
//! into the durable deployment catalog by natural key. Discovery sources are
//! re-run repeatedly, so the merge must converge: the same facts always map
//! onto the same rows, updates happen in place, and duplicates are never
//! created.

pub mod reconciler;

pub use reconciler::{DiscoveryReconciler, ReconciliationReport};
