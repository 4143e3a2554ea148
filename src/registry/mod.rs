//! # Component Registries
//!
//! Runtime registries resolved once at startup. The adapter registry maps a
//! provider's internal name to its [`ProviderAdapter`](crate::providers::ProviderAdapter)
//! implementation, so adding a provider family is a pure-addition change
//! rather than a growing conditional chain.

pub mod adapter_registry;

pub use adapter_registry::AdapterRegistry;
