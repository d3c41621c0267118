//! Adapters module - per-broker export descriptions and their registry.

mod adapter_registry;
mod adapters_model;

pub use adapter_registry::AdapterRegistry;
pub use adapters_model::{AdapterTable, BrokerAdapterConfig, DecimalStyle, SourceKind};
