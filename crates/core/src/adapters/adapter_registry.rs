//! Broker adapter registry.
//!
//! The built-in table is loaded from `brokers.json` at compile time via
//! `include_str!` and parsed once via `lazy_static`. The registry is immutable
//! after construction and shared read-only between pipeline invocations.

use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use log::debug;

use super::adapters_model::{AdapterTable, BrokerAdapterConfig};
use crate::constants::ADAPTER_TABLE_VERSION;
use crate::errors::{Error, Result};

lazy_static! {
    static ref BUILTIN: Arc<AdapterRegistry> = Arc::new(
        AdapterRegistry::from_json(include_str!("brokers.json"))
            .expect("brokers.json must be a valid adapter table")
    );
}

/// Lookup table from broker identifier to adapter.
#[derive(Debug, Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, BrokerAdapterConfig>,
}

impl AdapterRegistry {
    /// The adapter table shipped with this build.
    pub fn builtin() -> Arc<AdapterRegistry> {
        Arc::clone(&BUILTIN)
    }

    /// Builds a registry, rejecting duplicate broker ids and invalid adapters.
    pub fn from_configs(configs: Vec<BrokerAdapterConfig>) -> Result<Self> {
        let mut adapters = HashMap::with_capacity(configs.len());
        for config in configs {
            config.validate().map_err(Error::Configuration)?;
            let broker_id = config.broker_id.trim().to_string();
            if adapters.contains_key(&broker_id) {
                return Err(Error::Configuration(format!(
                    "Duplicate adapter for broker '{}'",
                    broker_id
                )));
            }
            adapters.insert(broker_id, config);
        }
        debug!("Adapter registry built with {} brokers", adapters.len());
        Ok(Self { adapters })
    }

    /// Parses a versioned adapter table.
    pub fn from_json(json: &str) -> Result<Self> {
        let table: AdapterTable = serde_json::from_str(json)?;
        if table.version != ADAPTER_TABLE_VERSION {
            return Err(Error::Configuration(format!(
                "Unsupported adapter table version {} (expected {})",
                table.version, ADAPTER_TABLE_VERSION
            )));
        }
        Self::from_configs(table.adapters)
    }

    /// Resolves the adapter for a broker.
    pub fn lookup(&self, broker_id: &str) -> Result<&BrokerAdapterConfig> {
        self.adapters
            .get(broker_id.trim())
            .ok_or_else(|| Error::UnknownBroker(broker_id.to_string()))
    }

    pub fn contains(&self, broker_id: &str) -> bool {
        self.adapters.contains_key(broker_id.trim())
    }

    /// Registered broker ids, sorted.
    pub fn broker_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
