//! Seam to the home-automation host.
//!
//! The host owns a keyed snapshot store of entity states and a service
//! bus for remote commands. The card only reads the store and issues
//! service calls; it never writes state directly.

/// In-memory host used by tests and the simulator
pub mod memory;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use memory::MemoryHass;

/// Identifier of a host entity, `<domain>.<object_id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(String);

impl EntityId {
    /// Wrap an entity identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Full identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Part before the first dot.
    pub fn domain(&self) -> &str {
        self.0.split_once('.').map_or("", |(domain, _)| domain)
    }

    /// Part after the first dot.
    pub fn object_id(&self) -> &str {
        self.0.split_once('.').map_or(self.0.as_str(), |(_, object)| object)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Raw state object as published by the host.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityState {
    /// Primary state string, e.g. `playing`.
    pub state: String,

    /// Free-form attributes.
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl EntityState {
    /// State with no attributes.
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            attributes: Map::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// Attribute lookup.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

/// One outbound remote procedure call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceCall {
    /// Service domain, e.g. `media_player`.
    pub domain: String,
    /// Service name, e.g. `media_seek`.
    pub service: String,
    /// Call parameters.
    pub data: Value,
}

impl ServiceCall {
    /// `domain.service` form used in logs.
    pub fn name(&self) -> String {
        format!("{}.{}", self.domain, self.service)
    }
}

/// Errors reported by the host.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HassError {
    /// The host rejected or failed the service call
    #[error("service {domain}.{service} failed: {reason}")]
    ServiceFailed {
        /// Service domain
        domain: String,
        /// Service name
        service: String,
        /// Reason given by the host
        reason: String,
    },

    /// The entity does not exist in the store
    #[error("entity {0} not found")]
    EntityNotFound(EntityId),
}

/// Capabilities the card consumes from the host.
#[async_trait]
pub trait Hass: Send + Sync {
    /// Current snapshot of `entity`, if the store has one.
    fn state(&self, entity: &EntityId) -> Option<EntityState>;

    /// Invoke a service and wait for it to settle.
    ///
    /// # Errors
    ///
    /// Returns `HassError` when the host rejects the call.
    async fn call_service(&self, domain: &str, service: &str, data: Value)
    -> Result<(), HassError>;
}
