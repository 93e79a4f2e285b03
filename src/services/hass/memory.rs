use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{EntityId, EntityState, Hass, HassError, ServiceCall};

#[derive(Debug, Clone, Copy)]
enum Failure {
    Always,
    Times(usize),
}

/// Host double holding states in memory and recording every call.
///
/// With echo enabled, media player services are reflected back into
/// the target entity's state the way a real backend would report them.
#[derive(Debug, Default)]
pub struct MemoryHass {
    states: RwLock<HashMap<EntityId, EntityState>>,
    calls: Mutex<Vec<ServiceCall>>,
    failures: Mutex<HashMap<String, Failure>>,
    latency: Mutex<Option<Duration>>,
    echo: bool,
}

impl MemoryHass {
    /// Empty store that only records calls.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty store that reflects media player commands into state.
    pub fn with_echo() -> Self {
        Self {
            echo: true,
            ..Self::default()
        }
    }

    /// Insert or replace an entity state.
    pub fn set_state(&self, entity: impl Into<EntityId>, state: EntityState) {
        self.states
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entity.into(), state);
    }

    /// Remove an entity from the store.
    pub fn remove_state(&self, entity: &EntityId) {
        self.states
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(entity);
    }

    /// Every call issued so far, in order.
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Calls to a single service name, in order.
    pub fn calls_to(&self, service: &str) -> Vec<ServiceCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.service == service)
            .collect()
    }

    /// Service names issued so far, in order.
    pub fn service_names(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.service).collect()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Make every call to `domain.service` fail.
    pub fn fail(&self, domain: &str, service: &str) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(format!("{domain}.{service}"), Failure::Always);
    }

    /// Make the next `times` calls to `domain.service` fail.
    pub fn fail_times(&self, domain: &str, service: &str, times: usize) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(format!("{domain}.{service}"), Failure::Times(times));
    }

    /// Delay every call by `latency` before it settles.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner) = latency;
    }

    fn take_failure(&self, name: &str) -> bool {
        let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        match failures.get_mut(name) {
            Some(Failure::Always) => true,
            Some(Failure::Times(remaining)) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }

    fn reflect(&self, call: &ServiceCall) {
        let Some(entity) = call.data.get("entity_id").and_then(Value::as_str) else {
            return;
        };
        let entity = EntityId::new(entity);

        let mut states = self.states.write().unwrap_or_else(PoisonError::into_inner);
        let queue = states
            .get(&EntityId::new(format!("sensor.{}_queue", entity.object_id())))
            .and_then(|queue| queue.attribute("items"))
            .and_then(Value::as_array)
            .cloned();
        let Some(state) = states.get_mut(&entity) else {
            return;
        };

        let param = |key: &str| call.data.get(key).cloned().unwrap_or(Value::Null);
        match call.service.as_str() {
            "media_play" => state.state = "playing".to_string(),
            "media_pause" => state.state = "paused".to_string(),
            "media_seek" => {
                state.attributes.insert("media_position".into(), param("seek_position"));
            }
            "volume_set" => {
                state.attributes.insert("volume_level".into(), param("volume_level"));
            }
            "volume_mute" => {
                state.attributes.insert("is_volume_muted".into(), param("is_volume_muted"));
            }
            "shuffle_set" => {
                state.attributes.insert("shuffle".into(), param("shuffle"));
            }
            "repeat_set" => {
                state.attributes.insert("repeat".into(), param("repeat"));
            }
            "media_next_track" | "media_previous_track" => {
                let current = state
                    .attribute("queue_position")
                    .and_then(Value::as_i64)
                    .unwrap_or(1);
                let position = if call.service == "media_next_track" {
                    current + 1
                } else {
                    (current - 1).max(1)
                };
                state.attributes.insert("queue_position".into(), position.into());
                state.attributes.insert("media_position".into(), 0.into());

                let item = usize::try_from(position - 1)
                    .ok()
                    .and_then(|index| queue.as_ref()?.get(index).cloned());
                if let Some(item) = item {
                    for (from, to) in [("title", "media_title"), ("artist", "media_artist")] {
                        if let Some(value) = item.get(from) {
                            state.attributes.insert(to.into(), value.clone());
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

#[async_trait]
impl Hass for MemoryHass {
    fn state(&self, entity: &EntityId) -> Option<EntityState> {
        self.states
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity)
            .cloned()
    }

    async fn call_service(
        &self,
        domain: &str,
        service: &str,
        data: Value,
    ) -> Result<(), HassError> {
        let call = ServiceCall {
            domain: domain.to_string(),
            service: service.to_string(),
            data,
        };
        debug!(service = %call.name(), data = %call.data, "memory host received call");
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call.clone());

        let latency = *self.latency.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.take_failure(&call.name()) {
            return Err(HassError::ServiceFailed {
                domain: call.domain,
                service: call.service,
                reason: "rejected by memory host".to_string(),
            });
        }

        if self.echo {
            self.reflect(&call);
        }
        Ok(())
    }
}
