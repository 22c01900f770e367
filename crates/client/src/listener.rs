//! Listener registry: routes inbound frames to callbacks by event type.

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// The `type` tag carried by every frame the hub sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTag {
    Connection,
    InitialData,
    SensorUpdate,
    DeviceStatus,
    DeviceError,
    DeviceSync,
    Error,
}

impl EventTag {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::InitialData => "initial_data",
            Self::SensorUpdate => "sensor_update",
            Self::DeviceStatus => "device_status",
            Self::DeviceError => "device_error",
            Self::DeviceSync => "device_sync",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a frame carries an unrecognized `type` tag.
#[derive(Debug, PartialEq, Eq)]
pub struct UnknownTag(pub String);

impl FromStr for EventTag {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "connection" => Ok(Self::Connection),
            "initial_data" => Ok(Self::InitialData),
            "sensor_update" => Ok(Self::SensorUpdate),
            "device_status" => Ok(Self::DeviceStatus),
            "device_error" => Ok(Self::DeviceError),
            "device_sync" => Ok(Self::DeviceSync),
            "error" => Ok(Self::Error),
            other => Err(UnknownTag(other.to_string())),
        }
    }
}

type Callback = Box<dyn Fn(&serde_json::Value) + Send + Sync>;

/// Handle returned on registration; pass it back to
/// [`ListenerRegistry::unsubscribe`] to remove the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerHandle(u64);

struct Entry {
    handle: ListenerHandle,
    // `None` matches every tag.
    filter: Option<EventTag>,
    callback: Callback,
}

/// Registry of event listeners.
///
/// Listeners matching a dispatched frame are invoked in registration order,
/// wildcard and tagged listeners interleaved. Callbacks run on the client's
/// read task, so they should return quickly.
#[derive(Default)]
pub struct ListenerRegistry {
    entries: Mutex<Vec<Entry>>,
    next_handle: AtomicU64,
}

impl ListenerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for one event tag.
    pub fn subscribe(
        &self,
        tag: EventTag,
        callback: impl Fn(&serde_json::Value) + Send + Sync + 'static,
    ) -> ListenerHandle {
        self.insert(Some(tag), Box::new(callback))
    }

    /// Register a listener receiving every frame regardless of tag.
    pub fn subscribe_all(
        &self,
        callback: impl Fn(&serde_json::Value) + Send + Sync + 'static,
    ) -> ListenerHandle {
        self.insert(None, Box::new(callback))
    }

    /// Remove a listener. Idempotent: unknown handles are ignored.
    pub fn unsubscribe(&self, handle: ListenerHandle) {
        let mut entries = self.entries.lock().expect("listener lock poisoned");
        entries.retain(|entry| entry.handle != handle);
    }

    /// Invoke every listener matching `tag`, in registration order.
    pub fn dispatch(&self, tag: EventTag, payload: &serde_json::Value) {
        let entries = self.entries.lock().expect("listener lock poisoned");
        for entry in entries.iter() {
            if entry.filter.is_none() || entry.filter == Some(tag) {
                (entry.callback)(payload);
            }
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("listener lock poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, filter: Option<EventTag>, callback: Callback) -> ListenerHandle {
        let handle = ListenerHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let mut entries = self.entries.lock().expect("listener lock poisoned");
        entries.push(Entry {
            handle,
            filter,
            callback,
        });
        handle
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;

    use super::*;

    fn recording_registry() -> (ListenerRegistry, Arc<Mutex<Vec<String>>>) {
        (ListenerRegistry::new(), Arc::new(Mutex::new(Vec::new())))
    }

    #[test]
    fn should_parse_every_tag_from_wire_form() {
        for tag in [
            EventTag::Connection,
            EventTag::InitialData,
            EventTag::SensorUpdate,
            EventTag::DeviceStatus,
            EventTag::DeviceError,
            EventTag::DeviceSync,
            EventTag::Error,
        ] {
            assert_eq!(tag.as_str().parse::<EventTag>(), Ok(tag));
        }
    }

    #[test]
    fn should_reject_unknown_tag() {
        let err = "telemetry".parse::<EventTag>().unwrap_err();
        assert_eq!(err, UnknownTag("telemetry".to_string()));
    }

    #[test]
    fn should_invoke_only_matching_listeners() {
        let (registry, seen) = recording_registry();
        let seen_status = Arc::clone(&seen);
        registry.subscribe(EventTag::DeviceStatus, move |_| {
            seen_status.lock().unwrap().push("status".to_string());
        });
        let seen_sensor = Arc::clone(&seen);
        registry.subscribe(EventTag::SensorUpdate, move |_| {
            seen_sensor.lock().unwrap().push("sensor".to_string());
        });

        registry.dispatch(EventTag::SensorUpdate, &serde_json::json!({}));

        assert_eq!(*seen.lock().unwrap(), ["sensor"]);
    }

    #[test]
    fn should_invoke_listeners_in_registration_order() {
        let (registry, seen) = recording_registry();
        for name in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            registry.subscribe(EventTag::DeviceSync, move |_| {
                seen.lock().unwrap().push(name.to_string());
            });
        }

        registry.dispatch(EventTag::DeviceSync, &serde_json::json!({}));

        assert_eq!(*seen.lock().unwrap(), ["first", "second", "third"]);
    }

    #[test]
    fn should_hand_every_frame_to_wildcard_listeners() {
        let (registry, seen) = recording_registry();
        let seen_all = Arc::clone(&seen);
        registry.subscribe_all(move |payload| {
            seen_all
                .lock()
                .unwrap()
                .push(payload["type"].as_str().unwrap_or("?").to_string());
        });

        registry.dispatch(
            EventTag::SensorUpdate,
            &serde_json::json!({"type": "sensor_update"}),
        );
        registry.dispatch(
            EventTag::DeviceError,
            &serde_json::json!({"type": "device_error"}),
        );

        assert_eq!(*seen.lock().unwrap(), ["sensor_update", "device_error"]);
    }

    #[test]
    fn should_stop_invoking_after_unsubscribe() {
        let (registry, seen) = recording_registry();
        let seen_once = Arc::clone(&seen);
        let handle = registry.subscribe(EventTag::DeviceStatus, move |_| {
            seen_once.lock().unwrap().push("called".to_string());
        });

        registry.dispatch(EventTag::DeviceStatus, &serde_json::json!({}));
        registry.unsubscribe(handle);
        registry.dispatch(EventTag::DeviceStatus, &serde_json::json!({}));

        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn should_ignore_unsubscribe_of_unknown_handle() {
        let (registry, _) = recording_registry();
        let handle = registry.subscribe(EventTag::Connection, |_| {});
        registry.unsubscribe(handle);
        registry.unsubscribe(handle);
        assert!(registry.is_empty());
    }
}
