use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;

use super::event::EventKind;
use crate::error::StreamError;

pub type EventCallback = Arc<dyn Fn(Value) -> BoxFuture<'static, ()> + Send + Sync>;
pub type OpenCallback = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(StreamError) -> BoxFuture<'static, ()> + Send + Sync>;

pub fn event_callback<F, Fut>(f: F) -> EventCallback
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |payload| f(payload).boxed())
}

pub fn open_callback<F, Fut>(f: F) -> OpenCallback
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

pub fn error_callback<F, Fut>(f: F) -> ErrorCallback
where
    F: Fn(StreamError) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |err| f(err).boxed())
}

/// Optional callback per known event, mounted in one call.
///
/// `on_open` runs each time a connection opens, `on_error` after every
/// stream failure and for payloads that are not valid JSON.
#[derive(Clone, Default)]
pub struct EventHandlers {
    pub on_open: Option<OpenCallback>,
    pub on_error: Option<ErrorCallback>,
    pub on_add_device: Option<EventCallback>,
    pub on_update_device_state: Option<EventCallback>,
    pub on_update_device_info: Option<EventCallback>,
    pub on_update_device_online: Option<EventCallback>,
    pub on_delete_device: Option<EventCallback>,
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_open<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_open = Some(open_callback(f));
        self
    }

    pub fn on_error<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(StreamError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_error = Some(error_callback(f));
        self
    }

    /// Sets the callback for one known event.
    pub fn on<F, Fut>(mut self, kind: EventKind, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        *self.slot_mut(kind) = Some(event_callback(f));
        self
    }

    fn slot_mut(&mut self, kind: EventKind) -> &mut Option<EventCallback> {
        match kind {
            EventKind::AddDevice => &mut self.on_add_device,
            EventKind::UpdateDeviceState => &mut self.on_update_device_state,
            EventKind::UpdateDeviceInfo => &mut self.on_update_device_info,
            EventKind::UpdateDeviceOnline => &mut self.on_update_device_online,
            EventKind::DeleteDevice => &mut self.on_delete_device,
        }
    }

    fn into_event_slots(self) -> [(EventKind, Option<EventCallback>); 5] {
        [
            (EventKind::AddDevice, self.on_add_device),
            (EventKind::UpdateDeviceState, self.on_update_device_state),
            (EventKind::UpdateDeviceInfo, self.on_update_device_info),
            (EventKind::UpdateDeviceOnline, self.on_update_device_online),
            (EventKind::DeleteDevice, self.on_delete_device),
        ]
    }
}

/// Event name to callback map, plus the two local pseudo-events.
///
/// Safe to mutate while the stream is dispatching: callbacks are cloned out
/// of the map before they run.
#[derive(Default)]
pub struct HandlerRegistry {
    events: RwLock<HashMap<String, EventCallback>>,
    on_open: RwLock<Option<OpenCallback>>,
    on_error: RwLock<Option<ErrorCallback>>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` under `name`, replacing any previous one.
    pub fn register(&self, name: impl Into<String>, callback: EventCallback) {
        write(&self.events).insert(name.into(), callback);
    }

    pub fn remove(&self, name: &str) -> bool {
        write(&self.events).remove(name).is_some()
    }

    pub fn set_on_open(&self, callback: Option<OpenCallback>) {
        *write(&self.on_open) = callback;
    }

    pub fn set_on_error(&self, callback: Option<ErrorCallback>) {
        *write(&self.on_error) = callback;
    }

    /// Registers every slot that is set. Unset slots leave existing entries alone.
    pub fn mount(&self, handlers: EventHandlers) {
        if let Some(cb) = handlers.on_open.clone() {
            self.set_on_open(Some(cb));
        }
        if let Some(cb) = handlers.on_error.clone() {
            self.set_on_error(Some(cb));
        }
        for (kind, callback) in handlers.into_event_slots() {
            if let Some(callback) = callback {
                self.register(kind.name(), callback);
            }
        }
    }

    pub fn clear(&self) {
        write(&self.events).clear();
        self.set_on_open(None);
        self.set_on_error(None);
    }

    pub fn get(&self, name: &str) -> Option<EventCallback> {
        read(&self.events).get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        read(&self.events).contains_key(name)
    }

    pub fn len(&self) -> usize {
        read(&self.events).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_error_handler(&self) -> bool {
        read(&self.on_error).is_some()
    }

    /// Runs the callback registered for `name`. Returns false when none is.
    ///
    /// A panicking callback is caught and returned as [`StreamError::Handler`].
    pub async fn dispatch(&self, name: &str, payload: Value) -> Result<bool, StreamError> {
        let Some(callback) = self.get(name) else {
            return Ok(false);
        };
        guarded(name, async move { callback(payload).await }).await?;
        Ok(true)
    }

    pub async fn notify_open(&self) -> Result<(), StreamError> {
        let callback = read(&self.on_open).clone();
        match callback {
            Some(callback) => guarded("onopen", async move { callback().await }).await,
            None => {
                tracing::debug!("Connected to event stream");
                Ok(())
            }
        }
    }

    /// Hands `err` to the error callback, or logs it when none is registered.
    pub async fn report_error(&self, err: StreamError) {
        let callback = read(&self.on_error).clone();
        match callback {
            Some(callback) => {
                if let Err(e) = guarded("onerror", async move { callback(err).await }).await {
                    tracing::error!("{}", e);
                }
            }
            None if err.is_connection_failure() => {
                tracing::warn!("Event stream failed, reconnecting: {}", err)
            }
            None => tracing::error!("Event stream error: {}", err),
        }
    }
}

async fn guarded<F>(event: &str, fut: F) -> Result<(), StreamError>
where
    F: Future<Output = ()>,
{
    AssertUnwindSafe(fut)
        .catch_unwind()
        .await
        .map_err(|panic| StreamError::Handler {
            event: event.to_string(),
            message: panic_message(panic.as_ref()),
        })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
