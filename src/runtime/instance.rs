use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use serde_json::{Map, Value};
use tracing::{debug, trace};
use uuid::Uuid;

use super::cell::WatchGuard;
use super::types::OverlayEvent;

/// Stand-in for a reactive framework's component instance: the property
/// bag an overlay binds its visibility prop to, the owner's prop-update
/// callback, the event-emission channel, and the mount lifecycle.
///
/// Cloning shares the instance. Watcher subscriptions retained on the
/// instance end when the last handle is dropped.
#[derive(Clone)]
pub struct HostInstance {
    inner: Rc<InstanceInner>,
}

struct InstanceInner {
    id: Uuid,
    props: Map<String, Value>,
    prop_update: RefCell<Option<Rc<dyn Fn(&str, Value)>>>,
    events_tx: UnboundedSender<OverlayEvent>,
    events_rx: RefCell<Option<UnboundedReceiver<OverlayEvent>>>,
    mounted: Cell<bool>,
    mounted_hooks: RefCell<Vec<Box<dyn FnOnce()>>>,
    watch_scope: RefCell<Vec<WatchGuard>>,
}

impl HostInstance {
    /// Instance with an empty property bag
    pub fn new() -> Self {
        Self::with_props(Map::new())
    }

    /// Instance owning the given props
    pub fn with_props(props: Map<String, Value>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded();
        HostInstance {
            inner: Rc::new(InstanceInner {
                id: Uuid::new_v4(),
                props,
                prop_update: RefCell::new(None),
                events_tx,
                events_rx: RefCell::new(Some(events_rx)),
                mounted: Cell::new(false),
                mounted_hooks: RefCell::new(Vec::new()),
                watch_scope: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Read a prop by name
    pub fn prop(&self, name: &str) -> Option<&Value> {
        self.inner.props.get(name)
    }

    /// Read a boolean prop; a missing or non-boolean prop reads as false
    pub fn bool_prop(&self, name: &str) -> bool {
        self.inner.props.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Register the owner's prop-update callback
    pub fn on_prop_update(&self, callback: impl Fn(&str, Value) + 'static) {
        *self.inner.prop_update.borrow_mut() = Some(Rc::new(callback));
    }

    /// Propagate a prop write to the owner. The props bag itself is never
    /// mutated; without a registered callback the write is dropped.
    pub fn update_prop(&self, name: &str, value: Value) {
        let callback = self.inner.prop_update.borrow().clone();
        match callback {
            Some(callback) => callback(name, value),
            None => trace!(instance = %self.inner.id, prop = name, "prop update dropped, no owner callback"),
        }
    }

    /// Emit an event to whoever holds the receiving end of the channel.
    /// Dropped silently once the receiver is gone.
    pub fn emit(&self, event: OverlayEvent) {
        debug!(instance = %self.inner.id, ?event, "emit");
        let _ = self.inner.events_tx.unbounded_send(event);
    }

    /// Take the receiving end of the event channel. Yields `Some` exactly
    /// once; events emitted before the take are buffered.
    pub fn take_events(&self) -> Option<UnboundedReceiver<OverlayEvent>> {
        self.inner.events_rx.borrow_mut().take()
    }

    /// Queue a hook to run once the component has mounted. Hooks
    /// registered after mount run immediately.
    pub fn on_mounted(&self, hook: impl FnOnce() + 'static) {
        if self.inner.mounted.get() {
            hook();
        } else {
            self.inner.mounted_hooks.borrow_mut().push(Box::new(hook));
        }
    }

    /// Mark the component mounted and run queued hooks in registration
    /// order. Idempotent.
    pub fn mount(&self) {
        if self.inner.mounted.replace(true) {
            return;
        }
        trace!(instance = %self.inner.id, "mounted");
        // The flag is already set, so hooks registering further hooks run
        // them inline rather than re-entering this queue.
        let hooks = std::mem::take(&mut *self.inner.mounted_hooks.borrow_mut());
        for hook in hooks {
            hook();
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.get()
    }

    /// Tie a watcher subscription to this instance's lifetime
    pub fn retain_watch(&self, guard: WatchGuard) {
        self.inner.watch_scope.borrow_mut().push(guard);
    }
}

impl Default for HostInstance {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HostInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostInstance")
            .field("id", &self.inner.id)
            .field("mounted", &self.inner.mounted.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props_with(name: &str, value: Value) -> Map<String, Value> {
        let mut props = Map::new();
        props.insert(name.to_string(), value);
        props
    }

    #[test]
    fn test_bool_prop_defaults_false() {
        let instance = HostInstance::with_props(props_with("open", json!("yes")));
        assert!(!instance.bool_prop("open")); // non-boolean
        assert!(!instance.bool_prop("missing"));

        let instance = HostInstance::with_props(props_with("open", json!(true)));
        assert!(instance.bool_prop("open"));
    }

    #[test]
    fn test_update_prop_reaches_owner() {
        let instance = HostInstance::new();
        instance.update_prop("visible", json!(true)); // no callback yet, dropped

        let updates = Rc::new(RefCell::new(Vec::new()));
        let seen = updates.clone();
        instance.on_prop_update(move |name, value| {
            seen.borrow_mut().push((name.to_string(), value));
        });
        instance.update_prop("visible", json!(false));
        assert_eq!(
            updates.borrow().as_slice(),
            &[("visible".to_string(), json!(false))]
        );
    }

    #[test]
    fn test_emit_buffers_until_taken() {
        let instance = HostInstance::new();
        instance.emit(OverlayEvent::Confirm { value: None });

        let mut events = instance.take_events().unwrap();
        assert_eq!(
            events.try_next().unwrap(),
            Some(OverlayEvent::Confirm { value: None })
        );
        assert!(events.try_next().is_err()); // empty, channel still open
    }

    #[test]
    fn test_take_events_yields_once() {
        let instance = HostInstance::new();
        assert!(instance.take_events().is_some());
        assert!(instance.take_events().is_none());
    }

    #[test]
    fn test_emit_without_receiver_is_noop() {
        let instance = HostInstance::new();
        drop(instance.take_events());
        instance.emit(OverlayEvent::Cancel { value: None });
    }

    #[test]
    fn test_mount_runs_hooks_in_order() {
        let instance = HostInstance::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second"] {
            let seen = order.clone();
            instance.on_mounted(move || seen.borrow_mut().push(tag));
        }
        assert!(!instance.is_mounted());
        instance.mount();
        instance.mount(); // idempotent
        assert_eq!(order.borrow().as_slice(), &["first", "second"]);

        let seen = order.clone();
        instance.on_mounted(move || seen.borrow_mut().push("late"));
        assert_eq!(order.borrow().as_slice(), &["first", "second", "late"]);
    }

    #[test]
    fn test_instances_have_distinct_ids() {
        assert_ne!(HostInstance::new().id(), HostInstance::new().id());
    }
}
