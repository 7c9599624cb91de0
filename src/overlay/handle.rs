use std::rc::Rc;

use futures::channel::mpsc::UnboundedReceiver;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::meta::OverlayMeta;
use crate::runtime::{HostInstance, OverlayContext, OverlayEvent, VisibleCell};

/// How an overlay run ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum OverlayOutcome {
    Confirmed { value: Option<Value> },
    Cancelled { value: Option<Value> },
}

/// Orchestrator side of an imperatively created overlay.
///
/// Owns the host instance the shared meta emits through and the receiving
/// end of its event channel. The overlay subtree gets the shared meta
/// through [`context`](Self::context); the orchestrator assigns the
/// teardown hook and awaits the outcome.
pub struct OverlayHandle {
    meta: OverlayMeta,
    instance: HostInstance,
    events: UnboundedReceiver<OverlayEvent>,
}

/// Create the shared meta for one imperative overlay run, starting hidden.
///
/// The returned handle's meta is not a template: consumers that retrieve
/// it through [`use_overlay_meta`](super::use_overlay_meta) attach the
/// delayed-teardown watcher to it.
pub fn create_overlay() -> OverlayHandle {
    let instance = HostInstance::new();
    let visible = VisibleCell::new(false);

    let confirm = {
        let visible = visible.clone();
        let emitter = instance.clone();
        Rc::new(move |value: Option<Value>| {
            visible.set(false);
            emitter.emit(OverlayEvent::Confirm { value });
        })
    };
    let cancel = {
        let visible = visible.clone();
        let emitter = instance.clone();
        Rc::new(move |value: Option<Value>| {
            visible.set(false);
            emitter.emit(OverlayEvent::Cancel { value });
        })
    };

    let meta = OverlayMeta::from_parts(visible, confirm, cancel, false);
    let events = instance
        .take_events()
        .expect("fresh instance still holds its event receiver");
    debug!(instance = %instance.id(), "overlay created");

    OverlayHandle {
        meta,
        instance,
        events,
    }
}

impl OverlayHandle {
    /// Context to thread into the overlay component subtree
    pub fn context(&self) -> OverlayContext {
        OverlayContext::with_meta(self.meta.clone())
    }

    /// The shared meta record
    pub fn meta(&self) -> OverlayMeta {
        self.meta.clone()
    }

    /// The host instance the meta emits through
    pub fn instance(&self) -> &HostInstance {
        &self.instance
    }

    /// Show the overlay
    pub fn show(&self) {
        self.meta.visible().set(true);
    }

    /// Assign the teardown hook on the shared meta
    pub fn set_vanish(&self, hook: impl Fn() + 'static) {
        self.meta.set_vanish(hook);
    }

    /// Wait for the next confirm/cancel emitted by the overlay. Returns
    /// `None` once every emitting handle is gone without a further
    /// outcome; awaiting again after an outcome reads the next one.
    pub async fn outcome(&mut self) -> Option<OverlayOutcome> {
        let outcome = match self.events.next().await? {
            OverlayEvent::Confirm { value } => OverlayOutcome::Confirmed { value },
            OverlayEvent::Cancel { value } => OverlayOutcome::Cancelled { value },
        };
        debug!(instance = %self.instance.id(), ?outcome, "overlay resolved");
        Some(outcome)
    }
}
