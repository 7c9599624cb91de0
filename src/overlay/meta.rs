use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, trace};

use crate::runtime::{HostInstance, OverlayContext, OverlayEvent, VisibleCell};

pub(crate) type OutcomeFn = Rc<dyn Fn(Option<Value>)>;
type VanishHook = Rc<RefCell<Option<Rc<dyn Fn()>>>>;

/// Options accepted by [`use_overlay_meta`]
#[derive(Debug, Clone)]
pub struct OverlayOptions {
    /// Exit animation length; teardown waits this long after the overlay
    /// hides so the component is not destroyed mid-animation
    pub animation: Duration,
    /// Show the overlay as soon as the component mounts
    pub immediate: bool,
    /// Name of the two-way bound visibility prop
    pub model: String,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        OverlayOptions {
            animation: Duration::ZERO,
            immediate: true,
            model: "visible".to_string(),
        }
    }
}

/// The shared bundle of visibility state and outcome callbacks describing
/// one overlay instance.
///
/// Clones share everything by reference: flipping `visible` or assigning
/// the teardown hook through one handle is observed through all of them.
#[derive(Clone)]
pub struct OverlayMeta {
    visible: VisibleCell,
    confirm: OutcomeFn,
    cancel: OutcomeFn,
    vanish: VanishHook,
    is_template: bool,
}

impl OverlayMeta {
    pub(crate) fn from_parts(
        visible: VisibleCell,
        confirm: OutcomeFn,
        cancel: OutcomeFn,
        is_template: bool,
    ) -> Self {
        OverlayMeta {
            visible,
            confirm,
            cancel,
            vanish: Rc::new(RefCell::new(None)),
            is_template,
        }
    }

    /// The shared show/hide flag
    pub fn visible(&self) -> &VisibleCell {
        &self.visible
    }

    /// Hide the overlay, then emit a `confirm` event carrying `value`
    pub fn confirm(&self, value: Option<Value>) {
        (self.confirm)(value)
    }

    /// Hide the overlay, then emit a `cancel` event carrying `value`
    pub fn cancel(&self, value: Option<Value>) {
        (self.cancel)(value)
    }

    /// Run the assigned teardown hook; skipped while none is assigned
    pub fn vanish(&self) {
        invoke_vanish(&self.vanish);
    }

    /// Assign the teardown hook invoked once the overlay has hidden and
    /// any exit animation has elapsed. Assignment is the orchestrator's
    /// job; this crate only ever calls the hook.
    pub fn set_vanish(&self, hook: impl Fn() + 'static) {
        *self.vanish.borrow_mut() = Some(Rc::new(hook));
    }

    /// Whether this record was created by the current component rather
    /// than received from an ancestor
    pub fn is_template(&self) -> bool {
        self.is_template
    }
}

impl std::fmt::Debug for OverlayMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayMeta")
            .field("visible", &self.visible.get())
            .field("is_template", &self.is_template)
            .finish()
    }
}

fn invoke_vanish(slot: &VanishHook) {
    let hook = slot.borrow().clone();
    match hook {
        Some(hook) => hook(),
        None => trace!("vanish skipped, no hook assigned"),
    }
}

/// Build a template meta for the current component.
///
/// With an instance, `visible` is bound two-way to the named prop: the
/// initial value is read from the instance's props and writes go back out
/// through its prop-update convention. Without one the flag degrades to a
/// local cell and the emit side of `confirm`/`cancel` becomes a no-op.
/// Never fails.
pub fn template_meta(instance: Option<&HostInstance>, model: &str) -> OverlayMeta {
    let visible = match instance {
        Some(instance) => {
            let owner = instance.clone();
            let prop = model.to_string();
            VisibleCell::bound(instance.bool_prop(model), move |value| {
                owner.update_prop(&prop, Value::Bool(value));
            })
        }
        None => VisibleCell::new(false),
    };

    let confirm = emitting(&visible, instance, |value| OverlayEvent::Confirm { value });
    let cancel = emitting(&visible, instance, |value| OverlayEvent::Cancel { value });
    OverlayMeta::from_parts(visible, confirm, cancel, true)
}

/// Outcome callback: hide first, then emit through the creating instance
fn emitting(
    visible: &VisibleCell,
    instance: Option<&HostInstance>,
    event: fn(Option<Value>) -> OverlayEvent,
) -> OutcomeFn {
    let visible = visible.clone();
    let instance = instance.cloned();
    Rc::new(move |value| {
        visible.set(false);
        if let Some(instance) = &instance {
            instance.emit(event(value));
        }
    })
}

/// Retrieve the overlay meta shared across this overlay subtree.
///
/// An ancestor-provided meta is reused; otherwise a fresh template meta
/// is built from the current instance via [`template_meta`] using
/// `options.model`. For an inherited (non-template) meta a watcher
/// schedules the delayed teardown: each time `visible` drops to false, a
/// local task waits `options.animation` and then calls the meta's
/// `vanish`. A pending call is not cancelled when visibility flips back
/// up during the wait, so rapid toggling can stack teardown calls. With
/// `immediate` the overlay shows itself once the component mounts.
/// Descendants of the caller see a cleared chain, so nested overlays
/// never share a grandparent's meta.
///
/// The delayed teardown is a `spawn_local` task; callers run inside a
/// tokio `LocalSet` on the current-thread scheduler.
pub fn use_overlay_meta(
    instance: Option<&HostInstance>,
    ctx: &OverlayContext,
    options: OverlayOptions,
) -> OverlayMeta {
    let OverlayOptions {
        animation,
        immediate,
        model,
    } = options;

    let template = template_meta(instance, &model);
    let meta = ctx.inject().unwrap_or(template);
    debug!(
        inherited = !meta.is_template(),
        visible = meta.visible.get(),
        "resolved overlay meta"
    );

    // The creator's own destruction is governed by whoever owns its
    // lifecycle; only inherited metas get the teardown watcher.
    if !meta.is_template() {
        let vanish = meta.vanish.clone();
        let guard = meta.visible.watch(move |visible| {
            if visible {
                return;
            }
            debug!(delay_ms = animation.as_millis() as u64, "overlay hidden, scheduling vanish");
            let vanish = vanish.clone();
            tokio::task::spawn_local(async move {
                if !animation.is_zero() {
                    tokio::time::sleep(animation).await;
                }
                invoke_vanish(&vanish);
            });
        });
        match instance {
            Some(instance) => instance.retain_watch(guard),
            None => guard.persist(),
        }
    }

    if immediate {
        if let Some(instance) = instance {
            let visible = meta.visible.clone();
            instance.on_mounted(move || visible.set(true));
        }
    }

    // Nested overlays start a fresh lookup chain
    ctx.provide(None);
    meta
}
