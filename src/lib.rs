//! Headless state sharing for overlay UI components (modals, popovers,
//! drawers).
//!
//! One overlay subtree shares a single meta record: a visibility flag,
//! `confirm`/`cancel` outcome callbacks, and a `vanish` teardown hook that
//! runs once the overlay has hidden and its exit animation has elapsed.
//! A host component that owns a two-way bindable `visible` prop builds
//! the record; descendants retrieve the shared one through an explicitly
//! threaded [`OverlayContext`]. Nothing here renders — stacking, focus
//! and positioning stay with the embedder.
//!
//! Delayed teardown runs as local tasks on tokio's current-thread
//! scheduler, so the mechanism lives inside a `LocalSet`.

mod overlay;
mod runtime;

pub use overlay::{
    create_overlay, template_meta, use_overlay_meta, OverlayHandle, OverlayMeta, OverlayOptions,
    OverlayOutcome,
};
pub use runtime::{HostInstance, OverlayContext, OverlayEvent, VisibleCell, WatchGuard};
