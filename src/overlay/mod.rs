mod handle;
mod meta;

pub use handle::{create_overlay, OverlayHandle, OverlayOutcome};
pub use meta::{template_meta, use_overlay_meta, OverlayMeta, OverlayOptions};
