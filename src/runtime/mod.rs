mod cell;
mod context;
mod instance;
mod types;

pub use cell::{VisibleCell, WatchGuard};
pub use context::OverlayContext;
pub use instance::HostInstance;
pub use types::OverlayEvent;
