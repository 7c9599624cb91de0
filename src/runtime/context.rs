use std::cell::RefCell;

use crate::overlay::OverlayMeta;

/// One frame of the ancestor-to-descendant sharing chain for overlay metas.
///
/// Replaces a framework's scoped provide/inject mechanism with explicit
/// passing: the embedder threads a context through component construction,
/// deriving a child frame per component with [`descend`](Self::descend).
/// A component's lookup sees what its ancestors provided, never its own
/// [`provide`](Self::provide).
#[derive(Debug)]
pub struct OverlayContext {
    inherited: Option<OverlayMeta>,
    provided: RefCell<Option<Option<OverlayMeta>>>,
}

impl OverlayContext {
    /// Start of a chain, nothing inherited
    pub fn root() -> Self {
        OverlayContext {
            inherited: None,
            provided: RefCell::new(None),
        }
    }

    /// A context handing `meta` to the subtree constructed under it
    pub fn with_meta(meta: OverlayMeta) -> Self {
        OverlayContext {
            inherited: Some(meta),
            provided: RefCell::new(None),
        }
    }

    /// The meta an ancestor provided, if any
    pub fn inject(&self) -> Option<OverlayMeta> {
        self.inherited.clone()
    }

    /// Set what descendants derived from this frame will inject.
    /// `provide(None)` clears the chain so nested overlays start fresh.
    pub fn provide(&self, meta: Option<OverlayMeta>) {
        *self.provided.borrow_mut() = Some(meta);
    }

    /// Derive the frame for a child component: the child inherits this
    /// frame's override when one was provided, else the inherited value
    /// passes through unchanged.
    pub fn descend(&self) -> OverlayContext {
        let inherited = match &*self.provided.borrow() {
            Some(overridden) => overridden.clone(),
            None => self.inherited.clone(),
        };
        OverlayContext {
            inherited,
            provided: RefCell::new(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::template_meta;

    #[test]
    fn test_root_injects_nothing() {
        assert!(OverlayContext::root().inject().is_none());
    }

    #[test]
    fn test_with_meta_injects() {
        let meta = template_meta(None, "visible");
        let ctx = OverlayContext::with_meta(meta.clone());
        let injected = ctx.inject().unwrap();
        assert!(injected.visible().ptr_eq(meta.visible()));
    }

    #[test]
    fn test_descend_passes_inherited_through() {
        let meta = template_meta(None, "visible");
        let ctx = OverlayContext::with_meta(meta.clone());
        let child = ctx.descend();
        let grandchild = child.descend();
        assert!(grandchild.inject().unwrap().visible().ptr_eq(meta.visible()));
    }

    #[test]
    fn test_provide_overrides_for_descendants() {
        let outer = template_meta(None, "visible");
        let replacement = template_meta(None, "visible");
        let ctx = OverlayContext::with_meta(outer);
        ctx.provide(Some(replacement.clone()));
        let child = ctx.descend();
        assert!(child.inject().unwrap().visible().ptr_eq(replacement.visible()));
    }

    #[test]
    fn test_provide_none_clears_chain() {
        let ctx = OverlayContext::with_meta(template_meta(None, "visible"));
        ctx.provide(None);
        assert!(ctx.descend().inject().is_none());
    }

    #[test]
    fn test_own_provide_invisible_to_own_lookup() {
        let meta = template_meta(None, "visible");
        let ctx = OverlayContext::with_meta(meta.clone());
        ctx.provide(None);
        assert!(ctx.inject().unwrap().visible().ptr_eq(meta.visible()));
    }
}
