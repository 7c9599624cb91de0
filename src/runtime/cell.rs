use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Shared reactive boolean behind an overlay's `visible` flag.
///
/// Clones share the underlying value by reference, so the instance that
/// created an overlay meta and every consumer that inherited it observe
/// and mutate a single cell.
#[derive(Clone)]
pub struct VisibleCell {
    inner: Rc<RefCell<CellInner>>,
}

struct CellInner {
    value: bool,
    write_back: Option<Rc<dyn Fn(bool)>>,
    watchers: Vec<Watcher>,
    next_watcher_id: u64,
}

struct Watcher {
    id: u64,
    callback: Rc<dyn Fn(bool)>,
}

impl VisibleCell {
    /// Create a local cell, not bound to any owner
    pub fn new(initial: bool) -> Self {
        Self::build(initial, None)
    }

    /// Create a cell whose writes are handed to the owner through
    /// `write_back` instead of mutating the owner's props directly
    pub fn bound(initial: bool, write_back: impl Fn(bool) + 'static) -> Self {
        Self::build(initial, Some(Rc::new(write_back)))
    }

    fn build(initial: bool, write_back: Option<Rc<dyn Fn(bool)>>) -> Self {
        VisibleCell {
            inner: Rc::new(RefCell::new(CellInner {
                value: initial,
                write_back,
                watchers: Vec::new(),
                next_watcher_id: 0,
            })),
        }
    }

    /// Current value of the flag
    pub fn get(&self) -> bool {
        self.inner.borrow().value
    }

    /// Write the flag. The write-back callback sees every write; watchers
    /// fire only when the stored value actually changes.
    pub fn set(&self, value: bool) {
        let (write_back, watchers) = {
            let mut inner = self.inner.borrow_mut();
            let changed = inner.value != value;
            inner.value = value;
            // Snapshot before invoking anything, callbacks may touch the cell
            let watchers: Vec<Rc<dyn Fn(bool)>> = if changed {
                inner.watchers.iter().map(|w| Rc::clone(&w.callback)).collect()
            } else {
                Vec::new()
            };
            (inner.write_back.clone(), watchers)
        };

        if let Some(write_back) = write_back {
            write_back(value);
        }
        for callback in watchers {
            callback(value);
        }
    }

    /// Register a watcher invoked with the new value on every transition
    pub fn watch(&self, callback: impl Fn(bool) + 'static) -> WatchGuard {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_watcher_id;
        inner.next_watcher_id += 1;
        inner.watchers.push(Watcher {
            id,
            callback: Rc::new(callback),
        });
        WatchGuard {
            cell: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Whether two handles share the same underlying cell
    pub fn ptr_eq(&self, other: &VisibleCell) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for VisibleCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibleCell").field("value", &self.get()).finish()
    }
}

/// Removes its watcher from the cell when dropped, tying the subscription
/// to the owning consumer's lifecycle.
pub struct WatchGuard {
    cell: Weak<RefCell<CellInner>>,
    id: u64,
}

impl WatchGuard {
    /// Leave the watcher installed for the remaining life of the cell
    pub fn persist(mut self) {
        self.cell = Weak::new();
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if let Some(cell) = self.cell.upgrade() {
            cell.borrow_mut().watchers.retain(|w| w.id != self.id);
        }
    }
}
