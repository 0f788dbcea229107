//! Navigation guard: ask before leaving while there are unsaved changes.
//!
//! The guard mirrors the dirty flag into an [`UnloadHook`]: registered while
//! dirty, deregistered as soon as the draft is clean again or the guard is
//! dropped. It only covers leaving from outside the editor's own controls;
//! exiting edit mode goes through the discard confirmation instead.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Host-side interception of "leave the page".
pub trait UnloadHook {
    fn register(&mut self);
    fn deregister(&mut self);
}

#[derive(Debug)]
pub struct NavigationGuard<H: UnloadHook> {
    hook: H,
    armed: bool,
}

impl<H: UnloadHook> NavigationGuard<H> {
    pub fn new(hook: H) -> Self {
        Self { hook, armed: false }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Register or deregister the hook so it matches `dirty`.
    pub fn sync(&mut self, dirty: bool) {
        match (dirty, self.armed) {
            (true, false) => {
                self.hook.register();
                self.armed = true;
                debug!("unload guard registered");
            }
            (false, true) => {
                self.hook.deregister();
                self.armed = false;
                debug!("unload guard deregistered");
            }
            _ => {}
        }
    }
}

impl<H: UnloadHook> Drop for NavigationGuard<H> {
    fn drop(&mut self) {
        self.sync(false);
    }
}

/// Hook backed by a shared flag the host checks before quitting.
#[derive(Debug, Clone, Default)]
pub struct UnloadFlag(Arc<AtomicBool>);

impl UnloadFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether leaving now needs the user's confirmation.
    pub fn should_confirm(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl UnloadHook for UnloadFlag {
    fn register(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn deregister(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
