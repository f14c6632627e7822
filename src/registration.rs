//! Registration handles.
//!
//! Every dynamic registration (effect handler or service) hands back an
//! [`Unregister`] handle. Dropping the handle keeps the registration alive;
//! only an explicit [`Unregister::unregister`] call removes it.

use parking_lot::Mutex;

type Action = Box<dyn FnOnce() + Send>;

/// Handle that removes exactly the registration it was created for.
///
/// Calling [`unregister`](Self::unregister) more than once is a no-op.
pub struct Unregister {
    action: Mutex<Option<Action>>,
}

impl Unregister {
    pub(crate) fn new<F>(action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            action: Mutex::new(Some(Box::new(action))),
        }
    }

    /// Combine several handles into one that releases them in order.
    pub fn group(handles: Vec<Unregister>) -> Self {
        Self::new(move || {
            for handle in handles {
                handle.unregister();
            }
        })
    }

    /// Remove the registration. Idempotent.
    pub fn unregister(&self) {
        let action = self.action.lock().take();
        if let Some(action) = action {
            action();
        }
    }

    /// Whether `unregister` has already run.
    pub fn is_released(&self) -> bool {
        self.action.lock().is_none()
    }
}

impl std::fmt::Debug for Unregister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unregister")
            .field("released", &self.is_released())
            .finish()
    }
}
