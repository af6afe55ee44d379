//! Per-request binding cell.
//!
//! A `RequestContext` is created when a request starts (see
//! [`crate::middleware::request_context`]) and dropped with the request. Each request
//! gets its own cell, so concurrent requests never see each other's binding. Clones
//! share the cell, which lets work spawned by the request observe the same binding.
//!
//! This type only stores what it is told; conflict detection lives in
//! [`crate::scope::Waypoint`].

use crate::binding::Binding;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct RequestContext {
    request_id: Uuid,
    current: Arc<Mutex<Option<Binding>>>,
}

impl RequestContext {
    pub fn new() -> Self {
        RequestContext {
            request_id: Uuid::new_v4(),
            current: Arc::new(Mutex::new(None)),
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn get(&self) -> Option<Binding> {
        *self.cell()
    }

    pub fn set(&self, binding: Binding) {
        *self.cell() = Some(binding);
    }

    pub fn clear(&self) {
        *self.cell() = None;
    }

    /// Check-and-set under one lock. Returns the already active binding instead of
    /// overwriting it.
    pub(crate) fn try_bind(&self, binding: Binding) -> Result<(), Binding> {
        let mut cell = self.cell();
        match *cell {
            Some(active) => Err(active),
            None => {
                *cell = Some(binding);
                Ok(())
            }
        }
    }

    // An Option<Binding> cannot be left half-written, so a poisoned lock is still usable.
    fn cell(&self) -> MutexGuard<'_, Option<Binding>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unbound() {
        let ctx = RequestContext::new();
        assert_eq!(ctx.get(), None);
    }

    #[test]
    fn set_get_clear() {
        let ctx = RequestContext::new();
        ctx.set(Binding::Slave);
        assert_eq!(ctx.get(), Some(Binding::Slave));
        ctx.set(Binding::Master);
        assert_eq!(ctx.get(), Some(Binding::Master));
        ctx.clear();
        assert_eq!(ctx.get(), None);
    }

    #[test]
    fn clones_share_fresh_contexts_do_not() {
        let ctx = RequestContext::new();
        let shared = ctx.clone();
        let other = RequestContext::new();
        ctx.set(Binding::Master);
        assert_eq!(shared.get(), Some(Binding::Master));
        assert_eq!(shared.request_id(), ctx.request_id());
        assert_eq!(other.get(), None);
        assert_ne!(other.request_id(), ctx.request_id());
    }

    #[test]
    fn try_bind_keeps_existing_value() {
        let ctx = RequestContext::new();
        assert!(ctx.try_bind(Binding::Master).is_ok());
        assert_eq!(ctx.try_bind(Binding::Slave), Err(Binding::Master));
        assert_eq!(ctx.get(), Some(Binding::Master));
    }
}
