//! Typed attachment storage for daemon objects.
//!
//! # Responsibilities
//! - Let unrelated subsystems hang state off connections without the
//!   owning type knowing about them
//! - Keep attachments type-safe; a slot is (name, stored type)
//!
//! # Design Decisions
//! - Inserting into an occupied slot fails instead of overwriting, so
//!   two subsystems colliding on a name is loud
//! - Values must be `Send + Sync`; attachments cross task boundaries
//!   with their owner

use std::any::{Any, TypeId};
use std::collections::HashMap;

/// String-and-type keyed storage for arbitrary attachments.
#[derive(Default)]
pub struct Extensions {
    slots: HashMap<(String, TypeId), Box<dyn Any + Send + Sync>>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `value` under `key`. Returns false and leaves the existing
    /// value in place when the slot is already occupied.
    pub fn insert<T: Any + Send + Sync>(&mut self, key: &str, value: T) -> bool {
        let slot = (key.to_string(), TypeId::of::<T>());
        if self.slots.contains_key(&slot) {
            return false;
        }
        self.slots.insert(slot, Box::new(value));
        true
    }

    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.slots
            .get(&(key.to_string(), TypeId::of::<T>()))
            .and_then(|boxed| boxed.downcast_ref())
    }

    pub fn get_mut<T: Any + Send + Sync>(&mut self, key: &str) -> Option<&mut T> {
        self.slots
            .get_mut(&(key.to_string(), TypeId::of::<T>()))
            .and_then(|boxed| boxed.downcast_mut())
    }

    /// Detach and return the value under `key`, if any.
    pub fn remove<T: Any + Send + Sync>(&mut self, key: &str) -> Option<T> {
        self.slots
            .remove(&(key.to_string(), TypeId::of::<T>()))
            .and_then(|boxed| boxed.downcast().ok())
            .map(|boxed| *boxed)
    }

    pub fn contains<T: Any + Send + Sync>(&self, key: &str) -> bool {
        self.slots
            .contains_key(&(key.to_string(), TypeId::of::<T>()))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

impl std::fmt::Debug for Extensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extensions")
            .field("slots", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct IdleSince(u64);

    #[test]
    fn insert_then_get() {
        let mut ext = Extensions::new();
        assert!(ext.insert("idle", IdleSince(42)));
        assert_eq!(ext.get::<IdleSince>("idle"), Some(&IdleSince(42)));
    }

    #[test]
    fn occupied_slot_rejects_second_insert() {
        let mut ext = Extensions::new();
        assert!(ext.insert("idle", IdleSince(1)));
        assert!(!ext.insert("idle", IdleSince(2)));
        assert_eq!(ext.get::<IdleSince>("idle"), Some(&IdleSince(1)));
    }

    #[test]
    fn same_name_different_type_coexists() {
        let mut ext = Extensions::new();
        assert!(ext.insert("marker", IdleSince(7)));
        assert!(ext.insert("marker", String::from("oper")));
        assert_eq!(ext.get::<IdleSince>("marker"), Some(&IdleSince(7)));
        assert_eq!(ext.get::<String>("marker").map(String::as_str), Some("oper"));
    }

    #[test]
    fn remove_returns_ownership() {
        let mut ext = Extensions::new();
        ext.insert("idle", IdleSince(9));
        assert_eq!(ext.remove::<IdleSince>("idle"), Some(IdleSince(9)));
        assert!(ext.remove::<IdleSince>("idle").is_none());
        assert!(ext.is_empty());
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut ext = Extensions::new();
        ext.insert("idle", IdleSince(1));
        if let Some(value) = ext.get_mut::<IdleSince>("idle") {
            value.0 = 99;
        }
        assert_eq!(ext.get::<IdleSince>("idle"), Some(&IdleSince(99)));
    }

    #[test]
    fn missing_type_is_not_found() {
        let mut ext = Extensions::new();
        ext.insert("idle", IdleSince(1));
        assert!(ext.get::<String>("idle").is_none());
        assert!(!ext.contains::<String>("idle"));
        assert!(ext.contains::<IdleSince>("idle"));
    }
}
