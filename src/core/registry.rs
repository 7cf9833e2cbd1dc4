//! # Name → subscriber list registry.
//!
//! ## Rules
//! - Keys are non-empty names and exist only while their list is non-empty.
//! - Lists keep insertion order (= notification order for that name).
//! - Containment is by `Arc` pointer identity.
//!
//! The registry is plain data; the controller guards it with its lock.

use std::collections::HashMap;
use std::sync::Arc;

use crate::subscribers::Subscriber;

#[derive(Default)]
pub(crate) struct Registry {
    by_name: HashMap<Arc<str>, Vec<Arc<Subscriber>>>,
}

impl Registry {
    /// Appends `sub` under `name`. Returns `false` if it was already there.
    pub fn insert(&mut self, name: &str, sub: &Arc<Subscriber>) -> bool {
        if let Some(list) = self.by_name.get_mut(name) {
            if list.iter().any(|s| Arc::ptr_eq(s, sub)) {
                return false;
            }
            list.push(Arc::clone(sub));
            return true;
        }
        self.by_name.insert(Arc::from(name), vec![Arc::clone(sub)]);
        true
    }

    /// Removes the whole list for `name`.
    pub fn remove_name(&mut self, name: &str) -> Vec<Arc<Subscriber>> {
        self.by_name.remove(name).unwrap_or_default()
    }

    /// Removes `sub` from `name`, dropping the key if the list empties.
    pub fn remove(&mut self, name: &str, sub: &Arc<Subscriber>) -> bool {
        let Some(list) = self.by_name.get_mut(name) else {
            return false;
        };
        let before = list.len();
        list.retain(|s| !Arc::ptr_eq(s, sub));
        let removed = list.len() != before;
        if list.is_empty() {
            self.by_name.remove(name);
        }
        removed
    }

    /// Removes every entry.
    pub fn clear(&mut self) -> Vec<(Arc<str>, Vec<Arc<Subscriber>>)> {
        self.by_name.drain().collect()
    }

    /// Snapshot of the subscribers for `name`, in notification order.
    pub fn snapshot(&self, name: &str) -> Vec<Arc<Subscriber>> {
        self.by_name.get(name).cloned().unwrap_or_default()
    }

    pub fn count(&self, name: &str) -> usize {
        self.by_name.get(name).map_or(0, Vec::len)
    }

    /// Sorted list of registered names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_name.keys().map(|k| k.to_string()).collect();
        names.sort_unstable();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
