//! The local binding table: which accelerators this process believes it owns.
//!
//! A key present in the table means this process has asked the host to own
//! that accelerator and has not since asked it to release it.  The converse
//! does not hold: unregistration is fire-and-forget, so absence from the table
//! says nothing about whether the host has actually let go yet.
//!
//! The table itself is not synchronised.  The application layer keeps it
//! behind a single `Mutex` so every read and write shares one lock.

use std::collections::HashMap;
use std::sync::Arc;

use shortcut_core::Accelerator;

/// A zero-argument action run when its accelerator fires.
///
/// Stored as an `Arc` so the dispatcher can clone it out of the table and
/// release the lock before running user code.
pub type ShortcutCallback = Arc<dyn Fn() + Send + Sync + 'static>;

/// Mapping from accelerator to callback.
///
/// # HashMap choice
///
/// Lookups on the dispatch path are by exact string, so a `HashMap` gives
/// O(1) access.  Insertion order is irrelevant.
#[derive(Default)]
pub struct BindingTable {
    bindings: HashMap<Accelerator, ShortcutCallback>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `callback` to `accelerator` unless it is already bound.
    ///
    /// Returns `true` if the binding was inserted.  When the accelerator is
    /// already present the existing callback is kept and `callback` is dropped.
    pub fn insert_if_absent(&mut self, accelerator: Accelerator, callback: ShortcutCallback) -> bool {
        if self.bindings.contains_key(accelerator.as_str()) {
            return false;
        }
        self.bindings.insert(accelerator, callback);
        true
    }

    /// Removes the binding for `accelerator`.  Returns `true` if one existed.
    pub fn remove(&mut self, accelerator: &str) -> bool {
        self.bindings.remove(accelerator).is_some()
    }

    /// Removes every binding and returns how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.bindings.len();
        self.bindings.clear();
        count
    }

    /// Returns a clone of the callback bound to `accelerator`.
    pub fn callback(&self, accelerator: &str) -> Option<ShortcutCallback> {
        self.bindings.get(accelerator).cloned()
    }

    pub fn contains(&self, accelerator: &str) -> bool {
        self.bindings.contains_key(accelerator)
    }

    /// Returns the bound accelerators, sorted for stable output.
    pub fn accelerators(&self) -> Vec<Accelerator> {
        let mut keys: Vec<Accelerator> = self.bindings.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn acc(s: &str) -> Accelerator {
        Accelerator::parse(s).unwrap()
    }

    fn counting_callback(counter: &Arc<AtomicUsize>) -> ShortcutCallback {
        let counter = Arc::clone(counter);
        Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_insert_if_absent_inserts_new_binding() {
        let mut table = BindingTable::new();
        let hits = Arc::new(AtomicUsize::new(0));

        assert!(table.insert_if_absent(acc("F1"), counting_callback(&hits)));
        assert!(table.contains("F1"));
        assert_eq!(table.accelerators(), vec![acc("F1")]);
    }

    #[test]
    fn test_insert_if_absent_keeps_first_callback() {
        // Arrange
        let mut table = BindingTable::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        table.insert_if_absent(acc("F1"), counting_callback(&first));

        // Act
        let inserted = table.insert_if_absent(acc("F1"), counting_callback(&second));
        (table.callback("F1").expect("bound"))();

        // Assert
        assert!(!inserted);
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_remove_reports_presence() {
        let mut table = BindingTable::new();
        table.insert_if_absent(acc("F2"), Arc::new(|| {}));

        assert!(table.remove("F2"));
        assert!(!table.remove("F2"));
        assert!(!table.contains("F2"));
    }

    #[test]
    fn test_clear_returns_removed_count() {
        let mut table = BindingTable::new();
        table.insert_if_absent(acc("A"), Arc::new(|| {}));
        table.insert_if_absent(acc("B"), Arc::new(|| {}));

        assert_eq!(table.clear(), 2);
        assert!(table.accelerators().is_empty());
        assert!(table.callback("A").is_none());
    }

    #[test]
    fn test_accelerators_are_sorted() {
        let mut table = BindingTable::new();
        for key in ["Ctrl+C", "Alt+A", "Shift+B"] {
            table.insert_if_absent(acc(key), Arc::new(|| {}));
        }

        let keys: Vec<String> = table.accelerators().into_iter().map(String::from).collect();
        assert_eq!(keys, vec!["Alt+A", "Ctrl+C", "Shift+B"]);
    }
}
