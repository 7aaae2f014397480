//! The reactive store.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use crate::watch::WatchHandle;

/// A shared, interior-mutable value with synchronous change notification.
///
/// Cloning a `Store` produces another handle to the same value. `Store` is
/// single-threaded by construction (`Rc`-based) and re-entrant: watcher
/// callbacks may read the store, register or stop watchers, and even commit
/// further updates (which trigger nested notification rounds).
pub struct Store<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

struct Inner<T> {
    value: T,
    next_id: u64,
    watchers: BTreeMap<u64, Rc<Slot<T>>>,
}

struct Slot<T> {
    stopped: Rc<Cell<bool>>,
    hook: RefCell<Box<dyn FnMut(&T)>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Store {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Store<T> {
    pub fn new(value: T) -> Self {
        Store {
            inner: Rc::new(RefCell::new(Inner {
                value,
                next_id: 0,
                watchers: BTreeMap::new(),
            })),
        }
    }

    /// Clone out the current value.
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Read the current value through a closure without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Mutate the value in place and commit.
    ///
    /// Watchers are notified synchronously before `update` returns, and only
    /// if the committed value differs from the previous one.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let (result, changed) = {
            let mut inner = self.inner.borrow_mut();
            let before = inner.value.clone();
            let result = f(&mut inner.value);
            let changed = inner.value != before;
            (result, changed)
        };
        if changed {
            self.notify();
        }
        result
    }

    /// Replace the whole value.
    pub fn replace(&self, value: T) {
        self.update(|current| *current = value);
    }

    /// Register a deep watcher, fired on every committed change.
    pub fn subscribe(&self, mut callback: impl FnMut(&T) + 'static) -> WatchHandle {
        self.attach(Box::new(move |value: &T| callback(value)))
    }

    /// Register a selector watcher.
    ///
    /// `selector` derives a value from the store; `callback` runs only when
    /// the derived value changes between commits. The selector is evaluated
    /// once at registration to seed the comparison; the callback does not
    /// fire for that initial evaluation.
    pub fn watch<V, S, F>(&self, selector: S, mut callback: F) -> WatchHandle
    where
        V: PartialEq + 'static,
        S: Fn(&T) -> V + 'static,
        F: FnMut(&T, &V) + 'static,
    {
        let mut last = self.with(&selector);
        self.attach(Box::new(move |value: &T| {
            let next = selector(value);
            if next != last {
                last = next;
                callback(value, &last);
            }
        }))
    }

    fn attach(&self, hook: Box<dyn FnMut(&T)>) -> WatchHandle {
        let stopped = Rc::new(Cell::new(false));
        let slot = Rc::new(Slot {
            stopped: Rc::clone(&stopped),
            hook: RefCell::new(hook),
        });
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id = inner.next_id.saturating_add(1);
            inner.watchers.insert(id, slot);
            id
        };
        let weak: Weak<RefCell<Inner<T>>> = Rc::downgrade(&self.inner);
        WatchHandle::new(
            stopped,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.borrow_mut().watchers.remove(&id);
                }
            }),
        )
    }

    fn notify(&self) {
        // Snapshot slots so hooks can attach/detach watchers freely. Watchers
        // registered during this round are not called until the next commit.
        let slots: Vec<Rc<Slot<T>>> = {
            let inner = self.inner.borrow();
            inner.watchers.values().rev().cloned().collect()
        };
        let value = self.get();
        for slot in slots {
            if slot.stopped.get() {
                continue;
            }
            (slot.hook.borrow_mut())(&value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_get_and_with() {
        let store = Store::new(41);
        assert_eq!(store.get(), 41);
        assert_eq!(store.with(|v| v + 1), 42);
    }

    #[test]
    fn test_update_returns_closure_result() {
        let store = Store::new(vec![1]);
        let len = store.update(|v| {
            v.push(2);
            v.len()
        });
        assert_eq!(len, 2);
    }

    #[test]
    fn test_subscribe_fires_on_change_only() {
        let store = Store::new(1);
        let fired = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&fired);
        let _watch = store.subscribe(move |v: &i32| log.borrow_mut().push(*v));

        store.update(|v| *v = 2);
        store.update(|v| *v = 2); // no-op commit
        store.replace(3);
        assert_eq!(*fired.borrow(), vec![2, 3]);
    }

    #[test]
    fn test_watch_selector_change_only() {
        let store = Store::new((1, "a".to_string()));
        let fired = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&fired);
        let _watch = store.watch(
            |v: &(i32, String)| v.0,
            move |_, selected| log.borrow_mut().push(*selected),
        );

        store.update(|v| v.1 = "b".to_string()); // unrelated change
        store.update(|v| v.0 = 7);
        assert_eq!(*fired.borrow(), vec![7]);
    }

    #[test]
    fn test_notify_newest_first() {
        let store = Store::new(0);
        let order = Rc::new(RefCell::new(Vec::new()));

        let first = Rc::clone(&order);
        let _a = store.subscribe(move |_: &i32| first.borrow_mut().push("old"));
        let second = Rc::clone(&order);
        let _b = store.subscribe(move |_: &i32| second.borrow_mut().push("new"));

        store.replace(1);
        assert_eq!(*order.borrow(), vec!["new", "old"]);
    }

    #[test]
    fn test_stop_detaches() {
        let store = Store::new(0);
        let count = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&count);
        let mut watch = store.subscribe(move |_: &i32| *counter.borrow_mut() += 1);

        store.replace(1);
        watch.stop();
        assert!(watch.is_stopped());
        store.replace(2);
        assert_eq!(*count.borrow(), 1);

        // Idempotent
        watch.stop();
    }

    #[test]
    fn test_drop_detaches() {
        let store = Store::new(0);
        let count = Rc::new(RefCell::new(0));
        {
            let counter = Rc::clone(&count);
            let _watch = store.subscribe(move |_: &i32| *counter.borrow_mut() += 1);
            store.replace(1);
        }
        store.replace(2);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_stop_sibling_during_notification() {
        let store = Store::new(0);
        let count = Rc::new(RefCell::new(0));

        let counter = Rc::clone(&count);
        let victim = store.subscribe(move |_: &i32| *counter.borrow_mut() += 1);
        let victim = Rc::new(RefCell::new(Some(victim)));

        // Registered later, so it runs first and stops the older watcher
        let killer = Rc::clone(&victim);
        let _assassin = store.subscribe(move |_: &i32| {
            if let Some(mut watch) = killer.borrow_mut().take() {
                watch.stop();
            }
        });

        store.replace(1);
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn test_watcher_registered_mid_round_waits() {
        let store: Store<i32> = Store::new(0);
        let count = Rc::new(RefCell::new(0));

        let outer_store = store.clone();
        let counter = Rc::clone(&count);
        let late: Rc<RefCell<Option<WatchHandle>>> = Rc::new(RefCell::new(None));
        let late_slot = Rc::clone(&late);
        let _watch = store.subscribe(move |_: &i32| {
            if late_slot.borrow().is_none() {
                let inner_counter = Rc::clone(&counter);
                let handle = outer_store.subscribe(move |_: &i32| *inner_counter.borrow_mut() += 1);
                *late_slot.borrow_mut() = Some(handle);
            }
        });

        store.replace(1);
        assert_eq!(*count.borrow(), 0);
        store.replace(2);
        assert_eq!(*count.borrow(), 1);
    }
}
