//! Single-threaded reactive value container.
//!
//! [`Store`] holds a value behind shared interior mutability and notifies
//! watchers synchronously whenever a committed mutation actually changes the
//! value. Two watcher flavors exist:
//!
//! - [`Store::subscribe`] fires on every committed change (a deep watcher);
//! - [`Store::watch`] derives a value through a selector and fires only when
//!   the derived value changes, compared by `PartialEq`.
//!
//! Notification order is most-recent-subscriber-first. Watchers registered
//! during a notification round are not called until the next commit, and a
//! watcher stopped mid-round is skipped for the rest of it.
//!
//! # Example
//!
//! ```
//! use remodel_reactive::Store;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let store = Store::new(vec![1, 2, 3]);
//! let seen = Rc::new(Cell::new(0usize));
//! let seen2 = Rc::clone(&seen);
//! let _watch = store.subscribe(move |v: &Vec<i32>| seen2.set(v.len()));
//!
//! store.update(|v| v.push(4));
//! assert_eq!(seen.get(), 4);
//!
//! // Committing an identical value does not notify
//! store.update(|_| {});
//! assert_eq!(seen.get(), 4);
//! ```

pub mod store;
pub mod watch;

pub use store::Store;
pub use watch::WatchHandle;
