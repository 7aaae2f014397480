//! Reactive data models over `serde_json` records.
//!
//! A [`Model`] wraps a JSON record in a reactive store and composes optional
//! capabilities on top of it:
//!
//! - **dirty tracking** — any committed change to the record flips the
//!   `dirty` flag (unless the model is locked by a bulk restore);
//! - **rollback** — a snapshot of the record taken at construction (and
//!   refreshed after successful saves) can be restored wholesale or through a
//!   [`Mask`] selecting individual paths;
//! - **save** — an async [`Storage`] backend persists the record, with
//!   create/update/destroy routing driven by the model flags;
//! - **validation** — a recursive [`Pattern`] compiles
//!   into a tree of validator nodes that track per-field dirtiness, validity,
//!   and messages, reconciling themselves against structural changes.
//!
//! # Example
//!
//! ```
//! use remodel::{Model, Pattern, Verdict};
//! use serde_json::json;
//!
//! let pattern = Pattern::new().rule("name", |value, _, _| {
//!     match value.and_then(|v| v.as_str()) {
//!         Some(s) if !s.is_empty() => Verdict::Pass,
//!         _ => Verdict::fail("name is required"),
//!     }
//! });
//!
//! let model = Model::builder("id", json!({"id": null, "name": ""}))
//!     .with_pattern(pattern)
//!     .build()
//!     .unwrap();
//!
//! assert!(model.v().invalid());
//! model.update(|data| data["name"] = json!("Ada"));
//! assert!(!model.v().invalid());
//! ```

pub mod model;
pub mod rollback;
pub mod save;
pub mod validate;

pub use model::builder::{ModelBuilder, RollbackOptions, SaveOptions, ValidateOptions};
pub use model::{Capability, Model, ModelError, ModelHooks};
pub use rollback::flatten_keys::flatten_keys;
pub use rollback::mask::{ArrayMask, Mask, MaskNode};
pub use save::{PersistenceError, SaveError, Storage};
pub use validate::pattern::{ArrayPattern, Each, Pattern, PatternNode, RuleFn, Verdict};
pub use validate::validation::Validation;

pub use remodel_path::{PathError, Step};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
