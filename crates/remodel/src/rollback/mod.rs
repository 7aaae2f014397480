//! Rollback engine: snapshot and masked restore.
//!
//! A snapshot of the record is taken when the capability is attached and
//! refreshed after every successful create/update save. `rollback` restores
//! the record from the snapshot, either wholesale or through a mask
//! selecting individual paths. While the restore runs the model is locked,
//! which suppresses dirty tracking and spontaneous validator recomputation.

use remodel_path::Step;
use serde_json::Value;

use crate::model::Model;
use crate::rollback::mask::Mask;

pub mod flatten_keys;
pub mod mask;

pub(crate) struct RollbackState {
    original: Value,
    mask_paths: Option<Vec<String>>,
}

impl RollbackState {
    pub(crate) fn new(original: Value, mask: Option<&Mask>) -> Self {
        RollbackState {
            original,
            mask_paths: mask.map(Mask::flatten),
        }
    }
}

impl Model {
    /// Restore the record from the snapshot, applying the default mask when
    /// one was configured.
    ///
    /// No-op when the model is not dirty or lacks the rollback capability.
    pub fn rollback(&mut self) {
        self.rollback_masked(None);
    }

    /// Restore the record from the snapshot through `mask`, overriding the
    /// configured default. `None` falls back to the default mask (or a full
    /// restore when none is configured).
    ///
    /// Masked paths absent from the snapshot are removed from the live
    /// record (object keys) or nulled (array slots). `[]` placeholders
    /// expand against the live array shape; a placeholder over a non-array
    /// value contributes nothing. Afterwards `dirty` reflects whether the
    /// record still diverges from the snapshot.
    pub fn rollback_masked(&mut self, mask: Option<&Mask>) {
        if !self.dirty() {
            return;
        }
        let (original, default_paths) = match &self.rollback {
            Some(state) => (state.original.clone(), state.mask_paths.clone()),
            None => return,
        };
        let paths = mask.map(Mask::flatten).or(default_paths);

        self.run_before_rollback();
        self.flags.borrow_mut().locked = true;

        match &paths {
            Some(list) => {
                self.store.update(|data| {
                    for mask_path in list {
                        let steps = remodel_path::parse_relaxed(mask_path);
                        // Placeholder expansion sees copies made for earlier
                        // mask entries
                        for path in resolve_paths(data, &steps) {
                            match remodel_path::get(&original, &path) {
                                Some(value) => {
                                    remodel_path::set(data, &path, value.clone());
                                }
                                None => {
                                    remodel_path::remove(data, &path);
                                }
                            }
                        }
                    }
                });
            }
            None => self.store.replace(original.clone()),
        }

        let diverged = self.store.with(|data| *data != original);
        {
            let mut flags = self.flags.borrow_mut();
            flags.dirty = diverged;
            flags.locked = false;
        }
        self.run_after_rollback();
    }

    /// Re-snapshot the current record as the rollback baseline.
    pub fn update_original(&mut self) {
        let data = self.store.get();
        if let Some(state) = &mut self.rollback {
            state.original = data;
        }
    }

    /// Flattened default mask paths, when a default mask was configured.
    pub fn mask_paths(&self) -> Option<&[String]> {
        self.rollback
            .as_ref()
            .and_then(|state| state.mask_paths.as_deref())
    }
}

/// Expand `[]` placeholders against the live data shape.
///
/// Each placeholder multiplies the path by the current length of the array
/// at its prefix; a non-array value there yields no paths.
fn resolve_paths(data: &Value, steps: &[Step]) -> Vec<Vec<Step>> {
    let Some(pos) = steps.iter().position(Step::is_any) else {
        return vec![steps.to_vec()];
    };
    let prefix = &steps[..pos];
    let Some(Value::Array(arr)) = remodel_path::get(data, prefix) else {
        return Vec::new();
    };
    let len = arr.len();
    let rest = &steps[pos + 1..];

    let mut paths = Vec::new();
    for idx in 0..len {
        let mut candidate = Vec::with_capacity(steps.len());
        candidate.extend_from_slice(prefix);
        candidate.push(Step::Index(idx));
        candidate.extend_from_slice(rest);
        paths.extend(resolve_paths(data, &candidate));
    }
    paths
}
