//! Exercise library service - stored catalog with builtin fallback and per-exercise overrides

use std::collections::HashMap;

use rand::Rng;
use thiserror::Error;
use tracing::warn;

use crate::exercises::{self, ExerciseDefinition, ParameterOverride, ParameterSet};
use crate::store::{KeyValueStore, StoreError};

/// Storage key for the full definition list
const LIBRARY_KEY: &str = "exerciseLibrary";
/// Storage key for the id -> override map
const EDITS_KEY: &str = "exerciseEdits";
/// Storage key for the last chosen patient
const SELECTED_PATIENT_KEY: &str = "selectedPatientId";

const ID_CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 7;

/// Library operation failure
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("unknown exercise id: {id}")]
    NotFound { id: String },
}

/// Per-exercise parameter overrides, keyed by exercise id
pub type EditMap = HashMap<String, ParameterOverride>;

/// Stored library if present and parseable, builtin seed otherwise.
/// Unreadable data is logged and never surfaces as an error.
pub fn load_exercises(store: &dyn KeyValueStore) -> Vec<ExerciseDefinition> {
    match store.get(LIBRARY_KEY) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(list) => list,
            Err(e) => {
                warn!("stored exercise library is unreadable, using builtin: {e}");
                exercises::builtin_library()
            }
        },
        Ok(None) => exercises::builtin_library(),
        Err(e) => {
            warn!("exercise library read failed, using builtin: {e}");
            exercises::builtin_library()
        }
    }
}

/// Persist the full definition list
pub fn save_exercises(
    store: &dyn KeyValueStore,
    list: &[ExerciseDefinition],
) -> Result<(), LibraryError> {
    let raw = serde_json::to_string(list).map_err(StoreError::from)?;
    store.set(LIBRARY_KEY, &raw)?;
    Ok(())
}

/// Insert a new definition at the front of the library. The id is
/// generated here; whatever the caller put in the id field is replaced.
pub fn add_exercise(
    store: &dyn KeyValueStore,
    mut def: ExerciseDefinition,
) -> Result<ExerciseDefinition, LibraryError> {
    let mut list = load_exercises(store);
    def.id = generate_id(&list);
    list.insert(0, def.clone());
    save_exercises(store, &list)?;
    Ok(def)
}

/// Replace an existing definition, keyed by id
pub fn update_exercise(
    store: &dyn KeyValueStore,
    id: &str,
    mut def: ExerciseDefinition,
) -> Result<ExerciseDefinition, LibraryError> {
    let mut list = load_exercises(store);
    let slot = list
        .iter_mut()
        .find(|e| e.id == id)
        .ok_or_else(|| LibraryError::NotFound { id: id.to_string() })?;
    def.id = id.to_string();
    *slot = def.clone();
    save_exercises(store, &list)?;
    Ok(def)
}

/// Drop a definition. Unknown ids are a no-op.
pub fn delete_exercise(store: &dyn KeyValueStore, id: &str) -> Result<(), LibraryError> {
    let mut list = load_exercises(store);
    list.retain(|e| e.id != id);
    save_exercises(store, &list)
}

/// Drop the stored library and overrides, back to the builtin seed
pub fn reset_library(store: &dyn KeyValueStore) -> Result<(), LibraryError> {
    store.remove(LIBRARY_KEY)?;
    store.remove(EDITS_KEY)?;
    Ok(())
}

fn generate_id(existing: &[ExerciseDefinition]) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let suffix: String = (0..ID_SUFFIX_LEN)
            .map(|_| ID_CHARSET[rng.gen_range(0..ID_CHARSET.len())] as char)
            .collect();
        let id = format!("ex_{suffix}");
        if !existing.iter().any(|e| e.id == id) {
            return id;
        }
    }
}

/// Stored override map, empty when nothing was saved or the data is unreadable
pub fn load_edits(store: &dyn KeyValueStore) -> EditMap {
    match store.get(EDITS_KEY) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(edits) => edits,
            Err(e) => {
                warn!("stored parameter edits are unreadable, discarding: {e}");
                EditMap::new()
            }
        },
        Ok(None) => EditMap::new(),
        Err(e) => {
            warn!("parameter edits read failed: {e}");
            EditMap::new()
        }
    }
}

fn persist_edits(store: &dyn KeyValueStore, edits: &EditMap) -> Result<(), LibraryError> {
    let raw = serde_json::to_string(edits).map_err(StoreError::from)?;
    store.set(EDITS_KEY, &raw)?;
    Ok(())
}

/// Save an override for one exercise. An empty override clears the entry.
pub fn save_edit(
    store: &dyn KeyValueStore,
    id: &str,
    edit: ParameterOverride,
) -> Result<(), LibraryError> {
    let mut edits = load_edits(store);
    if edit.is_empty() {
        edits.remove(id);
    } else {
        edits.insert(id.to_string(), edit);
    }
    persist_edits(store, &edits)
}

/// Drop the override for one exercise
pub fn reset_edit(store: &dyn KeyValueStore, id: &str) -> Result<(), LibraryError> {
    let mut edits = load_edits(store);
    edits.remove(id);
    persist_edits(store, &edits)
}

/// Defaults merged with the stored override, if any
pub fn effective_params(def: &ExerciseDefinition, edits: &EditMap) -> ParameterSet {
    match edits.get(&def.id) {
        Some(edit) => edit.apply(&def.default_params),
        None => def.default_params.clone(),
    }
}

pub fn has_override(id: &str, edits: &EditMap) -> bool {
    edits.get(id).is_some_and(|e| !e.is_empty())
}

/// Last chosen patient, if one was persisted
pub fn selected_patient_id(store: &dyn KeyValueStore) -> Option<String> {
    store.get(SELECTED_PATIENT_KEY).ok().flatten()
}

/// Remember the chosen patient across sessions
pub fn select_patient(store: &dyn KeyValueStore, id: &str) -> Result<(), LibraryError> {
    store.set(SELECTED_PATIENT_KEY, id)?;
    Ok(())
}
