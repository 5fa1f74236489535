//! Weekly protocol canvas - placements, parameter editing and publication

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::exercises::{self, ExerciseDefinition, PAIN_SCALE_MAX, ParameterSet, ROM_LIMIT};
use crate::patients::Patient;
use crate::store::{KeyValueStore, StoreResult};

/// Days on the weekly canvas, indexed 0-6 from Monday
pub const WEEK_DAYS: u8 = 7;

/// One exercise dropped on the canvas, with its own editable parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub id: u64,
    pub exercise: ExerciseDefinition,
    pub params: ParameterSet,
    pub day: u8,
    pub order: u32,
}

/// Patient-facing export of a published protocol
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolExport {
    pub patient_id: String,
    pub patient_name: String,
    pub published_at: DateTime<Utc>,
    pub exercises: Vec<ExportEntry>,
}

/// One line of a published protocol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportEntry {
    pub name: String,
    pub day: u8,
    pub params: ParameterSet,
}

#[derive(Serialize, Deserialize)]
struct DraftRecord {
    placements: Vec<Placement>,
}

fn draft_key(patient_id: &str) -> String {
    format!("protocolDraft:{patient_id}")
}

/// The weekly canvas for one patient
#[derive(Debug, Clone)]
pub struct WeekSchedule {
    post_op_day: u32,
    placements: Vec<Placement>,
    selected: Option<u64>,
    next_id: u64,
}

impl WeekSchedule {
    /// Empty canvas for a patient at the given recovery day
    pub fn new(post_op_day: u32) -> Self {
        Self {
            post_op_day,
            placements: Vec::new(),
            selected: None,
            next_id: 1,
        }
    }

    /// Drop an exercise on a day. Refused for days off the canvas and for
    /// exercises contraindicated at the patient's recovery stage.
    pub fn place(&mut self, exercise: &ExerciseDefinition, params: ParameterSet, day: u8) -> Option<u64> {
        if day >= WEEK_DAYS {
            warn!("placement refused: day {day} is off the canvas");
            return None;
        }
        if exercises::is_contraindicated(exercise, self.post_op_day) {
            warn!(
                "placement refused: {} is contraindicated at day {}",
                exercise.name, self.post_op_day
            );
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;
        let order = self.placements.iter().filter(|p| p.day == day).count() as u32;
        self.placements.push(Placement {
            id,
            exercise: exercise.clone(),
            params,
            day,
            order,
        });
        Some(id)
    }

    /// Drop a serialized drag payload on a day
    pub fn place_payload(&mut self, payload: &str, params: ParameterSet, day: u8) -> Option<u64> {
        match exercises::decode_drag_payload(payload) {
            Some(def) => self.place(&def, params, day),
            None => {
                warn!("placement refused: undecodable drag payload");
                None
            }
        }
    }

    /// Apply a proposed parameter set to one placement, field by field.
    /// Out-of-range fields keep their stored value; a proposal that would
    /// cross the ROM bounds leaves both bounds untouched.
    pub fn update_params(&mut self, id: u64, proposed: &ParameterSet) -> bool {
        let Some(placement) = self.placements.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        let current = placement.params.clone();
        let mut next = current.clone();

        if proposed.duration >= 1 {
            next.duration = proposed.duration;
        }
        if proposed.sets >= 1 {
            next.sets = proposed.sets;
        }
        if proposed.reps >= 1 {
            next.reps = proposed.reps;
        }
        next.tempo = proposed.tempo.clone();
        next.pain_threshold = proposed.pain_threshold.min(PAIN_SCALE_MAX);
        if proposed.rom_min < current.rom_max {
            next.rom_min = proposed.rom_min;
        }
        if proposed.rom_max > current.rom_min && proposed.rom_max <= ROM_LIMIT {
            next.rom_max = proposed.rom_max;
        }
        if next.rom_min >= next.rom_max {
            next.rom_min = current.rom_min;
            next.rom_max = current.rom_max;
        }

        placement.params = next;
        true
    }

    /// Remove one placement. Orders of the remaining placements are kept.
    pub fn remove(&mut self, id: u64) {
        self.placements.retain(|p| p.id != id);
        if self.selected == Some(id) {
            self.selected = None;
        }
    }

    /// Wipe the canvas
    pub fn clear_all(&mut self) {
        self.placements.clear();
        self.selected = None;
    }

    /// Placements for one day, in order
    pub fn placements_for_day(&self, day: u8) -> Vec<&Placement> {
        let mut on_day: Vec<&Placement> = self.placements.iter().filter(|p| p.day == day).collect();
        on_day.sort_by_key(|p| p.order);
        on_day
    }

    /// All placements, in placement order
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Select a placement for inspection. False for unknown ids.
    pub fn select(&mut self, id: u64) -> bool {
        if self.placements.iter().any(|p| p.id == id) {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected_id(&self) -> Option<u64> {
        self.selected
    }

    /// The selected placement, if it is still on the canvas
    pub fn selected(&self) -> Option<&Placement> {
        self.selected
            .and_then(|id| self.placements.iter().find(|p| p.id == id))
    }

    /// Freeze the canvas into a patient-facing export
    pub fn publish(&self, patient: &Patient) -> ProtocolExport {
        let exercises = self
            .placements
            .iter()
            .map(|p| ExportEntry {
                name: p.exercise.name.clone(),
                day: p.day,
                params: p.params.clone(),
            })
            .collect::<Vec<_>>();
        info!(
            "published protocol for {}: {} exercises",
            patient.name,
            exercises.len()
        );
        ProtocolExport {
            patient_id: patient.id.clone(),
            patient_name: patient.name.clone(),
            published_at: Utc::now(),
            exercises,
        }
    }

    /// Persist the canvas as a per-patient draft
    pub fn save_draft(&self, store: &dyn KeyValueStore, patient_id: &str) -> StoreResult<()> {
        let record = DraftRecord {
            placements: self.placements.clone(),
        };
        store.set(&draft_key(patient_id), &serde_json::to_string(&record)?)
    }

    /// Restore a saved draft. Missing or unreadable drafts yield None.
    pub fn load_draft(
        store: &dyn KeyValueStore,
        patient_id: &str,
        post_op_day: u32,
    ) -> Option<WeekSchedule> {
        let raw = match store.get(&draft_key(patient_id)) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("draft read for {patient_id} failed, ignoring: {e}");
                return None;
            }
        };
        let record: DraftRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!("draft for {patient_id} is unreadable, ignoring: {e}");
                return None;
            }
        };
        let next_id = record.placements.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        Some(WeekSchedule {
            post_op_day,
            placements: record.placements,
            selected: None,
            next_id,
        })
    }
}
