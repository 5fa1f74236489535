//! Exercise catalog - clinical exercise definitions and safety rules

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Upper bound for range-of-motion values, degrees
pub const ROM_LIMIT: u16 = 180;
/// Upper bound for the pain threshold scale
pub const PAIN_SCALE_MAX: u8 = 10;

/// Tunable parameters attached to every exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSet {
    /// Minutes
    pub duration: u32,
    pub sets: u32,
    pub reps: u32,
    /// Free-form pacing note, e.g. "3-2-3" or "continuous"
    pub tempo: String,
    /// Degrees
    pub rom_min: u16,
    /// Degrees
    pub rom_max: u16,
    /// 0-10 pain scale
    pub pain_threshold: u8,
}

/// Partial parameter edit; absent fields keep the defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sets: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tempo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rom_min: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rom_max: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pain_threshold: Option<u8>,
}

impl ParameterOverride {
    /// Merge this override over a base parameter set
    pub fn apply(&self, base: &ParameterSet) -> ParameterSet {
        ParameterSet {
            duration: self.duration.unwrap_or(base.duration),
            sets: self.sets.unwrap_or(base.sets),
            reps: self.reps.unwrap_or(base.reps),
            tempo: self.tempo.clone().unwrap_or_else(|| base.tempo.clone()),
            rom_min: self.rom_min.unwrap_or(base.rom_min),
            rom_max: self.rom_max.unwrap_or(base.rom_max),
            pain_threshold: self.pain_threshold.unwrap_or(base.pain_threshold),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.duration.is_none()
            && self.sets.is_none()
            && self.reps.is_none()
            && self.tempo.is_none()
            && self.rom_min.is_none()
            && self.rom_max.is_none()
            && self.pain_threshold.is_none()
    }
}

/// One exercise in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseDefinition {
    pub id: String,
    pub name: String,
    pub category: String,
    pub target_muscles: Vec<String>,
    /// Free clinical notes; only "post-op < N weeks" rules gate placement
    pub contraindications: Vec<String>,
    pub icon: String,
    pub default_params: ParameterSet,
}

/// Static seed entry, converted to an owned definition on load
struct SeedExercise {
    id: &'static str,
    name: &'static str,
    category: &'static str,
    target_muscles: &'static [&'static str],
    contraindications: &'static [&'static str],
    icon: &'static str,
    duration: u32,
    sets: u32,
    reps: u32,
    tempo: &'static str,
    rom_min: u16,
    rom_max: u16,
    pain_threshold: u8,
}

/// Builtin knee rehab catalog, shipped with the app
const SEED_LIBRARY: &[SeedExercise] = &[
    SeedExercise {
        id: "quad_sets",
        name: "Séries de quadriceps",
        category: "Strengthening",
        target_muscles: &["Quadriceps"],
        contraindications: &[],
        icon: "🦵",
        duration: 10,
        sets: 3,
        reps: 15,
        tempo: "3-2-3",
        rom_min: 0,
        rom_max: 20,
        pain_threshold: 2,
    },
    SeedExercise {
        id: "heel_slides",
        name: "Glissements du talon",
        category: "ROM",
        target_muscles: &["Ischio-jambiers", "Quadriceps"],
        contraindications: &[],
        icon: "🦶",
        duration: 10,
        sets: 2,
        reps: 12,
        tempo: "lent",
        rom_min: 0,
        rom_max: 90,
        pain_threshold: 3,
    },
    SeedExercise {
        id: "straight_leg_raises",
        name: "Relevés de jambe tendue",
        category: "Strengthening",
        target_muscles: &["Quadriceps", "Fléchisseurs de la hanche"],
        contraindications: &[],
        icon: "🦵",
        duration: 15,
        sets: 3,
        reps: 10,
        tempo: "2-1-2",
        rom_min: 0,
        rom_max: 45,
        pain_threshold: 2,
    },
    SeedExercise {
        id: "mini_squats",
        name: "Mini-squats",
        category: "Strengthening",
        target_muscles: &["Quadriceps", "Fessiers"],
        contraindications: &[],
        icon: "🏋️",
        duration: 10,
        sets: 3,
        reps: 12,
        tempo: "3-1-3",
        rom_min: 0,
        rom_max: 60,
        pain_threshold: 3,
    },
    SeedExercise {
        id: "stationary_bike",
        name: "Vélo stationnaire",
        category: "Circulation",
        target_muscles: &["Quadriceps", "Mollets"],
        contraindications: &["post-op < 3 weeks"],
        icon: "🚴",
        duration: 15,
        sets: 1,
        reps: 1,
        tempo: "continuous",
        rom_min: 0,
        rom_max: 110,
        pain_threshold: 3,
    },
    SeedExercise {
        id: "ankle_pumps",
        name: "Pompes de cheville",
        category: "Circulation",
        target_muscles: &["Mollets"],
        contraindications: &[],
        icon: "👣",
        duration: 5,
        sets: 4,
        reps: 20,
        tempo: "continuous",
        rom_min: 0,
        rom_max: 40,
        pain_threshold: 1,
    },
    SeedExercise {
        id: "wall_slides",
        name: "Glissades murales",
        category: "ROM",
        target_muscles: &["Quadriceps"],
        contraindications: &[],
        icon: "🧱",
        duration: 10,
        sets: 3,
        reps: 10,
        tempo: "lent",
        rom_min: 0,
        rom_max: 100,
        pain_threshold: 3,
    },
    SeedExercise {
        id: "step_ups",
        name: "Montées de marche",
        category: "Strengthening",
        target_muscles: &["Quadriceps", "Fessiers"],
        contraindications: &["post-op < 4 weeks"],
        icon: "🪜",
        duration: 12,
        sets: 3,
        reps: 10,
        tempo: "2-1-2",
        rom_min: 0,
        rom_max: 70,
        pain_threshold: 3,
    },
    SeedExercise {
        id: "balance_board",
        name: "Plateau d'équilibre",
        category: "Balance",
        target_muscles: &["Stabilisateurs", "Mollets"],
        contraindications: &["post-op < 6 weeks"],
        icon: "🧘",
        duration: 10,
        sets: 3,
        reps: 8,
        tempo: "continuous",
        rom_min: 0,
        rom_max: 30,
        pain_threshold: 3,
    },
    SeedExercise {
        id: "jump_squats",
        name: "Squats sautés",
        category: "Strengthening",
        target_muscles: &["Quadriceps", "Fessiers", "Mollets"],
        contraindications: &["post-op < 8 weeks"],
        icon: "⚡",
        duration: 12,
        sets: 4,
        reps: 8,
        tempo: "explosif",
        rom_min: 0,
        rom_max: 90,
        pain_threshold: 4,
    },
    SeedExercise {
        id: "light_jogging",
        name: "Course légère",
        category: "Circulation",
        target_muscles: &["Quadriceps", "Ischio-jambiers", "Mollets"],
        contraindications: &["post-op < 12 weeks"],
        icon: "🏃",
        duration: 20,
        sets: 1,
        reps: 1,
        tempo: "continuous",
        rom_min: 0,
        rom_max: 120,
        pain_threshold: 3,
    },
    SeedExercise {
        id: "hamstring_stretch",
        name: "Étirements des ischio-jambiers",
        category: "ROM",
        target_muscles: &["Ischio-jambiers"],
        contraindications: &["éviter en cas de douleur aiguë"],
        icon: "🧎",
        duration: 10,
        sets: 2,
        reps: 5,
        tempo: "maintien 30s",
        rom_min: 0,
        rom_max: 80,
        pain_threshold: 4,
    },
];

/// Owned copy of the builtin catalog
pub fn builtin_library() -> Vec<ExerciseDefinition> {
    SEED_LIBRARY
        .iter()
        .map(|seed| ExerciseDefinition {
            id: seed.id.to_string(),
            name: seed.name.to_string(),
            category: seed.category.to_string(),
            target_muscles: seed.target_muscles.iter().map(|m| m.to_string()).collect(),
            contraindications: seed
                .contraindications
                .iter()
                .map(|c| c.to_string())
                .collect(),
            icon: seed.icon.to_string(),
            default_params: ParameterSet {
                duration: seed.duration,
                sets: seed.sets,
                reps: seed.reps,
                tempo: seed.tempo.to_string(),
                rom_min: seed.rom_min,
                rom_max: seed.rom_max,
                pain_threshold: seed.pain_threshold,
            },
        })
        .collect()
}

static MIN_WEEKS_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"post-op < (\d+) weeks").expect("valid rule pattern"));

/// Parse the week threshold out of a "post-op < N weeks" rule
pub fn min_week_threshold(rule: &str) -> Option<u32> {
    let caps = MIN_WEEKS_RULE.captures(rule)?;
    caps.get(1)?.as_str().parse().ok()
}

/// True when any rule blocks the exercise at the given post-op day.
/// Free-text notes never block; only "post-op < N weeks" rules gate placement.
pub fn is_contraindicated(def: &ExerciseDefinition, post_op_day: u32) -> bool {
    def.contraindications
        .iter()
        .any(|rule| min_week_threshold(rule).is_some_and(|weeks| post_op_day < weeks * 7))
}

/// Serialize an exercise for a canvas drop
pub fn drag_payload(def: &ExerciseDefinition) -> String {
    serde_json::to_string(def).unwrap_or_default()
}

/// Decode a dropped payload. Malformed JSON or a payload without an
/// identity comes back as None.
pub fn decode_drag_payload(raw: &str) -> Option<ExerciseDefinition> {
    let def: ExerciseDefinition = serde_json::from_str(raw).ok()?;
    if def.id.is_empty() || def.name.is_empty() {
        return None;
    }
    Some(def)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_sets() -> ExerciseDefinition {
        builtin_library()
            .into_iter()
            .find(|e| e.id == "quad_sets")
            .expect("builtin catalog has quad_sets")
    }

    fn with_rules(rules: &[&str]) -> ExerciseDefinition {
        let mut def = quad_sets();
        def.contraindications = rules.iter().map(|r| r.to_string()).collect();
        def
    }

    #[test]
    fn test_builtin_library_ids_unique() {
        let library = builtin_library();
        for (i, a) in library.iter().enumerate() {
            for b in library.iter().skip(i + 1) {
                assert_ne!(a.id, b.id, "Duplicate id: {}", a.id);
            }
        }
    }

    #[test]
    fn test_builtin_library_entries_well_formed() {
        for def in builtin_library() {
            assert!(!def.id.is_empty());
            assert!(!def.name.is_empty());
            assert!(!def.category.is_empty());
            assert!(
                def.default_params.rom_min < def.default_params.rom_max,
                "{}: ROM bounds inverted",
                def.id
            );
            assert!(def.default_params.pain_threshold <= PAIN_SCALE_MAX);
        }
    }

    #[test]
    fn test_min_week_threshold_parses_rule() {
        assert_eq!(min_week_threshold("post-op < 8 weeks"), Some(8));
        assert_eq!(min_week_threshold("post-op < 12 weeks"), Some(12));
    }

    #[test]
    fn test_min_week_threshold_ignores_free_text() {
        assert_eq!(min_week_threshold("éviter en cas de douleur aiguë"), None);
        assert_eq!(min_week_threshold(""), None);
        assert_eq!(min_week_threshold("post-op"), None);
    }

    #[test]
    fn test_contraindicated_before_threshold() {
        let def = with_rules(&["post-op < 8 weeks"]);
        // 8 weeks = 56 days
        assert!(is_contraindicated(&def, 40));
        assert!(is_contraindicated(&def, 55));
    }

    #[test]
    fn test_allowed_at_and_after_threshold() {
        let def = with_rules(&["post-op < 8 weeks"]);
        assert!(!is_contraindicated(&def, 56));
        assert!(!is_contraindicated(&def, 60));
    }

    #[test]
    fn test_free_text_rules_never_block() {
        let def = with_rules(&["éviter en cas de douleur aiguë"]);
        assert!(!is_contraindicated(&def, 0));
        assert!(!is_contraindicated(&def, 100));
    }

    #[test]
    fn test_no_rules_never_blocks() {
        let def = with_rules(&[]);
        assert!(!is_contraindicated(&def, 0));
    }

    #[test]
    fn test_any_matching_rule_blocks() {
        let def = with_rules(&["note libre", "post-op < 6 weeks"]);
        assert!(is_contraindicated(&def, 21));
        assert!(!is_contraindicated(&def, 42));
    }

    #[test]
    fn test_params_serialize_camel_case() {
        let def = quad_sets();
        let json = serde_json::to_string(&def.default_params).unwrap();
        assert!(json.contains("\"romMin\""), "JSON: {}", json);
        assert!(json.contains("\"romMax\""), "JSON: {}", json);
        assert!(json.contains("\"painThreshold\""), "JSON: {}", json);
    }

    #[test]
    fn test_override_apply_merges_set_fields_only() {
        let base = quad_sets().default_params;
        let edit = ParameterOverride {
            sets: Some(5),
            tempo: Some("4-4-4".to_string()),
            ..Default::default()
        };
        let merged = edit.apply(&base);
        assert_eq!(merged.sets, 5);
        assert_eq!(merged.tempo, "4-4-4");
        assert_eq!(merged.duration, base.duration);
        assert_eq!(merged.rom_max, base.rom_max);
    }

    #[test]
    fn test_override_empty_roundtrip() {
        let edit = ParameterOverride::default();
        assert!(edit.is_empty());
        let json = serde_json::to_string(&edit).unwrap();
        assert_eq!(json, "{}", "Empty override should serialize without fields");
    }

    #[test]
    fn test_drag_payload_roundtrip() {
        let def = quad_sets();
        let payload = drag_payload(&def);
        let decoded = decode_drag_payload(&payload).expect("payload should decode");
        assert_eq!(decoded, def);
    }

    #[test]
    fn test_decode_rejects_malformed_json() {
        assert!(decode_drag_payload("not json").is_none());
        assert!(decode_drag_payload("{\"id\":").is_none());
    }

    #[test]
    fn test_decode_rejects_missing_identity() {
        let mut def = quad_sets();
        def.id = String::new();
        assert!(decode_drag_payload(&drag_payload(&def)).is_none());

        let mut def = quad_sets();
        def.name = String::new();
        assert!(decode_drag_payload(&drag_payload(&def)).is_none());
    }
}
