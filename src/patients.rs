//! Patient roster - mock recovery data behind the cockpit

use serde::{Deserialize, Serialize};

/// Weekly adherence target shown on the dashboard, percent
pub const ADHERENCE_TARGET: u32 = 85;

/// Day column labels, Monday through Sunday
pub const DAYS_OF_WEEK: [&str; 7] = ["Lun", "Mar", "Mer", "Jeu", "Ven", "Sam", "Dim"];

/// Weekday columns are flagged active on the canvas
pub const ACTIVE_DAYS: usize = 5;

/// Signed-in clinician, shown in the header and the copilot greeting
pub const CLINICIAN_NAME: &str = "Dr. Chen";
pub const CLINICIAN_SPECIALTY: &str = "Orthopédie";

/// Recovery status badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatientStatus {
    OnTrack,
    Warning,
    Critical,
}

impl PatientStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PatientStatus::OnTrack => "Sur la bonne voie",
            PatientStatus::Warning => "Attention",
            PatientStatus::Critical => "Critique",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            PatientStatus::OnTrack => "✓",
            PatientStatus::Warning => "⚠",
            PatientStatus::Critical => "✖",
        }
    }

    /// All statuses, in picker filter order
    pub fn all() -> &'static [PatientStatus] {
        &[
            PatientStatus::OnTrack,
            PatientStatus::Warning,
            PatientStatus::Critical,
        ]
    }
}

/// Patient record with the last seven days of home-program metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub injury_type: String,
    pub post_op_day: u32,
    pub status: PatientStatus,
    /// Knee flexion per day, degrees
    pub rom_data: Vec<f64>,
    /// Percent of prescribed sessions completed
    pub adherence_score: u32,
    /// Self-reported pain per day, 0-10
    pub pain_levels: Vec<f64>,
    /// Session intensity per day, 0-10
    pub intensity_levels: Vec<f64>,
}

impl Patient {
    /// Post-op week, 1-based (day 1 opens week 1)
    pub fn post_op_week(&self) -> u32 {
        self.post_op_day.saturating_sub(1) / 7 + 1
    }

    /// Rehab phase derived from the post-op week
    pub fn phase(&self) -> u32 {
        match self.post_op_week() {
            0..=2 => 1,
            3..=6 => 2,
            _ => 3,
        }
    }

    /// Most recent ROM reading, degrees
    pub fn latest_rom(&self) -> Option<f64> {
        self.rom_data.last().copied()
    }
}

struct SeedPatient {
    id: &'static str,
    name: &'static str,
    age: u32,
    injury_type: &'static str,
    post_op_day: u32,
    status: PatientStatus,
    rom_data: &'static [f64],
    adherence_score: u32,
    pain_levels: &'static [f64],
    intensity_levels: &'static [f64],
}

const ROSTER: &[SeedPatient] = &[
    SeedPatient {
        id: "pat-001",
        name: "Marie Dubois",
        age: 34,
        injury_type: "Reconstruction du LCA",
        post_op_day: 21,
        status: PatientStatus::Warning,
        rom_data: &[72.0, 78.0, 84.0, 89.0, 90.0, 90.0, 91.0],
        adherence_score: 72,
        pain_levels: &[3.0, 3.0, 4.0, 4.0, 6.0, 5.0, 4.0],
        intensity_levels: &[4.0, 5.0, 5.0, 6.0, 7.0, 6.0, 6.0],
    },
    SeedPatient {
        id: "pat-002",
        name: "Lucas Moreau",
        age: 27,
        injury_type: "Entorse de la cheville",
        post_op_day: 5,
        status: PatientStatus::OnTrack,
        rom_data: &[20.0, 25.0, 28.0, 32.0, 35.0, 38.0, 41.0],
        adherence_score: 91,
        pain_levels: &[5.0, 4.0, 4.0, 3.0, 3.0, 2.0, 2.0],
        intensity_levels: &[2.0, 2.0, 3.0, 3.0, 3.0, 4.0, 4.0],
    },
    SeedPatient {
        id: "pat-003",
        name: "Amélie Rousseau",
        age: 45,
        injury_type: "Prothèse totale du genou",
        post_op_day: 40,
        status: PatientStatus::Warning,
        rom_data: &[65.0, 70.0, 72.0, 75.0, 78.0, 80.0, 83.0],
        adherence_score: 68,
        pain_levels: &[6.0, 5.0, 5.0, 4.0, 4.0, 5.0, 4.0],
        intensity_levels: &[3.0, 4.0, 4.0, 5.0, 5.0, 5.0, 6.0],
    },
    SeedPatient {
        id: "pat-004",
        name: "Karim Benali",
        age: 52,
        injury_type: "Réparation de la coiffe des rotateurs",
        post_op_day: 62,
        status: PatientStatus::OnTrack,
        rom_data: &[95.0, 100.0, 104.0, 110.0, 115.0, 118.0, 122.0],
        adherence_score: 88,
        pain_levels: &[3.0, 2.0, 2.0, 2.0, 1.0, 2.0, 1.0],
        intensity_levels: &[5.0, 5.0, 6.0, 6.0, 7.0, 7.0, 7.0],
    },
    SeedPatient {
        id: "pat-005",
        name: "Sophie Lemaire",
        age: 61,
        injury_type: "Fracture du plateau tibial",
        post_op_day: 12,
        status: PatientStatus::Critical,
        rom_data: &[30.0, 32.0, 31.0, 33.0, 32.0, 33.0, 33.0],
        adherence_score: 48,
        pain_levels: &[7.0, 7.0, 8.0, 7.0, 8.0, 7.0, 8.0],
        intensity_levels: &[2.0, 2.0, 2.0, 3.0, 2.0, 2.0, 2.0],
    },
];

/// Owned copy of the mock roster
pub fn builtin_patients() -> Vec<Patient> {
    ROSTER
        .iter()
        .map(|seed| Patient {
            id: seed.id.to_string(),
            name: seed.name.to_string(),
            age: seed.age,
            injury_type: seed.injury_type.to_string(),
            post_op_day: seed.post_op_day,
            status: seed.status,
            rom_data: seed.rom_data.to_vec(),
            adherence_score: seed.adherence_score,
            pain_levels: seed.pain_levels.to_vec(),
            intensity_levels: seed.intensity_levels.to_vec(),
        })
        .collect()
}

/// Look up a roster patient by id
pub fn find_patient(id: &str) -> Option<Patient> {
    builtin_patients().into_iter().find(|p| p.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(PatientStatus::OnTrack.label(), "Sur la bonne voie");
        assert_eq!(PatientStatus::Warning.label(), "Attention");
        assert_eq!(PatientStatus::Critical.label(), "Critique");
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_string(&PatientStatus::OnTrack).unwrap();
        assert_eq!(json, "\"on-track\"");
        let back: PatientStatus = serde_json::from_str("\"critical\"").unwrap();
        assert_eq!(back, PatientStatus::Critical);
    }

    #[test]
    fn test_post_op_week() {
        let mut patient = builtin_patients().remove(0);
        patient.post_op_day = 21;
        assert_eq!(patient.post_op_week(), 3);
        patient.post_op_day = 22;
        assert_eq!(patient.post_op_week(), 4);
        patient.post_op_day = 1;
        assert_eq!(patient.post_op_week(), 1);
    }

    #[test]
    fn test_phase_from_week() {
        let mut patient = builtin_patients().remove(0);
        patient.post_op_day = 7; // week 1
        assert_eq!(patient.phase(), 1);
        patient.post_op_day = 21; // week 3
        assert_eq!(patient.phase(), 2);
        patient.post_op_day = 50; // week 8
        assert_eq!(patient.phase(), 3);
    }

    #[test]
    fn test_roster_ids_unique() {
        let roster = builtin_patients();
        for (i, a) in roster.iter().enumerate() {
            for b in roster.iter().skip(i + 1) {
                assert_ne!(a.id, b.id, "Duplicate id: {}", a.id);
            }
        }
    }

    #[test]
    fn test_roster_series_are_week_long() {
        for patient in builtin_patients() {
            assert_eq!(patient.rom_data.len(), 7, "{}: rom_data", patient.id);
            assert_eq!(patient.pain_levels.len(), 7, "{}: pain_levels", patient.id);
            assert_eq!(
                patient.intensity_levels.len(),
                7,
                "{}: intensity_levels",
                patient.id
            );
        }
    }

    #[test]
    fn test_find_patient() {
        let found = find_patient("pat-001").expect("pat-001 in roster");
        assert_eq!(found.name, "Marie Dubois");
        assert!(find_patient("pat-999").is_none());
    }

    #[test]
    fn test_day_labels_cover_week() {
        assert_eq!(DAYS_OF_WEEK.len(), 7);
        assert_eq!(DAYS_OF_WEEK[0], "Lun");
        assert_eq!(DAYS_OF_WEEK[6], "Dim");
        assert!(ACTIVE_DAYS <= DAYS_OF_WEEK.len());
    }
}
