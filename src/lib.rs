//! kinecockpit - Clinician cockpit for physical therapy protocol authoring
//!
//! Weekly protocol canvas, exercise catalog with local overrides, patient
//! recovery insights and a scripted copilot, rendered as a terminal dashboard.

pub mod copilot;
pub mod evidence;
pub mod exercises;
pub mod insights;
pub mod library;
pub mod patients;
pub mod schedule;
pub mod store;
pub mod tui;

pub use schedule::WeekSchedule;
pub use store::SqliteStore;
