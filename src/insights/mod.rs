//! Insights module - Recovery analytics for the patient context panel
//!
//! Features:
//! - ROM trend fitting and target projection (linfa)
//! - Stall and pain spike detection
//! - Adherence banding against the clinic objective

pub mod rom_trend;

pub use rom_trend::RomTrend;

use crate::patients::{ADHERENCE_TARGET, Patient};

/// A windowed ROM gain below this many degrees counts as a stall
pub const STALL_GAIN_DEGREES: f64 = 2.0;
/// Window over which a stall is measured, in days
pub const STALL_WINDOW_DAYS: usize = 3;
/// Day-over-day pain increase that counts as a spike
pub const PAIN_SPIKE_JUMP: f64 = 2.0;
/// Recovery target for knee flexion
pub const ROM_TARGET_DEGREES: f64 = 120.0;

/// Adherence gauge band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdherenceBand {
    Good,
    Borderline,
    Poor,
}

/// Band for an adherence score out of 100
pub fn adherence_band(score: u32) -> AdherenceBand {
    if score >= 80 {
        AdherenceBand::Good
    } else if score >= 60 {
        AdherenceBand::Borderline
    } else {
        AdherenceBand::Poor
    }
}

/// True when the last few measurements gained too little range
pub fn rom_stalled(rom_data: &[f64]) -> bool {
    if rom_data.len() < STALL_WINDOW_DAYS {
        return false;
    }
    let window = &rom_data[rom_data.len() - STALL_WINDOW_DAYS..];
    window[window.len() - 1] - window[0] < STALL_GAIN_DEGREES
}

/// Day of the first day-over-day pain jump, counted from 1
pub fn pain_spike_day(pain_levels: &[f64]) -> Option<usize> {
    pain_levels
        .windows(2)
        .position(|w| w[1] - w[0] >= PAIN_SPIKE_JUMP)
        .map(|i| i + 2)
}

/// Everything the context panel shows about one patient
#[derive(Debug, Clone)]
pub struct PatientInsights {
    pub daily_gain: Option<f64>,
    pub projected_days_to_target: Option<u32>,
    pub stalled: bool,
    pub pain_spike_day: Option<usize>,
    pub adherence_band: AdherenceBand,
    pub notices: Vec<String>,
}

impl PatientInsights {
    /// Run every analysis over one patient's series
    pub fn analyze(patient: &Patient) -> Self {
        let trend = RomTrend::fit(&patient.rom_data);
        let daily_gain = trend.as_ref().map(|t| t.daily_gain());
        let projected_days_to_target = trend
            .as_ref()
            .and_then(|t| t.days_to_reach(ROM_TARGET_DEGREES));
        let stalled = rom_stalled(&patient.rom_data);
        let spike = pain_spike_day(&patient.pain_levels);
        let adherence = adherence_band(patient.adherence_score);

        let mut notices = Vec::new();
        match (stalled, spike) {
            (true, Some(day)) => notices.push(format!(
                "⚠ La progression de l'amplitude articulaire est au point mort depuis {STALL_WINDOW_DAYS} jours. Pic de douleur détecté le jour {day}."
            )),
            (true, None) => notices.push(format!(
                "⚠ La progression de l'amplitude articulaire est au point mort depuis {STALL_WINDOW_DAYS} jours."
            )),
            (false, Some(day)) => {
                notices.push(format!("⚠ Pic de douleur détecté le jour {day}."))
            }
            (false, None) => {}
        }
        if stalled || adherence != AdherenceBand::Good {
            notices.push(
                "💡 Considérez réduire l'intensité des exercices ou vérifier la gestion de la douleur."
                    .to_string(),
            );
        }
        if patient.adherence_score < ADHERENCE_TARGET {
            notices.push(format!(
                "Adhésion à {}% (objectif: {ADHERENCE_TARGET}%).",
                patient.adherence_score
            ));
        }

        Self {
            daily_gain,
            projected_days_to_target,
            stalled,
            pain_spike_day: spike,
            adherence_band: adherence,
            notices,
        }
    }
}
