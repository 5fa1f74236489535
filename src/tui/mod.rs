//! TUI module - Clinician cockpit dashboard with ratatui

mod views;

use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::io::{Stdout, stdout};
use tracing::{error, info, warn};

use crate::copilot::{CopilotContext, CopilotSession, SUGGESTIONS};
use crate::exercises::{self, ExerciseDefinition};
use crate::library::{self, EditMap};
use crate::patients::{self, CLINICIAN_NAME, DAYS_OF_WEEK, Patient, PatientStatus};
use crate::schedule::{WEEK_DAYS, WeekSchedule};
use crate::store::SqliteStore;

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Tempo choices the inspector cycles through
const TEMPO_CHOICES: [&str; 5] = ["continuous", "3-2-3", "2-1-2", "lent", "explosif"];
/// Editable rows of the parameter inspector
const INSPECTOR_FIELDS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Picker,
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Library,
    Canvas,
    Inspector,
    Copilot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PanelTab {
    Copilot,
    Evidence,
}

/// App state for the cockpit TUI
pub struct App {
    store: SqliteStore,
    patients: Vec<Patient>,
    screen: Screen,
    picker_index: usize,
    status_filter: Option<PatientStatus>,
    patient: Option<Patient>,
    schedule: WeekSchedule,
    library: Vec<ExerciseDefinition>,
    edits: EditMap,
    copilot: Option<CopilotSession>,
    focus: Focus,
    library_index: usize,
    target_day: u8,
    canvas_day: u8,
    canvas_slot: usize,
    inspector_field: usize,
    chat_input: String,
    evidence_query: String,
    panel_tab: PanelTab,
    status_line: Option<String>,
    should_quit: bool,
}

impl App {
    pub fn new(store: SqliteStore) -> Result<Self> {
        let patients = patients::builtin_patients();
        let library = library::load_exercises(&store);
        let edits = library::load_edits(&store);
        let picker_index = library::selected_patient_id(&store)
            .and_then(|id| patients.iter().position(|p| p.id == id))
            .unwrap_or(0);

        Ok(Self {
            store,
            patients,
            screen: Screen::Picker,
            picker_index,
            status_filter: None,
            patient: None,
            schedule: WeekSchedule::new(0),
            library,
            edits,
            copilot: None,
            focus: Focus::Library,
            library_index: 0,
            target_day: 0,
            canvas_day: 0,
            canvas_slot: 0,
            inspector_field: 0,
            chat_input: String::new(),
            evidence_query: String::new(),
            panel_tab: PanelTab::Copilot,
            status_line: None,
            should_quit: false,
        })
    }

    /// Run the cockpit until the clinician quits
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;

        while !self.should_quit {
            if let Some(copilot) = self.copilot.as_mut() {
                copilot.poll_replies();
            }
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
        }

        restore_terminal()?;
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        match self.screen {
            Screen::Picker => views::render_picker(self, frame),
            Screen::Dashboard => views::render_dashboard(self, frame),
        }
    }

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press {
                    match self.screen {
                        Screen::Picker => self.handle_picker_key(key.code),
                        Screen::Dashboard => self.handle_dashboard_key(key.code),
                    }
                }
        Ok(())
    }

    fn filtered_patients(&self) -> Vec<&Patient> {
        self.patients
            .iter()
            .filter(|p| self.status_filter.is_none_or(|s| p.status == s))
            .collect()
    }

    fn handle_picker_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Up => self.picker_index = self.picker_index.saturating_sub(1),
            KeyCode::Down => {
                let count = self.filtered_patients().len();
                if count > 0 && self.picker_index + 1 < count {
                    self.picker_index += 1;
                }
            }
            KeyCode::Char('f') => {
                self.status_filter = next_status_filter(self.status_filter);
                self.picker_index = 0;
            }
            KeyCode::Enter => {
                if let Some(patient) = self.filtered_patients().get(self.picker_index) {
                    let patient = (*patient).clone();
                    self.open_dashboard(patient);
                }
            }
            _ => {}
        }
    }

    fn open_dashboard(&mut self, patient: Patient) {
        if let Err(e) = library::select_patient(&self.store, &patient.id) {
            warn!("could not persist patient selection: {e}");
        }
        self.library = library::load_exercises(&self.store);
        self.edits = library::load_edits(&self.store);
        self.schedule = WeekSchedule::load_draft(&self.store, &patient.id, patient.post_op_day)
            .unwrap_or_else(|| WeekSchedule::new(patient.post_op_day));

        let ctx = CopilotContext {
            patient: patient.clone(),
            library: self.library.clone(),
        };
        self.copilot = Some(CopilotSession::new(ctx, CLINICIAN_NAME));
        info!("dashboard opened for {}", patient.name);

        self.patient = Some(patient);
        self.screen = Screen::Dashboard;
        self.focus = Focus::Library;
        self.panel_tab = PanelTab::Copilot;
        self.library_index = 0;
        self.target_day = 0;
        self.canvas_day = 0;
        self.canvas_slot = 0;
        self.chat_input.clear();
        self.evidence_query.clear();
        self.status_line = None;
    }

    fn close_dashboard(&mut self) {
        self.copilot = None;
        self.patient = None;
        self.schedule = WeekSchedule::new(0);
        self.screen = Screen::Picker;
        self.status_line = None;
    }

    fn handle_dashboard_key(&mut self, code: KeyCode) {
        // The right panel captures printable keys while focused
        if self.focus == Focus::Copilot {
            self.handle_panel_key(code);
            return;
        }
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab => self.cycle_focus(),
            KeyCode::F(2) => self.toggle_panel_tab(),
            _ => match self.focus {
                Focus::Library => self.handle_library_key(code),
                Focus::Canvas => self.handle_canvas_key(code),
                Focus::Inspector => self.handle_inspector_key(code),
                Focus::Copilot => {}
            },
        }
    }

    fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Library => Focus::Canvas,
            Focus::Canvas | Focus::Inspector => Focus::Copilot,
            Focus::Copilot => Focus::Library,
        };
    }

    fn toggle_panel_tab(&mut self) {
        self.panel_tab = match self.panel_tab {
            PanelTab::Copilot => PanelTab::Evidence,
            PanelTab::Evidence => PanelTab::Copilot,
        };
    }

    fn handle_library_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => self.library_index = self.library_index.saturating_sub(1),
            KeyCode::Down => {
                if self.library_index + 1 < self.library.len() {
                    self.library_index += 1;
                }
            }
            KeyCode::Left => self.target_day = (self.target_day + WEEK_DAYS - 1) % WEEK_DAYS,
            KeyCode::Right => self.target_day = (self.target_day + 1) % WEEK_DAYS,
            KeyCode::Enter => self.place_from_library(),
            KeyCode::Esc => self.close_dashboard(),
            _ => {}
        }
    }

    fn place_from_library(&mut self) {
        let Some(def) = self.library.get(self.library_index) else {
            return;
        };
        let name = def.name.clone();
        let params = library::effective_params(def, &self.edits);
        let payload = exercises::drag_payload(def);
        let day = self.target_day;

        match self.schedule.place_payload(&payload, params, day) {
            Some(_) => {
                self.status_line = Some(format!("{name} ajouté ({})", DAYS_OF_WEEK[day as usize]));
            }
            None => {
                let post_op_day = self.patient.as_ref().map(|p| p.post_op_day).unwrap_or(0);
                self.status_line = Some(format!(
                    "Placement refusé: {name} est contre-indiqué au jour {post_op_day}"
                ));
            }
        }
    }

    fn handle_canvas_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Left => {
                self.canvas_day = (self.canvas_day + WEEK_DAYS - 1) % WEEK_DAYS;
                self.canvas_slot = 0;
            }
            KeyCode::Right => {
                self.canvas_day = (self.canvas_day + 1) % WEEK_DAYS;
                self.canvas_slot = 0;
            }
            KeyCode::Up => self.canvas_slot = self.canvas_slot.saturating_sub(1),
            KeyCode::Down => {
                let count = self.schedule.placements_for_day(self.canvas_day).len();
                if count > 0 && self.canvas_slot + 1 < count {
                    self.canvas_slot += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(id) = self.placement_under_cursor()
                    && self.schedule.select(id) {
                        self.inspector_field = 0;
                        self.focus = Focus::Inspector;
                    }
            }
            KeyCode::Char('x') => {
                if let Some(id) = self.placement_under_cursor() {
                    self.schedule.remove(id);
                    self.canvas_slot = self.canvas_slot.saturating_sub(1);
                }
            }
            KeyCode::Char('C') => {
                self.schedule.clear_all();
                self.canvas_slot = 0;
                self.status_line = Some("Canevas vidé".to_string());
            }
            KeyCode::Char('s') => self.save_draft(),
            KeyCode::Char('l') => self.load_draft(),
            KeyCode::Char('p') => self.publish_protocol(),
            KeyCode::Esc => self.close_dashboard(),
            _ => {}
        }
    }

    fn placement_under_cursor(&self) -> Option<u64> {
        self.schedule
            .placements_for_day(self.canvas_day)
            .get(self.canvas_slot)
            .map(|p| p.id)
    }

    fn save_draft(&mut self) {
        let Some(patient) = self.patient.as_ref() else {
            return;
        };
        match self.schedule.save_draft(&self.store, &patient.id) {
            Ok(()) => self.status_line = Some("Brouillon enregistré".to_string()),
            Err(e) => {
                error!("draft save failed: {e}");
                self.status_line = Some("Échec de l'enregistrement du brouillon".to_string());
            }
        }
    }

    fn load_draft(&mut self) {
        let Some(patient) = self.patient.as_ref() else {
            return;
        };
        match WeekSchedule::load_draft(&self.store, &patient.id, patient.post_op_day) {
            Some(schedule) => {
                self.schedule = schedule;
                self.canvas_slot = 0;
                self.focus = Focus::Canvas;
                self.status_line = Some("Brouillon chargé".to_string());
            }
            None => self.status_line = Some("Aucun brouillon pour ce patient".to_string()),
        }
    }

    fn publish_protocol(&mut self) {
        let Some(patient) = self.patient.as_ref() else {
            return;
        };
        if self.schedule.is_empty() {
            self.status_line = Some("Rien à publier: le canevas est vide".to_string());
            return;
        }
        let export = self.schedule.publish(patient);
        match serde_json::to_string_pretty(&export) {
            Ok(json) => {
                info!("protocol export:\n{json}");
                self.status_line = Some(format!(
                    "Protocole Publié: {} exercices envoyés à l'application de {}",
                    export.exercises.len(),
                    patient.name
                ));
            }
            Err(e) => {
                error!("protocol export failed: {e}");
                self.status_line = Some("Échec de la publication".to_string());
            }
        }
    }

    fn handle_inspector_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => self.inspector_field = self.inspector_field.saturating_sub(1),
            KeyCode::Down => {
                if self.inspector_field + 1 < INSPECTOR_FIELDS {
                    self.inspector_field += 1;
                }
            }
            KeyCode::Left => self.adjust_selected_param(-1),
            KeyCode::Right => self.adjust_selected_param(1),
            KeyCode::Esc => {
                self.schedule.clear_selection();
                self.focus = Focus::Canvas;
            }
            _ => {}
        }
    }

    /// Build a full proposal from the stored params plus one field change,
    /// then let the schedule sanitize it field by field.
    fn adjust_selected_param(&mut self, delta: i32) {
        let Some(placement) = self.schedule.selected() else {
            return;
        };
        let id = placement.id;
        let mut proposed = placement.params.clone();
        match self.inspector_field {
            0 => proposed.duration = shift_u32(proposed.duration, delta),
            1 => proposed.sets = shift_u32(proposed.sets, delta),
            2 => proposed.reps = shift_u32(proposed.reps, delta),
            3 => proposed.tempo = cycle_tempo(&proposed.tempo, delta),
            4 => proposed.rom_min = shift_u16(proposed.rom_min, delta * 5),
            5 => proposed.rom_max = shift_u16(proposed.rom_max, delta * 5),
            6 => proposed.pain_threshold = shift_u8(proposed.pain_threshold, delta),
            _ => {}
        }
        self.schedule.update_params(id, &proposed);
    }

    fn handle_panel_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Tab => self.cycle_focus(),
            KeyCode::F(2) => self.toggle_panel_tab(),
            KeyCode::Esc => self.focus = Focus::Canvas,
            KeyCode::Backspace => {
                match self.panel_tab {
                    PanelTab::Copilot => self.chat_input.pop(),
                    PanelTab::Evidence => self.evidence_query.pop(),
                };
            }
            KeyCode::Enter => {
                if self.panel_tab == PanelTab::Copilot && !self.chat_input.is_empty() {
                    let text = std::mem::take(&mut self.chat_input);
                    if let Some(copilot) = self.copilot.as_mut() {
                        copilot.send(&text);
                    }
                }
            }
            KeyCode::Char(c) => self.handle_panel_char(c),
            _ => {}
        }
    }

    fn handle_panel_char(&mut self, c: char) {
        if self.panel_tab == PanelTab::Evidence {
            self.evidence_query.push(c);
            return;
        }
        // An empty input treats 1-4 as suggestion chips
        if self.chat_input.is_empty()
            && let Some(digit) = c.to_digit(10)
                && (1..=SUGGESTIONS.len() as u32).contains(&digit) {
                    if let Some(copilot) = self.copilot.as_mut() {
                        copilot.send(SUGGESTIONS[(digit - 1) as usize]);
                    }
                    return;
                }
        self.chat_input.push(c);
    }
}

fn next_status_filter(current: Option<PatientStatus>) -> Option<PatientStatus> {
    let all = PatientStatus::all();
    match current {
        None => all.first().copied(),
        Some(status) => all
            .iter()
            .position(|&s| s == status)
            .and_then(|i| all.get(i + 1))
            .copied(),
    }
}

fn cycle_tempo(current: &str, delta: i32) -> String {
    let count = TEMPO_CHOICES.len() as i32;
    let index = TEMPO_CHOICES
        .iter()
        .position(|&t| t == current)
        .unwrap_or(0) as i32;
    let next = (index + delta).rem_euclid(count) as usize;
    TEMPO_CHOICES[next].to_string()
}

fn shift_u32(value: u32, delta: i32) -> u32 {
    if delta >= 0 {
        value.saturating_add(delta as u32)
    } else {
        value.saturating_sub(delta.unsigned_abs())
    }
}

fn shift_u16(value: u16, delta: i32) -> u16 {
    if delta >= 0 {
        value.saturating_add(delta as u16)
    } else {
        value.saturating_sub(delta.unsigned_abs() as u16)
    }
}

fn shift_u8(value: u8, delta: i32) -> u8 {
    if delta >= 0 {
        value.saturating_add(delta as u8)
    } else {
        value.saturating_sub(delta.unsigned_abs() as u8)
    }
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_app() -> App {
        let store = SqliteStore::open_in_memory().unwrap();
        App::new(store).unwrap()
    }

    fn app_on_dashboard() -> App {
        let mut app = fixture_app();
        app.handle_picker_key(KeyCode::Enter);
        app
    }

    #[test]
    fn test_picker_filter_cycles() {
        let mut app = fixture_app();
        assert_eq!(app.filtered_patients().len(), 5);

        app.handle_picker_key(KeyCode::Char('f'));
        assert_eq!(app.status_filter, Some(PatientStatus::OnTrack));
        assert_eq!(app.filtered_patients().len(), 2);

        app.handle_picker_key(KeyCode::Char('f'));
        app.handle_picker_key(KeyCode::Char('f'));
        assert_eq!(app.status_filter, Some(PatientStatus::Critical));
        assert_eq!(app.filtered_patients().len(), 1);

        app.handle_picker_key(KeyCode::Char('f'));
        assert_eq!(app.status_filter, None);
    }

    #[test]
    fn test_enter_opens_dashboard_and_persists_choice() {
        let mut app = fixture_app();
        app.handle_picker_key(KeyCode::Down);
        app.handle_picker_key(KeyCode::Enter);

        assert_eq!(app.screen, Screen::Dashboard);
        let name = app.patient.as_ref().map(|p| p.name.clone()).unwrap();
        assert_eq!(name, "Lucas Moreau");
        assert!(app.copilot.is_some(), "Copilot session opens with the dashboard");
        assert_eq!(
            library::selected_patient_id(&app.store).as_deref(),
            Some("pat-002")
        );
    }

    #[test]
    fn test_place_from_library_lands_on_target_day() {
        let mut app = app_on_dashboard();
        app.handle_library_key(KeyCode::Right);
        app.handle_library_key(KeyCode::Right);
        app.handle_library_key(KeyCode::Enter);

        assert_eq!(app.schedule.placements_for_day(2).len(), 1);
        assert!(app.status_line.as_ref().unwrap().contains("Mer"));
    }

    #[test]
    fn test_contraindicated_place_refused_with_notice() {
        let mut app = app_on_dashboard();
        let jumps = app
            .library
            .iter()
            .position(|d| d.id == "jump_squats")
            .unwrap();
        for _ in 0..jumps {
            app.handle_library_key(KeyCode::Down);
        }
        app.handle_library_key(KeyCode::Enter);

        assert!(app.schedule.is_empty(), "Day 21 blocks an 8-week exercise");
        assert!(
            app.status_line.as_ref().unwrap().contains("contre-indiqué"),
            "Status: {:?}",
            app.status_line
        );
    }

    #[test]
    fn test_inspector_adjusts_through_sanitizer() {
        let mut app = app_on_dashboard();
        app.handle_library_key(KeyCode::Enter);
        app.focus = Focus::Canvas;
        app.handle_canvas_key(KeyCode::Enter);
        assert_eq!(app.focus, Focus::Inspector);

        app.handle_inspector_key(KeyCode::Down);
        app.handle_inspector_key(KeyCode::Right);
        let params = &app.schedule.selected().unwrap().params;
        assert_eq!(params.sets, 4, "Second row is sets");

        // Walk rom_min up against rom_max, the bound must hold
        app.inspector_field = 4;
        for _ in 0..40 {
            app.handle_inspector_key(KeyCode::Right);
        }
        let params = &app.schedule.selected().unwrap().params;
        assert!(
            params.rom_min < params.rom_max,
            "Bounds stayed ordered: {} < {}",
            params.rom_min,
            params.rom_max
        );

        app.handle_inspector_key(KeyCode::Esc);
        assert_eq!(app.focus, Focus::Canvas);
        assert!(app.schedule.selected().is_none());
    }

    #[test]
    fn test_remove_and_clear_from_canvas() {
        let mut app = app_on_dashboard();
        app.handle_library_key(KeyCode::Enter);
        app.handle_library_key(KeyCode::Enter);
        app.focus = Focus::Canvas;

        app.handle_canvas_key(KeyCode::Char('x'));
        assert_eq!(app.schedule.placements().len(), 1);

        app.handle_canvas_key(KeyCode::Char('C'));
        assert!(app.schedule.is_empty());
    }

    #[test]
    fn test_publish_sets_toast() {
        let mut app = app_on_dashboard();
        app.focus = Focus::Canvas;
        app.handle_canvas_key(KeyCode::Char('p'));
        assert!(app.status_line.as_ref().unwrap().contains("Rien à publier"));

        app.handle_library_key(KeyCode::Enter);
        app.handle_canvas_key(KeyCode::Char('p'));
        assert!(
            app.status_line
                .as_ref()
                .unwrap()
                .starts_with("Protocole Publié: 1 exercice"),
            "Status: {:?}",
            app.status_line
        );
    }

    #[test]
    fn test_draft_save_and_reload() {
        let mut app = app_on_dashboard();
        app.handle_library_key(KeyCode::Enter);
        app.focus = Focus::Canvas;
        app.handle_canvas_key(KeyCode::Char('s'));
        assert!(app.status_line.as_ref().unwrap().contains("enregistré"));

        app.handle_canvas_key(KeyCode::Char('C'));
        app.handle_canvas_key(KeyCode::Char('l'));
        assert_eq!(app.schedule.placements().len(), 1);
        assert!(app.status_line.as_ref().unwrap().contains("chargé"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_chat_digit_sends_suggestion() {
        let mut app = app_on_dashboard();
        app.focus = Focus::Copilot;
        app.handle_panel_key(KeyCode::Char('3'));

        let copilot = app.copilot.as_ref().unwrap();
        let last = copilot.messages().last().unwrap();
        assert_eq!(last.content, SUGGESTIONS[2]);
        assert!(copilot.is_typing());
        assert!(app.chat_input.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_chat_typing_and_send() {
        let mut app = app_on_dashboard();
        app.focus = Focus::Copilot;
        for c in "salut".chars() {
            app.handle_panel_key(KeyCode::Char(c));
        }
        app.handle_panel_key(KeyCode::Backspace);
        assert_eq!(app.chat_input, "salu");

        app.handle_panel_key(KeyCode::Enter);
        assert!(app.chat_input.is_empty());
        let copilot = app.copilot.as_ref().unwrap();
        assert_eq!(copilot.messages().last().unwrap().content, "salu");
    }

    #[test]
    fn test_panel_tab_toggle_routes_typing() {
        let mut app = app_on_dashboard();
        app.focus = Focus::Copilot;
        app.handle_panel_key(KeyCode::F(2));
        assert_eq!(app.panel_tab, PanelTab::Evidence);

        app.handle_panel_key(KeyCode::Char('l'));
        app.handle_panel_key(KeyCode::Char('c'));
        app.handle_panel_key(KeyCode::Char('a'));
        assert_eq!(app.evidence_query, "lca");
        assert!(app.chat_input.is_empty());
    }

    #[test]
    fn test_tempo_cycle_wraps() {
        assert_eq!(cycle_tempo("continuous", 1), "3-2-3");
        assert_eq!(cycle_tempo("continuous", -1), "explosif");
        assert_eq!(cycle_tempo("explosif", 1), "continuous");
        assert_eq!(cycle_tempo("inconnu", 1), "3-2-3", "Unknown tempo restarts the cycle");
    }
}
