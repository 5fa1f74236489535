//! Views - Rendering for the picker and dashboard screens

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Gauge, Paragraph, Sparkline, Tabs, Wrap},
};

use super::{App, Focus, PanelTab};
use crate::copilot::{MessageKind, MessageRole, SUGGESTIONS};
use crate::evidence;
use crate::exercises;
use crate::insights::{AdherenceBand, PatientInsights, ROM_TARGET_DEGREES};
use crate::library;
use crate::patients::{
    ACTIVE_DAYS, ADHERENCE_TARGET, CLINICIAN_NAME, CLINICIAN_SPECIALTY, DAYS_OF_WEEK, Patient,
    PatientStatus,
};

const FIELD_LABELS: [&str; 7] = [
    "Durée (min)",
    "Séries",
    "Répétitions",
    "Tempo",
    "Amplitude min (°)",
    "Amplitude max (°)",
    "Seuil de douleur",
];

fn status_color(status: PatientStatus) -> Color {
    match status {
        PatientStatus::OnTrack => Color::Green,
        PatientStatus::Warning => Color::Yellow,
        PatientStatus::Critical => Color::Red,
    }
}

fn band_color(band: AdherenceBand) -> Color {
    match band {
        AdherenceBand::Good => Color::Green,
        AdherenceBand::Borderline => Color::Yellow,
        AdherenceBand::Poor => Color::Red,
    }
}

fn focus_block(title: &str, focused: bool) -> Block<'_> {
    let block = Block::default().borders(Borders::ALL).title(title.to_string());
    if focused {
        block.border_style(Style::default().fg(Color::Cyan))
    } else {
        block
    }
}

pub(super) fn render_picker(app: &App, frame: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let filter_label = match app.status_filter {
        None => "Tous".to_string(),
        Some(status) => status.label().to_string(),
    };
    let header = Paragraph::new(format!(
        "Cockpit du Clinicien - Choisir un patient  |  Filtre: {filter_label}"
    ))
    .style(Style::default().fg(Color::Cyan).bold())
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(44)])
        .split(chunks[1]);

    let mut lines = Vec::new();
    for (i, patient) in app.filtered_patients().iter().enumerate() {
        let marker = if i == app.picker_index { "▶ " } else { "  " };
        let style = if i == app.picker_index {
            Style::default().bold()
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::raw(marker),
            Span::styled(
                patient.status.symbol().to_string(),
                Style::default().fg(status_color(patient.status)),
            ),
            Span::styled(format!(" {} ({} ans)", patient.name, patient.age), style),
        ]));
        lines.push(Line::from(Span::styled(
            format!("     {} - Jour {} post-op", patient.injury_type, patient.post_op_day),
            Style::default().fg(Color::DarkGray),
        )));
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "Aucun patient pour ce filtre",
            Style::default().fg(Color::DarkGray),
        )));
    }
    let list = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Patients"));
    frame.render_widget(list, body[0]);

    render_picker_preview(app, frame, body[1]);

    let footer = Paragraph::new("↑↓ choisir | Entrée: ouvrir | f: filtre | q: quitter")
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, chunks[2]);
}

fn render_picker_preview(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Aperçu");
    let Some(patient) = app.filtered_patients().get(app.picker_index).copied() else {
        frame.render_widget(block, area);
        return;
    };

    let insights = PatientInsights::analyze(patient);
    let mut lines = vec![
        Line::from(Span::styled(
            patient.name.clone(),
            Style::default().bold(),
        )),
        Line::from(patient.injury_type.clone()),
        Line::from(format!(
            "Jour {} post-op (Semaine {}, Phase {})",
            patient.post_op_day,
            patient.post_op_week(),
            patient.phase()
        )),
        Line::from(vec![
            Span::raw("Statut: "),
            Span::styled(
                format!("{} {}", patient.status.symbol(), patient.status.label()),
                Style::default().fg(status_color(patient.status)),
            ),
        ]),
        Line::from(format!(
            "Adhésion: {}% (objectif: {ADHERENCE_TARGET}%)",
            patient.adherence_score
        )),
    ];
    if let Some(rom) = patient.latest_rom() {
        lines.push(Line::from(format!("Dernière amplitude: {rom}°")));
    }
    if let Some(gain) = insights.daily_gain {
        lines.push(Line::from(format!("Gain: {gain:.1}°/jour")));
    }
    let preview = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(preview, area);
}

pub(super) fn render_dashboard(app: &App, frame: &mut Frame) {
    let Some(patient) = app.patient.as_ref() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(14),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "Cockpit du Clinicien",
            Style::default().fg(Color::Cyan).bold(),
        ),
        Span::raw("  Centre de Commande de Réadaptation  |  "),
        Span::styled(patient.name.clone(), Style::default().bold()),
        Span::raw(format!("  |  {CLINICIAN_NAME} ({CLINICIAN_SPECIALTY})")),
    ]))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(34),
            Constraint::Min(48),
            Constraint::Length(44),
        ])
        .split(chunks[1]);

    render_context_panel(patient, frame, body[0]);
    render_center(app, patient, frame, body[1]);
    render_side_panel(app, frame, body[2]);

    let hints = match app.focus {
        Focus::Library => "↑↓ exercice | ←→ jour cible | Entrée: placer | Tab: canevas | Esc: patients | q: quitter",
        Focus::Canvas => "←→ jour | ↑↓ choisir | Entrée: inspecter | x: retirer | C: vider | s/l: brouillon | p: publier",
        Focus::Inspector => "↑↓ champ | ←→ ajuster | Esc: fermer l'inspecteur",
        Focus::Copilot => "Entrée: envoyer | 1-4: suggestions | F2: Copilote/Preuves | Esc: canevas",
    };
    let mut footer_spans = vec![Span::styled(hints, Style::default().fg(Color::DarkGray))];
    if let Some(status) = &app.status_line {
        footer_spans.push(Span::raw("  |  "));
        footer_spans.push(Span::styled(
            status.clone(),
            Style::default().fg(Color::Yellow),
        ));
    }
    let footer =
        Paragraph::new(Line::from(footer_spans)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, chunks[2]);
}

fn render_context_panel(patient: &Patient, frame: &mut Frame, area: Rect) {
    let insights = PatientInsights::analyze(patient);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Length(5),
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(4),
        ])
        .split(area);

    let card = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("{} ({} ans)", patient.name, patient.age),
            Style::default().bold(),
        )),
        Line::from(patient.injury_type.clone()),
        Line::from(format!(
            "Jour {} | Phase {} | Semaine {}",
            patient.post_op_day,
            patient.phase(),
            patient.post_op_week()
        )),
        Line::from(Span::styled(
            format!("{} {}", patient.status.symbol(), patient.status.label()),
            Style::default().fg(status_color(patient.status)),
        )),
    ])
    .block(Block::default().borders(Borders::ALL).title("Contexte du Patient"));
    frame.render_widget(card, chunks[0]);

    let rom_values: Vec<u64> = patient.rom_data.iter().map(|v| *v as u64).collect();
    let rom_title = match (patient.latest_rom(), insights.projected_days_to_target) {
        (Some(rom), Some(days)) if days > 0 => {
            format!("Tendance ROM (7 jours) {rom}° / {ROM_TARGET_DEGREES}° (~{days}j)")
        }
        (Some(rom), _) => format!("Tendance ROM (7 jours) {rom}° / {ROM_TARGET_DEGREES}°"),
        (None, _) => "Tendance ROM (7 jours)".to_string(),
    };
    let rom_spark = Sparkline::default()
        .block(Block::default().borders(Borders::ALL).title(rom_title))
        .data(&rom_values)
        .style(Style::default().fg(Color::Cyan));
    frame.render_widget(rom_spark, chunks[1]);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Indice d'Adhésion"))
        .gauge_style(Style::default().fg(band_color(insights.adherence_band)))
        .percent(patient.adherence_score.min(100) as u16)
        .label(format!(
            "{}% / Objectif: {ADHERENCE_TARGET}%",
            patient.adherence_score
        ));
    frame.render_widget(gauge, chunks[2]);

    let pain_block = Block::default()
        .borders(Borders::ALL)
        .title("Douleur vs Intensité");
    let inner = pain_block.inner(chunks[3]);
    frame.render_widget(pain_block, chunks[3]);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(inner);
    let pain_values: Vec<u64> = patient.pain_levels.iter().map(|v| *v as u64).collect();
    let intensity_values: Vec<u64> = patient.intensity_levels.iter().map(|v| *v as u64).collect();
    frame.render_widget(
        Sparkline::default()
            .data(&pain_values)
            .style(Style::default().fg(Color::Red)),
        rows[0],
    );
    frame.render_widget(
        Sparkline::default()
            .data(&intensity_values)
            .style(Style::default().fg(Color::Blue)),
        rows[1],
    );

    let mut notice_lines = Vec::new();
    for notice in &insights.notices {
        notice_lines.push(Line::from(notice.clone()));
    }
    if notice_lines.is_empty() {
        notice_lines.push(Line::from(Span::styled(
            "Récupération conforme au plan",
            Style::default().fg(Color::Green),
        )));
    }
    let notices = Paragraph::new(notice_lines)
        .block(Block::default().borders(Borders::ALL).title("Aperçus"))
        .wrap(Wrap { trim: false });
    frame.render_widget(notices, chunks[4]);
}

fn render_center(app: &App, patient: &Patient, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(11)])
        .split(area);

    render_canvas(app, patient, frame, chunks[0]);

    if app.schedule.selected().is_some() {
        render_inspector(app, frame, chunks[1]);
    } else {
        render_library(app, patient, frame, chunks[1]);
    }
}

fn render_canvas(app: &App, patient: &Patient, frame: &mut Frame, area: Rect) {
    let title = format!(
        "Canevas du Protocole - Phase {} • Semaine {}",
        patient.phase(),
        patient.post_op_week()
    );
    let block = focus_block(&title, app.focus == Focus::Canvas);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 7); 7])
        .split(inner);

    for day in 0..7u8 {
        let is_cursor_day = app.focus != Focus::Library && app.canvas_day == day;
        let day_block = Block::default()
            .borders(Borders::ALL)
            .title(DAYS_OF_WEEK[day as usize])
            .border_style(if is_cursor_day {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            });
        let day_inner = day_block.inner(columns[day as usize]);
        frame.render_widget(day_block, columns[day as usize]);

        let mut lines = vec![if (day as usize) < ACTIVE_DAYS {
            Line::from(Span::styled("Actif", Style::default().fg(Color::Green)))
        } else {
            Line::from(Span::styled("Repos", Style::default().fg(Color::DarkGray)))
        }];

        let placements = app.schedule.placements_for_day(day);
        if placements.is_empty() {
            lines.push(Line::from(Span::styled(
                "Déposer ici",
                Style::default().fg(Color::DarkGray).italic(),
            )));
        }
        for (slot, placement) in placements.iter().enumerate() {
            let under_cursor = is_cursor_day && slot == app.canvas_slot;
            let selected = app.schedule.selected_id() == Some(placement.id);
            let style = if selected {
                Style::default().fg(Color::Cyan).bold()
            } else if under_cursor {
                Style::default().fg(Color::Yellow).bold()
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(
                format!("{} {}", placement.exercise.icon, placement.exercise.name),
                style,
            )));
            lines.push(Line::from(Span::styled(
                format!(
                    " {}x{} • {}min",
                    placement.params.sets, placement.params.reps, placement.params.duration
                ),
                Style::default().fg(Color::DarkGray),
            )));
        }

        frame.render_widget(Paragraph::new(lines), day_inner);
    }
}

fn render_library(app: &App, patient: &Patient, frame: &mut Frame, area: Rect) {
    let title = format!(
        "Bibliothèque d'Exercices (cible: {})",
        DAYS_OF_WEEK[app.target_day as usize]
    );
    let block = focus_block(&title, app.focus == Focus::Library);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = inner.height as usize;
    let start = app.library_index.saturating_sub(rows.saturating_sub(1));
    let mut lines = Vec::new();
    for (i, def) in app.library.iter().enumerate().skip(start).take(rows) {
        let blocked = exercises::is_contraindicated(def, patient.post_op_day);
        let marker = if i == app.library_index { "▶ " } else { "  " };
        let mut spans = vec![Span::raw(marker.to_string())];

        let name_style = if blocked {
            Style::default().fg(Color::DarkGray)
        } else if i == app.library_index && app.focus == Focus::Library {
            Style::default().fg(Color::Yellow).bold()
        } else {
            Style::default()
        };
        spans.push(Span::styled(
            format!("{} {} - {}", def.icon, def.name, def.category),
            name_style,
        ));
        if blocked {
            spans.push(Span::styled(" ⚠", Style::default().fg(Color::Red)));
        }
        if library::has_override(&def.id, &app.edits) {
            spans.push(Span::styled(" (modifié)", Style::default().fg(Color::Cyan)));
        }
        lines.push(Line::from(spans));
    }
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_inspector(app: &App, frame: &mut Frame, area: Rect) {
    let Some(placement) = app.schedule.selected() else {
        return;
    };
    let title = format!("Inspecteur de Paramètres - {}", placement.exercise.name);
    let block = focus_block(&title, app.focus == Focus::Inspector);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let params = &placement.params;
    let values = [
        params.duration.to_string(),
        params.sets.to_string(),
        params.reps.to_string(),
        params.tempo.clone(),
        format!("{}°", params.rom_min),
        format!("{}°", params.rom_max),
        format!("{}/10", params.pain_threshold),
    ];

    let mut lines = Vec::new();
    for (i, (label, value)) in FIELD_LABELS.iter().zip(values.iter()).enumerate() {
        let style = if i == app.inspector_field {
            Style::default().fg(Color::Yellow).bold()
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!("{label:<18} {value}"),
            style,
        )));
    }
    lines.push(Line::from(Span::styled(
        format!("Amplitude: {}° - {}°", params.rom_min, params.rom_max),
        Style::default().fg(Color::DarkGray),
    )));
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_side_panel(app: &App, frame: &mut Frame, area: Rect) {
    let block = focus_block("Copilote IA", app.focus == Focus::Copilot);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let tab_index = match app.panel_tab {
        PanelTab::Copilot => 0,
        PanelTab::Evidence => 1,
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(6)])
        .split(inner);
    let tabs = Tabs::new(vec!["Copilote", "Preuves"])
        .select(tab_index)
        .highlight_style(Style::default().fg(Color::Cyan).bold());
    frame.render_widget(tabs, chunks[0]);

    match app.panel_tab {
        PanelTab::Copilot => render_chat(app, frame, chunks[1]),
        PanelTab::Evidence => render_evidence(app, frame, chunks[1]),
    }
}

fn render_chat(app: &App, frame: &mut Frame, area: Rect) {
    let Some(copilot) = app.copilot.as_ref() else {
        return;
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(6),
            Constraint::Length(6),
            Constraint::Length(3),
        ])
        .split(area);

    let mut lines = Vec::new();
    let messages = copilot.messages();
    let start = messages.len().saturating_sub(4);
    for message in &messages[start..] {
        let (prefix, style) = match message.role {
            MessageRole::User => ("Vous: ", Style::default().bold()),
            MessageRole::Assistant => (
                "Copilote: ",
                match message.kind {
                    Some(MessageKind::Warning) => Style::default().fg(Color::Yellow),
                    Some(MessageKind::Suggestion) => Style::default().fg(Color::Green),
                    _ => Style::default().fg(Color::Cyan),
                },
            ),
        };
        lines.push(Line::from(Span::styled(prefix, style)));
        for content_line in message.content.lines() {
            lines.push(Line::from(content_line.to_string()));
        }
        lines.push(Line::from(""));
    }
    if copilot.is_typing() {
        lines.push(Line::from(Span::styled(
            "Analyse en cours...",
            Style::default().fg(Color::DarkGray).italic(),
        )));
    }
    let transcript = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    frame.render_widget(transcript, chunks[0]);

    let chips: Vec<Line> = SUGGESTIONS
        .iter()
        .enumerate()
        .map(|(i, s)| Line::from(format!("{}. {s}", i + 1)))
        .collect();
    let chips = Paragraph::new(chips)
        .block(Block::default().borders(Borders::ALL).title("Suggestions"))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(chips, chunks[1]);

    let input_line = if app.chat_input.is_empty() {
        Line::from(Span::styled(
            "Posez une question au copilote IA...",
            Style::default().fg(Color::DarkGray).italic(),
        ))
    } else {
        Line::from(format!("> {}", app.chat_input))
    };
    let input = Paragraph::new(input_line).block(Block::default().borders(Borders::ALL));
    frame.render_widget(input, chunks[2]);
}

fn render_evidence(app: &App, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(4)])
        .split(area);

    let query_line = if app.evidence_query.is_empty() {
        Line::from(Span::styled(
            "Rechercher directives, articles...",
            Style::default().fg(Color::DarkGray).italic(),
        ))
    } else {
        Line::from(format!("> {}", app.evidence_query))
    };
    let search = Paragraph::new(query_line).block(Block::default().borders(Borders::ALL));
    frame.render_widget(search, chunks[0]);

    let mut lines = Vec::new();
    let results = evidence::search(&app.evidence_query);
    if results.is_empty() {
        lines.push(Line::from(Span::styled(
            "Aucun résultat",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for result in &results {
        lines.push(Line::from(Span::styled(
            result.title,
            Style::default().bold(),
        )));
        lines.push(Line::from(Span::styled(
            format!(
                "  {} • {} • {}%",
                result.kind.label(),
                result.source,
                result.relevance
            ),
            Style::default().fg(Color::DarkGray),
        )));
    }
    let list = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Résultats"))
        .wrap(Wrap { trim: false });
    frame.render_widget(list, chunks[1]);
}
