//! Responder - Keyword-matched reply templates over the patient context

use crate::exercises::{self, ExerciseDefinition};
use crate::insights::{self, ROM_TARGET_DEGREES};
use crate::patients::{ADHERENCE_TARGET, Patient};

/// Canned prompts shown as chips under the chat input
pub const SUGGESTIONS: [&str; 4] = [
    "Pourquoi l'amplitude stagne-t-elle?",
    "Générer un protocole LCA de Phase 2",
    "Vérifier les contre-indications",
    "Recommander des ajustements de gestion de la douleur",
];

/// Visual accent of an assistant reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Suggestion,
    Warning,
}

/// Everything the responder interpolates into its replies
#[derive(Debug, Clone)]
pub struct CopilotContext {
    pub patient: Patient,
    pub library: Vec<ExerciseDefinition>,
}

/// A finished reply, ready to enter the transcript
#[derive(Debug, Clone)]
pub struct ResponseTemplate {
    pub content: String,
    pub kind: MessageKind,
}

/// Reply accent from the question's keywords
pub fn kind_for(query: &str) -> MessageKind {
    let q = query.to_lowercase();
    if q.contains("contre-indication") || q.contains("contraindication") || q.contains("warning") {
        MessageKind::Warning
    } else if q.contains("recommand") || q.contains("recommend") || q.contains("suggest") {
        MessageKind::Suggestion
    } else {
        MessageKind::Info
    }
}

/// Pick and fill the reply template matching the question.
/// French and English keyword spellings both match.
pub fn template_for(query: &str, ctx: &CopilotContext) -> ResponseTemplate {
    let q = query.to_lowercase();
    let content = if (q.contains("rom") || q.contains("amplitude"))
        && (q.contains("stall") || q.contains("stagn"))
    {
        rom_stall_reply(ctx)
    } else if (q.contains("generate") || q.contains("génér")) && q.contains("phase") {
        phase_protocol_reply(ctx)
    } else if q.contains("contraindication") || q.contains("contre-indication") {
        contraindication_reply(ctx)
    } else {
        fallback_reply(query, ctx)
    };
    ResponseTemplate {
        content,
        kind: kind_for(query),
    }
}

fn rom_stall_reply(ctx: &CopilotContext) -> String {
    let patient = &ctx.patient;
    let mut causes = Vec::new();
    if let Some(day) = insights::pain_spike_day(&patient.pain_levels) {
        causes.push(format!(
            "Pic de douleur détecté le jour {day}, corrélé à la montée d'intensité"
        ));
    }
    causes.push(format!(
        "Adhésion tombée à {}% (objectif: {ADHERENCE_TARGET}%), le patient évite peut-être les exercices douloureux",
        patient.adherence_score
    ));
    causes.push("Le protocole actuel est peut-être trop agressif pour cette phase".to_string());

    let mut lines = vec![
        format!("Analyse de la progression de {}...", patient.name),
        String::new(),
        "**Analyse des Causes Profondes:**".to_string(),
    ];
    for (i, cause) in causes.iter().enumerate() {
        lines.push(format!("{}. {cause}", i + 1));
    }
    lines.push(String::new());
    lines.push("**Recommandations:**".to_string());
    lines.push("1. Réduire l'intensité de 20% pour les glissements du talon".to_string());
    lines.push("2. Ajouter un protocole de gestion de la douleur au besoin".to_string());
    lines.push("3. Planifier un suivi sous 48h".to_string());
    lines.push(String::new());
    lines.push("Voulez-vous que j'ajuste automatiquement le protocole?".to_string());
    lines.join("\n")
}

fn phase_protocol_reply(ctx: &CopilotContext) -> String {
    let patient = &ctx.patient;
    format!(
        "**Phase 2 Proposée (Semaines 3-6):**\n\n\
        • Objectif: Restaurer l'amplitude articulaire à {ROM_TARGET_DEGREES}°\n\
        • Exercices en chaîne fermée: mini-squats, montées de marche\n\
        • Vélo stationnaire dès que l'amplitude dépasse 100°\n\
        • Maintenir les séries de quadriceps quotidiennes\n\n\
        Pour {} (jour {}), je recommande de commencer par 3 séances par jour, \
        en montant l'intensité chaque semaine si la douleur reste sous le seuil.\n\n\
        Dois-je remplir la chronologie avec les exercices recommandés?",
        patient.name, patient.post_op_day
    )
}

fn contraindication_reply(ctx: &CopilotContext) -> String {
    let day = ctx.patient.post_op_day;
    let (blocked, safe): (Vec<&ExerciseDefinition>, Vec<&ExerciseDefinition>) = ctx
        .library
        .iter()
        .partition(|def| exercises::is_contraindicated(def, day));

    let mut lines = vec![
        format!("**Contre-indications Actuelles pour le Jour {day}:**"),
        String::new(),
        "⚠️ **À Éviter:**".to_string(),
    ];
    if blocked.is_empty() {
        lines.push("• Aucun exercice bloqué à ce stade".to_string());
    }
    for def in &blocked {
        let weeks = def
            .contraindications
            .iter()
            .find_map(|rule| exercises::min_week_threshold(rule));
        match weeks {
            Some(w) => lines.push(format!("• {} (nécessite {w}+ semaines)", def.name)),
            None => lines.push(format!("• {}", def.name)),
        }
    }
    lines.push(String::new());
    lines.push("✅ **Sûr à Inclure:**".to_string());
    for def in &safe {
        lines.push(format!("• {}", def.name));
    }
    lines.join("\n")
}

fn fallback_reply(query: &str, ctx: &CopilotContext) -> String {
    format!(
        "Je comprends que vous posez une question sur \"{query}\". \
        En fonction du statut actuel de {} et des directives de réadaptation, \
        je recommande de consulter le navigateur de preuves pour les protocoles spécifiques. \
        Voulez-vous que je recherche des études pertinentes?",
        ctx.patient.name
    )
}

/// Opening assistant message, tuned to the patient's situation
pub fn greeting(ctx: &CopilotContext, clinician: &str) -> String {
    let patient = &ctx.patient;
    let mut text = format!(
        "Bonjour {clinician}! Je suis prêt à vous aider avec le protocole de réadaptation de {}.",
        patient.name
    );

    let stalled = insights::rom_stalled(&patient.rom_data);
    let below_target = patient.adherence_score < ADHERENCE_TARGET;
    if stalled && below_target {
        text.push_str(
            " J'ai remarqué que sa progression d'amplitude stagne et que son adhésion est sous l'objectif. Voulez-vous que j'analyse les causes?"
        );
    } else if stalled {
        text.push_str(
            " J'ai remarqué que sa progression d'amplitude stagne depuis quelques jours. Voulez-vous que j'analyse les causes?"
        );
    } else if below_target {
        text.push_str(&format!(
            " Son adhésion de {}% est sous l'objectif de {ADHERENCE_TARGET}%. Voulez-vous des recommandations?",
            patient.adherence_score
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patients::builtin_patients;

    fn context_for(id: &str) -> CopilotContext {
        let patient = builtin_patients()
            .into_iter()
            .find(|p| p.id == id)
            .unwrap();
        CopilotContext {
            patient,
            library: exercises::builtin_library(),
        }
    }

    #[test]
    fn test_kind_for_keywords() {
        assert_eq!(kind_for("Vérifier les contre-indications"), MessageKind::Warning);
        assert_eq!(kind_for("any warning here?"), MessageKind::Warning);
        assert_eq!(
            kind_for("Recommander des ajustements de gestion de la douleur"),
            MessageKind::Suggestion
        );
        assert_eq!(kind_for("suggest something"), MessageKind::Suggestion);
        assert_eq!(kind_for("bonjour"), MessageKind::Info);
        assert_eq!(
            kind_for("recommend around contraindications"),
            MessageKind::Warning,
            "Warning keywords win over suggestion keywords"
        );
    }

    #[test]
    fn test_stall_template_interpolates_patient() {
        let ctx = context_for("pat-001");
        let reply = template_for("Pourquoi l'amplitude stagne-t-elle?", &ctx);

        assert_eq!(reply.kind, MessageKind::Info);
        assert!(reply.content.contains("Marie Dubois"), "Reply: {}", reply.content);
        assert!(reply.content.contains("**Analyse des Causes Profondes:**"));
        assert!(reply.content.contains("le jour 5"), "Spike day expected");
        assert!(reply.content.contains("72% (objectif: 85%)"));
        assert!(
            reply
                .content
                .ends_with("Voulez-vous que j'ajuste automatiquement le protocole?")
        );
    }

    #[test]
    fn test_stall_template_matches_english() {
        let ctx = context_for("pat-001");
        let reply = template_for("why does the ROM stall?", &ctx);
        assert!(reply.content.contains("**Analyse des Causes Profondes:**"));
    }

    #[test]
    fn test_stall_template_without_spike() {
        let ctx = context_for("pat-005");
        let reply = template_for("Pourquoi l'amplitude stagne-t-elle?", &ctx);
        assert!(!reply.content.contains("Pic de douleur"));
        assert!(reply.content.contains("1. Adhésion tombée à 48%"));
    }

    #[test]
    fn test_phase_template() {
        let ctx = context_for("pat-001");
        let reply = template_for("Générer un protocole LCA de Phase 2", &ctx);

        assert_eq!(reply.kind, MessageKind::Info);
        assert!(reply.content.contains("**Phase 2 Proposée (Semaines 3-6):**"));
        assert!(reply.content.contains("120°"));
        assert!(reply.content.contains("jour 21"));
        assert!(
            reply
                .content
                .ends_with("Dois-je remplir la chronologie avec les exercices recommandés?")
        );

        let english = template_for("generate a phase 2 protocol", &ctx);
        assert_eq!(english.content, reply.content);
    }

    #[test]
    fn test_contraindication_template_partitions_library() {
        let ctx = context_for("pat-001");
        let reply = template_for("Vérifier les contre-indications", &ctx);

        assert_eq!(reply.kind, MessageKind::Warning);
        assert!(reply.content.contains("Jour 21"));
        assert!(reply.content.contains("• Plateau d'équilibre (nécessite 6+ semaines)"));
        assert!(reply.content.contains("• Montées de marche (nécessite 4+ semaines)"));
        assert!(reply.content.contains("• Course légère (nécessite 12+ semaines)"));

        let (_, safe_part) = reply
            .content
            .split_once("✅ **Sûr à Inclure:**")
            .expect("safe section present");
        assert!(safe_part.contains("• Séries de quadriceps"));
        assert!(safe_part.contains("• Vélo stationnaire"), "3 weeks = day 21 is allowed");
        assert!(
            safe_part.contains("• Étirements des ischio-jambiers"),
            "Free-text rules never block"
        );
    }

    #[test]
    fn test_contraindication_template_when_nothing_blocked() {
        let mut ctx = context_for("pat-001");
        ctx.patient.post_op_day = 100;
        let reply = template_for("check contraindications", &ctx);
        assert!(reply.content.contains("• Aucun exercice bloqué à ce stade"));
    }

    #[test]
    fn test_fallback_echoes_question() {
        let ctx = context_for("pat-002");
        let reply = template_for("Combien de séances par semaine?", &ctx);

        assert_eq!(reply.kind, MessageKind::Info);
        assert!(reply.content.contains("\"Combien de séances par semaine?\""));
        assert!(reply.content.contains("Lucas Moreau"));
        assert!(reply.content.contains("navigateur de preuves"));
    }

    #[test]
    fn test_suggestions_route_to_templates() {
        let ctx = context_for("pat-001");
        assert!(template_for(SUGGESTIONS[0], &ctx).content.contains("Causes Profondes"));
        assert!(template_for(SUGGESTIONS[1], &ctx).content.contains("Phase 2 Proposée"));
        assert!(template_for(SUGGESTIONS[2], &ctx).content.contains("À Éviter"));
        assert_eq!(template_for(SUGGESTIONS[3], &ctx).kind, MessageKind::Suggestion);
    }

    #[test]
    fn test_greeting_variants() {
        let stalled = greeting(&context_for("pat-001"), "Dr. Chen");
        assert!(stalled.starts_with("Bonjour Dr. Chen!"));
        assert!(stalled.contains("Marie Dubois"));
        assert!(stalled.contains("stagne et que son adhésion"));

        let on_track = greeting(&context_for("pat-002"), "Dr. Chen");
        assert!(on_track.ends_with("réadaptation de Lucas Moreau."));

        let mut ctx = context_for("pat-004");
        ctx.patient.adherence_score = 70;
        let below = greeting(&ctx, "Dr. Chen");
        assert!(below.contains("70% est sous l'objectif de 85%"));
    }
}
