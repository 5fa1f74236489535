//! Evidence browser - curated guideline and study search

/// Kind of evidence entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvidenceKind {
    Guideline,
    Paper,
    Protocol,
}

impl EvidenceKind {
    pub fn label(&self) -> &'static str {
        match self {
            EvidenceKind::Guideline => "Directive",
            EvidenceKind::Paper => "Article",
            EvidenceKind::Protocol => "Protocole",
        }
    }
}

/// One entry of the curated evidence base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvidenceResult {
    pub id: &'static str,
    pub title: &'static str,
    pub source: &'static str,
    pub kind: EvidenceKind,
    pub relevance: u8,
    pub summary: &'static str,
}

const EVIDENCE: &[EvidenceResult] = &[
    EvidenceResult {
        id: "ev1",
        title: "Directives de réadaptation du LCA 2024",
        source: "JOSPT Clinical Practice Guidelines",
        kind: EvidenceKind::Guideline,
        relevance: 95,
        summary: "Protocole de réadaptation en cinq phases après reconstruction du LCA, avec des critères de progression fondés sur l'amplitude articulaire et la force.",
    },
    EvidenceResult {
        id: "ev2",
        title: "Mobilisation précoce après reconstruction du LCA",
        source: "Journal of Orthopaedic & Sports Physical Therapy",
        kind: EvidenceKind::Paper,
        relevance: 88,
        summary: "La mobilisation précoce du genou améliore la récupération de l'amplitude sans augmenter la laxité du greffon.",
    },
    EvidenceResult {
        id: "ev3",
        title: "Protocole accéléré vs conservateur",
        source: "Protocole interne de la clinique",
        kind: EvidenceKind::Protocol,
        relevance: 82,
        summary: "Comparaison interne des délais de retour au sport entre le protocole accéléré et le protocole conservateur du genou.",
    },
    EvidenceResult {
        id: "ev4",
        title: "Gestion de la douleur post-opératoire en kinésithérapie",
        source: "PEDro",
        kind: EvidenceKind::Paper,
        relevance: 76,
        summary: "Stratégies de dosage des exercices quand la douleur limite l'adhésion au programme de réadaptation.",
    },
];

/// Search the evidence base over titles and summaries.
/// An empty query returns everything, best relevance first.
pub fn search(query: &str) -> Vec<EvidenceResult> {
    let needle = query.trim().to_lowercase();
    let mut results: Vec<EvidenceResult> = EVIDENCE
        .iter()
        .filter(|e| {
            needle.is_empty()
                || e.title.to_lowercase().contains(&needle)
                || e.summary.to_lowercase().contains(&needle)
        })
        .copied()
        .collect();
    results.sort_by(|a, b| b.relevance.cmp(&a.relevance));
    results
}
