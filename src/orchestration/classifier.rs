//! Request classifier.
//!
//! Decides whether a request needs decomposition into a plan or can run
//! as a single direct task. This is an intentionally cheap heuristic,
//! not NLP: it may over-trigger planning. A false positive costs an
//! extra validation task; a false negative falls back to direct
//! single-task execution.

/// Complexity-indicating phrases, English.
const COMPLEXITY_KEYWORDS_EN: &[&str] = &[
    "create",
    "build",
    "implement",
    "develop",
    "refactor",
    "restructure",
    "architecture",
    "integrate",
    "integration",
    "migrate",
    "optimize",
    "rewrite",
    "redesign",
    "test suite",
    "add tests",
    "write tests",
    "set up",
    "setup",
];

/// Complexity-indicating phrases, Portuguese.
const COMPLEXITY_KEYWORDS_PT: &[&str] = &[
    "criar",
    "construir",
    "implementar",
    "desenvolver",
    "refatorar",
    "reestruturar",
    "arquitetura",
    "integrar",
    "migrar",
    "otimizar",
    "reescrever",
    "adicionar testes",
    "escrever testes",
    "configurar",
];

/// Requests longer than this many words are assumed to need a plan.
const WORD_COUNT_THRESHOLD: usize = 15;

/// Decide whether a request needs planning.
///
/// Returns true if the text contains a complexity keyword (checked
/// case-insensitively in both languages), exceeds the word-count
/// threshold, or no plan exists yet for the session.
pub fn needs_planning(request: &str, has_plan: bool) -> bool {
    if !has_plan {
        return true;
    }

    let lowered = request.to_lowercase();
    let keyword_hit = COMPLEXITY_KEYWORDS_EN
        .iter()
        .chain(COMPLEXITY_KEYWORDS_PT.iter())
        .any(|kw| lowered.contains(kw));
    if keyword_hit {
        return true;
    }

    request.split_whitespace().count() > WORD_COUNT_THRESHOLD
}
