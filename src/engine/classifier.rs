/// Heuristic estimate of whether a group message is addressed to the agent.
///
/// Purely lexical: lowercased substring checks against fixed Italian
/// vocabulary lists, each contributing a fixed weight. Deterministic,
/// no state, result clamped to [0, 1].
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressingClassifier;

const STARTER_WEIGHT: f64 = 0.3;
const TECH_WEIGHT: f64 = 0.15;
const TECH_CAP: f64 = 0.4;
const HELP_WEIGHT: f64 = 0.35;
const QUESTION_MARK_WEIGHT: f64 = 0.2;
const GROUP_ADDRESS_WEIGHT: f64 = 0.15;
const CONFUSION_WEIGHT: f64 = 0.25;

/// Interrogatives that open a question ("come si fa...", "perché non...").
const QUESTION_STARTERS: &[&str] = &[
    "come", "cosa", "perché", "quando", "dove", "chi", "quale", "quanto",
];

/// Everyday tech terms the character is known for struggling with.
const TECH_KEYWORDS: &[&str] = &[
    "app",
    "wifi",
    "internet",
    "computer",
    "telefono",
    "whatsapp",
    "telegram",
    "installare",
    "scaricare",
    "aggiornamento",
    "password",
    "email",
    "foto",
    "video",
    "link",
    "browser",
    "google",
    "facebook",
    "instagram",
];

const HELP_PHRASES: &[&str] = &[
    "aiuto",
    "aiutare",
    "spiegare",
    "non capisco",
    "non riesco",
    "come faccio",
    "qualcuno sa",
    "qualcuno può",
    "che ne pensate",
    "cosa fate",
    "consigli",
];

/// Ways of addressing the whole group.
const GROUP_ADDRESS: &[&str] = &[
    "ragazzi",
    "tutti",
    "qualcuno",
    "ciao",
    "salve",
    "buongiorno",
    "buonasera",
];

const CONFUSION_WORDS: &[&str] = &["confuso", "capire", "spiegazione", "non so", "boh", "mah"];

impl AddressingClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Score in [0, 1]. Empty text scores 0.
    pub fn score(&self, text: &str) -> f64 {
        if text.is_empty() {
            return 0.0;
        }

        let text = text.to_lowercase();
        let mut score = 0.0;

        if QUESTION_STARTERS.iter().any(|q| text.starts_with(q)) {
            score += STARTER_WEIGHT;
        }

        // Each distinct keyword counts once, regardless of repetitions
        let tech_mentions = TECH_KEYWORDS.iter().filter(|k| text.contains(*k)).count();
        score += (tech_mentions as f64 * TECH_WEIGHT).min(TECH_CAP);

        if HELP_PHRASES.iter().any(|p| text.contains(p)) {
            score += HELP_WEIGHT;
        }

        if text.contains('?') {
            score += QUESTION_MARK_WEIGHT;
        }

        if GROUP_ADDRESS.iter().any(|a| text.contains(a)) {
            score += GROUP_ADDRESS_WEIGHT;
        }

        if CONFUSION_WORDS.iter().any(|w| text.contains(w)) {
            score += CONFUSION_WEIGHT;
        }

        score.min(1.0)
    }
}
