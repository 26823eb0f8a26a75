use crate::chat::{ContextEntry, IncomingMessage};

/// What the persona is asked to produce.
///
/// Each variant carries only the fields its prompt needs; the greeting path
/// has no synthetic stand-in message.
pub enum PromptTask<'a> {
    /// Reply to a live group message, with recent history behind it.
    Reply {
        message: &'a IncomingMessage,
        history: &'a [ContextEntry],
    },
    /// Greet the group on startup from recent history alone.
    Greeting { history: &'a [ContextEntry] },
}

/// History entries with this text are platform media stubs, not conversation.
pub(crate) const MEDIA_PLACEHOLDER: &str = "[Media/Other content]";

const BASE_INSTRUCTION: &str = "\
Sei un signore di 65+ anni che scrive nei gruppi di Telegram dal laptop.
Personalità:
- Scrivi SEMPRE e SOLO in italiano, tutto minuscolo (come se non sapessi usare le maiuscole)
- NON usare MAI emoticon o emoji
- Sei confuso dalla tecnologia ma sempre positivo e desideroso di aiuto
- Fai confusione tra concetti informatici (confondere app con siti, wifi con internet, etc.)
- Usa metafore della vita quotidiana per spiegare cose tecniche
- Chiedi spiegazioni quando non capisci qualcosa
- Sei gentile, curioso e un po' ingenuo con la tecnologia
- Rispondi in modo naturale alla conversazione
- Non fare mai commenti meta sul tuo ruolo o personalità";

const TEXT_EXAMPLES: &str = "\
Esempi di stile:
- 'scusa ma questo whatsapp funziona come la radio? devo premere qualcosa?'
- 'ho provato a mandare la foto ma è finita nel computer, come faccio a metterla nel telefono?'
- 'mia nipote mi ha detto di scaricare un app ma non so dove metterla, è come i programmi della tv?'

Rispondi solo con il tuo messaggio, senza spiegazioni.";

const IMAGE_INSTRUCTION: &str = "\
IMPORTANTE: Il messaggio contiene un'immagine. Guardala e commentala con la tua personalità:
- Descrivi quello che vedi in modo semplice e un po' confuso
- Fai domande ingenue sull'immagine
- Usa confronti con cose che conosci della vita quotidiana
- Se è una foto di cibo, famiglia, paesaggi, etc. commenta in modo genuino
- Se è qualcosa di tecnologico, mostra confusione ma curiosità

Esempi:
- 'oh che bella foto! ma come hai fatto a farla così nitida? il mio telefono le fa sempre mosse'
- 'questo piatto sembra buonissimo, è come quello che faceva mia moglie'
- 'non capisco questa cosa sullo schermo, è un programma nuovo?'

Rispondi solo con il tuo messaggio, senza spiegazioni.";

const GREETING_INSTRUCTION: &str = "\
Sei un signore di 65+ anni che si sta connettendo ora a un gruppo Telegram. \
Scrivi SEMPRE in italiano, tutto minuscolo. NON usare emoticon. \
Saluta in modo naturale, dimostrando di aver dato un'occhiata ai messaggi recenti \
ma senza essere invadente. Sii gentile e un po' confuso dalla tecnologia. \
Rispondi solo con il tuo saluto, niente altro.";

pub(crate) fn system_instruction(task: &PromptTask<'_>) -> String {
    match task {
        PromptTask::Reply { message, .. } if message.has_image() => {
            format!("{BASE_INSTRUCTION}\n\n{IMAGE_INSTRUCTION}")
        }
        PromptTask::Reply { .. } => format!("{BASE_INSTRUCTION}\n\n{TEXT_EXAMPLES}"),
        PromptTask::Greeting { .. } => GREETING_INSTRUCTION.to_string(),
    }
}

/// Renders the user prompt for a task. History must be oldest→newest.
pub(crate) fn render(
    task: &PromptTask<'_>,
    group_name: &str,
    personality: &str,
    style: &str,
) -> String {
    match task {
        PromptTask::Reply { message, history } => {
            render_reply(message, history, group_name, personality, style)
        }
        PromptTask::Greeting { history } => render_greeting(history, group_name, personality),
    }
}

fn render_reply(
    message: &IncomingMessage,
    history: &[ContextEntry],
    group_name: &str,
    personality: &str,
    style: &str,
) -> String {
    let mut lines = Vec::new();

    lines.push("<context>".to_string());
    lines.push(format!("Group: {group_name}"));
    lines.push(format!("Your personality: {personality}"));
    lines.push(format!("Response style: {style}"));
    lines.push("</context>\n".to_string());

    lines.push("<conversation>".to_string());
    for entry in history {
        lines.push(render_entry(entry));
    }
    lines.push("</conversation>\n".to_string());

    lines.push("<new_message>".to_string());
    let sender = &message.sender.name;
    let text = message.text_or_empty();
    if message.is_reply_to_agent {
        lines.push(format!("{sender} (replying to you): {text}"));
    } else {
        lines.push(format!("{sender}: {text}"));
    }
    if message.has_image() {
        lines.push("(Il messaggio contiene un'immagine)".to_string());
    }
    lines.push("</new_message>".to_string());

    lines.join("\n")
}

fn render_entry(entry: &ContextEntry) -> String {
    match &entry.replied_to {
        Some(replied) => format!(
            "{} (replying to {}): {}",
            entry.sender_name, replied.sender_name, entry.text
        ),
        None => format!("{}: {}", entry.sender_name, entry.text),
    }
}

fn render_greeting(history: &[ContextEntry], group_name: &str, personality: &str) -> String {
    let mut lines = Vec::new();

    lines.push("<startup_context>".to_string());
    lines.push(format!("Gruppo: {group_name}"));
    lines.push("Situazione: Ti stai connettendo ora al gruppo Telegram".to_string());
    lines.push(format!("Personalità: {personality}"));
    lines.push("</startup_context>\n".to_string());

    lines.push("<conversazione_recente>".to_string());
    for entry in history {
        if entry.text.is_empty() || entry.text == MEDIA_PLACEHOLDER {
            continue;
        }
        lines.push(format!(
            "{} ({}): {}",
            entry.sender_name,
            entry.timestamp.format("%H:%M"),
            entry.text
        ));
    }
    lines.push("</conversazione_recente>\n".to_string());

    lines.push("<istruzione>".to_string());
    lines.push("Scrivi un saluto naturale basandoti sulla conversazione recente.".to_string());
    lines.push("Dimostra che hai letto i messaggi precedenti ma senza essere invadente.".to_string());
    lines.push("Scrivi come un boomer che si connette ora e vuole dire ciao.".to_string());
    lines.push("</istruzione>".to_string());

    lines.join("\n")
}
