//! Short natural-language directives over a [`Document`].
//!
//! Commands are matched against an ordered rule table; the first rule that
//! recognises the input wins. Every rule exists in English and Spanish and the
//! reply is written in the language of the phrase that matched.

use std::sync::LazyLock;

use regex::Regex;

use super::Document;
use crate::models::Language;

/// A recognised directive with the section name it refers to, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    CountHeadings,
    CharacterCount { name: String },
    ClearText { name: String },
    DeleteSection { name: String },
}

struct Rule {
    language: Language,
    parse: fn(&str) -> Option<Intent>,
}

const RULES: &[Rule] = &[
    Rule { language: Language::English, parse: count_headings_en },
    Rule { language: Language::Spanish, parse: count_headings_es },
    Rule { language: Language::English, parse: character_count_en },
    Rule { language: Language::Spanish, parse: character_count_es },
    Rule { language: Language::English, parse: clear_text_en },
    Rule { language: Language::Spanish, parse: clear_text_es },
    Rule { language: Language::English, parse: delete_section_en },
    Rule { language: Language::Spanish, parse: delete_section_es },
];

static CHARACTERS_EN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"how many characters does (.+?)(?:\s+have)?[\s?.!]*$").expect("valid regex")
});
static CHARACTERS_ES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"caracteres tiene (.+)").expect("valid regex"));

/// Interprets one line of text against a document and answers with one line.
#[derive(Debug, Clone, Copy)]
pub struct CommandInterpreter {
    /// Language of the reply when nothing matches.
    language: Language,
}

impl Default for CommandInterpreter {
    fn default() -> Self {
        Self::new(Language::English)
    }
}

impl CommandInterpreter {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    /// Classify `input`, returning the intent and the language it was phrased in.
    pub fn classify(input: &str) -> Option<(Intent, Language)> {
        let normalized = normalize(input);
        RULES
            .iter()
            .find_map(|rule| (rule.parse)(&normalized).map(|intent| (intent, rule.language)))
    }

    pub fn interpret(&self, doc: &mut Document, input: &str) -> String {
        match Self::classify(input) {
            Some((intent, language)) => {
                tracing::debug!(?intent, language = language.code(), "Outline command");
                execute(doc, intent, language)
            }
            None => not_recognized(self.language).to_string(),
        }
    }
}

fn execute(doc: &mut Document, intent: Intent, language: Language) -> String {
    match intent {
        Intent::CountHeadings => {
            let count = doc.count_titles();
            match language {
                Language::English => format!(
                    "There are {} titles and {} subtitles.",
                    count.titles, count.subtitles
                ),
                Language::Spanish => format!(
                    "Hay {} títulos y {} subtítulos.",
                    count.titles, count.subtitles
                ),
            }
        }
        Intent::CharacterCount { name } => match lookup(doc, &name) {
            Some(id) => {
                let count = doc.get_character_count(id);
                match language {
                    Language::English => format!("That section has {} characters.", count),
                    Language::Spanish => format!("Esa sección tiene {} caracteres.", count),
                }
            }
            None => not_found(language).to_string(),
        },
        Intent::ClearText { name } => match lookup(doc, &name) {
            Some(id) => {
                doc.update_text(id, "");
                match language {
                    Language::English => "Text updated.".to_string(),
                    Language::Spanish => "Texto actualizado.".to_string(),
                }
            }
            None => not_found(language).to_string(),
        },
        // The confirmation echoes the name as the user typed it, not the stored text.
        Intent::DeleteSection { name } => match lookup(doc, &name) {
            Some(id) => {
                doc.delete_section(id);
                match language {
                    Language::English => format!("Section {} deleted.", name),
                    Language::Spanish => format!("Apartado {} eliminado.", name),
                }
            }
            None => not_found(language).to_string(),
        },
    }
}

fn lookup(doc: &Document, name: &str) -> Option<uuid::Uuid> {
    if name.is_empty() {
        return None;
    }
    doc.find_section_by_name(name)
}

fn normalize(input: &str) -> String {
    input
        .trim()
        .trim_start_matches(['¿', '¡'])
        .trim()
        .to_lowercase()
}

fn strip_prefix_word<'a>(name: &'a str, articles: &[&str]) -> &'a str {
    for article in articles {
        if let Some(rest) = name.strip_prefix(article) {
            return rest;
        }
    }
    name
}

fn count_headings_en(t: &str) -> Option<Intent> {
    (t.contains("titles") && t.contains("subtitles")).then_some(Intent::CountHeadings)
}

fn count_headings_es(t: &str) -> Option<Intent> {
    let titles = t.contains("títulos") || t.contains("titulos");
    let subtitles = t.contains("subtítulos") || t.contains("subtitulos");
    (titles && subtitles).then_some(Intent::CountHeadings)
}

fn character_count_en(t: &str) -> Option<Intent> {
    let caps = CHARACTERS_EN.captures(t)?;
    let name = caps[1].trim_matches([' ', '?']);
    let name = strip_prefix_word(name, &["the "]);
    Some(Intent::CharacterCount {
        name: name.to_string(),
    })
}

fn character_count_es(t: &str) -> Option<Intent> {
    let caps = CHARACTERS_ES.captures(t)?;
    let name = caps[1].trim_matches([' ', '?']);
    let name = strip_prefix_word(name, &["la ", "el "]);
    Some(Intent::CharacterCount {
        name: name.to_string(),
    })
}

fn clear_text_en(t: &str) -> Option<Intent> {
    let rest = t.strip_prefix("can you modify the text of")?;
    Some(Intent::ClearText {
        name: rest.trim_matches([' ', '?']).to_string(),
    })
}

fn clear_text_es(t: &str) -> Option<Intent> {
    let rest = t.strip_prefix("puedes modificar el texto de")?;
    Some(Intent::ClearText {
        name: rest.trim_matches([' ', '?']).to_string(),
    })
}

fn delete_section_en(t: &str) -> Option<Intent> {
    let (_, rest) = t.split_once("delete the section")?;
    let name = rest.trim_matches([' ', '.', '?']);
    let name = strip_prefix_word(name, &["of "]);
    Some(Intent::DeleteSection {
        name: name.to_string(),
    })
}

fn delete_section_es(t: &str) -> Option<Intent> {
    let (_, rest) = t.split_once("elimina el apartado")?;
    let name = rest.trim_matches([' ', '.', '?']);
    let name = strip_prefix_word(name, &["de "]);
    Some(Intent::DeleteSection {
        name: name.to_string(),
    })
}

fn not_found(language: Language) -> &'static str {
    match language {
        Language::English => "Section not found.",
        Language::Spanish => "Sección no encontrada.",
    }
}

fn not_recognized(language: Language) -> &'static str {
    match language {
        Language::English => "Command not recognized.",
        Language::Spanish => "Comando no reconocido.",
    }
}
