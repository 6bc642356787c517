//! Static dialogue texts. These are always available and are what the
//! assistant falls back to when the language model cannot be used.

use crate::models::{Language, Step};

/// Fixed replies that are not step questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    InvalidPageCount,
    PageCountOutOfRange,
    PageCountReminder,
    ConfirmStructure,
    NoProposal,
    AskAdjustments,
    ContextCompleted,
    ConversationFinished,
}

/// The question asked while waiting at `step`.
pub fn question(step: Step, language: Language) -> &'static str {
    match (language, step) {
        (Language::English, Step::Purpose) => "What do you need this report for?",
        (Language::English, Step::Topic) => "What specific topic does the report cover?",
        (Language::English, Step::Style) => {
            "Which style do you prefer (technical, academic, executive, etc.)?"
        }
        (Language::English, Step::Pages) => "How many pages do you want? (maximum 30)",
        (Language::English, Step::Extras) => {
            "Are there sources, constraints or a specific tone we should consider?"
        }
        (Language::English, Step::Confirmation) => notice(Notice::ConfirmStructure, language),
        (Language::English, Step::Finished) => notice(Notice::ConversationFinished, language),

        (Language::Spanish, Step::Purpose) => "¿Para qué necesitas este informe?",
        (Language::Spanish, Step::Topic) => "¿Sobre qué tema específico trata el informe?",
        (Language::Spanish, Step::Style) => {
            "¿Qué estilo prefieres (técnico, académico, ejecutivo, etc.)?"
        }
        (Language::Spanish, Step::Pages) => "¿Cuántas páginas deseas? (máximo 30)",
        (Language::Spanish, Step::Extras) => {
            "¿Hay fuentes, restricciones o tono específico que debamos considerar?"
        }
        (Language::Spanish, Step::Confirmation) => notice(Notice::ConfirmStructure, language),
        (Language::Spanish, Step::Finished) => notice(Notice::ConversationFinished, language),
    }
}

pub fn notice(notice: Notice, language: Language) -> &'static str {
    match (language, notice) {
        (Language::English, Notice::InvalidPageCount) => {
            "Please enter a valid page count between 1 and 30."
        }
        (Language::English, Notice::PageCountOutOfRange) => "The number must be between 1 and 30.",
        (Language::English, Notice::PageCountReminder) => {
            "Please indicate a page count between 1 and 30 to continue."
        }
        (Language::English, Notice::ConfirmStructure) => "Does this look right? (yes/no)",
        (Language::English, Notice::NoProposal) => {
            "No structure could be proposed right now. Confirm to continue without one."
        }
        (Language::English, Notice::AskAdjustments) => {
            "What adjustments would you like to make to the structure?"
        }
        (Language::English, Notice::ContextCompleted) => "Context completed",
        (Language::English, Notice::ConversationFinished) => "Conversation finished",

        (Language::Spanish, Notice::InvalidPageCount) => {
            "Indica un número de páginas válido entre 1 y 30."
        }
        (Language::Spanish, Notice::PageCountOutOfRange) => "El número debe estar entre 1 y 30.",
        (Language::Spanish, Notice::PageCountReminder) => {
            "Por favor, indica un número de páginas entre 1 y 30 para continuar."
        }
        (Language::Spanish, Notice::ConfirmStructure) => "¿Te parece bien? (sí/no)",
        (Language::Spanish, Notice::NoProposal) => {
            "No se pudo proponer una estructura ahora. Confirma para continuar sin ella."
        }
        (Language::Spanish, Notice::AskAdjustments) => {
            "¿Qué ajustes quieres hacer a la estructura?"
        }
        (Language::Spanish, Notice::ContextCompleted) => "Contexto completado",
        (Language::Spanish, Notice::ConversationFinished) => "Conversación finalizada",
    }
}

const AFFIRMATIVE: &[&str] = &[
    "yes", "y", "yeah", "yep", "ok", "okay", "sure", "correct", "si", "sí", "vale", "claro",
    "perfecto", "de acuerdo",
];

/// Whether a confirmation answer starts with an affirmative token.
pub fn is_affirmative(input: &str) -> bool {
    let normalized = input
        .trim()
        .trim_start_matches(['¿', '¡'])
        .to_lowercase();
    AFFIRMATIVE.iter().any(|token| {
        normalized
            .strip_prefix(token)
            .is_some_and(|rest| rest.chars().next().map_or(true, |c| !c.is_alphanumeric()))
    })
}

/// Recognise a whole-message request to change the dialogue language.
pub fn language_directive(input: &str) -> Option<Language> {
    let normalized = input
        .trim()
        .trim_end_matches(['.', '!', '?'])
        .to_lowercase();
    let target = ["switch to ", "change to ", "cambia a ", "cambiar a ", "in ", "en ", "habla en "]
        .iter()
        .find_map(|prefix| normalized.strip_prefix(prefix))
        .unwrap_or(&normalized);

    match target.trim() {
        "english" | "inglés" | "ingles" => Some(Language::English),
        "spanish" | "español" | "espanol" | "castellano" => Some(Language::Spanish),
        _ => None,
    }
}
