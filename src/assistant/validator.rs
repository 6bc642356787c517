//! Heuristic gate for free-text answers.
//!
//! Rejects empty, evasive or too-short answers and parses page counts. It never
//! judges whether a real answer is on topic.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::prompts::{self, Notice};
use crate::models::{Language, Step};

pub const MIN_PAGES: u32 = 1;
pub const MAX_PAGES: u32 = 30;

static OFF_TOPIC: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^(hi|hello|hey|good morning|good afternoon|good evening|hola|buenas|buenos dias|buenos días|buenas tardes|buenas noches)$",
        r"^(how are you\??|¿?c[oó]mo est[aá]s\??)$",
        r"^((ja)+a*|ja ja+|(ha)+a*|ha ha+|(je)+e*|(he)+e*|lol+|xd+)$",
        r"^(no se|no sé|no lo se|no lo sé|ni idea|lo que sea|cualquiera|i don't know|i dont know|dunno|no idea|whatever|anything)$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid regex"))
    .collect()
});

static FIRST_INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

const AMBIGUOUS: &[&str] = &["yes", "no", "?", "si", "sí"];

/// A validation request as it arrives over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRequest {
    /// Step name: `purpose`, `topic`, `style`, `length` or `extras`.
    pub step: String,
    pub input: String,
    /// Question to repeat on rejection. Defaults to the step's static question.
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub language: Option<Language>,
}

/// Outcome of validating one answer. Rejection is a normal result, not an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationResult {
    pub step: String,
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    /// Parsed page count for the length step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<u32>,
}

impl ValidationResult {
    fn accept(step: &str, value: Option<u32>) -> Self {
        Self {
            step: step.to_string(),
            valid: true,
            feedback: None,
            value,
        }
    }

    fn reject(step: &str, feedback: impl Into<String>) -> Self {
        Self {
            step: step.to_string(),
            valid: false,
            feedback: Some(feedback.into()),
            value: None,
        }
    }
}

/// Validate `input` as the answer to `question` at the step named `step`.
pub fn validate(step: &str, input: &str, question: &str, language: Language) -> ValidationResult {
    let text = input.trim();
    if text.is_empty() {
        return ValidationResult::reject(step, question);
    }

    let normalized = text.to_lowercase();
    if OFF_TOPIC.iter().any(|re| re.is_match(&normalized)) {
        return ValidationResult::reject(step, question);
    }

    if Step::from_str(step) == Some(Step::Pages) {
        let reminder = prompts::notice(Notice::PageCountReminder, language);
        let pages = FIRST_INTEGER
            .find(text)
            .and_then(|m| m.as_str().parse::<u32>().ok());
        return match pages {
            Some(n) if (MIN_PAGES..=MAX_PAGES).contains(&n) => {
                ValidationResult::accept(step, Some(n))
            }
            _ => ValidationResult::reject(step, reminder),
        };
    }

    if normalized.chars().count() <= 2 || AMBIGUOUS.contains(&normalized.as_str()) {
        return ValidationResult::reject(step, question);
    }

    ValidationResult::accept(step, None)
}

/// Validate a wire request, filling in the static question when none is given.
pub fn validate_request(
    request: &ValidationRequest,
    default_language: Language,
) -> ValidationResult {
    let language = request.language.unwrap_or(default_language);
    let question = match (&request.question, Step::from_str(&request.step)) {
        (Some(q), _) => q.clone(),
        (None, Some(step)) => prompts::question(step, language).to_string(),
        (None, None) => String::new(),
    };
    validate(&request.step, &request.input, &question, language)
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUESTION: &str = "What specific topic does the report cover?";

    #[test]
    fn empty_input_repeats_question() {
        let result = validate("topic", "   ", QUESTION, Language::English);
        assert!(!result.valid);
        assert_eq!(result.feedback.as_deref(), Some(QUESTION));
    }

    #[test]
    fn off_topic_input_repeats_question() {
        for input in ["hola", "Hello", "how are you?", "jajaja", "xd", "no sé", "whatever"] {
            let result = validate("topic", input, QUESTION, Language::English);
            assert!(!result.valid, "{input} should be rejected");
            assert_eq!(result.feedback.as_deref(), Some(QUESTION));
        }
    }

    #[test]
    fn page_count_boundaries() {
        for input in ["0", "31", "abc"] {
            let result = validate("length", input, "pages?", Language::English);
            assert!(!result.valid, "{input} should be rejected");
            assert!(result.feedback.unwrap().contains("between 1 and 30"));
        }
        for (input, expected) in [("1", 1), ("30", 30), ("about 12 pages", 12)] {
            let result = validate("length", input, "pages?", Language::English);
            assert!(result.valid);
            assert_eq!(result.value, Some(expected));
        }
    }

    #[test]
    fn spanish_page_reminder() {
        let result = validate(
            "longitud",
            "alo?",
            "Indica el número de páginas",
            Language::Spanish,
        );
        assert!(!result.valid);
        assert!(result.feedback.unwrap().contains("1 y 30"));
    }

    #[test]
    fn short_or_ambiguous_answers_are_rejected() {
        for input in ["ab", "yes", "no", "?", "sí"] {
            let result = validate("style", input, "Style?", Language::English);
            assert!(!result.valid, "{input} should be rejected");
        }
    }

    #[test]
    fn real_answer_is_accepted() {
        let result = validate("topic", "sales figures", QUESTION, Language::English);
        assert_eq!(
            result,
            ValidationResult {
                step: "topic".to_string(),
                valid: true,
                feedback: None,
                value: None,
            }
        );
    }

    #[test]
    fn request_defaults_to_static_question() {
        let request = ValidationRequest {
            step: "topic".to_string(),
            input: "hola".to_string(),
            question: None,
            language: Some(Language::Spanish),
        };
        let result = validate_request(&request, Language::English);
        assert_eq!(
            result.feedback.as_deref(),
            Some("¿Sobre qué tema específico trata el informe?")
        );
    }
}
