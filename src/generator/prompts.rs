//! Prompt construction for reports, structure proposals and dialogue questions.

use crate::models::{ConversationState, GenerateReportInput, Language};

fn context_block(context: &[String]) -> String {
    if context.is_empty() {
        return String::new();
    }
    let mut block =
        String::from("\n\nReference material from earlier reports and uploaded documents:\n");
    for (i, snippet) in context.iter().enumerate() {
        block.push_str(&format!("[{}] {}\n", i + 1, snippet.trim()));
    }
    block
}

/// Prompt for a full report body in Markdown.
pub fn report_prompt(
    input: &GenerateReportInput,
    language: Language,
    context: &[String],
) -> String {
    format!(
        "Write a professional report in {} of type \"{}\" on the topic: \"{}\". \
         Purpose: {}. Style: {}. Approximate length: {} pages. \
         Include an introduction, a structured argument and conclusions. \
         Use Markdown headings (# for sections, ## for subsections). \
         Additional considerations: {}.{}",
        language.name(),
        input.kind,
        input.topic,
        input.purpose.as_deref().unwrap_or("N/A"),
        input.style.as_deref().unwrap_or("standard"),
        input.pages.unwrap_or(5),
        input.extras.as_deref().unwrap_or("none"),
        context_block(context),
    )
}

/// Prompt for a section outline the user confirms before the report is written.
pub fn structure_prompt(state: &ConversationState, context: &[String]) -> String {
    let mut prompt = format!(
        "Propose the section structure, as a numbered list of section titles, for a report in {}. \
         Purpose: {}. Topic: {}. Style: {}. Length: {} pages. Extras: {}.",
        state.language.name(),
        state.purpose.as_deref().unwrap_or("N/A"),
        state.topic.as_deref().unwrap_or("N/A"),
        state.style.as_deref().unwrap_or("standard"),
        state.pages.unwrap_or(5),
        state.extras.as_deref().unwrap_or("none"),
    );
    if let Some(previous) = &state.proposed_structure {
        prompt.push_str(&format!(
            "\n\nThe previous proposal was rejected:\n{}\nApply the requested adjustments from the extras above.",
            previous.trim()
        ));
    }
    prompt.push_str(&context_block(context));
    prompt
}

/// Prompt asking the model to rephrase a fixed question using what is known so far.
pub fn question_prompt(question: &str, state: &ConversationState) -> String {
    let mut known = Vec::new();
    if let Some(purpose) = &state.purpose {
        known.push(format!("purpose: {}", purpose));
    }
    if let Some(topic) = &state.topic {
        known.push(format!("topic: {}", topic));
    }
    if let Some(style) = &state.style {
        known.push(format!("style: {}", style));
    }
    if let Some(pages) = state.pages {
        known.push(format!("pages: {}", pages));
    }
    let known = if known.is_empty() {
        "nothing yet".to_string()
    } else {
        known.join("; ")
    };

    format!(
        "You are a friendly assistant helping a user describe a report. \
         Rephrase the following question in {} in one short sentence, \
         taking into account what the user already said ({}). \
         Reply with the question only.\n\nQuestion: {}",
        state.language.name(),
        known,
        question
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_prompt_uses_defaults() {
        let input = GenerateReportInput {
            topic: "sales".to_string(),
            kind: "report".to_string(),
            ..Default::default()
        };
        let prompt = report_prompt(&input, Language::English, &[]);
        assert!(prompt.contains("\"sales\""));
        assert!(prompt.contains("Approximate length: 5 pages"));
        assert!(prompt.contains("Additional considerations: none."));
        assert!(!prompt.contains("Reference material"));
    }

    #[test]
    fn structure_prompt_mentions_rejected_proposal() {
        let mut state = ConversationState::new(Language::Spanish);
        state.topic = Some("ventas".to_string());
        state.proposed_structure = Some("1. Intro".to_string());
        let prompt = structure_prompt(&state, &["past report".to_string()]);
        assert!(prompt.contains("in Spanish"));
        assert!(prompt.contains("1. Intro"));
        assert!(prompt.contains("[1] past report"));
    }

    #[test]
    fn question_prompt_lists_known_fields() {
        let mut state = ConversationState::new(Language::English);
        state.purpose = Some("board meeting".to_string());
        let prompt = question_prompt("Which topic?", &state);
        assert!(prompt.contains("purpose: board meeting"));
        assert!(prompt.ends_with("Question: Which topic?"));
    }
}
