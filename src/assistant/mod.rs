//! Stepped elicitation dialogue.
//!
//! | Step | Waits for | Then |
//! |---|---|---|
//! | 0 `Purpose` | any non-empty text | ask topic |
//! | 1 `Topic` | any non-empty text | ask style |
//! | 2 `Style` | any non-empty text | ask page count |
//! | 3 `Pages` | leading integer 1–30 | ask extras, or re-prompt |
//! | 4 `Extras` | any text | propose a structure |
//! | 5 `Confirmation` | yes / no | finish, or back to 4 for adjustments |
//! | 6 `Finished` | — | "conversation finished" |
//!
//! The very first message of a session only opens it and is answered with the
//! opening question; a language directive there still sets the language.
//! Questions can be rephrased by the language model; any generation failure
//! falls back to the static text.

pub mod prompts;
pub mod store;
pub mod validator;

use serde::{Deserialize, Serialize};

use crate::generator::{prompts as generation, GeneratorHandle};
use crate::models::{ConversationState, Language, Step, TurnReply};
use crate::retrieval::Retriever;
use prompts::Notice;
pub use store::{LockScope, SessionStore};

/// Dialogue behaviour switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    pub default_language: Language,
    /// Ask the language model to rephrase step questions.
    pub personalize_questions: bool,
    /// Run the input validator on steps 0–3 instead of the plain checks.
    pub strict_validation: bool,
    pub lock_scope: LockScope,
    /// Retrieved snippets added to structure prompts. `0` disables retrieval.
    pub context_snippets: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            default_language: Language::English,
            personalize_questions: false,
            strict_validation: false,
            lock_scope: LockScope::PerSession,
            context_snippets: 3,
        }
    }
}

pub struct Assistant {
    store: SessionStore,
    generator: GeneratorHandle,
    retriever: Option<Retriever>,
    config: AssistantConfig,
}

fn text_slot(state: &mut ConversationState, step: Step) -> Option<&mut Option<String>> {
    match step {
        Step::Purpose => Some(&mut state.purpose),
        Step::Topic => Some(&mut state.topic),
        Step::Style => Some(&mut state.style),
        Step::Extras => Some(&mut state.extras),
        _ => None,
    }
}

fn leading_integer(text: &str) -> Option<i64> {
    text.split_whitespace().next()?.parse().ok()
}

impl Assistant {
    pub fn new(generator: GeneratorHandle, config: AssistantConfig) -> Self {
        Self {
            store: SessionStore::new(config.lock_scope),
            generator,
            retriever: None,
            config,
        }
    }

    pub fn with_retriever(mut self, retriever: Retriever) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub async fn conversation(&self, session_id: &str) -> Option<ConversationState> {
        self.store.get(session_id).await
    }

    pub fn reset(&self, session_id: &str) -> bool {
        self.store.remove(session_id)
    }

    /// Process one user message for `session_id`.
    pub async fn handle_turn(&self, session_id: &str, message: &str) -> TurnReply {
        let mut session = self
            .store
            .checkout(session_id, self.config.default_language)
            .await;
        let created = session.created;
        let state = &mut *session.state;

        if created {
            tracing::info!(session_id, "Conversation started");
            if let Some(language) = prompts::language_directive(message) {
                state.language = language;
            }
            let question = prompts::question(Step::Purpose, state.language);
            return TurnReply::new(self.ask(question, state).await, state.step);
        }

        let text = message.trim();
        if let Some(language) = prompts::language_directive(text) {
            tracing::info!(
                session_id,
                language = language.code(),
                "Conversation language changed"
            );
            state.language = language;
            return self.repeat_prompt(state).await;
        }

        let before = state.step;
        let reply = match state.step {
            Step::Purpose | Step::Topic | Step::Style => self.accept_text(state, text).await,
            Step::Pages => self.accept_pages(state, text).await,
            Step::Extras => self.accept_extras(state, text).await,
            Step::Confirmation => self.accept_confirmation(state, text).await,
            Step::Finished => TurnReply::new(
                prompts::notice(Notice::ConversationFinished, state.language),
                Step::Finished,
            ),
        };

        if state.step != before {
            tracing::info!(
                session_id,
                from = before.ordinal(),
                to = state.step.ordinal(),
                "Conversation step changed"
            );
        }
        reply
    }

    /// Personalize `question` when configured, falling back to the static text.
    async fn ask(&self, question: &str, state: &ConversationState) -> String {
        if !self.config.personalize_questions {
            return question.to_string();
        }
        let prompt = generation::question_prompt(question, state);
        match self.generator.generate(&prompt).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => question.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Question generation failed, using static text");
                question.to_string()
            }
        }
    }

    async fn repeat_prompt(&self, state: &ConversationState) -> TurnReply {
        let language = state.language;
        match state.step {
            Step::Confirmation => {
                let confirm = prompts::notice(Notice::ConfirmStructure, language);
                let shown = match &state.proposed_structure {
                    Some(structure) => structure.as_str(),
                    None => prompts::notice(Notice::NoProposal, language),
                };
                let mut reply = TurnReply::new(format!("{}\n\n{}", shown, confirm), state.step);
                reply.proposed_structure = state.proposed_structure.clone();
                reply
            }
            Step::Finished => TurnReply::new(
                prompts::notice(Notice::ConversationFinished, language),
                state.step,
            ),
            step => {
                let question = prompts::question(step, language);
                TurnReply::new(self.ask(question, state).await, step)
            }
        }
    }

    /// Rejection reply for an answer to `step`, if the answer is not acceptable.
    fn reject(&self, step: Step, text: &str, language: Language) -> Option<TurnReply> {
        let question = prompts::question(step, language);
        if self.config.strict_validation {
            let result = validator::validate(step.as_str(), text, question, language);
            return (!result.valid).then(|| {
                TurnReply::new(
                    result.feedback.unwrap_or_else(|| question.to_string()),
                    step,
                )
            });
        }
        text.is_empty().then(|| TurnReply::new(question, step))
    }

    async fn accept_text(&self, state: &mut ConversationState, text: &str) -> TurnReply {
        let step = state.step;
        if let Some(rejection) = self.reject(step, text, state.language) {
            return rejection;
        }
        if let Some(slot) = text_slot(state, step) {
            *slot = Some(text.to_string());
        }
        state.step = step.next();
        let question = prompts::question(state.step, state.language);
        TurnReply::new(self.ask(question, state).await, state.step)
    }

    async fn accept_pages(&self, state: &mut ConversationState, text: &str) -> TurnReply {
        let language = state.language;
        let pages = if self.config.strict_validation {
            let question = prompts::question(Step::Pages, language);
            let result = validator::validate(Step::Pages.as_str(), text, question, language);
            match result.value {
                Some(pages) if result.valid => pages,
                _ => {
                    let feedback = result.feedback.unwrap_or_else(|| question.to_string());
                    return TurnReply::new(feedback, Step::Pages);
                }
            }
        } else {
            let range = i64::from(validator::MIN_PAGES)..=i64::from(validator::MAX_PAGES);
            match leading_integer(text) {
                None => {
                    return TurnReply::new(
                        prompts::notice(Notice::InvalidPageCount, language),
                        Step::Pages,
                    )
                }
                Some(n) if !range.contains(&n) => {
                    return TurnReply::new(
                        prompts::notice(Notice::PageCountOutOfRange, language),
                        Step::Pages,
                    )
                }
                Some(n) => n as u32,
            }
        };

        state.pages = Some(pages);
        state.step = Step::Extras;
        let question = prompts::question(Step::Extras, language);
        TurnReply::new(self.ask(question, state).await, state.step)
    }

    async fn accept_extras(&self, state: &mut ConversationState, text: &str) -> TurnReply {
        state.extras = Some(text.to_string());

        let context = self.retrieve_context(state).await;
        let prompt = generation::structure_prompt(state, &context);
        state.step = Step::Confirmation;
        let confirm = prompts::notice(Notice::ConfirmStructure, state.language);

        match self.generator.generate(&prompt).await {
            Ok(structure) => {
                let structure = structure.trim().to_string();
                state.proposed_structure = Some(structure.clone());
                TurnReply {
                    reply: format!("{}\n\n{}", structure, confirm),
                    step: state.step,
                    context: None,
                    proposed_structure: Some(structure),
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Structure generation failed");
                state.proposed_structure = None;
                let notice = prompts::notice(Notice::NoProposal, state.language);
                TurnReply {
                    reply: format!("{}\n\n{}", notice, confirm),
                    step: state.step,
                    context: None,
                    proposed_structure: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn accept_confirmation(&self, state: &mut ConversationState, text: &str) -> TurnReply {
        if prompts::is_affirmative(text) {
            state.step = Step::Finished;
            let mut reply = TurnReply::new(
                prompts::notice(Notice::ContextCompleted, state.language),
                state.step,
            );
            reply.context = Some(state.clone());
            return reply;
        }

        state.step = Step::Extras;
        let question = prompts::notice(Notice::AskAdjustments, state.language);
        TurnReply::new(self.ask(question, state).await, state.step)
    }

    async fn retrieve_context(&self, state: &ConversationState) -> Vec<String> {
        let Some(retriever) = &self.retriever else {
            return Vec::new();
        };
        if self.config.context_snippets == 0 {
            return Vec::new();
        }
        let query = [state.topic.as_deref(), state.purpose.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if query.is_empty() {
            return Vec::new();
        }
        retriever.context_for(&query, self.config.context_snippets).await
    }
}
