use serde::{Deserialize, Serialize};

use super::report::{default_kind, GenerateReportInput};

/// Language a session (or a reply) is written in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "es")]
    Spanish,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Spanish => "es",
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Some(Self::English),
            "es" | "spanish" | "español" | "espanol" => Some(Self::Spanish),
            _ => None,
        }
    }

    /// Name of the language as a prompt would spell it.
    pub fn name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Spanish => "Spanish",
        }
    }
}

/// Position of a session in the elicitation dialogue.
///
/// Steps advance one at a time; the only backward edge is
/// `Confirmation → Extras` when the proposed structure is rejected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(into = "u8", try_from = "u8")]
pub enum Step {
    Purpose = 0,
    Topic = 1,
    Style = 2,
    Pages = 3,
    Extras = 4,
    Confirmation = 5,
    Finished = 6,
}

impl Step {
    pub const ALL: [Step; 7] = [
        Step::Purpose,
        Step::Topic,
        Step::Style,
        Step::Pages,
        Step::Extras,
        Step::Confirmation,
        Step::Finished,
    ];

    pub fn ordinal(&self) -> u8 {
        *self as u8
    }

    /// The following step. `Finished` is terminal.
    pub fn next(&self) -> Step {
        Step::ALL
            .get(self.ordinal() as usize + 1)
            .copied()
            .unwrap_or(Step::Finished)
    }

    /// Name used by the input validator for this step.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Purpose => "purpose",
            Self::Topic => "topic",
            Self::Style => "style",
            Self::Pages => "length",
            Self::Extras => "extras",
            Self::Confirmation => "confirmation",
            Self::Finished => "finished",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "purpose" | "proposito" => Some(Self::Purpose),
            "topic" | "tema" => Some(Self::Topic),
            "style" | "estilo" => Some(Self::Style),
            "length" | "pages" | "longitud" => Some(Self::Pages),
            "extras" => Some(Self::Extras),
            "confirmation" => Some(Self::Confirmation),
            "finished" => Some(Self::Finished),
            _ => None,
        }
    }
}

impl From<Step> for u8 {
    fn from(step: Step) -> Self {
        step.ordinal()
    }
}

impl TryFrom<u8> for Step {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Step::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| format!("step {} is out of range 0-6", value))
    }
}

/// One elicitation session. Fields stay `None` until their step is answered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationState {
    pub step: Step,
    pub purpose: Option<String>,
    pub topic: Option<String>,
    pub style: Option<String>,
    /// Requested length, 1 to 30 pages.
    pub pages: Option<u32>,
    pub extras: Option<String>,
    pub proposed_structure: Option<String>,
    pub language: Language,
}

impl ConversationState {
    pub fn new(language: Language) -> Self {
        Self {
            step: Step::Purpose,
            purpose: None,
            topic: None,
            style: None,
            pages: None,
            extras: None,
            proposed_structure: None,
            language,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.step == Step::Finished
    }

    /// Report parameters collected by this session, if a topic was given.
    pub fn report_input(&self) -> Option<GenerateReportInput> {
        let topic = self.topic.clone()?;
        let extras = match (&self.extras, &self.proposed_structure) {
            (Some(extras), Some(structure)) => {
                Some(format!("{}\nAgreed structure:\n{}", extras, structure))
            }
            (None, Some(structure)) => Some(format!("Agreed structure:\n{}", structure)),
            (extras, None) => extras.clone(),
        };
        Some(GenerateReportInput {
            topic,
            kind: default_kind(),
            purpose: self.purpose.clone(),
            style: self.style.clone(),
            pages: self.pages,
            extras,
            language: Some(self.language),
        })
    }
}

/// Input for one dialogue turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnInput {
    pub message: String,
}

/// What the assistant answers for one turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurnReply {
    pub reply: String,
    pub step: Step,
    /// Full collected state, present once the context is completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ConversationState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_structure: Option<String>,
    /// Set when a collaborator failed but the turn still completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TurnReply {
    pub fn new(reply: impl Into<String>, step: Step) -> Self {
        Self {
            reply: reply.into(),
            step,
            context: None,
            proposed_structure: None,
            error: None,
        }
    }
}
