//! Core data models for translation

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::core::errors::{Result, TranslationError};
use crate::core::registry::Register;

/// Model selection hint passed through to the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelHint {
    /// The generator's default (highest quality) model
    #[default]
    Default,
    /// A faster, cheaper model variant
    Fast,
}

impl ModelHint {
    /// Parse the optional `model` field of an API request.
    ///
    /// Unknown values fall back to [`ModelHint::Default`].
    pub fn from_wire(value: Option<&str>) -> Self {
        match value.map(str::parse::<ModelHint>) {
            Some(Ok(hint)) => hint,
            Some(Err(_)) => {
                tracing::debug!("Unknown model hint {:?}, using default", value);
                ModelHint::Default
            }
            None => ModelHint::Default,
        }
    }
}

impl fmt::Display for ModelHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelHint::Default => write!(f, "default"),
            ModelHint::Fast => write!(f, "fast"),
        }
    }
}

impl FromStr for ModelHint {
    type Err = TranslationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "default" | "opus" => Ok(ModelHint::Default),
            "fast" | "sonnet" => Ok(ModelHint::Fast),
            other => Err(TranslationError::validation(format!("Unknown model '{}'", other))),
        }
    }
}

/// Translation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    source_text: String,
    input_register: Register,
    output_registers: Vec<Register>,
    model_hint: ModelHint,
}

impl TranslationRequest {
    /// Build a validated request.
    ///
    /// Rejects empty text, a missing input register and an empty output set.
    /// Whitespace-only text is passed through untouched.
    /// Duplicate output registers are dropped, keeping first occurrence order.
    pub fn try_new(
        source_text: impl Into<String>,
        input_register: Option<Register>,
        output_registers: impl IntoIterator<Item = Register>,
    ) -> Result<Self> {
        let source_text = source_text.into();
        if source_text.is_empty() {
            return Err(TranslationError::validation("Text is required"));
        }

        let input_register = input_register
            .ok_or_else(|| TranslationError::validation("Input language is required"))?;

        let mut outputs: Vec<Register> = Vec::new();
        for register in output_registers {
            if !outputs.contains(&register) {
                outputs.push(register);
            }
        }
        if outputs.is_empty() {
            return Err(TranslationError::validation(
                "At least one output language is required",
            ));
        }

        Ok(Self {
            source_text,
            input_register,
            output_registers: outputs,
            model_hint: ModelHint::Default,
        })
    }

    /// Set the model hint
    pub fn with_model_hint(mut self, model_hint: ModelHint) -> Self {
        self.model_hint = model_hint;
        self
    }

    /// The literal text to translate
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// Register of the source text
    pub fn input_register(&self) -> Register {
        self.input_register
    }

    /// Requested output registers, in caller order
    pub fn output_registers(&self) -> &[Register] {
        &self.output_registers
    }

    /// Requested model variant
    pub fn model_hint(&self) -> ModelHint {
        self.model_hint
    }
}

/// Fully resolved instruction ready for the generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPlan {
    /// User-turn instruction, ending with the verbatim source text
    pub instruction_text: String,
    /// System prompt framing the generator's role
    pub system_preamble: String,
}

/// One tagged sentence `<sN>…</sN>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentenceSegment {
    /// `N` from the tag; 1-based, gaps allowed
    pub index: u32,
    /// Text between the tags, untrimmed
    pub text: String,
}

/// The labeled block found for one register plus its parsed segments
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterText {
    /// Register the block was labeled with
    pub register: Register,
    /// Trimmed block text with tags intact; empty when not found
    pub raw_block: String,
    /// Tagged sentences parsed from `raw_block`
    pub segments: Vec<SentenceSegment>,
}

impl RegisterText {
    /// Whether no block was found for this register
    pub fn is_empty(&self) -> bool {
        self.raw_block.is_empty()
    }
}

/// Translation result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationResult {
    /// The source text as echoed back under the input register's header
    pub original: RegisterText,
    /// One entry per requested output register
    pub translations: BTreeMap<Register, RegisterText>,
}

impl TranslationResult {
    /// Block for one output register
    pub fn translation(&self, register: Register) -> Option<&RegisterText> {
        self.translations.get(&register)
    }

    /// Requested registers for which neither pass found a block
    pub fn missing_registers(&self) -> Vec<Register> {
        self.translations
            .values()
            .filter(|t| t.is_empty())
            .map(|t| t.register)
            .collect()
    }

    /// Registers whose segment count differs from the original's
    pub fn mismatched_registers(&self) -> Vec<Register> {
        let expected = self.original.segments.len();
        self.translations
            .values()
            .filter(|t| !t.is_empty() && t.segments.len() != expected)
            .map(|t| t.register)
            .collect()
    }
}

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking
    User,
    /// The generator's earlier answer
    Assistant,
}

impl Role {
    /// Label used when rendering history into a prompt
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// One prior exchange in the Q&A mode, supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Who spoke
    pub role: Role,
    /// What was said
    pub content: String,
}

impl ConversationTurn {
    /// Create a turn
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_validation() {
        assert!(TranslationRequest::try_new("", Some(Register::Modern), [Register::Plain]).is_err());
        assert!(TranslationRequest::try_new("  \n", Some(Register::Modern), [Register::Plain]).is_ok());
        assert!(TranslationRequest::try_new("学而时习之", None, [Register::Plain]).is_err());

        let err = TranslationRequest::try_new("学而时习之", Some(Register::Classical), [])
            .unwrap_err();
        assert!(matches!(err, TranslationError::ValidationError { .. }));
    }

    #[test]
    fn test_request_dedups_outputs_in_order() {
        let request = TranslationRequest::try_new(
            "学而时习之",
            Some(Register::Classical),
            [Register::Plain, Register::Modern, Register::Plain],
        )
        .unwrap();
        assert_eq!(request.output_registers(), &[Register::Plain, Register::Modern]);
        assert_eq!(request.model_hint(), ModelHint::Default);
    }

    #[test]
    fn test_model_hint_from_wire() {
        assert_eq!(ModelHint::from_wire(Some("sonnet")), ModelHint::Fast);
        assert_eq!(ModelHint::from_wire(Some("fast")), ModelHint::Fast);
        assert_eq!(ModelHint::from_wire(Some("opus")), ModelHint::Default);
        assert_eq!(ModelHint::from_wire(Some("gpt-9")), ModelHint::Default);
        assert_eq!(ModelHint::from_wire(None), ModelHint::Default);
    }

    #[test]
    fn test_missing_and_mismatched_registers() {
        let block = |register, n: u32| RegisterText {
            register,
            raw_block: if n == 0 { String::new() } else { "x".to_string() },
            segments: (1..=n)
                .map(|i| SentenceSegment { index: i, text: format!("s{}", i) })
                .collect(),
        };
        let mut translations = BTreeMap::new();
        translations.insert(Register::Modern, block(Register::Modern, 1));
        translations.insert(Register::Plain, block(Register::Plain, 0));
        let result = TranslationResult {
            original: block(Register::Classical, 2),
            translations,
        };

        assert_eq!(result.missing_registers(), vec![Register::Plain]);
        assert_eq!(result.mismatched_registers(), vec![Register::Modern]);
    }
}
