//! Language registry: the three registers and their prompt metadata

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::errors::TranslationError;

/// A textual register the service translates between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Register {
    /// Classical Chinese (文言文), wire code `ancient`
    #[serde(rename = "ancient")]
    Classical,
    /// Modern simplified Chinese, wire code `modern`
    #[serde(rename = "modern")]
    Modern,
    /// English, wire code `english`
    #[serde(rename = "english")]
    Plain,
}

impl Register {
    /// All registers in canonical order
    pub const ALL: [Register; 3] = [Register::Classical, Register::Modern, Register::Plain];

    /// External code used by the HTTP interface
    pub fn code(&self) -> &'static str {
        match self {
            Register::Classical => "ancient",
            Register::Modern => "modern",
            Register::Plain => "english",
        }
    }

    /// Human label used inside prompts
    pub fn label(&self) -> &'static str {
        match self {
            Register::Classical => "Classical/Ancient Chinese",
            Register::Modern => "Modern Simplified Chinese",
            Register::Plain => "English",
        }
    }

    /// All-caps section header the generator is asked to emit
    pub fn header(&self) -> &'static str {
        match self {
            Register::Classical => "ANCIENT",
            Register::Modern => "MODERN",
            Register::Plain => "ENGLISH",
        }
    }

    /// Parenthesised note shown after the header, if any
    pub fn header_note(&self) -> Option<&'static str> {
        match self {
            Register::Classical => Some("文言文"),
            Register::Modern | Register::Plain => None,
        }
    }

    /// Full header line, e.g. `ANCIENT (文言文):`
    pub fn header_line(&self) -> String {
        match self.header_note() {
            Some(note) => format!("{} ({}):", self.header(), note),
            None => format!("{}:", self.header()),
        }
    }

    /// Orthography / grammar requirement injected into the prompt rules
    pub fn grammar_requirement(&self) -> &'static str {
        match self {
            Register::Classical => {
                "For Ancient/Classical Chinese, use traditional characters and classical grammar (文言文) with authentic particles such as 之, 乎, 者, 也"
            }
            Register::Modern => "For Modern Chinese, use simplified characters and contemporary vernacular grammar",
            Register::Plain => "For English, write natural, idiomatic English with no special marking",
        }
    }

    /// Placeholder sentences shown in the prompt's format example
    pub(crate) fn example_sentences(&self) -> (&'static str, &'static str) {
        match self {
            Register::Classical => (
                "first sentence in Classical/Ancient Chinese with particles like 之乎者也",
                "second sentence in Classical Chinese",
            ),
            Register::Modern => (
                "first sentence in Modern Chinese",
                "second sentence in Modern Chinese",
            ),
            Register::Plain => ("first sentence in English", "second sentence in English"),
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Register {
    type Err = TranslationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ancient" | "classical" => Ok(Register::Classical),
            "modern" => Ok(Register::Modern),
            "english" | "plain" => Ok(Register::Plain),
            other => Err(TranslationError::validation(format!(
                "Unknown language '{}', expected one of ancient, modern, english",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_through_from_str() {
        for register in Register::ALL {
            assert_eq!(register.code().parse::<Register>().unwrap(), register);
        }
        assert_eq!("ENGLISH".parse::<Register>().unwrap(), Register::Plain);
        assert!("french".parse::<Register>().is_err());
    }

    #[test]
    fn test_header_lines() {
        assert_eq!(Register::Classical.header_line(), "ANCIENT (文言文):");
        assert_eq!(Register::Modern.header_line(), "MODERN:");
        assert_eq!(Register::Plain.header_line(), "ENGLISH:");
    }

    #[test]
    fn test_serde_uses_wire_codes() {
        let json = serde_json::to_string(&Register::Classical).unwrap();
        assert_eq!(json, "\"ancient\"");
        let parsed: Register = serde_json::from_str("\"english\"").unwrap();
        assert_eq!(parsed, Register::Plain);
    }
}
