//! Response alignment: labeled blocks and `<sN>` sentence segments

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::core::models::{RegisterText, SentenceSegment, TranslationResult};
use crate::core::registry::Register;

/// Opening `<sN>` tag
static OPEN_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<s(\d+)>").expect("valid tag pattern"));

/// Start of the next labeled header line: any all-caps label, or a known
/// register label in any case, optionally wrapped in markdown emphasis,
/// e.g. `\nMODERN:`, `\n**ANCIENT (文言文):**`, `\nEnglish:`
static NEXT_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\n[ \t]*[*_#]*[ \t]*(?:[A-Z]{2,}|(?i:ancient|modern|english))(?:[ \t]*\([^)\n]*\))?[ \t]*:",
    )
    .expect("valid header pattern")
});

/// Strict header for one register: upper-case label, optional note, colon,
/// and any emphasis closing it (`**ANCIENT (文言文):**`)
fn strict_header(register: Register) -> Regex {
    let pattern = format!(
        r"{}(?:[ \t]*\([^)\n]*\))?[ \t]*:[ \t]*[*_]*",
        regex::escape(register.header())
    );
    Regex::new(&pattern).expect("valid strict header pattern")
}

/// Loose fallback: label anywhere, any case, optional colon, rest of text
fn loose_header(register: Register) -> Regex {
    let pattern = format!(r"(?is){}:?\s*(.*)", regex::escape(register.header()));
    Regex::new(&pattern).expect("valid loose header pattern")
}

/// Block after the strict header, up to the next labeled header or end of text
pub fn find_block(raw: &str, register: Register) -> Option<String> {
    let header = strict_header(register).find(raw)?;
    let rest = &raw[header.end()..];
    let end = NEXT_HEADER.find(rest).map(|m| m.start()).unwrap_or(rest.len());
    Some(rest[..end].trim().to_string())
}

/// Everything after a loose occurrence of the register label
pub fn find_block_loose(raw: &str, register: Register) -> Option<String> {
    loose_header(register)
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// All `<sN>…</sN>` spans in order of appearance.
///
/// Each opener pairs with the nearest `</sN>` carrying the same number. An
/// opener with no such closer is dropped and scanning resumes right after it,
/// so one stray tag does not hide the spans that follow.
pub fn extract_segments(block: &str) -> Vec<SentenceSegment> {
    let mut segments = Vec::new();
    let mut rest = block;

    while let Some(caps) = OPEN_TAG.captures(rest) {
        let (Some(open), Some(number)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let body = &rest[open.end()..];
        let close = format!("</s{}>", number.as_str());

        match body.find(&close) {
            Some(end) => {
                match number.as_str().parse::<u32>() {
                    Ok(index) if index > 0 => segments.push(SentenceSegment {
                        index,
                        text: body[..end].to_string(),
                    }),
                    _ => debug!("Skipping segment with index {}", number.as_str()),
                }
                rest = &body[end + close.len()..];
            }
            None => {
                debug!("No closing tag for <s{}>", number.as_str());
                rest = body;
            }
        }
    }

    segments
}

fn register_text(register: Register, raw_block: String) -> RegisterText {
    let segments = extract_segments(&raw_block);
    RegisterText {
        register,
        raw_block,
        segments,
    }
}

/// Parse generator output into the original block and one block per output register.
///
/// Never fails: registers with no block get an empty `raw_block`.
pub fn align(raw: &str, input: Register, outputs: &[Register]) -> TranslationResult {
    let original = find_block(raw, input).unwrap_or_else(|| {
        warn!("No {} block found for the original text", input);
        String::new()
    });

    let mut translations = BTreeMap::new();
    for &register in outputs {
        let block = match find_block(raw, register) {
            Some(block) => block,
            None => {
                warn!("Translation for {} not found in response, trying loose match", register);
                find_block_loose(raw, register).unwrap_or_default()
            }
        };
        translations.insert(register, register_text(register, block));
    }

    TranslationResult {
        original: register_text(input, original),
        translations,
    }
}
