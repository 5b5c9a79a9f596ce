//! Prompt composition for translation and follow-up queries

use std::fmt::Write;

use crate::core::models::{ConversationTurn, PromptPlan, TranslationRequest};
use crate::core::registry::Register;

const QUERY_PREAMBLE: &str = "You are an expert in linguistics, Classical Chinese literature, and translation. \
Provide insightful explanations that help users understand the text deeply across languages and cultures.";

/// Build the instruction and system preamble for a translation request.
///
/// Output is a pure function of the request; the source text is appended
/// last and byte-for-byte unchanged.
pub fn compose(request: &TranslationRequest) -> PromptPlan {
    let input = request.input_register();
    let outputs = request.output_registers();

    let mut prompt = format!(
        "You are an expert translator. Translate the following {} text.\n\nIMPORTANT RULES:\n",
        input.label()
    );

    for (number, rule) in rules(input, outputs).iter().enumerate() {
        // Infallible for String
        let _ = writeln!(prompt, "{}. {}", number + 1, rule);
    }

    prompt.push_str("\nYour output must be EXACTLY in this format:\n\n");
    prompt.push_str(&input.header_line());
    let _ = write!(
        prompt,
        "\n<s1>first sentence in original {}</s1><s2>second sentence</s2>...\n",
        input.label()
    );

    for register in outputs {
        let (first, second) = register.example_sentences();
        let _ = write!(
            prompt,
            "\n{}\n<s1>{}</s1><s2>{}</s2>...",
            register.header_line(),
            first,
            second
        );
    }

    prompt.push_str("\n\nText to translate:\n");
    prompt.push_str(request.source_text());

    PromptPlan {
        instruction_text: prompt,
        system_preamble: system_preamble(input).to_string(),
    }
}

/// Numbered formatting rules: four fixed rules plus one orthography rule
/// per distinct register involved (five to seven in total).
fn rules(input: Register, outputs: &[Register]) -> Vec<String> {
    let mut rules = vec![
        "Split the text into logical sentences or phrases (use punctuation as guide)".to_string(),
        "Mark each sentence with XML tags numbered sequentially from 1: <s1>, <s2>, <s3>, etc.".to_string(),
        "Maintain the SAME sentence numbers across all versions".to_string(),
        "Translate with full context awareness - consider the whole text's meaning".to_string(),
    ];

    let mut involved = vec![input];
    for register in outputs {
        if !involved.contains(register) {
            involved.push(*register);
        }
    }
    involved.sort();
    rules.extend(involved.iter().map(|r| r.grammar_requirement().to_string()));

    rules
}

/// System preamble keyed on the input register
pub fn system_preamble(input: Register) -> &'static str {
    match input {
        Register::Classical => {
            "You are an expert in Classical Chinese (文言文) literature and translation. \
Provide accurate translations that preserve cultural and historical context. \
When translating TO Ancient Chinese, use authentic classical grammar with particles like 之, 乎, 者, 也, 矣, 焉, 哉, 而, 於, 為, etc."
        }
        Register::Modern => {
            "You are an expert translator specializing in Modern Chinese. \
Provide natural, fluent translations. \
When translating TO Ancient Chinese (文言文), use authentic classical grammar and vocabulary with particles like 之, 乎, 者, 也, 矣, 焉."
        }
        Register::Plain => {
            "You are an expert translator from English. \
Provide accurate, culturally appropriate translations. \
When translating TO Ancient Chinese (文言文), use authentic classical grammar with particles like 之, 乎, 者, 也, etc."
        }
    }
}

/// Build the follow-up query prompt around a highlighted excerpt.
///
/// History is rendered as alternating `User:` / `Assistant:` paragraphs.
pub fn compose_query(
    original_text: &str,
    highlighted: &str,
    question: &str,
    history: &[ConversationTurn],
) -> PromptPlan {
    let mut conversation = String::new();
    if !history.is_empty() {
        conversation.push_str("\n\nPrevious conversation:\n");
        for turn in history {
            let _ = write!(conversation, "{}: {}\n\n", turn.role.label(), turn.content);
        }
        conversation.push_str("Current question:\n");
    }

    let instruction_text = format!(
        "\n<original_text>\n{}\n</original_text>\n\n\
Focus on this sentence/text: <highlighted_sentence>{}</highlighted_sentence>\n{}\n\
Answer this question: <user_question>{}</user_question>\n\n\
Please provide a detailed answer about the highlighted text in the context of the full document. \
Consider linguistic, cultural, and historical aspects as relevant. \
Use markdown formatting for better readability.",
        original_text, highlighted, conversation, question
    );

    PromptPlan {
        instruction_text,
        system_preamble: QUERY_PREAMBLE.to_string(),
    }
}
