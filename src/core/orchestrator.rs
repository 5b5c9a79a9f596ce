//! Translation orchestrator: compose → invoke → align, plus follow-up queries

use std::sync::Arc;
use tracing::{info, warn};

use crate::core::aligner;
use crate::core::errors::{Result, TranslationError};
use crate::core::generator::Generator;
use crate::core::invoker::{GenerationInvoker, RetryPolicy};
use crate::core::models::{ConversationTurn, ModelHint, TranslationRequest, TranslationResult};
use crate::core::prompt;

/// End-to-end translation service over an injected generator
#[derive(Clone)]
pub struct Translator {
    invoker: GenerationInvoker,
}

impl Translator {
    /// Create a translator
    pub fn new(generator: Arc<dyn Generator>, policy: RetryPolicy) -> Self {
        Self {
            invoker: GenerationInvoker::new(generator, policy),
        }
    }

    /// Translate a validated request into aligned register blocks
    pub async fn translate(&self, request: &TranslationRequest) -> Result<TranslationResult> {
        info!(
            "Translation request: {} chars, {} -> {:?}, model {}",
            request.source_text().chars().count(),
            request.input_register(),
            request.output_registers(),
            request.model_hint()
        );

        let plan = prompt::compose(request);
        let invocation = self.invoker.invoke(&plan, request.model_hint()).await?;
        info!(
            "Final translation result received, length: {} (attempts: {}, {:?})",
            invocation.text.len(),
            invocation.attempts,
            invocation.elapsed
        );

        let result = aligner::align(
            &invocation.text,
            request.input_register(),
            request.output_registers(),
        );

        for register in result.missing_registers() {
            warn!("Translation for {} not found in response", register);
        }
        for register in result.mismatched_registers() {
            warn!(
                "Segment count for {} differs from the original ({} segments)",
                register,
                result.original.segments.len()
            );
        }

        Ok(result)
    }

    /// Answer a question about a highlighted excerpt of a translated document.
    ///
    /// History is caller supplied and rendered into the prompt; nothing is kept.
    pub async fn converse(
        &self,
        original_text: &str,
        highlighted: &str,
        question: &str,
        history: &[ConversationTurn],
        model: ModelHint,
    ) -> Result<String> {
        if original_text.is_empty() || highlighted.is_empty() || question.is_empty() {
            return Err(TranslationError::validation(
                "originalText, highlightedSentence, and userQuestion are required",
            ));
        }

        info!(
            "Query on {} chars excerpt with {} prior turns",
            highlighted.chars().count(),
            history.len()
        );

        let plan = prompt::compose_query(original_text, highlighted, question, history);
        let invocation = self.invoker.invoke(&plan, model).await?;
        Ok(invocation.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mock::{MockGenerator, MockReply};
    use crate::core::models::Role;
    use crate::core::registry::Register;

    const ANALECTS: &str = "ANCIENT:\n<s1>学而时习之</s1>\nMODERN:\n<s1>学习并时常复习它</s1>\nENGLISH:\n<s1>Learn and practice it often</s1>";

    fn translator(generator: Arc<MockGenerator>) -> Translator {
        Translator::new(generator, RetryPolicy::default())
    }

    #[tokio::test]
    async fn test_end_to_end_analects() {
        let generator = Arc::new(MockGenerator::replying(ANALECTS));
        let request = TranslationRequest::try_new(
            "学而时习之",
            Some(Register::Classical),
            [Register::Modern, Register::Plain],
        )
        .unwrap();

        let result = translator(generator.clone()).translate(&request).await.unwrap();

        assert_eq!(result.original.register, Register::Classical);
        assert_eq!(result.original.segments.len(), 1);
        assert_eq!(result.original.segments[0].index, 1);
        for register in [Register::Modern, Register::Plain] {
            let text = result.translation(register).unwrap();
            assert_eq!(text.segments.len(), 1);
            assert_eq!(text.segments[0].index, 1);
        }
        assert_eq!(generator.calls(), 1);

        let prompts = generator.prompts();
        let (sent, options) = &prompts[0];
        assert!(sent.ends_with("Text to translate:\n学而时习之"));
        assert_eq!(options.system_prompt, prompt::system_preamble(Register::Classical));
    }

    #[tokio::test]
    async fn test_partial_alignment_is_not_an_error() {
        let generator = Arc::new(MockGenerator::replying("MODERN:\n<s1>你好</s1><s2>世界</s2>"));
        let request = TranslationRequest::try_new(
            "Hello world",
            Some(Register::Plain),
            [Register::Modern, Register::Classical],
        )
        .unwrap();

        let result = translator(generator).translate(&request).await.unwrap();
        assert!(result.original.is_empty());
        assert_eq!(result.translation(Register::Modern).unwrap().segments.len(), 2);
        assert_eq!(result.missing_registers(), vec![Register::Classical]);
    }

    #[tokio::test]
    async fn test_converse_returns_raw_text() {
        let answer = "**不亦说乎** is a rhetorical question.";
        let generator = Arc::new(MockGenerator::replying(answer));
        let history = vec![
            ConversationTurn::new(Role::User, "What is 说?"),
            ConversationTurn::new(Role::Assistant, "Read as 悦."),
        ];

        let response = translator(generator.clone())
            .converse("学而时习之，不亦说乎？", "不亦说乎", "Why a question?", &history, ModelHint::Fast)
            .await
            .unwrap();

        assert_eq!(response, answer);
        let prompts = generator.prompts();
        let (sent, options) = &prompts[0];
        assert!(sent.contains("User: What is 说?"));
        assert!(sent.contains("Assistant: Read as 悦."));
        assert_eq!(options.model, ModelHint::Fast);
    }

    #[tokio::test]
    async fn test_converse_validation() {
        let generator = Arc::new(MockGenerator::replying("unused"));
        let err = translator(generator.clone())
            .converse("原文", "", "问题", &[], ModelHint::Default)
            .await
            .unwrap_err();

        assert!(matches!(err, TranslationError::ValidationError { .. }));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_translate_surfaces_exhaustion() {
        let generator = Arc::new(MockGenerator::scripted([], MockReply::Empty));
        let request =
            TranslationRequest::try_new("Hi", Some(Register::Plain), [Register::Modern]).unwrap();

        let err = translator(generator.clone()).translate(&request).await.unwrap_err();
        assert!(matches!(err, TranslationError::GenerationFailure { attempts: 3, .. }));
        assert_eq!(generator.calls(), 3);
    }
}
