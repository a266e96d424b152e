//! Text-generation seam and the prompts sent through it.
//!
//! The model call itself lives behind [`TextGenerator`]; this crate only
//! owns prompt construction and answer parsing.

use std::sync::Arc;

use async_trait::async_trait;
use wtt_search::Topic;

use crate::error::{ResearchError, Result};
use crate::research::planner::NewsClassifier;

/// Opaque prompt-in, text-out generation service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::Llm`] when the service fails.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
impl<G: TextGenerator + ?Sized> TextGenerator for Arc<G> {
    async fn generate(&self, prompt: &str) -> Result<String> {
        (**self).generate(prompt).await
    }
}

/// Prompt asking whether `subject` has had notable news recently.
pub fn classification_prompt(subject: &str) -> String {
    format!(
        "Has the cryptocurrency token {subject} had notable news coverage in the past week \
         (launches, listings, exploits, regulatory action, major partnerships)?\n\
         Answer with a single word: yes or no."
    )
}

/// Prompt asking for a structured summary of the research text.
pub fn summary_prompt(subject: &str, research_text: &str) -> String {
    format!(
        "Analyze the following web search results for the token {subject}:\n\
         {research_text}\n\n\
         Extract and summarize key information about:\n\
         1. Token's primary purpose\n\
         2. Technology or blockchain it's built on\n\
         3. Current market status\n\
         4. Potential verification flags\n\n\
         Provide a concise, structured summary."
    )
}

/// Parse a yes/no answer. Only the first word counts.
pub fn parse_yes_no(answer: &str) -> Option<bool> {
    let first = answer
        .split_whitespace()
        .next()?
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_ascii_lowercase();
    match first.as_str() {
        "yes" | "true" | "y" => Some(true),
        "no" | "false" | "n" => Some(false),
        _ => None,
    }
}

/// [`NewsClassifier`] that asks a language model.
pub struct LlmNewsClassifier<G> {
    generator: G,
}

impl<G: TextGenerator> LlmNewsClassifier<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl<G: TextGenerator> NewsClassifier for LlmNewsClassifier<G> {
    async fn classify(&self, subject: &str) -> Result<Topic> {
        let answer = self
            .generator
            .generate(&classification_prompt(subject))
            .await?;
        match parse_yes_no(&answer) {
            Some(true) => Ok(Topic::News),
            Some(false) => Ok(Topic::General),
            None => Err(ResearchError::Llm(format!(
                "unrecognised classification answer: {}",
                answer.chars().take(80).collect::<String>()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(&'static str);

    #[async_trait]
    impl TextGenerator for Canned {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_owned())
        }
    }

    struct Offline;

    #[async_trait]
    impl TextGenerator for Offline {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Err(ResearchError::Llm("offline".into()))
        }
    }

    #[test]
    fn parses_yes_no_variants() {
        assert_eq!(parse_yes_no("Yes."), Some(true));
        assert_eq!(parse_yes_no("  no, nothing recent"), Some(false));
        assert_eq!(parse_yes_no("**YES**"), Some(true));
        assert_eq!(parse_yes_no("maybe"), None);
        assert_eq!(parse_yes_no(""), None);
    }

    #[test]
    fn summary_prompt_has_four_points() {
        let prompt = summary_prompt("ExampleCoin", "Source 1: A https://a.example.");
        assert!(prompt.contains("token ExampleCoin"));
        assert!(prompt.contains("Source 1: A https://a.example."));
        for point in ["1. Token's primary purpose", "2. Technology", "3. Current market", "4. Potential verification"] {
            assert!(prompt.contains(point), "missing {point}");
        }
    }

    #[tokio::test]
    async fn classifier_maps_answers() {
        let yes = LlmNewsClassifier::new(Canned("Yes"));
        assert_eq!(yes.classify("ExampleCoin").await.expect("answer"), Topic::News);
        let no = LlmNewsClassifier::new(Canned("No"));
        assert_eq!(no.classify("ExampleCoin").await.expect("answer"), Topic::General);
    }

    #[tokio::test]
    async fn unparseable_answer_is_error() {
        let classifier = LlmNewsClassifier::new(Canned("It depends on the market"));
        assert!(classifier.classify("ExampleCoin").await.is_err());
    }

    #[tokio::test]
    async fn generator_failure_propagates() {
        let classifier = LlmNewsClassifier::new(Arc::new(Offline));
        let err = classifier.classify("ExampleCoin").await.expect_err("offline");
        assert!(matches!(err, ResearchError::Llm(_)));
    }
}
