//! Token estimation and sentence-boundary truncation.
//!
//! Token counts are an explicit approximation and do not follow any
//! particular model's tokenizer:
//!
//! - a sentence ends at `.`, `!` or `?` followed by whitespace, or at the
//!   end of the text;
//! - a token is a run of alphanumeric/apostrophe characters, or any single
//!   other non-whitespace character;
//! - every non-empty sentence costs one extra token.
//!
//! [`truncate`] never splits a sentence. The result of truncating always
//! measures within the budget, and truncating twice equals truncating once.

use serde::{Deserialize, Serialize};
use wtt_search::ErrorKind;

/// What happened when text was fitted into a budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetOutcome {
    /// The text already fit and was returned unchanged.
    #[default]
    WithinBudget,
    /// Trailing sentences were dropped.
    Truncated,
    /// Even the first sentence exceeded the budget; nothing was kept.
    Exhausted,
}

/// Text fitted into a budget together with how it was fitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fitted {
    pub text: String,
    pub outcome: BudgetOutcome,
}

/// Estimated token cost of `text`.
///
/// ```
/// use wtt::research::budget::count_tokens;
///
/// assert_eq!(count_tokens(""), 0);
/// // "Hello", ",", "world", "." plus one per sentence.
/// assert_eq!(count_tokens("Hello, world."), 5);
/// ```
pub fn count_tokens(text: &str) -> usize {
    split_sentences(text)
        .into_iter()
        .map(sentence_tokens)
        .sum()
}

/// Truncate `text` to at most `max_tokens`, keeping whole sentences.
///
/// Returns `text` unchanged when it already fits; otherwise the longest
/// prefix of sentences that fits, joined by single spaces. Returns an empty
/// string when the first sentence alone is over budget.
pub fn truncate(text: &str, max_tokens: usize) -> String {
    fit(text, max_tokens).text
}

/// Like [`truncate`], also reporting the [`BudgetOutcome`].
pub fn fit(text: &str, max_tokens: usize) -> Fitted {
    let sentences = split_sentences(text);
    let total: usize = sentences.iter().map(|s| sentence_tokens(s)).sum();
    if total <= max_tokens {
        return Fitted {
            text: text.to_owned(),
            outcome: BudgetOutcome::WithinBudget,
        };
    }

    let mut used = 0;
    let mut kept: Vec<&str> = Vec::new();
    for sentence in sentences {
        let cost = sentence_tokens(sentence);
        if used + cost > max_tokens {
            break;
        }
        used += cost;
        kept.push(sentence);
    }

    if kept.is_empty() {
        tracing::debug!(
            code = ErrorKind::BudgetExceededIrrecoverable.code(),
            max_tokens,
            total,
            "first sentence exceeds budget"
        );
        return Fitted {
            text: String::new(),
            outcome: BudgetOutcome::Exhausted,
        };
    }

    Fitted {
        text: kept.join(" "),
        outcome: BudgetOutcome::Truncated,
    }
}

/// Split into trimmed, non-empty sentences.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if !matches!(ch, '.' | '!' | '?') {
            continue;
        }
        let ends = match chars.peek() {
            Some((_, next)) => next.is_whitespace(),
            None => true,
        };
        if ends {
            let end = idx + ch.len_utf8();
            push_trimmed(&mut sentences, &text[start..end]);
            start = end;
        }
    }
    push_trimmed(&mut sentences, &text[start..]);
    sentences
}

fn push_trimmed<'a>(out: &mut Vec<&'a str>, span: &'a str) {
    let trimmed = span.trim();
    if !trimmed.is_empty() {
        out.push(trimmed);
    }
}

/// Word-level tokens of one sentence plus the per-sentence overhead.
fn sentence_tokens(sentence: &str) -> usize {
    let mut count = 0;
    let mut in_word = false;
    for ch in sentence.chars() {
        if ch.is_alphanumeric() || ch == '\'' {
            if !in_word {
                count += 1;
                in_word = true;
            }
        } else {
            in_word = false;
            if !ch.is_whitespace() {
                count += 1;
            }
        }
    }
    count + 1
}
