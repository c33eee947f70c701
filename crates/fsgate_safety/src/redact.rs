//! Redaction of directive content from descriptions.
//!
//! Whole marker blocks (`<IMPORTANT>...</IMPORTANT>`, `[SYSTEM ...]`) are
//! dropped first, then every remaining sentence that still scans dirty. What
//! is left is documentation only.

use crate::scanner::DescriptionScanner;

/// Shown in place of a description when nothing survives redaction.
pub const WITHHELD_DESCRIPTION: &str = "Description withheld by the description safety filter.";

/// Outcome of redacting one description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redaction {
    /// Cleaned description text.
    pub text: String,
    /// Fragments that were removed, in order of removal.
    pub removed: Vec<String>,
}

impl Redaction {
    pub fn was_modified(&self) -> bool {
        !self.removed.is_empty()
    }
}

impl DescriptionScanner {
    /// Strip directive content from `text`.
    ///
    /// The returned text always rescans clean: a kept sentence that would
    /// form a directive together with the sentences before it is dropped too.
    pub fn redact(&self, text: &str) -> Redaction {
        let mut removed = Vec::new();
        let mut remaining = text.to_string();
        for re in &self.block_patterns {
            for mat in re.find_iter(&remaining) {
                removed.push(mat.as_str().trim().to_string());
            }
            remaining = re.replace_all(&remaining, " ").into_owned();
        }

        let mut kept = String::new();
        for sentence in split_sentences(&remaining) {
            let normalized = sentence.split_whitespace().collect::<Vec<_>>().join(" ");
            let candidate = if kept.is_empty() {
                normalized
            } else {
                format!("{kept} {normalized}")
            };
            if self.scan(&candidate).is_clean() {
                kept = candidate;
            } else {
                removed.push(sentence.to_string());
            }
        }

        if !removed.is_empty() {
            tracing::debug!(
                removed = removed.len(),
                "redacted directive content from description"
            );
        }

        let text = if kept.is_empty() && !removed.is_empty() {
            WITHHELD_DESCRIPTION.to_string()
        } else {
            kept
        };

        Redaction { text, removed }
    }
}

/// Split text into trimmed, non-empty sentences.
///
/// A sentence ends at a newline, or at `.`/`!`/`?` followed by whitespace or
/// the end of input, so file extensions and version numbers stay intact.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        let end = match ch {
            '\n' => Some(idx),
            '.' | '!' | '?' => match chars.peek() {
                None => Some(idx + ch.len_utf8()),
                Some((_, next)) if next.is_whitespace() => Some(idx + ch.len_utf8()),
                Some(_) => None,
            },
            _ => None,
        };
        if let Some(end) = end {
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}
