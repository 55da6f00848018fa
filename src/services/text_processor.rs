// Text Normalization Service
// Offset-preserving tokenizer, sentence splitter, and document fingerprinting

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::models::{AnalysisError, DocumentSummary, NormalizerOptions};

static WORD_RE: OnceLock<Regex> = OnceLock::new();
static WORD_PUNCT_RE: OnceLock<Regex> = OnceLock::new();

/// ASCII words/numbers as units, CJK ideographs as single-character tokens.
fn word_re() -> &'static Regex {
    WORD_RE.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9_]+|[\u{4e00}-\u{9fff}]").expect("word regex")
    })
}

/// Variant that keeps internal apostrophes and hyphens inside one token.
fn word_punct_re() -> &'static Regex {
    WORD_PUNCT_RE.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9_]+(?:['\u{2019}-][A-Za-z0-9_]+)*|[\u{4e00}-\u{9fff}]")
            .expect("word punct regex")
    })
}

/// One normalized token with byte offsets into the raw input text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// Token text after case folding (offsets still index the raw input).
    pub text: String,
    /// UTF-8 byte offset (0-based).
    pub start: usize,
    /// UTF-8 byte offset (0-based, end-exclusive).
    pub end: usize,
}

/// Byte range of one sentence in the raw input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceSpan {
    pub start: usize,
    pub end: usize,
}

/// The normalized view of one input document. All downstream stages
/// consume this; none of them re-reads the raw text on their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    /// Content hash of the raw text, "sha256:<hex>".
    pub fingerprint: String,
    pub text: String,
    pub tokens: Vec<Token>,
    pub sentences: Vec<SentenceSpan>,
}

impl Document {
    /// Build a document with a caller-supplied id.
    pub fn new(
        id: &str,
        text: &str,
        options: &NormalizerOptions,
    ) -> Result<Document, AnalysisError> {
        normalize(id, text, options)
    }

    /// Build a document whose id is its own content fingerprint.
    pub fn from_text(text: &str, options: &NormalizerOptions) -> Document {
        let fingerprint = fingerprint(text);
        Document {
            id: fingerprint.clone(),
            fingerprint,
            text: text.to_string(),
            tokens: tokenize(text, options),
            sentences: split_sentence_spans(text),
        }
    }

    pub fn token_texts(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    /// Tokens fully contained in each sentence span, in sentence order.
    pub fn sentence_token_counts(&self) -> Vec<usize> {
        self.sentences
            .iter()
            .map(|span| {
                self.tokens
                    .iter()
                    .filter(|t| t.start >= span.start && t.end <= span.end)
                    .count()
            })
            .collect()
    }

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id.clone(),
            fingerprint: self.fingerprint.clone(),
            tokens: self.tokens.len(),
            chars: self.text.chars().count(),
        }
    }
}

/// Normalize one raw document. Empty text is valid input and yields a
/// document with no tokens; a blank id is rejected.
pub fn normalize(
    id: &str,
    text: &str,
    options: &NormalizerOptions,
) -> Result<Document, AnalysisError> {
    if id.trim().is_empty() {
        return Err(AnalysisError::InvalidInput(
            "document id must not be blank".to_string(),
        ));
    }

    let mut document = Document::from_text(text, options);
    document.id = id.to_string();
    Ok(document)
}

/// Content hash used for determinism checks and caching keys.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

/// Extract tokens with raw-text byte offsets, applying case folding and
/// stop-word removal. Offsets of surviving tokens are untouched by either.
pub fn tokenize(text: &str, options: &NormalizerOptions) -> Vec<Token> {
    if text.is_empty() {
        return vec![];
    }

    let re = if options.keep_word_punctuation {
        word_punct_re()
    } else {
        word_re()
    };

    let stops: HashSet<String> = options
        .stop_words
        .iter()
        .map(|w| w.to_lowercase())
        .collect();

    let mut tokens = Vec::new();
    for m in re.find_iter(text) {
        let folded = m.as_str().to_lowercase();
        if !stops.is_empty() && stops.contains(&folded) {
            continue;
        }
        let token_text = if options.case_fold {
            folded
        } else {
            m.as_str().to_string()
        };
        tokens.push(Token {
            text: token_text,
            start: m.start(),
            end: m.end(),
        });
    }
    tokens
}

const ASCII_TERMINATORS: [char; 3] = ['.', '!', '?'];
const HARD_TERMINATORS: [char; 4] = ['\u{3002}', '\u{ff01}', '\u{ff1f}', '\u{2026}'];
const CLOSERS: [char; 8] = [
    '"', '\'', '\u{201d}', '\u{2019}', ')', ']', '\u{300d}', '\u{300f}',
];

/// Split raw text into sentence byte ranges.
///
/// ASCII terminators end a sentence only when followed by whitespace or end
/// of input and only outside an open double quote; a period between two
/// digits never terminates. Fullwidth CJK terminators and the ellipsis
/// character always end a sentence. Closing quotes and brackets directly
/// after a terminator are absorbed into the ending sentence.
pub fn split_sentence_spans(text: &str) -> Vec<SentenceSpan> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    let mut last_non_ws_end = 0usize;
    let mut in_quote = false;

    let mut i = 0usize;
    while i < chars.len() {
        let (idx, ch) = chars[i];
        if !ch.is_whitespace() {
            if start.is_none() {
                start = Some(idx);
            }
            last_non_ws_end = idx + ch.len_utf8();
        }

        match ch {
            '"' => in_quote = !in_quote,
            '\u{201c}' => in_quote = true,
            '\u{201d}' => in_quote = false,
            _ => {}
        }

        if let Some(s) = start {
            let hard = HARD_TERMINATORS.contains(&ch);
            let ascii = ASCII_TERMINATORS.contains(&ch);
            if hard || ascii {
                let decimal_point = ch == '.'
                    && i > 0
                    && chars[i - 1].1.is_ascii_digit()
                    && i + 1 < chars.len()
                    && chars[i + 1].1.is_ascii_digit();
                if !decimal_point {
                    let mut j = i + 1;
                    let mut quote_after = in_quote;
                    while j < chars.len() && CLOSERS.contains(&chars[j].1) {
                        match chars[j].1 {
                            '"' => quote_after = !quote_after,
                            '\u{201d}' => quote_after = false,
                            _ => {}
                        }
                        j += 1;
                    }
                    let followed_by_break = j >= chars.len() || chars[j].1.is_whitespace();
                    if hard || (followed_by_break && !quote_after) {
                        let end = if j > i + 1 {
                            chars[j - 1].0 + chars[j - 1].1.len_utf8()
                        } else {
                            idx + ch.len_utf8()
                        };
                        spans.push(SentenceSpan { start: s, end });
                        start = None;
                        in_quote = quote_after;
                        i = j;
                        continue;
                    }
                }
            }
        }
        i += 1;
    }

    // Trailing text without a terminator still counts as a sentence.
    if let Some(s) = start {
        if last_non_ws_end > s {
            spans.push(SentenceSpan {
                start: s,
                end: last_non_ws_end,
            });
        }
    }

    spans
}
