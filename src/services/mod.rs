// Core Services

pub mod detection;
pub mod text_processor;

pub use text_processor::{normalize, Document, SentenceSpan, Token};

pub use detection::{
    analyze, analyze_documents, analyze_with_cancel, compare, extract_highlights, score_ai,
    CancelFlag,
};
