pub mod grammar;
pub mod record;
pub mod tokenizer;

pub use grammar::{Slot, TokenKind, ALB_GRAMMAR, FIELD_COUNT, FIELD_NAMES};
pub use record::ParsedLogRecord;

use crate::storage::RawLogBlob;
use thiserror::Error;
use tokenizer::{Token, Tokenizer};
use tracing::{debug, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("line is empty")]
    Empty,

    #[error("line ended before {field} (position {position})")]
    MissingToken { position: usize, field: &'static str },

    #[error("expected {expected:?} token for {field} (position {position})")]
    KindMismatch {
        position: usize,
        field: &'static str,
        expected: TokenKind,
    },

    #[error("unterminated quoted token starting at byte {offset}")]
    UnterminatedQuote { offset: usize },

    #[error("quoted token is not followed by whitespace at byte {offset}")]
    MissingSeparator { offset: usize },
}

/// Outcome of parsing one blob.
#[derive(Debug, Default)]
pub struct BlobParse {
    pub records: Vec<ParsedLogRecord>,
    /// Lines that did not match the grammar and were dropped.
    pub skipped: usize,
}

/// Parses access log lines by walking a positional grammar.
#[derive(Debug, Clone, Copy)]
pub struct LogLineParser {
    grammar: &'static [Slot],
}

impl Default for LogLineParser {
    fn default() -> Self {
        Self::new(ALB_GRAMMAR)
    }
}

impl LogLineParser {
    pub fn new(grammar: &'static [Slot]) -> Self {
        Self { grammar }
    }

    pub fn parse_line(&self, line: &str) -> Result<ParsedLogRecord, ParseError> {
        let mut tokens = Tokenizer::new(line).peekable();
        if tokens.peek().is_none() {
            return Err(ParseError::Empty);
        }

        let mut fields = Vec::with_capacity(self.grammar.len());
        for (position, slot) in self.grammar.iter().enumerate() {
            let label = slot.name.unwrap_or("unnamed column");
            let token = tokens.next().ok_or(ParseError::MissingToken {
                position,
                field: label,
            })??;

            let value = match (slot.kind, token) {
                (TokenKind::Bare, Token::Bare(value)) => value,
                (TokenKind::Quoted, Token::Quoted(value)) => value,
                (expected, _) => {
                    return Err(ParseError::KindMismatch {
                        position,
                        field: label,
                        expected,
                    })
                }
            };

            if let Some(name) = slot.name {
                fields.push((name, value.to_string()));
            }
        }

        Ok(ParsedLogRecord::from_fields(fields))
    }

    /// Parses every complete line of a blob, skipping lines that fail.
    ///
    /// The text after the final newline is never parsed: it is either empty
    /// or a truncated line.
    pub fn parse_text(&self, text: &str) -> BlobParse {
        let mut lines: Vec<&str> = text.split('\n').collect();
        lines.pop();

        let mut result = BlobParse {
            records: Vec::with_capacity(lines.len()),
            skipped: 0,
        };

        for (index, line) in lines.into_iter().enumerate() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            match self.parse_line(line) {
                Ok(record) => result.records.push(record),
                Err(e) => {
                    warn!(line = index + 1, error = %e, "Skipping unparseable log line");
                    result.skipped += 1;
                }
            }
        }

        debug!(
            records = result.records.len(),
            skipped = result.skipped,
            "Parsed log blob"
        );

        result
    }

    pub fn parse_blob(&self, blob: &RawLogBlob) -> BlobParse {
        self.parse_text(blob.text())
    }
}
