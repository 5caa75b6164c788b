use super::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Bare(&'a str),
    /// Raw text between the quotes, escapes left in place.
    Quoted(&'a str),
}

/// Splits a line into bare and quoted tokens separated by whitespace.
pub struct Tokenizer<'a> {
    line: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(line: &'a str) -> Self {
        Self { line, pos: 0 }
    }

    fn skip_whitespace(&mut self) {
        let bytes = self.line.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn quoted(&mut self) -> Result<Token<'a>, ParseError> {
        let bytes = self.line.as_bytes();
        let start = self.pos;
        let mut i = start + 1;

        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b'"' => {
                    let value = &self.line[start + 1..i];
                    self.pos = i + 1;
                    if self.pos < bytes.len() && !bytes[self.pos].is_ascii_whitespace() {
                        return Err(ParseError::MissingSeparator { offset: self.pos });
                    }
                    return Ok(Token::Quoted(value));
                }
                _ => i += 1,
            }
        }

        self.pos = bytes.len();
        Err(ParseError::UnterminatedQuote { offset: start })
    }

    fn bare(&mut self) -> Token<'a> {
        let bytes = self.line.as_bytes();
        let start = self.pos;
        while self.pos < bytes.len() && !bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        Token::Bare(&self.line[start..self.pos])
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<Token<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace();
        if self.pos >= self.line.len() {
            return None;
        }

        if self.line.as_bytes()[self.pos] == b'"' {
            Some(self.quoted())
        } else {
            Some(Ok(self.bare()))
        }
    }
}
