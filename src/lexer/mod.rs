//! SQL lexer (§4.1).
//!
//! Tokenizes raw text into a finite token stream ending in a single `Eof`
//! token. The lexer never fails: unrecognized bytes are skipped rather than
//! raised as errors, matching the spec's leniency at this layer. Syntax
//! errors are the parser's concern.

mod token;

pub use token::{Keyword, Token, TokenKind};

/// Tokenizes `input` into a finite stream ending in `Eof`.
pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    peeked: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            peeked: Vec::new(),
        }
    }

    /// Peek at the next token without consuming it.
    pub fn peek(&mut self) -> &Token {
        if self.peeked.is_empty() {
            let token = self.scan_token();
            self.peeked.push(token);
        }
        &self.peeked[0]
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Token {
        if !self.peeked.is_empty() {
            return self.peeked.remove(0);
        }
        self.scan_token()
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while let Some(c) = self.peek_char() {
                if c.is_whitespace() {
                    self.advance_char();
                } else {
                    break;
                }
            }
            if self.peek_char() == Some('-') && self.peek_char_at(1) == Some('-') {
                while let Some(c) = self.peek_char() {
                    self.advance_char();
                    if c == '\n' {
                        break;
                    }
                }
                continue;
            }
            break;
        }
    }

    fn scan_token(&mut self) -> Token {
        loop {
            self.skip_whitespace_and_comments();

            if self.is_at_end() {
                return Token::new(TokenKind::Eof, self.pos);
            }

            let start = self.pos;
            let c = self.peek_char().unwrap();

            let kind = match c {
                '(' => {
                    self.advance_char();
                    TokenKind::LeftParen
                }
                ')' => {
                    self.advance_char();
                    TokenKind::RightParen
                }
                ',' => {
                    self.advance_char();
                    TokenKind::Comma
                }
                ';' => {
                    self.advance_char();
                    TokenKind::Semicolon
                }
                '*' => {
                    self.advance_char();
                    TokenKind::Star
                }
                '.' if self.peek_char_at(1).is_some_and(|n| n.is_ascii_digit()) => {
                    self.scan_number()
                }
                '.' => {
                    self.advance_char();
                    TokenKind::Dot
                }
                '=' => {
                    self.advance_char();
                    TokenKind::Eq
                }
                '!' if self.peek_char_at(1) == Some('=') => {
                    self.advance_char();
                    self.advance_char();
                    TokenKind::NotEq
                }
                '<' => {
                    self.advance_char();
                    if self.peek_char() == Some('=') {
                        self.advance_char();
                        TokenKind::LtEq
                    } else {
                        TokenKind::Lt
                    }
                }
                '>' => {
                    self.advance_char();
                    if self.peek_char() == Some('=') {
                        self.advance_char();
                        TokenKind::GtEq
                    } else {
                        TokenKind::Gt
                    }
                }
                '\'' | '"' => self.scan_string(c),
                '0'..='9' => self.scan_number(),
                c if c.is_ascii_alphabetic() => self.scan_identifier_or_keyword(),
                _ => {
                    // Unknown bytes are skipped; the lexer never fails (§4.1).
                    self.advance_char();
                    continue;
                }
            };

            return Token::new(kind, start);
        }
    }

    fn scan_string(&mut self, delim: char) -> TokenKind {
        self.advance_char(); // opening delimiter
        let mut value = String::new();
        loop {
            match self.peek_char() {
                None => break,
                Some(c) if c == delim => {
                    self.advance_char();
                    break;
                }
                Some('\\') if self.peek_char_at(1) == Some(delim) => {
                    self.advance_char();
                    self.advance_char();
                    value.push(delim);
                }
                Some(c) => {
                    self.advance_char();
                    value.push(c);
                }
            }
        }
        TokenKind::String(value)
    }

    fn scan_number(&mut self) -> TokenKind {
        let start = self.pos;
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance_char();
        }
        let mut is_float = false;
        if self.peek_char() == Some('.')
            && self.peek_char_at(1).is_some_and(|c| c.is_ascii_digit())
        {
            is_float = true;
            self.advance_char();
            while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.advance_char();
            }
        }
        let text = &self.input[start..self.pos];
        if is_float {
            TokenKind::Float(text.parse().unwrap_or(0.0))
        } else {
            TokenKind::Integer(text.parse().unwrap_or(0))
        }
    }

    fn scan_identifier_or_keyword(&mut self) -> TokenKind {
        let start = self.pos;
        while self
            .peek_char()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance_char();
        }
        let text = &self.input[start..self.pos];
        let upper = text.to_ascii_uppercase();
        match Keyword::lookup(&upper) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Identifier(text.to_string()),
        }
    }
}

/// Tokenize the full input, for tests and callers that want the whole
/// stream at once.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let is_eof = token.is_eof();
        tokens.push(token);
        if is_eof {
            break;
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_keywords_case_insensitively() {
        let tokens = tokenize("select * from t");
        assert!(tokens[0].is_keyword(Keyword::Select));
        assert!(matches!(tokens[1].kind, TokenKind::Star));
        assert!(tokens[2].is_keyword(Keyword::From));
        assert!(matches!(&tokens[3].kind, TokenKind::Identifier(s) if s == "t"));
    }

    #[test]
    fn identifiers_preserve_original_case() {
        let tokens = tokenize("MyTable");
        assert!(matches!(&tokens[0].kind, TokenKind::Identifier(s) if s == "MyTable"));
    }

    #[test]
    fn line_comment_runs_to_newline() {
        let tokens = tokenize("SELECT 1 -- trailing\n, 2");
        assert!(matches!(tokens[1].kind, TokenKind::Integer(1)));
        assert!(matches!(tokens[2].kind, TokenKind::Comma));
        assert!(matches!(tokens[3].kind, TokenKind::Integer(2)));
    }

    #[test]
    fn string_literal_supports_escaped_delimiter() {
        let tokens = tokenize(r#"'it\'s'"#);
        assert!(matches!(&tokens[0].kind, TokenKind::String(s) if s == "it's"));
    }

    #[test]
    fn number_parses_integer_and_float() {
        let tokens = tokenize("42 3.5 .9");
        assert!(matches!(tokens[0].kind, TokenKind::Integer(42)));
        assert!(matches!(tokens[1].kind, TokenKind::Float(f) if f == 3.5));
        assert!(matches!(tokens[2].kind, TokenKind::Float(f) if f == 0.9));
    }

    #[test]
    fn unknown_byte_is_skipped_not_fatal() {
        let tokens = tokenize("SELECT $ * FROM t");
        assert!(tokens.iter().any(|t| matches!(t.kind, TokenKind::Star)));
        assert!(tokens.last().unwrap().is_eof());
    }

    #[test]
    fn stream_ends_in_single_eof() {
        let tokens = tokenize("");
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is_eof());
    }
}
