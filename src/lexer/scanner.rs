use super::buffer::CharBuffer;
use super::token::{Token, TokenKind};

const KEYWORDS: [&str; 10] = [
    "let", "break", "continue", "return", "for", "if", "else", "fn", "lambda", "say",
];

/// Lazy tokenizer over a character buffer. Tokens are produced on demand
/// with a single token of lookahead.
pub struct Lexer {
    buffer: CharBuffer,
    lookahead: Option<Token>,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            buffer: CharBuffer::new(source),
            lookahead: None,
            line: 1,
            column: 1,
        }
    }

    pub fn peek(&mut self) -> Result<&Token, String> {
        if self.lookahead.is_none() {
            let token = self.read_token()?;
            self.lookahead = Some(token);
        }
        Ok(self.lookahead.as_ref().expect("lookahead filled above"))
    }

    pub fn next(&mut self) -> Result<Token, String> {
        match self.lookahead.take() {
            Some(token) => Ok(token),
            None => self.read_token(),
        }
    }

    /// Consume the next token iff its literal equals `expected`. String and
    /// illegal tokens never match, so string contents cannot pose as
    /// punctuation or keywords.
    pub fn next_if(&mut self, expected: &str) -> Result<bool, String> {
        let token = self.peek()?;
        if token.literal == expected
            && token.kind != TokenKind::Str
            && token.kind != TokenKind::Illegal
        {
            self.next()?;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn eof(&mut self) -> Result<bool, String> {
        Ok(self.peek()?.kind == TokenKind::Eof)
    }

    fn token(&self, kind: TokenKind, literal: String) -> Token {
        Token::new(kind, literal, self.line, self.column)
    }

    fn read_while(&mut self, predicate: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.buffer.peek() {
            if !predicate(c) {
                break;
            }
            out.push(c);
            self.buffer.next();
        }
        out
    }

    fn read_token(&mut self) -> Result<Token, String> {
        loop {
            self.read_while(char::is_whitespace);
            let (line, column) = self.buffer.pos();
            self.line = line;
            self.column = column;

            let c = match self.buffer.next() {
                Some(c) => c,
                None => return Ok(self.token(TokenKind::Eof, String::new())),
            };

            match c {
                '#' => {
                    self.read_while(|c| c != '\n');
                    continue;
                }
                '(' | ')' | '{' | '}' | '[' | ']' | ';' | ',' | ':' => {
                    return Ok(self.token(TokenKind::Punct, c.to_string()));
                }
                '+' | '-' | '*' | '/' | '%' | '=' | '!' | '>' | '<' | '&' | '|' => {
                    let literal = if self.buffer.next_if('=') {
                        format!("{c}=")
                    } else {
                        c.to_string()
                    };
                    return Ok(self.token(TokenKind::Op, literal));
                }
                '"' | '\'' => return self.read_string(c),
                _ => {
                    if c.is_alphabetic() || c == '_' || c == '$' {
                        return Ok(self.read_word(c));
                    }
                    if c.is_ascii_digit() {
                        return Ok(self.read_number(c));
                    }
                    let rest = self.read_while(|c| !c.is_whitespace());
                    return Ok(self.token(TokenKind::Illegal, format!("{c}{rest}")));
                }
            }
        }
    }

    /// Reads up to the matching quote. No escape processing: the body is
    /// taken verbatim.
    fn read_string(&mut self, quote: char) -> Result<Token, String> {
        let body = self.read_while(|c| c != quote);
        if !self.buffer.next_if(quote) {
            return Err(format!(
                "unterminated string literal: at line {}, column {}",
                self.line, self.column
            ));
        }
        Ok(self.token(TokenKind::Str, body))
    }

    fn read_number(&mut self, first: char) -> Token {
        let mut number = String::from(first);
        number.push_str(&self.read_while(|c| c.is_ascii_digit()));
        if self.buffer.next_if('.') {
            number.push('.');
            number.push_str(&self.read_while(|c| c.is_ascii_digit()));
            return self.token(TokenKind::Float, number);
        }
        self.token(TokenKind::Int, number)
    }

    fn read_word(&mut self, first: char) -> Token {
        let mut word = String::from(first);
        word.push_str(&self.read_while(|c| c.is_alphanumeric() || c == '_' || c == '$'));
        let kind = match word.as_str() {
            "true" | "false" => TokenKind::Bool,
            "null" => TokenKind::Null,
            w if KEYWORDS.contains(&w) => TokenKind::Keyword,
            _ => TokenKind::Identifier,
        };
        self.token(kind, word)
    }
}
