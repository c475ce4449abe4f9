use std::{iter::Peekable, str::CharIndices};

use crate::token::{Span, Token, TokenKind};

pub mod error;

pub use error::{LexError, LexResult};

pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    eof_reached: bool,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            eof_reached: false,
            line: 1,
            column: 0,
        }
    }

    pub fn next_token(&mut self) -> LexResult<Token<'a>> {
        self.skip_trivia()?;

        let Some(&(start_idx, ch)) = self.chars.peek() else {
            self.eof_reached = true;
            let index = self.input.len();
            return Ok(Token::new(
                TokenKind::EOF,
                "",
                Span::new(index, index, self.line, self.column),
            ));
        };

        let start_line = self.line;
        let start_column = self.column;
        let kind = match ch {
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            ',' => self.single(TokenKind::Comma),
            '.' => self.single(TokenKind::Dot),
            '-' => self.single(TokenKind::Minus),
            '+' => self.single(TokenKind::Plus),
            ';' => self.single(TokenKind::Semicolon),
            '*' => self.single(TokenKind::Star),
            '/' => self.single(TokenKind::Slash),
            '!' => self.with_equal(TokenKind::Bang, TokenKind::BangEqual),
            '=' => self.with_equal(TokenKind::Equal, TokenKind::EqualEqual),
            '<' => self.with_equal(TokenKind::Less, TokenKind::LessEqual),
            '>' => self.with_equal(TokenKind::Greater, TokenKind::GreaterEqual),
            '"' => self.read_string(start_idx, start_line)?,
            c if c.is_ascii_digit() => self.read_number(start_idx, start_line)?,
            c if c.is_alphabetic() || c == '_' => self.read_identifier(start_idx),
            _ => {
                self.advance_char();
                return Err(LexError::UnexpectedCharacter {
                    character: ch,
                    line: start_line,
                });
            }
        };

        let end_idx = self.current_index();
        Ok(Token::new(
            kind,
            &self.input[start_idx..end_idx],
            Span::new(start_idx, end_idx, start_line, start_column),
        ))
    }

    fn single(&mut self, kind: TokenKind<'a>) -> TokenKind<'a> {
        self.advance_char();
        kind
    }

    fn with_equal(&mut self, plain: TokenKind<'a>, with_equal: TokenKind<'a>) -> TokenKind<'a> {
        self.advance_char();
        if self.advance_if('=') {
            with_equal
        } else {
            plain
        }
    }

    /// Skips whitespace, `//` line comments and `/* */` block comments.
    fn skip_trivia(&mut self) -> LexResult<()> {
        while let Some(&(_, c)) = self.chars.peek() {
            match c {
                ' ' | '\r' | '\t' | '\n' => {
                    self.advance_char();
                }
                '/' => match self.peek_second() {
                    Some('/') => {
                        while let Some(&(_, c)) = self.chars.peek() {
                            if c == '\n' {
                                break;
                            }
                            self.advance_char();
                        }
                    }
                    Some('*') => self.skip_block_comment()?,
                    _ => return Ok(()),
                },
                _ => return Ok(()),
            }
        }
        Ok(())
    }

    fn skip_block_comment(&mut self) -> LexResult<()> {
        let line = self.line;
        self.advance_char();
        self.advance_char();
        while let Some((_, c)) = self.advance_char() {
            if c == '*' && self.advance_if('/') {
                return Ok(());
            }
        }
        Err(LexError::UnterminatedComment { line })
    }

    fn read_identifier(&mut self, start: usize) -> TokenKind<'a> {
        self.advance_char();
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.advance_char();
            } else {
                break;
            }
        }

        let ident = &self.input[start..self.current_index()];
        TokenKind::keyword(ident).unwrap_or(TokenKind::Identifier(ident))
    }

    fn read_number(&mut self, start: usize, line: usize) -> LexResult<TokenKind<'a>> {
        self.consume_digits();

        // A trailing '.' without digits is left for the parser (method call syntax).
        if self.chars.peek().is_some_and(|&(_, c)| c == '.')
            && self.peek_second().is_some_and(|c| c.is_ascii_digit())
        {
            self.advance_char();
            self.consume_digits();
        }

        let literal = &self.input[start..self.current_index()];
        let value = literal
            .parse::<f64>()
            .map_err(|_| LexError::InvalidNumberLiteral {
                literal: literal.to_string(),
                line,
            })?;
        Ok(TokenKind::Number(value))
    }

    fn consume_digits(&mut self) {
        while self.chars.peek().is_some_and(|&(_, c)| c.is_ascii_digit()) {
            self.advance_char();
        }
    }

    fn read_string(&mut self, start: usize, line: usize) -> LexResult<TokenKind<'a>> {
        self.advance_char(); // Consume opening quote
        let content_start = start + 1;
        while let Some(&(idx, c)) = self.chars.peek() {
            self.advance_char();
            if c == '"' {
                return Ok(TokenKind::String(&self.input[content_start..idx]));
            }
        }
        Err(LexError::UnterminatedString { line })
    }

    fn advance_char(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if let Some((_, c)) = next {
            if c == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }
        }
        next
    }

    fn advance_if(&mut self, expected: char) -> bool {
        if self.chars.peek().is_some_and(|&(_, c)| c == expected) {
            self.advance_char();
            true
        } else {
            false
        }
    }

    fn peek_second(&self) -> Option<char> {
        let mut lookahead = self.chars.clone();
        lookahead.next();
        lookahead.next().map(|(_, c)| c)
    }

    fn current_index(&mut self) -> usize {
        self.chars
            .peek()
            .map(|(idx, _)| *idx)
            .unwrap_or(self.input.len())
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = LexResult<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.eof_reached {
            return None;
        }
        Some(self.next_token())
    }
}

pub fn tokenize(input: &str) -> LexResult<Vec<Token<'_>>> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let is_eof = token.is_eof();
        tokens.push(token);
        if is_eof {
            break;
        }
    }
    tracing::debug!(tokens = tokens.len(), "tokenized source");
    Ok(tokens)
}
