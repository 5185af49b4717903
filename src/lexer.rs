//! Single-pass, `Position`-driven lexer. Digit and identifier runs are
//! recognized with `nom` so sub-token shape matching doesn't hand-roll what
//! a combinator already does well; the surrounding cursor bookkeeping
//! (line/column, one-char lookahead) stays a plain loop since that state is
//! inherently sequential.

use crate::error::LexError;
use crate::numeric::complex::Complex;
use crate::position::Position;
use crate::token::{Keyword, Token, TokenKind};
use bigdecimal::BigDecimal;
use nom::bytes::complete::take_while1;
use nom::character::complete::digit1;
use nom::IResult;
use num_bigint::BigInt;
use std::rc::Rc;
use std::str::FromStr;

const WHITESPACE: &[char] = &[' ', '\t'];

pub struct Lexer {
    chars: Vec<char>,
    pos: Position,
    current_char: Option<char>,
}

impl Lexer {
    pub fn new(filename: &str, text: &str) -> Self {
        let rc_text: Rc<str> = Rc::from(text);
        let rc_fn: Rc<str> = Rc::from(filename);
        let chars: Vec<char> = text.chars().collect();
        let mut lexer = Lexer { chars, pos: Position::start(rc_fn, rc_text), current_char: None };
        lexer.advance();
        lexer
    }

    fn advance(&mut self) {
        self.pos.advance(self.current_char);
        self.current_char = self.char_at(self.pos.index);
    }

    fn char_at(&self, idx: isize) -> Option<char> {
        if idx >= 0 && (idx as usize) < self.chars.len() {
            Some(self.chars[idx as usize])
        } else {
            None
        }
    }

    fn remaining_from(&self, idx: isize) -> String {
        if idx < 0 {
            return String::new();
        }
        self.chars[(idx as usize).min(self.chars.len())..].iter().collect()
    }

    pub fn make_tokens(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        while let Some(c) = self.current_char {
            if WHITESPACE.contains(&c) {
                self.advance();
            } else if c == '#' {
                self.skip_comment();
            } else if c == ';' || c == '\n' {
                let pos_start = self.pos.copy();
                self.advance();
                tokens.push(Token::new(TokenKind::Newline, pos_start.clone(), pos_start));
            } else if c.is_ascii_digit() {
                tokens.push(self.make_number());
            } else if c.is_ascii_alphabetic() {
                tokens.push(self.make_identifier());
            } else if c == '"' || c == '\'' {
                tokens.push(self.make_string(c)?);
            } else if c == '`' {
                tokens.push(self.make_raw_string());
            } else if c == '+' {
                tokens.push(self.single(TokenKind::Plus));
            } else if c == '-' {
                tokens.push(self.single(TokenKind::Minus));
            } else if c == '*' {
                tokens.push(self.single(TokenKind::Mul));
            } else if c == '/' {
                tokens.push(self.single(TokenKind::Div));
            } else if c == '^' {
                tokens.push(self.single(TokenKind::Pow));
            } else if c == '_' {
                tokens.push(self.single(TokenKind::Subscript));
            } else if c == '(' {
                tokens.push(self.single(TokenKind::LParen));
            } else if c == ')' {
                tokens.push(self.single(TokenKind::RParen));
            } else if c == '[' {
                tokens.push(self.single(TokenKind::LSquare));
            } else if c == ']' {
                tokens.push(self.single(TokenKind::RSquare));
            } else if c == ',' {
                tokens.push(self.single(TokenKind::Comma));
            } else if c == '!' {
                tokens.push(self.make_not_equals()?);
            } else if c == '=' {
                tokens.push(self.make_equals());
            } else if c == '<' {
                tokens.push(self.make_less_than());
            } else if c == '>' {
                tokens.push(self.make_greater_than());
            } else {
                let pos_start = self.pos.copy();
                let bad = c;
                self.advance();
                return Err(LexError::IllegalCharacter {
                    details: format!("'{bad}'"),
                    pos_start,
                    pos_end: self.pos.copy(),
                });
            }
        }

        let eof_pos = self.pos.copy();
        tokens.push(Token::new(TokenKind::Eof, eof_pos.clone(), eof_pos));
        Ok(tokens)
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        let pos_start = self.pos.copy();
        self.advance();
        Token::new(kind, pos_start, self.pos.copy())
    }

    fn skip_comment(&mut self) {
        while self.current_char.is_some() && self.current_char != Some('\n') {
            self.advance();
        }
        if self.current_char == Some('\n') {
            self.advance();
        }
    }

    fn take_digits(&self) -> usize {
        let remaining = self.remaining_from(self.pos.index);
        let result: IResult<&str, &str> = digit1(remaining.as_str());
        result.map(|(_, d)| d.chars().count()).unwrap_or(0)
    }

    fn make_number(&mut self) -> Token {
        let pos_start = self.pos.copy();
        let mut text = String::new();
        let mut dot_count = 0;

        loop {
            let run = self.take_digits();
            for _ in 0..run {
                text.push(self.current_char.unwrap());
                self.advance();
            }
            if self.current_char == Some('.') && dot_count == 0 {
                dot_count += 1;
                text.push('.');
                self.advance();
                continue;
            }
            break;
        }

        let is_complex = self.current_char == Some('i');
        if is_complex {
            self.advance();
        }

        let pos_end = self.pos.copy();

        if is_complex {
            let magnitude = BigDecimal::from_str(&text).unwrap_or_else(|_| BigDecimal::from(0));
            let value = Complex::new(BigDecimal::from(0), magnitude);
            Token::new(TokenKind::Complex(value), pos_start, pos_end)
        } else if dot_count == 1 {
            let value = BigDecimal::from_str(&text).unwrap_or_else(|_| BigDecimal::from(0));
            Token::new(TokenKind::Decimal(value), pos_start, pos_end)
        } else {
            let value = BigInt::from_str(&text).unwrap_or_else(|_| BigInt::from(0));
            Token::new(TokenKind::Integer(value), pos_start, pos_end)
        }
    }

    fn take_identifier(&self) -> usize {
        let remaining = self.remaining_from(self.pos.index);
        let result: IResult<&str, &str> = take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(remaining.as_str());
        result.map(|(_, d)| d.chars().count()).unwrap_or(0)
    }

    fn make_identifier(&mut self) -> Token {
        let pos_start = self.pos.copy();
        let len = self.take_identifier();
        let mut text = String::with_capacity(len);
        for _ in 0..len {
            text.push(self.current_char.unwrap());
            self.advance();
        }
        let pos_end = self.pos.copy();
        let kind = match Keyword::from_word(&text) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Identifier(text),
        };
        Token::new(kind, pos_start, pos_end)
    }

    fn make_string(&mut self, quote: char) -> Result<Token, LexError> {
        let pos_start = self.pos.copy();
        self.advance();
        let mut text = String::new();

        loop {
            match self.current_char {
                None => {
                    return Err(LexError::ExpectedCharacter {
                        details: format!("'{quote}'"),
                        pos_start: pos_start.clone(),
                        pos_end: self.pos.copy(),
                    });
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    let escape_start = self.pos.copy();
                    self.advance();
                    match self.current_char {
                        Some('n') => {
                            text.push('\n');
                            self.advance();
                        }
                        Some('t') => {
                            text.push('\t');
                            self.advance();
                        }
                        Some('\\') => {
                            text.push('\\');
                            self.advance();
                        }
                        other => {
                            let mut pos_end = self.pos.copy();
                            if other.is_some() {
                                pos_end.advance(other);
                            }
                            return Err(LexError::IllegalCharacter {
                                details: format!("'\\{}'", other.map(String::from).unwrap_or_default()),
                                pos_start: escape_start,
                                pos_end,
                            });
                        }
                    }
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }

        let pos_end = self.pos.copy();
        Ok(Token::new(TokenKind::String(text), pos_start, pos_end))
    }

    fn make_raw_string(&mut self) -> Token {
        let pos_start = self.pos.copy();
        self.advance();
        let mut text = String::new();
        while let Some(c) = self.current_char {
            if c == '`' {
                self.advance();
                break;
            }
            text.push(c);
            self.advance();
        }
        let pos_end = self.pos.copy();
        Token::new(TokenKind::RawString(text), pos_start, pos_end)
    }

    fn make_not_equals(&mut self) -> Result<Token, LexError> {
        let pos_start = self.pos.copy();
        self.advance();
        if self.current_char == Some('=') {
            self.advance();
            Ok(Token::new(TokenKind::Ne, pos_start, self.pos.copy()))
        } else {
            Err(LexError::ExpectedCharacter {
                details: "'=' (after '!')".to_string(),
                pos_start,
                pos_end: self.pos.copy(),
            })
        }
    }

    fn make_equals(&mut self) -> Token {
        let pos_start = self.pos.copy();
        self.advance();
        let kind = match self.current_char {
            Some('=') => {
                self.advance();
                TokenKind::EqEq
            }
            Some('>') => {
                self.advance();
                TokenKind::Arrow
            }
            _ => TokenKind::Eq,
        };
        Token::new(kind, pos_start, self.pos.copy())
    }

    fn make_less_than(&mut self) -> Token {
        let pos_start = self.pos.copy();
        self.advance();
        let kind = if self.current_char == Some('=') {
            self.advance();
            TokenKind::Lte
        } else {
            TokenKind::Lt
        };
        Token::new(kind, pos_start, self.pos.copy())
    }

    fn make_greater_than(&mut self) -> Token {
        let pos_start = self.pos.copy();
        self.advance();
        let kind = if self.current_char == Some('=') {
            self.advance();
            TokenKind::Gte
        } else {
            TokenKind::Gt
        };
        Token::new(kind, pos_start, self.pos.copy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new("<test>", src).make_tokens().unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn integer_decimal_and_complex_literals() {
        let ks = kinds("1 2.5 3i");
        assert!(matches!(ks[0], TokenKind::Integer(_)));
        assert!(matches!(ks[1], TokenKind::Decimal(_)));
        assert!(matches!(ks[2], TokenKind::Complex(_)));
    }

    #[test]
    fn keyword_vs_identifier() {
        let ks = kinds("if foo");
        assert!(matches!(ks[0], TokenKind::Keyword(Keyword::If)));
        assert!(matches!(&ks[1], TokenKind::Identifier(s) if s == "foo"));
    }

    #[test]
    fn string_escapes() {
        let ks = kinds("\"a\\nb\"");
        match &ks[0] {
            TokenKind::String(s) => assert_eq!(s, "a\nb"),
            other => panic!("expected String, got {other:?}"),
        }
    }

    #[test]
    fn invalid_escape_is_illegal_character() {
        let result = Lexer::new("<test>", "\"a\\zb\"").make_tokens();
        assert!(matches!(result, Err(LexError::IllegalCharacter { .. })));
    }

    #[test]
    fn raw_string_skips_escape_processing() {
        let ks = kinds("`a\\nb`");
        match &ks[0] {
            TokenKind::RawString(s) => assert_eq!(s, "a\\nb"),
            other => panic!("expected RawString, got {other:?}"),
        }
    }

    #[test]
    fn multi_char_operators() {
        let ks = kinds("== != <= >= => =");
        assert_eq!(
            ks,
            vec![TokenKind::EqEq, TokenKind::Ne, TokenKind::Lte, TokenKind::Gte, TokenKind::Arrow, TokenKind::Eq]
        );
    }

    #[test]
    fn bang_without_equals_is_expected_character() {
        let result = Lexer::new("<test>", "!x").make_tokens();
        assert!(matches!(result, Err(LexError::ExpectedCharacter { .. })));
    }

    #[test]
    fn comment_runs_to_end_of_line() {
        let ks = kinds("1 # comment\n2");
        assert!(matches!(ks[0], TokenKind::Integer(_)));
        assert!(matches!(ks[1], TokenKind::Newline));
        assert!(matches!(ks[2], TokenKind::Integer(_)));
    }

    #[test]
    fn ends_with_eof() {
        let ks = kinds("1");
        assert!(matches!(ks.last().unwrap(), TokenKind::Eof));
    }
}
