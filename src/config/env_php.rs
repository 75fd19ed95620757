//! Reader for Magento's `app/etc/env.php`
//!
//! The file is a PHP script that returns one array literal. Only the
//! literal subset Magento writes is understood: short and long array
//! syntax, quoted strings, numbers, `true`/`false`/`null` and comments.

use crate::error::ConfigError;

/// A PHP literal value
#[derive(Debug, Clone, PartialEq)]
pub enum PhpValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Ordered entries; list items get integer keys as PHP assigns them
    Array(Vec<(String, PhpValue)>),
}

impl PhpValue {
    /// Entry of an array by key
    pub fn get(&self, key: &str) -> Option<&PhpValue> {
        match self {
            PhpValue::Array(entries) => entries
                .iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Follow a dotted path such as `db.connection.default`
    pub fn path(&self, dotted: &str) -> Option<&PhpValue> {
        dotted
            .split('.')
            .try_fold(self, |value, key| value.get(key))
    }

    /// Scalar as text; `None` for null and arrays
    pub fn as_text(&self) -> Option<String> {
        match self {
            PhpValue::Str(s) => Some(s.clone()),
            PhpValue::Int(i) => Some(i.to_string()),
            PhpValue::Float(f) => Some(f.to_string()),
            PhpValue::Bool(true) => Some("1".to_string()),
            PhpValue::Bool(false) => Some(String::new()),
            PhpValue::Null | PhpValue::Array(_) => None,
        }
    }
}

/// Parse the array returned by an env.php script
pub fn parse(source: &str) -> Result<PhpValue, ConfigError> {
    let mut parser = Parser {
        src: source.as_bytes(),
        pos: 0,
    };

    parser.skip_open_tag();
    parser.skip_trivia();
    if !parser.eat_keyword("return") {
        return Err(parser.error("expected `return`"));
    }
    parser.skip_trivia();
    let value = parser.value()?;
    parser.skip_trivia();
    parser.eat(b';');
    Ok(value)
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: &str) -> ConfigError {
        ConfigError::EnvPhpSyntax {
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn starts_with(&self, s: &str) -> bool {
        self.src[self.pos..].starts_with(s.as_bytes())
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_open_tag(&mut self) {
        self.skip_whitespace();
        if self.starts_with("<?php") {
            self.pos += 5;
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Whitespace and comments
    fn skip_trivia(&mut self) {
        loop {
            self.skip_whitespace();
            if self.starts_with("//") || self.starts_with("#") {
                while self.peek().is_some_and(|b| b != b'\n') {
                    self.pos += 1;
                }
            } else if self.starts_with("/*") {
                self.pos += 2;
                while self.pos < self.src.len() && !self.starts_with("*/") {
                    self.pos += 1;
                }
                self.pos = (self.pos + 2).min(self.src.len());
            } else {
                return;
            }
        }
    }

    fn identifier(&mut self) -> &'a str {
        let src = self.src;
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            self.pos += 1;
        }
        std::str::from_utf8(&src[start..self.pos]).unwrap_or_default()
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let start = self.pos;
        if self.identifier().eq_ignore_ascii_case(keyword) {
            true
        } else {
            self.pos = start;
            false
        }
    }

    fn value(&mut self) -> Result<PhpValue, ConfigError> {
        match self.peek() {
            Some(b'[') => {
                self.pos += 1;
                self.array(b']')
            }
            Some(b'\'') => self.single_quoted().map(PhpValue::Str),
            Some(b'"') => self.double_quoted().map(PhpValue::Str),
            Some(b) if b == b'-' || b.is_ascii_digit() => self.number(),
            Some(b) if b.is_ascii_alphabetic() => {
                let start = self.pos;
                let word = self.identifier().to_ascii_lowercase();
                match word.as_str() {
                    "true" => Ok(PhpValue::Bool(true)),
                    "false" => Ok(PhpValue::Bool(false)),
                    "null" => Ok(PhpValue::Null),
                    "array" => {
                        self.skip_trivia();
                        if !self.eat(b'(') {
                            return Err(self.error("expected `(` after `array`"));
                        }
                        self.array(b')')
                    }
                    _ => {
                        self.pos = start;
                        Err(self.error("unsupported expression"))
                    }
                }
            }
            Some(_) => Err(self.error("unexpected character")),
            None => Err(self.error("unexpected end of file")),
        }
    }

    fn array(&mut self, close: u8) -> Result<PhpValue, ConfigError> {
        let mut entries = Vec::new();
        let mut next_index: i64 = 0;

        loop {
            self.skip_trivia();
            if self.eat(close) {
                return Ok(PhpValue::Array(entries));
            }

            let first = self.value()?;
            self.skip_trivia();

            let (key, value) = if self.starts_with("=>") {
                self.pos += 2;
                self.skip_trivia();
                let key = match &first {
                    PhpValue::Int(i) => {
                        next_index = next_index.max(i + 1);
                        i.to_string()
                    }
                    other => other
                        .as_text()
                        .ok_or_else(|| self.error("invalid array key"))?,
                };
                (key, self.value()?)
            } else {
                let key = next_index.to_string();
                next_index += 1;
                (key, first)
            };
            entries.push((key, value));

            self.skip_trivia();
            if self.eat(b',') {
                continue;
            }
            if self.eat(close) {
                return Ok(PhpValue::Array(entries));
            }
            return Err(self.error("expected `,` or end of array"));
        }
    }

    fn single_quoted(&mut self) -> Result<String, ConfigError> {
        self.pos += 1;
        let mut out = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated string")),
                Some(b'\'') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') if matches!(self.src.get(self.pos + 1), Some(b'\'' | b'\\')) => {
                    out.push(self.src[self.pos + 1]);
                    self.pos += 2;
                }
                Some(b) => {
                    out.push(b);
                    self.pos += 1;
                }
            }
        }
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    fn double_quoted(&mut self) -> Result<String, ConfigError> {
        self.pos += 1;
        let mut out = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated string")),
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    let escaped = match self.src.get(self.pos + 1) {
                        Some(b'n') => Some(b'\n'),
                        Some(b't') => Some(b'\t'),
                        Some(b'r') => Some(b'\r'),
                        Some(b'"') => Some(b'"'),
                        Some(b'\\') => Some(b'\\'),
                        Some(b'$') => Some(b'$'),
                        _ => None,
                    };
                    match escaped {
                        Some(b) => {
                            out.push(b);
                            self.pos += 2;
                        }
                        None => {
                            out.push(b'\\');
                            self.pos += 1;
                        }
                    }
                }
                Some(b) => {
                    out.push(b);
                    self.pos += 1;
                }
            }
        }
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    fn number(&mut self) -> Result<PhpValue, ConfigError> {
        let start = self.pos;
        self.eat(b'-');
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_digit() || b == b'.' || b == b'_')
        {
            self.pos += 1;
        }

        let text: String = String::from_utf8_lossy(&self.src[start..self.pos])
            .chars()
            .filter(|c| *c != '_')
            .collect();

        if let Ok(i) = text.parse::<i64>() {
            Ok(PhpValue::Int(i))
        } else if let Ok(f) = text.parse::<f64>() {
            Ok(PhpValue::Float(f))
        } else {
            self.pos = start;
            Err(self.error("invalid number"))
        }
    }
}
