//! Parser for the outcome-count literal printed at the end of each result line.
//!
//! The harness prints counts the way a Python `dict` reprs, e.g.
//! `{'0000': 12, '1111': 88}`. Only the subset of literal syntax such a mapping
//! can contain is accepted: quoted (or bare integer) keys and non-negative
//! integer values.

use super::error::{LiteralError, LiteralErrorKind};
use super::OutcomeTable;

/// Parse a mapping literal that starts at the beginning of `text`.
///
/// Returns the table and the number of bytes consumed up to and including the
/// closing brace. Anything after the brace is left for the caller.
pub fn parse_counts(text: &str) -> Result<(OutcomeTable, usize), LiteralError> {
    let mut cursor = Cursor::new(text);
    let table = cursor.mapping()?;
    Ok((table, cursor.pos))
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn error(&self, kind: LiteralErrorKind) -> LiteralError {
        LiteralError::new(self.pos, kind)
    }

    /// Error for whatever sits at the cursor when something else was expected.
    fn unexpected(&self) -> LiteralError {
        match self.peek() {
            Some(c) => self.error(LiteralErrorKind::UnexpectedChar(c)),
            None => self.error(LiteralErrorKind::UnexpectedEnd),
        }
    }

    fn mapping(&mut self) -> Result<OutcomeTable, LiteralError> {
        if self.peek() != Some('{') {
            return Err(self.error(LiteralErrorKind::ExpectedOpenBrace));
        }
        self.bump();

        let mut table = OutcomeTable::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('}') => {
                    self.bump();
                    return Ok(table);
                }
                None => return Err(self.error(LiteralErrorKind::UnexpectedEnd)),
                Some(_) => {}
            }

            let key = self.key()?;

            self.skip_whitespace();
            match self.peek() {
                Some(':') => {
                    self.bump();
                }
                None => return Err(self.error(LiteralErrorKind::UnexpectedEnd)),
                Some(_) => return Err(self.error(LiteralErrorKind::ExpectedColon)),
            }

            self.skip_whitespace();
            let count = self.count()?;
            // Repeated keys behave like a dict display: the last one wins.
            table.insert(key, count);

            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {
                    self.bump();
                    return Ok(table);
                }
                None => return Err(self.error(LiteralErrorKind::UnexpectedEnd)),
                Some(_) => return Err(self.error(LiteralErrorKind::ExpectedCommaOrClose)),
            }
        }
    }

    fn key(&mut self) -> Result<String, LiteralError> {
        match self.peek() {
            Some(quote @ ('\'' | '"')) => self.string(quote),
            // Integer keys are stringified, matching how a JSON dump writes them.
            Some(c) if c.is_ascii_digit() => self.integer().map(|n| n.to_string()),
            _ => Err(self.unexpected()),
        }
    }

    fn string(&mut self, quote: char) -> Result<String, LiteralError> {
        let start = self.pos;
        self.bump();

        let mut out = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(out),
                Some('\\') => self.escape(&mut out, start)?,
                Some('\n') | None => {
                    return Err(LiteralError::new(start, LiteralErrorKind::UnterminatedString))
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn escape(&mut self, out: &mut String, string_start: usize) -> Result<(), LiteralError> {
        let at = self.pos - 1;
        let Some(c) = self.bump() else {
            return Err(LiteralError::new(
                string_start,
                LiteralErrorKind::UnterminatedString,
            ));
        };

        match c {
            '\\' | '\'' | '"' => out.push(c),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            '0'..='7' => out.push(self.octal_escape(c, at)?),
            'x' => out.push(self.hex_escape(2, at)?),
            'u' => out.push(self.hex_escape(4, at)?),
            'U' => out.push(self.hex_escape(8, at)?),
            // Named escapes need the Unicode name table; not supported.
            'N' => return Err(LiteralError::new(at, LiteralErrorKind::InvalidEscape)),
            // Line continuation
            '\n' => {}
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    /// `\ooo`: up to three octal digits, the first already consumed.
    fn octal_escape(&mut self, first: char, at: usize) -> Result<char, LiteralError> {
        let mut value = first.to_digit(8).unwrap_or_default();
        for _ in 0..2 {
            match self.peek().and_then(|c| c.to_digit(8)) {
                Some(digit) => {
                    self.bump();
                    value = value * 8 + digit;
                }
                None => break,
            }
        }
        char::from_u32(value).ok_or_else(|| LiteralError::new(at, LiteralErrorKind::InvalidEscape))
    }

    fn hex_escape(&mut self, digits: usize, at: usize) -> Result<char, LiteralError> {
        let mut value = 0u32;
        for _ in 0..digits {
            let digit = self
                .peek()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| LiteralError::new(at, LiteralErrorKind::InvalidEscape))?;
            self.bump();
            value = value * 16 + digit;
        }
        char::from_u32(value).ok_or_else(|| LiteralError::new(at, LiteralErrorKind::InvalidEscape))
    }

    fn count(&mut self) -> Result<u64, LiteralError> {
        match self.peek() {
            Some('-') => return Err(self.error(LiteralErrorKind::NegativeCount)),
            Some('+') => {
                self.bump();
                self.skip_whitespace();
            }
            Some('.') => return Err(self.error(LiteralErrorKind::NonIntegerCount)),
            _ => {}
        }
        self.integer()
    }

    /// Decimal integer with optional single `_` separators between digits.
    ///
    /// Leading zeros are only allowed when every digit is zero (`0`, `00`, `0_0`).
    fn integer(&mut self) -> Result<u64, LiteralError> {
        let start = self.pos;
        let mut value: u64 = 0;
        let mut digits = 0usize;
        let mut after_underscore = false;
        let mut leading_zero = false;

        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => {
                    let digit = u64::from(c.to_digit(10).unwrap_or_default());
                    if digits == 0 {
                        leading_zero = digit == 0;
                    } else if leading_zero && digit != 0 {
                        return Err(LiteralError::new(start, LiteralErrorKind::LeadingZeros));
                    }
                    value = value
                        .checked_mul(10)
                        .and_then(|v| v.checked_add(digit))
                        .ok_or_else(|| LiteralError::new(start, LiteralErrorKind::CountOverflow))?;
                    digits += 1;
                    after_underscore = false;
                }
                '_' if digits > 0 && !after_underscore => after_underscore = true,
                _ => break,
            }
            self.bump();
        }

        if digits == 0 {
            return Err(self.unexpected());
        }
        if after_underscore {
            return Err(LiteralError::new(
                self.pos - 1,
                LiteralErrorKind::UnexpectedChar('_'),
            ));
        }

        match self.peek() {
            Some('.' | 'e' | 'E' | 'j' | 'J') => Err(self.error(LiteralErrorKind::NonIntegerCount)),
            Some(c) if c.is_alphanumeric() || c == '_' => {
                Err(self.error(LiteralErrorKind::UnexpectedChar(c)))
            }
            _ => Ok(value),
        }
    }
}
