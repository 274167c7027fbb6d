//! Character-level cursor over a `.thrift` source buffer.
//!
//! There is no token stream: the parser pulls words, identifiers, literals
//! and punctuation straight from the buffer, and position/line/column are
//! tracked by hand. Comments are skippable everywhere except inside string
//! literals; documentation comments are harvested on request.

use crate::ast::Location;
use crate::error::ThriftError;

#[derive(Debug, Clone, Copy)]
pub struct Mark {
    pos: usize,
    line: u32,
    line_start: usize,
}

pub struct Scanner {
    chars: Vec<char>,
    pos: usize,
    /// Number of newlines consumed so far.
    line: u32,
    /// Index of the first character of the current line.
    line_start: usize,
    file: Location,
}

impl Scanner {
    pub fn new(file: Location, text: &str) -> Self {
        Scanner {
            chars: text.chars().collect(),
            pos: 0,
            line: 0,
            line_start: 0,
            file,
        }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    pub fn location(&self) -> Location {
        self.file
            .at(self.line + 1, (self.pos - self.line_start + 1) as u32)
    }

    pub fn error(&self, message: impl Into<String>) -> ThriftError {
        ThriftError::syntax(self.location(), message)
    }

    fn peek_raw(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_raw_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    /// Call after `pos` has moved past a `'\n'`.
    fn newline(&mut self) {
        self.line += 1;
        self.line_start = self.pos;
    }

    /// Advance past one character that is known not to be a newline.
    pub fn bump(&mut self) {
        self.pos += 1;
    }

    /// Remember the cursor so a speculative look-ahead can be undone.
    pub fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            line: self.line,
            line_start: self.line_start,
        }
    }

    pub fn reset(&mut self, mark: Mark) {
        self.pos = mark.pos;
        self.line = mark.line;
        self.line_start = mark.line_start;
    }

    // -- Whitespace and comments ----------------------------------

    pub fn skip_whitespace(&mut self, skip_comments: bool) -> Result<(), ThriftError> {
        while let Some(c) = self.peek_raw() {
            match c {
                ' ' | '\t' | '\r' => self.pos += 1,
                '\n' => {
                    self.pos += 1;
                    self.newline();
                }
                '/' | '#' if skip_comments => {
                    self.read_comment()?;
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Peek the next significant character. End of input is an error.
    pub fn peek_char(&mut self, skip_comments: bool) -> Result<char, ThriftError> {
        self.skip_whitespace(skip_comments)?;
        self.peek_raw()
            .ok_or_else(|| self.error("unexpected end of file"))
    }

    pub fn read_char(&mut self) -> Result<char, ThriftError> {
        let c = self.peek_char(true)?;
        self.pos += 1;
        Ok(c)
    }

    /// Consume `expected` or fail with `message`.
    pub fn expect_char(&mut self, expected: char, message: &str) -> Result<(), ThriftError> {
        let loc = self.location();
        if self.read_char()? != expected {
            return Err(ThriftError::syntax(loc, message));
        }
        Ok(())
    }

    /// Read one comment starting at the cursor, which must sit on `#` or `/`.
    ///
    /// Block comments drop each line's leading indentation and `*` marker;
    /// line comments drop a single leading space.
    fn read_comment(&mut self) -> Result<String, ThriftError> {
        let start_loc = self.location();
        let comment_type = match self.peek_raw() {
            Some('#') => {
                self.pos += 1;
                '#'
            }
            Some('/') => {
                self.pos += 1;
                match self.peek_raw() {
                    Some(c @ ('/' | '*')) => {
                        self.pos += 1;
                        c
                    }
                    _ => return Err(ThriftError::syntax(start_loc, "unexpected start of comment")),
                }
            }
            _ => return Err(ThriftError::syntax(start_loc, "expected a comment")),
        };

        if comment_type == '*' {
            let mut text = String::new();
            let mut start_of_line = true;
            while self.pos + 1 < self.chars.len() {
                let c = self.chars[self.pos];
                let next = self.chars[self.pos + 1];
                if c == '*' && next == '/' {
                    self.pos += 2;
                    return Ok(text.trim().to_owned());
                }

                if c == '\n' {
                    text.push('\n');
                    self.pos += 1;
                    self.newline();
                    start_of_line = true;
                    continue;
                }

                if c == '\r' {
                    // dropped; '\n' carries the line break
                } else if !start_of_line {
                    text.push(c);
                } else if c == '*' {
                    if next == ' ' {
                        self.pos += 1;
                    }
                    start_of_line = false;
                } else if !c.is_whitespace() {
                    text.push(c);
                    start_of_line = false;
                }
                self.pos += 1;
            }
            return Err(ThriftError::syntax(start_loc, "unterminated comment"));
        }

        if self.peek_raw() == Some(' ') {
            self.pos += 1;
        }
        let start = self.pos;
        while let Some(c) = self.peek_raw() {
            if c == '\n' {
                break;
            }
            self.pos += 1;
        }
        let end = self.pos;
        if !self.at_end() {
            self.pos += 1;
            self.newline();
        }
        let text: String = self.chars[start..end].iter().collect();
        Ok(text.trim_end_matches('\r').to_owned())
    }

    /// Collect every comment between the cursor and the next significant
    /// character, joined by newlines. Empty when there are none.
    pub fn read_documentation(&mut self) -> Result<String, ThriftError> {
        let mut result: Option<String> = None;
        loop {
            self.skip_whitespace(false)?;
            match self.peek_raw() {
                Some('/') | Some('#') => {}
                _ => return Ok(result.unwrap_or_default()),
            }
            let comment = self.read_comment()?;
            result = Some(match result {
                None => comment,
                Some(prev) => format!("{}\n{}", prev, comment),
            });
        }
    }

    /// Read a documentation comment that trails a declaration on the same
    /// line, optionally after a single `,` or `;` separator.
    ///
    /// A trailing block comment must close before the end of the line and
    /// only whitespace may follow it.
    pub fn read_trailing_doc(&mut self, consume_separator: bool) -> Result<String, ThriftError> {
        let mut accept_separator = consume_separator;
        let mut comment_type = None;
        while let Some(c) = self.peek_raw() {
            match c {
                ',' | ';' if accept_separator => {
                    self.pos += 1;
                    accept_separator = false;
                }
                ' ' | '\t' => self.pos += 1,
                '#' | '/' => {
                    self.pos += 1;
                    comment_type = Some(c);
                    break;
                }
                _ => break,
            }
        }

        let Some(mut comment_type) = comment_type else {
            return Ok(String::new());
        };

        if comment_type == '/' {
            match self.peek_raw() {
                Some(c @ ('/' | '*')) => {
                    self.pos += 1;
                    comment_type = c;
                }
                _ => {
                    self.pos -= 1;
                    return Err(self.error("expected '//' or '/*'"));
                }
            }
        }

        let start = self.pos;
        let end = if comment_type == '*' {
            let end = loop {
                match self.peek_raw() {
                    None | Some('\n') => {
                        return Err(self.error("trailing comment must be closed on the same line"))
                    }
                    Some('*') if self.peek_raw_at(1) == Some('/') => {
                        let end = self.pos;
                        self.pos += 2;
                        break end;
                    }
                    Some(_) => self.pos += 1,
                }
            };

            while let Some(c) = self.peek_raw() {
                match c {
                    '\n' => {
                        self.pos += 1;
                        self.newline();
                        break;
                    }
                    ' ' | '\t' | '\r' => self.pos += 1,
                    _ => return Err(self.error("no syntax may follow trailing comment")),
                }
            }
            end
        } else {
            while let Some(c) = self.peek_raw() {
                if c == '\n' {
                    break;
                }
                self.pos += 1;
            }
            let end = self.pos;
            if !self.at_end() {
                self.pos += 1;
                self.newline();
            }
            end
        };

        let text: String = self.chars[start..end].iter().collect();
        Ok(text
            .trim_matches(|c| c == ' ' || c == '\t' || c == '\r')
            .to_owned())
    }

    // -- Lexemes ----------------------------------------------------

    /// A quoted string literal, single or double quotes, C-style escapes.
    pub fn read_literal(&mut self) -> Result<String, ThriftError> {
        self.skip_whitespace(true)?;
        let start_loc = self.location();
        let quote = match self.peek_raw() {
            Some(q @ ('"' | '\'')) => {
                self.pos += 1;
                q
            }
            _ => return Err(self.error("expected a string literal")),
        };

        let mut s = String::new();
        while let Some(c) = self.peek_raw() {
            self.pos += 1;
            if c == quote {
                return Ok(s);
            }

            if c == '\\' {
                let Some(escape) = self.peek_raw() else {
                    return Err(self.error("unexpected end of input"));
                };
                self.pos += 1;
                let resolved = match escape {
                    'a' => '\u{7}',
                    'b' => '\u{8}',
                    'f' => '\u{c}',
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    'v' => '\u{b}',
                    '\\' => '\\',
                    e if e == quote => quote,
                    other => {
                        return Err(self.error(format!("invalid escape character: {}", other)))
                    }
                };
                s.push(resolved);
            } else {
                if c == '\n' {
                    self.newline();
                }
                s.push(c);
            }
        }

        Err(ThriftError::syntax(start_loc, "unterminated string"))
    }

    /// A bare word: keywords and type names.
    pub fn read_word(&mut self) -> Result<String, ThriftError> {
        self.skip_whitespace(true)?;
        let start = self.pos;
        while let Some(c) = self.peek_raw() {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+' | '.') {
                self.pos += 1;
            } else {
                break;
            }
        }
        if start == self.pos {
            return Err(self.error("expected a word"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    /// `[A-Za-z_][A-Za-z0-9_.]*`, additionally allowing `-` after the first
    /// character for Smalltalk category names.
    pub fn read_identifier(&mut self, allow_hyphen: bool) -> Result<String, ThriftError> {
        self.skip_whitespace(true)?;
        let start = self.pos;
        while let Some(c) = self.peek_raw() {
            let first = self.pos == start;
            let ok = c.is_ascii_alphabetic()
                || c == '_'
                || (!first && (c.is_ascii_digit() || c == '.'))
                || (!first && allow_hyphen && c == '-');
            if !ok {
                break;
            }
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected an identifier"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    /// A decimal or `0x`-prefixed hexadecimal `i32`, optionally signed.
    /// Comments are not skipped before the number.
    pub fn read_int(&mut self) -> Result<i32, ThriftError> {
        self.skip_whitespace(false)?;
        let start_loc = self.location();
        let start = self.pos;
        while let Some(c) = self.peek_raw() {
            if c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.') {
                self.pos += 1;
            } else {
                break;
            }
        }
        if start == self.pos {
            return Err(self.error("expected an integer"));
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        parse_int(&text).ok_or_else(|| {
            ThriftError::syntax(start_loc, format!("expected an integer but was {}", text))
        })
    }

    /// `*` or a word naming a namespace scope.
    pub fn read_namespace_scope(&mut self) -> Result<String, ThriftError> {
        self.skip_whitespace(true)?;
        match self.peek_raw() {
            None => Err(self.error("unexpected end of input")),
            Some('*') => {
                self.pos += 1;
                Ok("*".to_owned())
            }
            Some(_) => self.read_word(),
        }
    }
}

fn parse_int(text: &str) -> Option<i32> {
    let (negative, unsigned) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let (digits, radix) = match unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        Some(hex) => (hex, 16),
        None => (unsigned, 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let magnitude = i64::from_str_radix(digits, radix).ok()?;
    let value = if negative {
        magnitude.checked_neg()?
    } else {
        magnitude
    };
    i32::try_from(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner(src: &str) -> Scanner {
        Scanner::new(Location::file("test.thrift"), src)
    }

    #[test]
    fn block_doc_strips_markers() {
        let mut s = scanner("/**\n * Line one\n *   indented\n */\nstruct");
        let doc = s.read_documentation().unwrap();
        assert_eq!(doc, "Line one\n  indented");
        assert_eq!(s.read_word().unwrap(), "struct");
    }

    #[test]
    fn consecutive_line_comments_are_joined() {
        let mut s = scanner("// first\n# second\n//third\nenum");
        assert_eq!(s.read_documentation().unwrap(), "first\nsecond\nthird");
        assert_eq!(s.location().line, 4);
    }

    #[test]
    fn line_comment_at_eof_keeps_last_char() {
        let mut s = scanner("# abc");
        assert_eq!(s.read_documentation().unwrap(), "abc");
        assert!(s.at_end());
    }

    #[test]
    fn unterminated_block_comment() {
        let mut s = scanner("/* never closed");
        let err = s.read_documentation().unwrap_err();
        assert!(err.message().contains("unterminated comment"));
    }

    #[test]
    fn trailing_line_doc_after_separator() {
        let mut s = scanner(", // trailing words  \nnext");
        assert_eq!(s.read_trailing_doc(true).unwrap(), "trailing words");
        assert_eq!(s.read_word().unwrap(), "next");
        assert_eq!(s.location().line, 2);
    }

    #[test]
    fn trailing_block_doc_must_close_on_line() {
        let mut s = scanner("; /* open\n */");
        let err = s.read_trailing_doc(true).unwrap_err();
        assert!(err.message().contains("closed on the same line"));
    }

    #[test]
    fn nothing_may_follow_trailing_block_doc() {
        let mut s = scanner(" /* doc */ 2: i32 b");
        let err = s.read_trailing_doc(true).unwrap_err();
        assert!(err.message().contains("no syntax may follow"));

        let mut ok = scanner(" /* doc */  \t\nx");
        assert_eq!(ok.read_trailing_doc(true).unwrap(), "doc");
    }

    #[test]
    fn trailing_doc_without_comment_only_eats_separator() {
        let mut s = scanner(",\n// not trailing\nx");
        assert_eq!(s.read_trailing_doc(true).unwrap(), "");
        assert_eq!(s.read_documentation().unwrap(), "not trailing");
    }

    #[test]
    fn literal_escapes_and_quotes() {
        let mut s = scanner(r#" "a\tb\"c\\" 'it\'s' "#);
        assert_eq!(s.read_literal().unwrap(), "a\tb\"c\\");
        assert_eq!(s.read_literal().unwrap(), "it's");
    }

    #[test]
    fn literal_errors() {
        let mut s = scanner("\"abc");
        assert!(s
            .read_literal()
            .unwrap_err()
            .message()
            .contains("unterminated string"));

        let mut s = scanner(r#""bad \q""#);
        assert!(s
            .read_literal()
            .unwrap_err()
            .message()
            .contains("invalid escape"));
    }

    #[test]
    fn identifiers() {
        let mut s = scanner("foo.bar_2 9abc");
        assert_eq!(s.read_identifier(false).unwrap(), "foo.bar_2");
        assert!(s.read_identifier(false).is_err());

        let mut s = scanner("My-Category rest");
        assert_eq!(s.read_identifier(true).unwrap(), "My-Category");
        let mut s = scanner("My-Category");
        assert_eq!(s.read_identifier(false).unwrap(), "My");
    }

    #[test]
    fn integers() {
        let mut s = scanner("42 -7 0x1F +3 99999999999");
        assert_eq!(s.read_int().unwrap(), 42);
        assert_eq!(s.read_int().unwrap(), -7);
        assert_eq!(s.read_int().unwrap(), 31);
        assert_eq!(s.read_int().unwrap(), 3);
        assert!(s.read_int().is_err());
    }

    #[test]
    fn malformed_integers_are_rejected() {
        for text in [
            "--5",
            "0x-3",
            "+-7",
            "-+7",
            "--9223372036854775808",
            "-0x",
            "0x",
            "-",
            "1.5",
            "12abc",
            "0xZZ",
        ] {
            let mut s = scanner(text);
            let err = s.read_int().unwrap_err();
            assert!(
                matches!(err, ThriftError::Syntax { .. }),
                "{}: {:?}",
                text,
                err
            );
            assert_eq!(
                err.message(),
                format!("expected an integer but was {}", text)
            );
        }
    }

    #[test]
    fn integer_bounds() {
        let mut s = scanner("-2147483648 2147483647 -0x80000000 2147483648");
        assert_eq!(s.read_int().unwrap(), i32::MIN);
        assert_eq!(s.read_int().unwrap(), i32::MAX);
        assert_eq!(s.read_int().unwrap(), i32::MIN);
        assert!(s.read_int().is_err());
    }

    #[test]
    fn columns_are_one_based() {
        let mut s = scanner("\n   word");
        s.skip_whitespace(true).unwrap();
        let loc = s.location();
        assert_eq!((loc.line, loc.column), (2, 4));
    }

    #[test]
    fn reset_restores_line_tracking() {
        let mut s = scanner("a\n\n  b");
        s.read_word().unwrap();
        let mark = s.mark();
        assert_eq!(s.peek_char(false).unwrap(), 'b');
        assert_eq!(s.location().line, 3);
        s.reset(mark);
        assert_eq!(s.location().line, 1);
        assert_eq!(s.read_word().unwrap(), "b");
    }

    #[test]
    fn peek_at_eof_is_an_error() {
        let mut s = scanner("   ");
        assert!(s
            .peek_char(true)
            .unwrap_err()
            .message()
            .contains("unexpected end of file"));
    }
}
