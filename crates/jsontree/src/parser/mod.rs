//! Recursive-descent JSON parser building nodes directly into an [`Arena`].
mod minify;

use std::borrow::Cow;

pub use minify::{minify, minify_str, minify_vec};

use crate::{
    error::{ParseError, ParseErrorKind},
    Arena, Error, NodeId, Number, NESTING_LIMIT,
};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Options for [`Arena::parse_with_opts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    length: Option<usize>,
    require_null_terminated: bool,
    allow_comments: bool,
    max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseOptions {
    #[must_use]
    pub fn new() -> Self {
        ParseOptions {
            length: None,
            require_null_terminated: false,
            allow_comments: false,
            max_depth: NESTING_LIMIT,
        }
    }
    /// Parse at most `length` bytes. Without a length, input ends at the first NUL byte.
    #[must_use]
    pub fn length(mut self, length: Option<usize>) -> Self {
        self.length = length;
        self
    }
    /// Only accept whitespace between the value and the end of input (or a NUL byte).
    #[must_use]
    pub fn require_null_terminated(mut self, yes: bool) -> Self {
        self.require_null_terminated = yes;
        self
    }
    /// Strip `//` and `/* */` comments from a copy of the input before parsing it.
    ///
    /// Offsets reported for such input refer to the stripped copy.
    #[must_use]
    pub fn allow_comments(mut self, yes: bool) -> Self {
        self.allow_comments = yes;
        self
    }
    /// Maximum nesting of arrays and objects.
    #[must_use]
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Arena {
    /// Parse a JSON document.
    ///
    /// Input after the first complete value is ignored, as is everything after a NUL character.
    /// Use [`Arena::parse_with_opts`] to reject trailing data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for malformed input and [`Error::Allocation`] if the hooks refuse
    /// a node. Nothing is left allocated on failure.
    pub fn parse(&mut self, text: &str) -> Result<NodeId, Error> {
        self.parse_bytes(text.as_bytes())
    }

    /// Parse a JSON document from bytes. See [`Arena::parse`].
    ///
    /// # Errors
    ///
    /// Same as [`Arena::parse`].
    pub fn parse_bytes(&mut self, input: &[u8]) -> Result<NodeId, Error> {
        self.parse_with_opts(input, &ParseOptions::default())
            .map(|(root, _)| root)
    }

    /// Parse a JSON document and report where parsing stopped.
    ///
    /// The returned offset points right after the value, or after the trailing whitespace when
    /// `require_null_terminated` is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] with the offset of the offending byte for malformed input,
    /// including trailing data when `require_null_terminated` is set. Returns
    /// [`Error::Allocation`] if the hooks refuse a node.
    pub fn parse_with_opts(
        &mut self,
        input: &[u8],
        options: &ParseOptions,
    ) -> Result<(NodeId, usize), Error> {
        let end = match options.length {
            Some(length) => length.min(input.len()),
            None => input.iter().position(|&b| b == 0).unwrap_or(input.len()),
        };
        let input = &input[..end];
        let result = if options.allow_comments {
            let mut stripped = input.to_vec();
            minify_vec(&mut stripped);
            Parser::new(&stripped, options).parse(self)
        } else {
            Parser::new(input, options).parse(self)
        };
        if let Err(Error::Parse(error)) = &result {
            log::trace!("Failed to parse JSON: {error}");
        }
        result
    }
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    max_depth: usize,
    require_null_terminated: bool,
}

impl<'a> Parser<'a> {
    fn new(input: &'a [u8], options: &ParseOptions) -> Self {
        Parser {
            input,
            pos: 0,
            max_depth: options.max_depth,
            require_null_terminated: options.require_null_terminated,
        }
    }

    fn parse(mut self, arena: &mut Arena) -> Result<(NodeId, usize), Error> {
        if self.input.starts_with(UTF8_BOM) {
            self.pos = UTF8_BOM.len();
        }
        self.skip_whitespace();
        let root = self.parse_value(arena, 0)?;
        if self.require_null_terminated {
            self.skip_whitespace();
            if matches!(self.peek(), Some(byte) if byte != 0) {
                arena.free_tree(root);
                return Err(self.error(ParseErrorKind::TrailingCharacters));
            }
        }
        Ok((root, self.pos))
    }

    fn error(&self, kind: ParseErrorKind) -> Error {
        ParseError::new(kind, self.pos).into()
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: u8) -> Result<(), Error> {
        match self.peek() {
            Some(byte) if byte == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(_) => Err(self.error(ParseErrorKind::UnexpectedToken)),
            None => Err(self.error(ParseErrorKind::UnexpectedEnd)),
        }
    }

    fn parse_value(&mut self, arena: &mut Arena, depth: usize) -> Result<NodeId, Error> {
        match self.peek() {
            None => Err(self.error(ParseErrorKind::UnexpectedEnd)),
            Some(b'n') => {
                self.expect_literal(b"null")?;
                arena.create_null()
            }
            Some(b't') => {
                self.expect_literal(b"true")?;
                arena.create_true()
            }
            Some(b'f') => {
                self.expect_literal(b"false")?;
                arena.create_false()
            }
            Some(b'"') => {
                let text = self.parse_string()?;
                arena.create_owned_string(text)
            }
            Some(b'-' | b'0'..=b'9') => {
                let number = self.parse_number()?;
                arena.create_number_from(number)
            }
            Some(b'[') => self.parse_array(arena, depth + 1),
            Some(b'{') => self.parse_object(arena, depth + 1),
            Some(_) => Err(self.error(ParseErrorKind::UnexpectedToken)),
        }
    }

    fn expect_literal(&mut self, literal: &[u8]) -> Result<(), Error> {
        let rest = &self.input[self.pos..];
        if rest.starts_with(literal) {
            self.pos += literal.len();
            return Ok(());
        }
        let matched = rest
            .iter()
            .zip(literal)
            .take_while(|(actual, expected)| actual == expected)
            .count();
        let kind = if matched == rest.len() {
            ParseErrorKind::UnexpectedEnd
        } else {
            ParseErrorKind::UnexpectedToken
        };
        Err(error_at(kind, self.pos + matched))
    }

    fn parse_array(&mut self, arena: &mut Arena, depth: usize) -> Result<NodeId, Error> {
        if depth > self.max_depth {
            return Err(self.error(ParseErrorKind::DepthLimitExceeded));
        }
        let array = arena.create_array()?;
        match self.parse_items(arena, array, depth) {
            Ok(()) => Ok(array),
            Err(error) => {
                arena.free_tree(array);
                Err(error)
            }
        }
    }

    fn parse_items(&mut self, arena: &mut Arena, array: NodeId, depth: usize) -> Result<(), Error> {
        self.pos += 1; // '['
        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(());
        }
        loop {
            self.skip_whitespace();
            let item = self.parse_value(arena, depth)?;
            arena.link_last(array, item);
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(_) => return Err(self.error(ParseErrorKind::UnexpectedToken)),
                None => return Err(self.error(ParseErrorKind::UnexpectedEnd)),
            }
        }
    }

    fn parse_object(&mut self, arena: &mut Arena, depth: usize) -> Result<NodeId, Error> {
        if depth > self.max_depth {
            return Err(self.error(ParseErrorKind::DepthLimitExceeded));
        }
        let object = arena.create_object()?;
        match self.parse_members(arena, object, depth) {
            Ok(()) => Ok(object),
            Err(error) => {
                arena.free_tree(object);
                Err(error)
            }
        }
    }

    fn parse_members(
        &mut self,
        arena: &mut Arena,
        object: NodeId,
        depth: usize,
    ) -> Result<(), Error> {
        self.pos += 1; // '{'
        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(());
        }
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b'"') => {}
                Some(_) => return Err(self.error(ParseErrorKind::UnexpectedToken)),
                None => return Err(self.error(ParseErrorKind::UnexpectedEnd)),
            }
            let key = self.parse_string()?;
            self.skip_whitespace();
            self.expect(b':')?;
            self.skip_whitespace();
            let member = self.parse_value(arena, depth)?;
            if let Err(error) = arena.set_key(member, Cow::Owned(key)) {
                arena.free_tree(member);
                return Err(error);
            }
            arena.link_last(object, member);
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(_) => return Err(self.error(ParseErrorKind::UnexpectedToken)),
                None => return Err(self.error(ParseErrorKind::UnexpectedEnd)),
            }
        }
    }

    fn parse_string(&mut self) -> Result<String, Error> {
        self.pos += 1; // '"'
        let mut out = Vec::new();
        loop {
            let start = self.pos;
            while matches!(self.peek(), Some(byte) if byte != b'"' && byte != b'\\' && byte >= 0x20)
            {
                self.pos += 1;
            }
            let run = &self.input[start..self.pos];
            if let Err(error) = std::str::from_utf8(run) {
                return Err(error_at(ParseErrorKind::InvalidUtf8, start + error.valid_up_to()));
            }
            out.extend_from_slice(run);
            match self.peek() {
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => self.parse_escape(&mut out)?,
                Some(_) => return Err(self.error(ParseErrorKind::ControlCharacter)),
                None => return Err(self.error(ParseErrorKind::UnexpectedEnd)),
            }
        }
        // Every run was validated and escapes produce whole characters.
        String::from_utf8(out).map_err(|_| self.error(ParseErrorKind::InvalidUtf8))
    }

    fn parse_escape(&mut self, out: &mut Vec<u8>) -> Result<(), Error> {
        let start = self.pos;
        self.pos += 1; // '\\'
        let Some(escape) = self.peek() else {
            return Err(self.error(ParseErrorKind::UnexpectedEnd));
        };
        self.pos += 1;
        let byte = match escape {
            b'"' => b'"',
            b'\\' => b'\\',
            b'/' => b'/',
            b'b' => 0x08,
            b'f' => 0x0C,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'u' => {
                let ch = self.parse_unicode_escape(start)?;
                let mut buffer = [0; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buffer).as_bytes());
                return Ok(());
            }
            _ => return Err(error_at(ParseErrorKind::InvalidEscape, start)),
        };
        out.push(byte);
        Ok(())
    }

    /// Decode the code point of a `\uXXXX` escape whose `\u` starts at `start`, consuming a
    /// second escape for surrogate pairs.
    fn parse_unicode_escape(&mut self, start: usize) -> Result<char, Error> {
        let first = self.parse_hex4()?;
        let code = match first {
            0xDC00..=0xDFFF => {
                return Err(error_at(ParseErrorKind::UnpairedSurrogate, start));
            }
            0xD800..=0xDBFF => {
                if !self.input[self.pos..].starts_with(b"\\u") {
                    return Err(error_at(ParseErrorKind::UnpairedSurrogate, start));
                }
                self.pos += 2;
                let second = self.parse_hex4()?;
                if !(0xDC00..=0xDFFF).contains(&second) {
                    return Err(error_at(ParseErrorKind::UnpairedSurrogate, start));
                }
                0x10000 + ((u32::from(first) - 0xD800) << 10) + (u32::from(second) - 0xDC00)
            }
            _ => u32::from(first),
        };
        char::from_u32(code).ok_or_else(|| error_at(ParseErrorKind::InvalidUnicodeEscape, start))
    }

    fn parse_hex4(&mut self) -> Result<u16, Error> {
        let mut value: u16 = 0;
        for _ in 0..4 {
            let digit = match self.peek() {
                Some(byte @ b'0'..=b'9') => byte - b'0',
                Some(byte @ b'a'..=b'f') => byte - b'a' + 10,
                Some(byte @ b'A'..=b'F') => byte - b'A' + 10,
                Some(_) => return Err(self.error(ParseErrorKind::InvalidUnicodeEscape)),
                None => return Err(self.error(ParseErrorKind::UnexpectedEnd)),
            };
            value = (value << 4) | u16::from(digit);
            self.pos += 1;
        }
        Ok(value)
    }

    fn skip_digits(&mut self) -> usize {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        self.pos - start
    }

    fn parse_number(&mut self) -> Result<Number, Error> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        match self.peek() {
            Some(b'0') => self.pos += 1,
            Some(b'1'..=b'9') => {
                self.skip_digits();
            }
            _ => return Err(self.error(ParseErrorKind::InvalidNumber)),
        }
        let mut integral = true;
        if self.peek() == Some(b'.') {
            integral = false;
            self.pos += 1;
            if self.skip_digits() == 0 {
                return Err(self.error(ParseErrorKind::InvalidNumber));
            }
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            integral = false;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if self.skip_digits() == 0 {
                return Err(self.error(ParseErrorKind::InvalidNumber));
            }
        }
        std::str::from_utf8(&self.input[start..self.pos])
            .ok()
            .and_then(|literal| Number::from_literal(literal, integral))
            .ok_or_else(|| error_at(ParseErrorKind::InvalidNumber, start))
    }
}

fn error_at(kind: ParseErrorKind, offset: usize) -> Error {
    ParseError::new(kind, offset).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Kind;
    use test_case::test_case;

    fn parse_error(input: &str) -> ParseError {
        let mut arena = Arena::new();
        let options = ParseOptions::new().require_null_terminated(true);
        match arena.parse_with_opts(input.as_bytes(), &options) {
            Err(Error::Parse(error)) => {
                assert!(arena.is_empty(), "Partial tree leaked for {input:?}");
                error
            }
            other => panic!("Expected a parse error for {input:?}, got {other:?}"),
        }
    }

    #[test_case("null", Kind::Null)]
    #[test_case("true", Kind::True)]
    #[test_case("false", Kind::False)]
    #[test_case("0", Kind::Number)]
    #[test_case("-1.5e3", Kind::Number)]
    #[test_case("\"text\"", Kind::String)]
    #[test_case("[]", Kind::Array)]
    #[test_case("{}", Kind::Object)]
    #[test_case(" \t\r\n[1] ", Kind::Array; "surrounding whitespace")]
    #[test_case("\u{FEFF}{}", Kind::Object; "byte order mark")]
    fn test_parse_kind(input: &str, expected: Kind) {
        let mut arena = Arena::new();
        let root = arena.parse(input).expect("Valid JSON");
        assert_eq!(arena.kind(root), expected);
    }

    #[test_case("", ParseErrorKind::UnexpectedEnd, 0)]
    #[test_case("[1,", ParseErrorKind::UnexpectedEnd, 3)]
    #[test_case("[1 2]", ParseErrorKind::UnexpectedToken, 3)]
    #[test_case("{\"a\" 1}", ParseErrorKind::UnexpectedToken, 5)]
    #[test_case("{1:2}", ParseErrorKind::UnexpectedToken, 1)]
    #[test_case("nul", ParseErrorKind::UnexpectedEnd, 3)]
    #[test_case("nulx", ParseErrorKind::UnexpectedToken, 3)]
    #[test_case("\"\\x\"", ParseErrorKind::InvalidEscape, 1)]
    #[test_case("\"\\u12G4\"", ParseErrorKind::InvalidUnicodeEscape, 5)]
    #[test_case("\"\\uD800\"", ParseErrorKind::UnpairedSurrogate, 1)]
    #[test_case("\"\\uDC00\"", ParseErrorKind::UnpairedSurrogate, 1)]
    #[test_case("\"\\uD800\\u0041\"", ParseErrorKind::UnpairedSurrogate, 1)]
    #[test_case("-", ParseErrorKind::InvalidNumber, 1)]
    #[test_case("1.", ParseErrorKind::InvalidNumber, 2)]
    #[test_case("1e+", ParseErrorKind::InvalidNumber, 3)]
    #[test_case("01", ParseErrorKind::TrailingCharacters, 1)]
    #[test_case("\"a\tb\"", ParseErrorKind::ControlCharacter, 2)]
    #[test_case("[1] x", ParseErrorKind::TrailingCharacters, 4)]
    #[test_case("\"abc", ParseErrorKind::UnexpectedEnd, 4)]
    fn test_parse_errors(input: &str, kind: ParseErrorKind, offset: usize) {
        assert_eq!(parse_error(input), ParseError::new(kind, offset));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut arena = Arena::new();
        let error = arena
            .parse_bytes(b"[\"ab\xFF\"]")
            .expect_err("Invalid UTF-8");
        assert_eq!(
            error,
            Error::Parse(ParseError::new(ParseErrorKind::InvalidUtf8, 4))
        );
    }

    #[test]
    fn test_escapes() {
        let mut arena = Arena::new();
        let root = arena
            .parse(r#""\"\\\/\b\f\n\r\t\u00e9\uD83D\uDE00""#)
            .expect("Valid JSON");
        assert_eq!(arena.as_str(root), Some("\"\\/\u{8}\u{c}\n\r\t\u{e9}\u{1F600}"));
    }

    #[test]
    fn test_numbers_keep_integer_shadow() {
        let mut arena = Arena::new();
        let root = arena
            .parse("[9007199254740993, 1.0, -0, 1E2, 123456789012345678901234567890]")
            .expect("Valid JSON");
        let shadows: Vec<_> = arena.items(root).map(|item| arena.as_i64(item)).collect();
        assert_eq!(shadows, [Some(9_007_199_254_740_993), None, Some(0), None, None]);
        let big = arena.array_item(root, 4).expect("Item exists");
        assert_eq!(
            arena.as_number(big),
            "123456789012345678901234567890".parse::<f64>().ok()
        );
    }

    #[test]
    fn test_trailing_data_is_ignored_by_default() {
        let mut arena = Arena::new();
        let (root, end) = arena
            .parse_with_opts(b"[1] x", &ParseOptions::default())
            .expect("Trailing data is allowed");
        assert!(arena.is_array(root));
        assert_eq!(end, 3);
    }

    #[test]
    fn test_end_offset_with_null_termination() {
        let mut arena = Arena::new();
        let options = ParseOptions::new().require_null_terminated(true);
        let (_, end) = arena
            .parse_with_opts(b"{\"a\":1}  ", &options)
            .expect("Valid JSON");
        assert_eq!(end, 9);
        let (_, end) = arena
            .parse_with_opts(b"[1] \0garbage", &options.clone().length(Some(12)))
            .expect("NUL terminates the document");
        assert_eq!(end, 4);
    }

    #[test]
    fn test_input_stops_at_nul_without_length() {
        let mut arena = Arena::new();
        let (root, end) = arena
            .parse_with_opts(b"[1]\0[2]", &ParseOptions::new().require_null_terminated(true))
            .expect("Input ends at NUL");
        assert_eq!(arena.array_size(root), 1);
        assert_eq!(end, 3);
    }

    #[test]
    fn test_length_limits_input() {
        let mut arena = Arena::new();
        let error = arena
            .parse_with_opts(b"[1, 2]", &ParseOptions::new().length(Some(4)))
            .expect_err("Truncated input");
        assert_eq!(
            error,
            Error::Parse(ParseError::new(ParseErrorKind::UnexpectedEnd, 4))
        );
    }

    #[test]
    fn test_depth_limit() {
        let mut arena = Arena::new();
        let nested = format!("{}{}", "[".repeat(NESTING_LIMIT), "]".repeat(NESTING_LIMIT));
        arena.parse(&nested).expect("Exactly at the limit");
        let too_deep = format!("[{nested}]");
        let error = arena.parse(&too_deep).expect_err("Too deep");
        assert_eq!(
            error,
            Error::Parse(ParseError::new(
                ParseErrorKind::DepthLimitExceeded,
                NESTING_LIMIT
            ))
        );
        let shallow = ParseOptions::new().max_depth(1);
        assert!(arena.parse_with_opts(b"[[]]", &shallow).is_err());
        assert!(arena.parse_with_opts(b"[{}, []]", &shallow).is_err());
        assert!(arena.parse_with_opts(b"[1, 2]", &shallow).is_ok());
    }

    #[test]
    fn test_allow_comments() {
        let mut arena = Arena::new();
        let input = b"{ /* note */ \"a\": 1, // more\n \"b\": \"// kept\" }";
        assert!(arena.parse_bytes(input).is_err());
        let (root, _) = arena
            .parse_with_opts(input, &ParseOptions::new().allow_comments(true))
            .expect("Comments are stripped");
        assert_eq!(
            arena.as_str(arena.object_item(root, "b").expect("Member exists")),
            Some("// kept")
        );
    }

    #[test]
    fn test_duplicate_keys_are_kept_in_order() {
        let mut arena = Arena::new();
        let root = arena.parse(r#"{"a":1,"a":2}"#).expect("Valid JSON");
        assert_eq!(arena.array_size(root), 2);
        let first = arena.object_item(root, "a").expect("Member exists");
        assert_eq!(arena.as_i64(first), Some(1));
    }
}
