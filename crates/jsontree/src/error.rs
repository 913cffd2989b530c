use core::fmt;

/// Errors produced by arena operations, the parser and the printer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The allocator hooks refused to provide `requested` bytes.
    Allocation { requested: usize },
    /// The input is not valid JSON.
    Parse(ParseError),
    /// The output does not fit into a fixed-size buffer.
    BufferFull { capacity: usize },
    /// A traversal went deeper than `limit` levels, usually through circular references.
    DepthLimit { limit: usize },
    /// The handle does not point to a live node.
    InvalidNode,
    /// Process-wide allocator hooks can be installed only once.
    HooksAlreadyInstalled,
}

impl Error {
    /// Offset of a parse failure, if this is a parse error.
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::Parse(error) => Some(error.offset),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Allocation { requested } => {
                write!(f, "Allocator hooks refused to allocate {requested} bytes")
            }
            Error::Parse(error) => error.fmt(f),
            Error::BufferFull { capacity } => {
                write!(f, "Output does not fit into a buffer of {capacity} bytes")
            }
            Error::DepthLimit { limit } => {
                write!(f, "Nesting depth exceeds the limit of {limit}")
            }
            Error::InvalidNode => f.write_str("Node handle is stale or invalid"),
            Error::HooksAlreadyInstalled => f.write_str("Allocator hooks are already installed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(error) => Some(error),
            _ => None,
        }
    }
}

impl From<ParseError> for Error {
    fn from(error: ParseError) -> Self {
        Error::Parse(error)
    }
}

/// A syntax error with the byte offset it was detected at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub offset: usize,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, offset: usize) -> ParseError {
        ParseError { kind, offset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    UnexpectedEnd,
    UnexpectedToken,
    InvalidEscape,
    InvalidUnicodeEscape,
    UnpairedSurrogate,
    InvalidNumber,
    InvalidUtf8,
    ControlCharacter,
    TrailingCharacters,
    DepthLimitExceeded,
}

impl ParseErrorKind {
    fn description(self) -> &'static str {
        match self {
            ParseErrorKind::UnexpectedEnd => "unexpected end of input",
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::InvalidEscape => "invalid escape sequence",
            ParseErrorKind::InvalidUnicodeEscape => "invalid unicode escape",
            ParseErrorKind::UnpairedSurrogate => "unpaired UTF-16 surrogate",
            ParseErrorKind::InvalidNumber => "invalid number",
            ParseErrorKind::InvalidUtf8 => "invalid UTF-8 in string",
            ParseErrorKind::ControlCharacter => "control character in string",
            ParseErrorKind::TrailingCharacters => "trailing characters after value",
            ParseErrorKind::DepthLimitExceeded => "nesting too deep",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.kind, self.offset)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(
        Error::Allocation { requested: 64 },
        "Allocator hooks refused to allocate 64 bytes"
    )]
    #[test_case(
        Error::Parse(ParseError::new(ParseErrorKind::InvalidNumber, 3)),
        "invalid number at offset 3"
    )]
    #[test_case(Error::BufferFull { capacity: 8 }, "Output does not fit into a buffer of 8 bytes")]
    #[test_case(Error::DepthLimit { limit: 1000 }, "Nesting depth exceeds the limit of 1000")]
    fn test_display(error: Error, expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn test_offset() {
        let error: Error = ParseError::new(ParseErrorKind::UnexpectedEnd, 11).into();
        assert_eq!(error.offset(), Some(11));
        assert_eq!(Error::InvalidNode.offset(), None);
    }
}
