//! Serialization of trees back to JSON text.
mod display;
mod sink;

use core::fmt::{self, Write};

pub use display::JsonAdapter;
use sink::{Fixed, Growable};

use crate::{node::Payload, Arena, Error, Items, NodeId, CIRCULAR_LIMIT};

/// Initial buffer size for [`Arena::print_pretty`], [`Arena::print_compact`] and
/// [`Arena::print_with`].
const DEFAULT_BUFFER_SIZE: usize = 256;

/// Options for [`Arena::print_with`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrintOptions {
    pretty: bool,
    escape_forward_slash: bool,
    ensure_ascii: bool,
}

impl PrintOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Indent object members with tabs and put spaces after `:` and `,`.
    #[must_use]
    pub fn pretty(mut self, yes: bool) -> Self {
        self.pretty = yes;
        self
    }
    /// Write `/` as `\/` inside strings.
    #[must_use]
    pub fn escape_forward_slash(mut self, yes: bool) -> Self {
        self.escape_forward_slash = yes;
        self
    }
    /// Write every non-ASCII character as a `\uXXXX` escape.
    #[must_use]
    pub fn ensure_ascii(mut self, yes: bool) -> Self {
        self.ensure_ascii = yes;
        self
    }
}

impl Arena {
    /// Print `id` with indentation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNode`] for stale handles and dangling references,
    /// [`Error::DepthLimit`] when a single path follows more reference edges than the circular
    /// reference limit (which is how circular structures end), and [`Error::Allocation`] if the
    /// hooks refuse the output buffer. Owned nesting is not limited.
    pub fn print_pretty(&self, id: NodeId) -> Result<String, Error> {
        self.print_with(id, &PrintOptions::new().pretty(true))
    }

    /// Print `id` without any whitespace.
    ///
    /// # Errors
    ///
    /// Same as [`Arena::print_pretty`].
    pub fn print_compact(&self, id: NodeId) -> Result<String, Error> {
        self.print_with(id, &PrintOptions::new())
    }

    /// Print `id` according to `options`.
    ///
    /// # Errors
    ///
    /// Same as [`Arena::print_pretty`].
    pub fn print_with(&self, id: NodeId, options: &PrintOptions) -> Result<String, Error> {
        let mut sink = Growable::new(self.hooks(), DEFAULT_BUFFER_SIZE, true)?;
        let result = Printer::new(self, &mut sink, options).run(id);
        let failure = sink.failure.take();
        finish(result, failure)?;
        Ok(sink.into_string())
    }

    /// Print `id` into a buffer that starts at `initial_capacity` bytes.
    ///
    /// With `grow` set the buffer doubles whenever it runs out of room, otherwise the print
    /// fails once the initial capacity is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferFull`] when the output does not fit and growing is disabled. See
    /// [`Arena::print_pretty`] for the other failures.
    pub fn print_buffered(
        &self,
        id: NodeId,
        initial_capacity: usize,
        grow: bool,
        pretty: bool,
    ) -> Result<String, Error> {
        let mut sink = Growable::new(self.hooks(), initial_capacity, grow)?;
        let options = PrintOptions::new().pretty(pretty);
        let result = Printer::new(self, &mut sink, &options).run(id);
        let failure = sink.failure.take();
        finish(result, failure)?;
        Ok(sink.into_string())
    }

    /// Print `id` into `buffer` and return the number of bytes written.
    ///
    /// Nothing is ever written past the end of `buffer`. On failure its contents are
    /// unspecified.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferFull`] when the output does not fit. See [`Arena::print_pretty`]
    /// for the other failures.
    pub fn print_preallocated(
        &self,
        id: NodeId,
        buffer: &mut [u8],
        pretty: bool,
    ) -> Result<usize, Error> {
        let mut sink = Fixed::new(buffer);
        let options = PrintOptions::new().pretty(pretty);
        let result = Printer::new(self, &mut sink, &options).run(id);
        finish(result, sink.failure.take())?;
        Ok(sink.len)
    }

    /// A [`Display`](fmt::Display) adapter for `id`.
    ///
    /// Formats the compact form; the alternate flag (`{:#}`) selects the pretty form.
    #[must_use]
    pub fn display(&self, id: NodeId) -> JsonAdapter<'_> {
        JsonAdapter::new(self, id)
    }
}

/// Pick the error that stopped the printer: its own, or the one its sink recorded.
fn finish(result: Result<(), Failure>, sink_failure: Option<Error>) -> Result<(), Error> {
    match result {
        Ok(()) => Ok(()),
        Err(Failure::Tree(error)) => Err(error),
        Err(Failure::Sink) => Err(sink_failure.unwrap_or(Error::BufferFull { capacity: 0 })),
    }
}

/// Why a print stopped.
pub(crate) enum Failure {
    /// The tree cannot be printed.
    Tree(Error),
    /// The output did not accept more text.
    Sink,
}

impl From<fmt::Error> for Failure {
    fn from(_: fmt::Error) -> Self {
        Failure::Sink
    }
}

pub(crate) struct Printer<'a, W> {
    arena: &'a Arena,
    out: W,
    pretty: bool,
    escape_forward_slash: bool,
    ensure_ascii: bool,
}

/// A container whose children are being printed.
struct Level<'a> {
    items: Items<'a>,
    object: bool,
    /// Nesting of the container, 1 for the outermost one.
    depth: usize,
    /// Reference edges followed on the way to the container.
    references: usize,
    empty: bool,
}

impl<'a, W: Write> Printer<'a, W> {
    pub(crate) fn new(arena: &'a Arena, out: W, options: &PrintOptions) -> Self {
        Printer {
            arena,
            out,
            pretty: options.pretty,
            escape_forward_slash: options.escape_forward_slash,
            ensure_ascii: options.ensure_ascii,
        }
    }

    /// Print the tree under `id`, keeping open containers on an explicit stack.
    pub(crate) fn run(mut self, id: NodeId) -> Result<(), Failure> {
        let mut stack = Vec::new();
        stack.extend(self.write_value(id, 0, 0)?);
        while let Some(level) = stack.last_mut() {
            let (object, depth, references) = (level.object, level.depth, level.references);
            let Some(item) = level.items.next() else {
                let empty = level.empty;
                stack.pop();
                self.close(object, depth, empty)?;
                continue;
            };
            let first = std::mem::replace(&mut level.empty, false);
            if object {
                self.write_member_prefix(item, depth, first)?;
            } else if !first {
                self.out.write_str(if self.pretty { ", " } else { "," })?;
            }
            stack.extend(self.write_value(item, depth, references)?);
        }
        Ok(())
    }

    /// Write a scalar, or open a container and return it for its children to be printed.
    fn write_value(
        &mut self,
        id: NodeId,
        depth: usize,
        references: usize,
    ) -> Result<Option<Level<'a>>, Failure> {
        let arena = self.arena;
        let references = references + usize::from(arena.is_reference_node(id));
        if references > CIRCULAR_LIMIT {
            log::trace!("Printing stopped after {references} reference edges");
            return Err(Failure::Tree(Error::DepthLimit {
                limit: CIRCULAR_LIMIT,
            }));
        }
        let Some(node) = arena.resolved(id) else {
            return Err(Failure::Tree(Error::InvalidNode));
        };
        let object = match &node.payload {
            Payload::Null => return self.scalar("null"),
            Payload::False => return self.scalar("false"),
            Payload::True => return self.scalar("true"),
            Payload::Number(number) => {
                number.write(&mut self.out)?;
                return Ok(None);
            }
            Payload::String(text) => {
                self.write_string(text)?;
                return Ok(None);
            }
            Payload::Raw(text) => return self.scalar(text),
            Payload::Array => false,
            Payload::Object => true,
            // `resolved` never yields a reference
            Payload::Reference(_) => return Err(Failure::Tree(Error::InvalidNode)),
        };
        self.out.write_char(if object { '{' } else { '[' })?;
        Ok(Some(Level {
            items: arena.items(id),
            object,
            depth: depth + 1,
            references,
            empty: true,
        }))
    }

    fn scalar(&mut self, text: &str) -> Result<Option<Level<'a>>, Failure> {
        self.out.write_str(text)?;
        Ok(None)
    }

    fn write_member_prefix(&mut self, member: NodeId, depth: usize, first: bool) -> fmt::Result {
        if !first {
            self.out.write_char(',')?;
        }
        if self.pretty {
            self.out.write_char('\n')?;
            self.indent(depth)?;
        }
        let arena = self.arena;
        self.write_string(arena.key(member).unwrap_or_default())?;
        self.out.write_str(if self.pretty { ": " } else { ":" })
    }

    fn close(&mut self, object: bool, depth: usize, empty: bool) -> fmt::Result {
        if !object {
            return self.out.write_char(']');
        }
        if self.pretty && !empty {
            self.out.write_char('\n')?;
            self.indent(depth - 1)?;
        }
        self.out.write_char('}')
    }

    fn indent(&mut self, depth: usize) -> fmt::Result {
        for _ in 0..depth {
            self.out.write_char('\t')?;
        }
        Ok(())
    }

    fn write_string(&mut self, text: &str) -> fmt::Result {
        self.out.write_char('"')?;
        let mut start = 0;
        for (index, ch) in text.char_indices() {
            let escape = match ch {
                '"' => "\\\"",
                '\\' => "\\\\",
                '\u{8}' => "\\b",
                '\u{c}' => "\\f",
                '\n' => "\\n",
                '\r' => "\\r",
                '\t' => "\\t",
                '/' if self.escape_forward_slash => "\\/",
                _ if ch < ' ' || (self.ensure_ascii && !ch.is_ascii()) => "",
                _ => continue,
            };
            self.out.write_str(&text[start..index])?;
            start = index + ch.len_utf8();
            if escape.is_empty() {
                let mut units = [0_u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    write!(self.out, "\\u{unit:04x}")?;
                }
            } else {
                self.out.write_str(escape)?;
            }
        }
        self.out.write_str(&text[start..])?;
        self.out.write_char('"')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn parsed(input: &str) -> (Arena, NodeId) {
        let mut arena = Arena::new();
        let root = arena.parse(input).expect("Valid JSON");
        (arena, root)
    }

    #[test_case("null", "null")]
    #[test_case("[]", "[]")]
    #[test_case("{}", "{}")]
    #[test_case("[1, 2.5, -3e-7]", "[1,2.5,-3e-7]")]
    #[test_case(r#"{ "a" : [ true, false, null ] }"#, r#"{"a":[true,false,null]}"#)]
    #[test_case(r#""tab\tquote\"slash/""#, r#""tab\tquote\"slash/""#)]
    #[test_case(r#""\u0001\u001f""#, r#""\u0001\u001f""#)]
    #[test_case(r#""héllo""#, r#""héllo""#)]
    fn test_compact(input: &str, expected: &str) {
        let (arena, root) = parsed(input);
        assert_eq!(arena.print_compact(root).expect("Printable"), expected);
    }

    #[test]
    fn test_pretty() {
        let (arena, root) = parsed(r#"{"a":1,"b":[1,2],"c":{"d":null},"e":{},"f":[{"g":true}]}"#);
        assert_eq!(
            arena.print_pretty(root).expect("Printable"),
            "{\n\t\"a\": 1,\n\t\"b\": [1, 2],\n\t\"c\": {\n\t\t\"d\": null\n\t},\n\t\"e\": {},\n\t\"f\": [{\n\t\t\t\"g\": true\n\t\t}]\n}"
        );
    }

    #[test]
    fn test_options() {
        let (arena, root) = parsed(r#""a/é😀""#);
        let options = PrintOptions::new()
            .escape_forward_slash(true)
            .ensure_ascii(true);
        assert_eq!(
            arena.print_with(root, &options).expect("Printable"),
            r#""a\/\u00e9\ud83d\ude00""#
        );
    }

    #[test]
    fn test_raw_is_verbatim() {
        let mut arena = Arena::new();
        let array = arena.create_array().expect("Allocation succeeds");
        let raw = arena.create_raw("{\"pre\": \"formatted\"}").expect("Allocation succeeds");
        assert!(arena.add_item_to_array(array, raw));
        assert_eq!(
            arena.print_compact(array).expect("Printable"),
            "[{\"pre\": \"formatted\"}]"
        );
    }

    #[test]
    fn test_non_finite_numbers_print_as_zero() {
        let mut arena = Arena::new();
        let array = arena
            .create_double_array(&[f64::NAN, f64::INFINITY, 1.5])
            .expect("Allocation succeeds");
        assert_eq!(arena.print_compact(array).expect("Printable"), "[0,0,1.5]");
    }

    #[test]
    fn test_references_print_their_target() {
        let mut arena = Arena::new();
        let target = arena.parse(r#"{"x":[1]}"#).expect("Valid JSON");
        let holder = arena.create_array().expect("Allocation succeeds");
        assert!(arena.add_item_reference_to_array(holder, target));
        assert!(arena.add_item_reference_to_array(holder, target));
        assert_eq!(
            arena.print_compact(holder).expect("Printable"),
            r#"[{"x":[1]},{"x":[1]}]"#
        );
        arena.delete(target);
        assert_eq!(arena.print_compact(holder), Err(Error::InvalidNode));
    }

    #[test]
    fn test_circular_reference_fails() {
        let mut arena = Arena::new();
        let object = arena.create_object().expect("Allocation succeeds");
        assert!(arena.add_item_reference_to_object(object, "self", object));
        assert_eq!(
            arena.print_compact(object),
            Err(Error::DepthLimit {
                limit: CIRCULAR_LIMIT
            })
        );
    }

    #[test]
    fn test_stale_handle() {
        let mut arena = Arena::new();
        let null = arena.create_null().expect("Allocation succeeds");
        arena.delete(null);
        assert_eq!(arena.print_compact(null), Err(Error::InvalidNode));
    }

    #[test]
    fn test_buffered() {
        let (arena, root) = parsed("[1,2,3,4,5,6,7,8,9,10]");
        assert_eq!(
            arena.print_buffered(root, 1, true, false).expect("Grows"),
            "[1,2,3,4,5,6,7,8,9,10]"
        );
        assert_eq!(
            arena.print_buffered(root, 4, false, false),
            Err(Error::BufferFull { capacity: 4 })
        );
        assert_eq!(
            arena.print_buffered(root, 64, false, true).expect("Fits"),
            "[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]"
        );
    }

    #[test]
    fn test_preallocated() {
        let (arena, root) = parsed(r#"{"key":"value"}"#);
        let expected = arena.print_compact(root).expect("Printable");
        let mut exact = vec![0_u8; expected.len()];
        assert_eq!(
            arena.print_preallocated(root, &mut exact, false),
            Ok(expected.len())
        );
        assert_eq!(exact, expected.as_bytes());
        let mut short = vec![0_u8; expected.len() - 1];
        assert_eq!(
            arena.print_preallocated(root, &mut short, false),
            Err(Error::BufferFull {
                capacity: expected.len() - 1
            })
        );
    }

    #[test]
    fn test_display() {
        let (arena, root) = parsed(r#"{"a":[1,2]}"#);
        assert_eq!(arena.display(root).to_string(), r#"{"a":[1,2]}"#);
        assert_eq!(format!("{:#}", arena.display(root)), "{\n\t\"a\": [1, 2]\n}");
    }

    #[test]
    fn test_deep_trees_print_without_limit() {
        const DEPTH: usize = 2000;
        let mut arena = Arena::new();
        let mut deep = arena.create_array().expect("Allocation succeeds");
        for index in 1..DEPTH {
            let outer = if index % 2 == 0 {
                let outer = arena.create_array().expect("Allocation succeeds");
                assert!(arena.add_item_to_array(outer, deep));
                outer
            } else {
                let outer = arena.create_object().expect("Allocation succeeds");
                assert!(arena.add_item_to_object(outer, "k", deep));
                outer
            };
            deep = outer;
        }
        let printed = arena.print_compact(deep).expect("Printable");
        // Half of the levels are `{"k":...}`, the other half `[...]`.
        assert_eq!(printed.len(), DEPTH / 2 * 6 + DEPTH / 2 * 2);
        assert!(printed.starts_with(r#"{"k":[{"k":["#));
        assert!(printed.ends_with("[]}]}"));
        let pretty = arena.print_pretty(deep).expect("Printable");
        assert!(pretty.ends_with("\n}"));
    }
}
