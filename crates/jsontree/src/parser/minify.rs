//! In-place removal of whitespace and comments.

/// Strip whitespace plus `//` and `/* */` comments outside string literals.
///
/// A `/` outside a string that does not open a comment is dropped as well, so the result never
/// contains a comment opener that the input did not have and minifying twice changes nothing.
///
/// The buffer is compacted in place and the new logical length is returned; bytes past it are
/// left as they were. String literals, including their escapes, are copied untouched. An
/// unterminated block comment swallows the rest of the input.
pub fn minify(buffer: &mut [u8]) -> usize {
    let mut read = 0;
    let mut write = 0;
    while let Some(&byte) = buffer.get(read) {
        match byte {
            b' ' | b'\t' | b'\r' | b'\n' => read += 1,
            b'/' if buffer.get(read + 1) == Some(&b'/') => {
                read = match buffer[read + 2..].iter().position(|&b| b == b'\n') {
                    Some(position) => read + 2 + position + 1,
                    None => buffer.len(),
                };
            }
            b'/' if buffer.get(read + 1) == Some(&b'*') => {
                read = match buffer[read + 2..].windows(2).position(|pair| pair == b"*/") {
                    Some(position) => read + 2 + position + 2,
                    None => buffer.len(),
                };
            }
            // A slash that starts no comment is dropped
            b'/' => read += 1,
            b'"' => {
                let end = string_end(buffer, read);
                buffer.copy_within(read..end, write);
                write += end - read;
                read = end;
            }
            _ => {
                buffer[write] = byte;
                write += 1;
                read += 1;
            }
        }
    }
    write
}

/// Offset right after the string literal starting at `start`, or the end of the buffer.
fn string_end(buffer: &[u8], start: usize) -> usize {
    let mut position = start + 1;
    while let Some(&byte) = buffer.get(position) {
        match byte {
            b'\\' => position += 2,
            b'"' => return position + 1,
            _ => position += 1,
        }
    }
    buffer.len()
}

/// [`minify`] a byte vector and truncate it to the new length.
pub fn minify_vec(buffer: &mut Vec<u8>) {
    let len = minify(buffer);
    buffer.truncate(len);
}

/// [`minify`] a string and truncate it to the new length.
pub fn minify_str(text: &mut String) {
    let mut bytes = std::mem::take(text).into_bytes();
    minify_vec(&mut bytes);
    // Only ASCII bytes and whole comments are dropped, so the rest stays valid UTF-8.
    *text = match String::from_utf8(bytes) {
        Ok(minified) => minified,
        Err(error) => String::from_utf8_lossy(error.as_bytes()).into_owned(),
    };
}
