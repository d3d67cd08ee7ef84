//! Formatted output helpers for CLI commands.

use std::fmt::Write;

use scap_event::{ParsedEvent, Parameter};

/// Number of buffer bytes shown in text output.
const PREVIEW_LEN: usize = 32;

/// Builds `len` bytes of printable test data.
#[must_use]
pub fn pattern(len: usize) -> Vec<u8> {
    b"hello scap ".iter().copied().cycle().take(len).collect()
}

/// Renders bytes as printable ASCII, escaping the rest, cut at `max` bytes.
#[must_use]
pub fn ascii_preview(bytes: &[u8], max: usize) -> String {
    let mut out = String::new();
    for &b in bytes.iter().take(max) {
        if b.is_ascii_graphic() || b == b' ' {
            out.push(char::from(b));
        } else {
            let _ = write!(out, "\\x{b:02x}");
        }
    }
    if bytes.len() > max {
        out.push_str("...");
    }
    out
}

/// Renders one event on a single line.
#[must_use]
pub fn render_event(event: &ParsedEvent<'_>) -> String {
    let header = event.header();
    let mut line = format!(
        "{} {} {} tid={}",
        header.ts_ns, header.syscall_id, header.direction, header.tid
    );
    for (slot, param) in event.schema().params.iter().zip(event.params()) {
        let value = match param {
            Parameter::Numeric { value } => value.to_string(),
            Parameter::ByteBuffer(buf) => format!(
                "({}) \"{}\"",
                buf.captured_len(),
                ascii_preview(buf.bytes(), PREVIEW_LEN)
            ),
            Parameter::Empty => "<empty>".to_owned(),
        };
        let _ = write!(line, " {}={value}", slot.name);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_repeats_to_length() {
        assert_eq!(pattern(13), b"hello scap he");
        assert!(pattern(0).is_empty());
    }

    #[test]
    fn ascii_preview_escapes_binary() {
        assert_eq!(ascii_preview(b"hi\0", 8), "hi\\x00");
    }

    #[test]
    fn ascii_preview_marks_cut() {
        assert_eq!(ascii_preview(b"abcdef", 3), "abc...");
    }
}
