//! Span/position utilities.

/// Convert a byte offset into a 1-based (line, column) pair.
///
/// Columns count bytes, which is what editors expect for ASCII-dominated
/// source. Offsets past the end of the source land on the last position.
pub fn offset_to_line_col(source: &str, offset: u32) -> (u32, u32) {
    let offset = (offset as usize).min(source.len());
    let mut line = 1u32;
    let mut col = 1u32;

    for (i, b) in source.bytes().enumerate() {
        if i == offset {
            break;
        }
        if b == b'\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Extract the full text of the line containing `offset` (without the
/// trailing newline).
pub fn line_text(source: &str, offset: u32) -> &str {
    let offset = (offset as usize).min(source.len());
    let start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
    let end = source[offset..]
        .find('\n')
        .map_or(source.len(), |i| offset + i);
    &source[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_to_line_col() {
        let source = "ab\ncd\nef";
        assert_eq!(offset_to_line_col(source, 0), (1, 1));
        assert_eq!(offset_to_line_col(source, 1), (1, 2));
        assert_eq!(offset_to_line_col(source, 3), (2, 1));
        assert_eq!(offset_to_line_col(source, 7), (3, 2));
    }

    #[test]
    fn test_offset_past_end() {
        assert_eq!(offset_to_line_col("ab", 99), (1, 3));
    }

    #[test]
    fn test_line_text() {
        let source = "first\nsecond\nthird";
        assert_eq!(line_text(source, 0), "first");
        assert_eq!(line_text(source, 8), "second");
        assert_eq!(line_text(source, 17), "third");
    }
}
