//! Timestamp stripping and payload sniffing for raw job logs.

/// What a log payload is, judged from its first bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Zip container (`PK` signature). Completed jobs are served this way.
    Archive,
    PlainText,
}

pub fn sniff(bytes: &[u8]) -> ContentKind {
    if bytes.starts_with(b"PK") {
        ContentKind::Archive
    } else {
        ContentKind::PlainText
    }
}

/// Strip a leading `2024-01-01T00:00:00.0000000Z ` prefix from one line.
///
/// This is a shape heuristic, not a timestamp parser: a line longer than 30
/// bytes with `-` at offsets 4 and 7 loses everything up to and including its
/// first space, provided that space sits before column 35.
pub fn strip_line(line: &str) -> &str {
    let bytes = line.as_bytes();
    if bytes.len() > 30 && bytes[4] == b'-' && bytes[7] == b'-' {
        if let Some(idx) = line.find(' ') {
            if idx > 0 && idx < 35 {
                return &line[idx + 1..];
            }
        }
    }
    line
}

/// Strip timestamps from every line, preserving line structure.
pub fn strip_timestamps(content: &str) -> String {
    content
        .split('\n')
        .map(strip_line)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_actions_timestamp() {
        assert_eq!(
            strip_line("2024-01-15T10:00:00.1234567Z Run actions/checkout@v4"),
            "Run actions/checkout@v4"
        );
    }

    #[test]
    fn short_line_unchanged() {
        assert_eq!(strip_line("2024-01-15 hello"), "2024-01-15 hello");
    }

    #[test]
    fn line_without_dashes_unchanged() {
        let line = "this line is long enough to qualify but has no date";
        assert_eq!(strip_line(line), line);
    }

    #[test]
    fn space_past_column_35_unchanged() {
        let line = "2024-01-15T10:00:00.123456789012345678Z tail";
        assert_eq!(strip_line(line), line);
    }

    #[test]
    fn strip_is_idempotent_on_plain_lines() {
        let line = "##[group]Run cargo test --workspace --all-features";
        assert_eq!(strip_line(strip_line(line)), strip_line(line));
        let ts = "2024-01-15T10:00:00.1234567Z cargo test --workspace";
        assert_eq!(strip_line(strip_line(ts)), strip_line(ts));
    }

    #[test]
    fn multibyte_line_does_not_panic() {
        let line = "ééééééééééééééééééééééééééééééé ok";
        assert_eq!(strip_line(line), line);
    }

    #[test]
    fn strip_timestamps_keeps_lines() {
        let raw = "2024-01-15T10:00:00.1234567Z a\n\n2024-01-15T10:00:01.1234567Z b\n";
        assert_eq!(strip_timestamps(raw), "a\n\nb\n");
    }

    #[test]
    fn sniff_detects_zip() {
        assert_eq!(sniff(b"PK\x03\x04rest"), ContentKind::Archive);
        assert_eq!(sniff(b"plain log"), ContentKind::PlainText);
        assert_eq!(sniff(b""), ContentKind::PlainText);
        assert_eq!(sniff(b"P"), ContentKind::PlainText);
    }
}
