//! Line-oriented grouping of instance text into comment and record runs.

/// A trimmed, non-blank input line with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub number: usize,
    pub text: String,
}

/// A contiguous run of lines of one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Blob {
    /// Consecutive `!` lines, trimmed.
    Comment(Vec<String>),
    /// Record lines up to and including the one carrying a `;` terminator.
    Record(Vec<SourceLine>),
}

/// Text before the first `!`, or the whole line.
pub(crate) fn strip_inline_comment(line: &str) -> &str {
    match line.find('!') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn closes_record(line: &str) -> bool {
    strip_inline_comment(line).contains(';')
}

/// Splits instance text into blobs.
///
/// Blank lines are dropped. A comment line met while a record blob is
/// still open is discarded rather than merged. A trailing unterminated
/// record blob is returned as-is.
pub fn extract_blobs(text: &str) -> Vec<Blob> {
    let mut blobs = Vec::new();
    let mut current: Option<Blob> = None;

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('!') {
            match &mut current {
                None => current = Some(Blob::Comment(vec![line.to_string()])),
                Some(Blob::Comment(lines)) => lines.push(line.to_string()),
                Some(Blob::Record(_)) => {}
            }
            continue;
        }

        let source = SourceLine {
            number: index + 1,
            text: line.to_string(),
        };
        match current.take() {
            Some(Blob::Record(mut lines)) => {
                lines.push(source);
                current = Some(Blob::Record(lines));
            }
            other => {
                if let Some(comment) = other {
                    blobs.push(comment);
                }
                current = Some(Blob::Record(vec![source]));
            }
        }
        if closes_record(line) {
            blobs.extend(current.take());
        }
    }

    blobs.extend(current);
    blobs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_texts(blob: &Blob) -> Vec<&str> {
        match blob {
            Blob::Record(lines) => lines.iter().map(|l| l.text.as_str()).collect(),
            Blob::Comment(_) => panic!("expected a record blob"),
        }
    }

    #[test]
    fn test_one_liner_records() {
        let blobs = extract_blobs("Version,12.9;MyObject,1,1,1;\n");
        assert_eq!(blobs.len(), 1);
        assert_eq!(record_texts(&blobs[0]), vec!["Version,12.9;MyObject,1,1,1;"]);
    }

    #[test]
    fn test_comments_and_records_alternate() {
        let text = "
! header one
! header two

Zone,
  Core,   ! name
  0;      ! origin
! trailer
";
        let blobs = extract_blobs(text);
        assert_eq!(blobs.len(), 3);
        assert_eq!(
            blobs[0],
            Blob::Comment(vec!["! header one".to_string(), "! header two".to_string()])
        );
        assert_eq!(record_texts(&blobs[1]), vec!["Zone,", "Core,   ! name", "0;      ! origin"]);
        if let Blob::Record(lines) = &blobs[1] {
            assert_eq!(lines[0].number, 5);
        }
        assert_eq!(blobs[2], Blob::Comment(vec!["! trailer".to_string()]));
    }

    #[test]
    fn test_comment_inside_open_record_is_dropped() {
        let text = "Zone,\n! lost\n  Core;\n";
        let blobs = extract_blobs(text);
        assert_eq!(blobs.len(), 1);
        assert_eq!(record_texts(&blobs[0]), vec!["Zone,", "Core;"]);
    }

    #[test]
    fn test_semicolon_in_comment_does_not_close() {
        let text = "Zone, ! not; closed\n  Core;\n";
        let blobs = extract_blobs(text);
        assert_eq!(blobs.len(), 1);
        assert_eq!(record_texts(&blobs[0]).len(), 2);
    }

    #[test]
    fn test_unterminated_tail_is_flushed() {
        let blobs = extract_blobs("Zone,\n  Core,\n");
        assert_eq!(blobs.len(), 1);
        assert_eq!(record_texts(&blobs[0]), vec!["Zone,", "Core,"]);
    }
}
