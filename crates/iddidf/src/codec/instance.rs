//! Instance (IDF) tokenizer.
//!
//! Record blobs are stripped of inline comments, joined, then split on `;`
//! into records and on `,` into fields.

use crate::codec::blob::{extract_blobs, strip_inline_comment, Blob, SourceLine};
use crate::error::{ParseError, ParseErrorKind};
use crate::model::{Document, Entry, InstanceRecord};

/// Tokenizes one record blob into its records.
fn tokenize_record_blob(lines: &[SourceLine]) -> Result<Vec<InstanceRecord>, ParseError> {
    let mut joined = String::new();
    for line in lines {
        let code = strip_inline_comment(&line.text).trim();
        if code.is_empty() {
            continue;
        }
        if !(code.ends_with(',') || code.ends_with(';')) {
            return Err(ParseError::new(ParseErrorKind::UnterminatedInstanceLine {
                line: code.to_string(),
            })
            .at_line(line.number));
        }
        joined.push_str(code);
    }

    let records = joined
        .split(';')
        .map(|record| {
            record
                .split(',')
                .map(|token| token.trim().to_string())
                .collect::<Vec<_>>()
        })
        // a lone empty token is what follows the final `;`
        .filter(|tokens| !(tokens.len() == 1 && tokens[0].is_empty()))
        .filter_map(InstanceRecord::from_tokens)
        .collect();
    Ok(records)
}

/// Parses instance text into a document.
///
/// Comment blocks are kept as [`Entry::Comment`] in their original position.
pub fn decode_document(text: &str, descriptor: &str) -> Result<Document, ParseError> {
    let mut entries = Vec::new();
    for blob in extract_blobs(text) {
        match blob {
            Blob::Comment(lines) => entries.push(Entry::Comment(lines)),
            Blob::Record(lines) => entries.extend(
                tokenize_record_blob(&lines)?
                    .into_iter()
                    .map(Entry::Record),
            ),
        }
    }
    Document::from_entries(descriptor, entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{VersionNumber, UNKNOWN_VERSION};

    fn parse(text: &str) -> Result<Document, ParseError> {
        decode_document(text, "/string/idf/snippet")
    }

    #[test]
    fn test_single_line_document() {
        let doc = parse("Version,12.9;MyObject,1,1,1;MyObject,1,1,1;").unwrap();
        assert_eq!(doc.record_count(), 3);
        assert_eq!(doc.version, "12.9");
        assert_eq!(doc.version_number, VersionNumber::new(12, 9));
        assert_eq!(doc.records_of_type("myobject").len(), 2);
    }

    #[test]
    fn test_multi_line_with_inline_comments() {
        let text = "
Version,
  8.6;                    !- Version Identifier

! A zone
Zone,
  Core,                   !- Name
  ,                       !- Direction
  0;                      !- X Origin
";
        let doc = parse(text).unwrap();
        assert_eq!(doc.entries.len(), 3);
        assert!(doc.entries[1].is_comment());
        let zone = doc.entries[2].as_record().unwrap();
        assert_eq!(zone.type_name, "Zone");
        assert_eq!(zone.fields, vec!["Core", "", "0"]);
    }

    #[test]
    fn test_comments_preserved_between_records() {
        let text = "
        Version,12.9;
        MyObject,1,1,1;
        ! ME COMMENT
        MyObject,1,1,1;";
        let doc = parse(text).unwrap();
        assert_eq!(doc.entries.len(), 4);
        assert_eq!(doc.entries[2], Entry::Comment(vec!["! ME COMMENT".to_string()]));
    }

    #[test]
    fn test_empty_trailing_field_kept() {
        let doc = parse("MyObject,Name,ZoneName,1,2,;").unwrap();
        let record = doc.records().next().unwrap();
        assert_eq!(record.fields.len(), 5);
        assert_eq!(record.fields[4], "");
    }

    #[test]
    fn test_line_without_terminator_fails() {
        let text = "Version,12.9;\nZone,\n  Core\n  0;\n";
        let err = parse(text).unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::UnterminatedInstanceLine {
                line: "Core".to_string()
            }
        );
        assert_eq!(err.line, Some(3));
    }

    #[test]
    fn test_missing_version_record() {
        let doc = parse("Zone,Core;").unwrap();
        assert_eq!(doc.version, UNKNOWN_VERSION);
    }

    #[test]
    fn test_bad_version_record_fails() {
        let err = parse("Version,abc;").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidDocumentVersion { .. }));
    }

    #[test]
    fn test_empty_input() {
        let doc = parse("\n  \n").unwrap();
        assert!(doc.entries.is_empty());
    }
}
