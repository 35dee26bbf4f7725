//! Error types for dictionary/instance parsing and file access.
//!
//! Parsing is fail-fast: the first problem aborts the pass and is reported
//! as a [`ParseError`]. Validation never produces these errors; it returns
//! [`ValidationIssue`](crate::validate::ValidationIssue) values instead.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// What went wrong while parsing dictionary or instance text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    // === Dictionary grammar ===
    #[error("group keyword not found where expected in group declaration")]
    InvalidGroupDeclaration,

    #[error("record type name was not terminated by a comma or semicolon")]
    UnterminatedTypeName,

    #[error("blank or unterminated field identifier")]
    UnterminatedFieldIdentifier,

    #[error("invalid field identifier {identifier:?}, expected A<n> or N<n>")]
    InvalidFieldIdentifier { identifier: String },

    #[error("unrecognized object flag {flag:?}")]
    UnknownObjectFlag { flag: String },

    #[error("repeated object flag {flag:?}")]
    RepeatedObjectFlag { flag: String },

    #[error("unrecognized field flag in {line:?}")]
    UnknownFieldFlag { line: String },

    #[error("expected a space after field flag {flag:?} before its data")]
    MissingFlagSeparator { flag: String },

    #[error("non-numeric \\min-fields value {value:?}")]
    NonNumericMinFields { value: String },

    #[error("found version {value:?}, but it is not a numeric major.minor value")]
    InvalidVersion { value: String },

    #[error("dictionary did not include both IDD_Version and IDD_BUILD headers")]
    MissingVersionHeaders,

    // === Instance grammar ===
    #[error("instance line doesn't end with comma/semicolon\nline:{line:?}")]
    UnterminatedInstanceLine { line: String },

    #[error("found document version {value:?}, but it is not a numeric major.minor value")]
    InvalidDocumentVersion { value: String },
}

/// A grammar failure with the location it was detected at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// 1-based line number, when known.
    pub line: Option<usize>,
    /// Record type being assembled when the error was raised, when known.
    pub type_name: Option<String>,
}

impl ParseError {
    /// Creates an error without location context.
    pub fn new(kind: ParseErrorKind) -> Self {
        Self {
            kind,
            line: None,
            type_name: None,
        }
    }

    /// Attaches a 1-based line number.
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Attaches the name of the record type being read.
    pub fn in_type(mut self, type_name: Option<&str>) -> Self {
        self.type_name = type_name.map(str::to_string);
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "parse error on line {line}: {}", self.kind)?,
            None => write!(f, "parse error: {}", self.kind)?,
        }
        if let Some(name) = &self.type_name {
            write!(f, " (tentative type name: {name:?})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// Kind of file access failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessProblem {
    CannotFindFile,
    CannotReadFile,
    CannotWriteFile,
}

impl AccessProblem {
    /// Returns the human-readable problem description.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessProblem::CannotFindFile => "cannot find file",
            AccessProblem::CannotReadFile => "cannot read file",
            AccessProblem::CannotWriteFile => "cannot write to file",
        }
    }
}

impl fmt::Display for AccessProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An input or output path could not be used.
#[derive(Debug, Error)]
#[error("file access problem on {path:?}: {problem}")]
pub struct AccessError {
    pub path: PathBuf,
    pub problem: AccessProblem,
    #[source]
    pub source: io::Error,
}

/// Any failure surfaced by the public parsing and writing entry points.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("i/o failure: {0}")]
    Io(#[from] io::Error),

    #[error("invalid name pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

impl Error {
    /// Returns the parse error, if this is one.
    pub fn as_parse(&self) -> Option<&ParseError> {
        match self {
            Error::Parse(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the grammar failure kind, if this is a parse error.
    pub fn parse_kind(&self) -> Option<&ParseErrorKind> {
        self.as_parse().map(|e| &e.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_context() {
        let err = ParseError::new(ParseErrorKind::UnterminatedTypeName)
            .at_line(7)
            .in_type(Some("Version"));
        let text = err.to_string();
        assert!(text.contains("line 7"));
        assert!(text.contains("\"Version\""));
    }

    #[test]
    fn test_display_without_context() {
        let err = ParseError::new(ParseErrorKind::MissingVersionHeaders);
        assert_eq!(
            err.to_string(),
            "parse error: dictionary did not include both IDD_Version and IDD_BUILD headers"
        );
    }

    #[test]
    fn test_access_error_display() {
        let err = AccessError {
            path: PathBuf::from("/nope/in.idf"),
            problem: AccessProblem::CannotFindFile,
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("cannot find file"));
    }

    #[test]
    fn test_parse_kind_accessor() {
        let err: Error = ParseError::new(ParseErrorKind::MissingVersionHeaders).into();
        assert_eq!(err.parse_kind(), Some(&ParseErrorKind::MissingVersionHeaders));
    }
}
