//! Instance (IDF) document types.
//!
//! A document keeps records and comment blocks interleaved in the order
//! they appeared, so writing it back reproduces the original layout.

use rustc_hash::FxHashMap;

use crate::error::{ParseError, ParseErrorKind};
use crate::model::VersionNumber;

/// Version string used when a document has no `Version` record.
pub const UNKNOWN_VERSION: &str = "UNKNOWN VERSION";

/// Name of the record type holding the document version.
pub const VERSION_TYPE: &str = "Version";

/// A concrete record: type name followed by positional field values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRecord {
    pub type_name: String,
    /// Field values, trimmed. Validation may grow or fill this list.
    pub fields: Vec<String>,
}

impl InstanceRecord {
    pub fn new(type_name: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields,
        }
    }

    /// Builds a record from a token list whose first token is the type name.
    ///
    /// Returns `None` for an empty token list.
    pub fn from_tokens(mut tokens: Vec<String>) -> Option<Self> {
        if tokens.is_empty() {
            return None;
        }
        let fields = tokens.split_off(1);
        let type_name = tokens.pop()?;
        Some(Self { type_name, fields })
    }

    pub fn is_type(&self, name: &str) -> bool {
        self.type_name.eq_ignore_ascii_case(name)
    }
}

/// One entry of a document: a record or a verbatim comment block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// Comment lines, trimmed, each still starting with `!`.
    Comment(Vec<String>),
    Record(InstanceRecord),
}

impl Entry {
    pub fn as_record(&self) -> Option<&InstanceRecord> {
        match self {
            Entry::Record(r) => Some(r),
            Entry::Comment(_) => None,
        }
    }

    pub fn as_record_mut(&mut self) -> Option<&mut InstanceRecord> {
        match self {
            Entry::Record(r) => Some(r),
            Entry::Comment(_) => None,
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Entry::Comment(_))
    }
}

/// A parsed instance document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Path or synthetic label the document was read from.
    pub descriptor: String,
    pub version: String,
    pub version_number: VersionNumber,
    pub entries: Vec<Entry>,
}

impl Document {
    /// Assembles a document, deriving its version from the first `Version` record.
    ///
    /// A missing `Version` record is tolerated; a present but non-numeric
    /// version is a parse error.
    pub fn from_entries(
        descriptor: impl Into<String>,
        entries: Vec<Entry>,
    ) -> Result<Self, ParseError> {
        let version = entries
            .iter()
            .filter_map(Entry::as_record)
            .find(|r| r.is_type(VERSION_TYPE))
            .and_then(|r| r.fields.first())
            .cloned();

        let (version, version_number) = match version {
            Some(v) => {
                let number = VersionNumber::parse(&v).ok_or_else(|| {
                    ParseError::new(ParseErrorKind::InvalidDocumentVersion { value: v.clone() })
                        .in_type(Some(VERSION_TYPE))
                })?;
                (v, number)
            }
            None => (UNKNOWN_VERSION.to_string(), VersionNumber::UNKNOWN),
        };

        Ok(Self {
            descriptor: descriptor.into(),
            version,
            version_number,
            entries,
        })
    }

    /// Iterates over records, skipping comment blocks.
    pub fn records(&self) -> impl Iterator<Item = &InstanceRecord> {
        self.entries.iter().filter_map(Entry::as_record)
    }

    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut InstanceRecord> {
        self.entries.iter_mut().filter_map(Entry::as_record_mut)
    }

    /// All records of a type, compared case-insensitively.
    pub fn records_of_type(&self, name: &str) -> Vec<&InstanceRecord> {
        self.records().filter(|r| r.is_type(name)).collect()
    }

    /// Number of records (comment blocks excluded).
    pub fn record_count(&self) -> usize {
        self.records().count()
    }

    /// Replaces every field value matching a key (case-insensitively) with its mapped value.
    pub fn global_swap<K, V>(&mut self, swaps: impl IntoIterator<Item = (K, V)>)
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let swaps: FxHashMap<String, String> = swaps
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_uppercase(), v.into()))
            .collect();
        for record in self.records_mut() {
            for value in record.fields.iter_mut() {
                if let Some(replacement) = swaps.get(&value.to_uppercase()) {
                    *value = replacement.clone();
                }
            }
        }
    }
}
