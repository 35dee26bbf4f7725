//! Dictionary (IDD) schema types.
//!
//! A [`Schema`] is built once by the dictionary lexer and is read-only
//! afterwards; it is handed out as `Arc<Schema>` so a cached instance can
//! be shared between callers.

use std::fmt;
use std::str::FromStr;

use glob::{MatchOptions, Pattern};
use rustc_hash::FxHashMap;

use crate::model::VersionNumber;

// =============================================================================
// FLAGS
// =============================================================================

/// Object-level flags recognized in a record type header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectFlag {
    Memo,
    UniqueObject,
    RequiredObject,
    MinFields,
    Obsolete,
    Extensible,
    Format,
}

impl ObjectFlag {
    /// Every recognized object flag.
    pub const ALL: [ObjectFlag; 7] = [
        ObjectFlag::Memo,
        ObjectFlag::UniqueObject,
        ObjectFlag::RequiredObject,
        ObjectFlag::MinFields,
        ObjectFlag::Obsolete,
        ObjectFlag::Extensible,
        ObjectFlag::Format,
    ];

    /// Returns the flag keyword as written in a dictionary, backslash included.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectFlag::Memo => "\\memo",
            ObjectFlag::UniqueObject => "\\unique-object",
            ObjectFlag::RequiredObject => "\\required-object",
            ObjectFlag::MinFields => "\\min-fields",
            ObjectFlag::Obsolete => "\\obsolete",
            ObjectFlag::Extensible => "\\extensible",
            ObjectFlag::Format => "\\format",
        }
    }

    /// Looks up a flag by its exact keyword.
    pub fn from_keyword(keyword: &str) -> Option<ObjectFlag> {
        Self::ALL.into_iter().find(|f| f.as_str() == keyword)
    }

    /// Returns false for flags that are markers only and never carry data.
    pub fn carries_data(&self) -> bool {
        !matches!(self, ObjectFlag::UniqueObject | ObjectFlag::RequiredObject)
    }
}

impl fmt::Display for ObjectFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level flags recognized after a field identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldFlag {
    Field,
    Note,
    RequiredField,
    BeginExtensible,
    UnitsBasedOnField,
    Units,
    IpUnits,
    ScheduleUnits,
    Minimum,
    Maximum,
    Default,
    Deprecated,
    Autosizable,
    Autocalculatable,
    Type,
    RetainCase,
    Key,
    ObjectList,
    ReferenceClassName,
    Reference,
    ExternalList,
}

impl FieldFlag {
    /// Every recognized field flag.
    pub const ALL: [FieldFlag; 21] = [
        FieldFlag::Field,
        FieldFlag::Note,
        FieldFlag::RequiredField,
        FieldFlag::BeginExtensible,
        FieldFlag::UnitsBasedOnField,
        FieldFlag::Units,
        FieldFlag::IpUnits,
        FieldFlag::ScheduleUnits,
        FieldFlag::Minimum,
        FieldFlag::Maximum,
        FieldFlag::Default,
        FieldFlag::Deprecated,
        FieldFlag::Autosizable,
        FieldFlag::Autocalculatable,
        FieldFlag::Type,
        FieldFlag::RetainCase,
        FieldFlag::Key,
        FieldFlag::ObjectList,
        FieldFlag::ReferenceClassName,
        FieldFlag::Reference,
        FieldFlag::ExternalList,
    ];

    /// Returns the flag keyword as written in a dictionary, backslash included.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldFlag::Field => "\\field",
            FieldFlag::Note => "\\note",
            FieldFlag::RequiredField => "\\required-field",
            FieldFlag::BeginExtensible => "\\begin-extensible",
            FieldFlag::UnitsBasedOnField => "\\unitsBasedOnField",
            FieldFlag::Units => "\\units",
            FieldFlag::IpUnits => "\\ip-units",
            FieldFlag::ScheduleUnits => "\\scheduleunits",
            FieldFlag::Minimum => "\\minimum",
            FieldFlag::Maximum => "\\maximum",
            FieldFlag::Default => "\\default",
            FieldFlag::Deprecated => "\\deprecated",
            FieldFlag::Autosizable => "\\autosizable",
            FieldFlag::Autocalculatable => "\\autocalculatable",
            FieldFlag::Type => "\\type",
            FieldFlag::RetainCase => "\\retaincase",
            FieldFlag::Key => "\\key",
            FieldFlag::ObjectList => "\\object-list",
            FieldFlag::ReferenceClassName => "\\reference-class-name",
            FieldFlag::Reference => "\\reference",
            FieldFlag::ExternalList => "\\external-list",
        }
    }

    /// Returns the longest recognized flag keyword that prefixes `line`.
    ///
    /// Longest match keeps `\unitsBasedOnField` from reading as `\units`
    /// and `\reference-class-name` from reading as `\reference`.
    pub fn longest_prefix(line: &str) -> Option<FieldFlag> {
        Self::ALL
            .into_iter()
            .filter(|f| line.starts_with(f.as_str()))
            .max_by_key(|f| f.as_str().len())
    }
}

impl fmt::Display for FieldFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// FIELDS
// =============================================================================

/// Whether a field holds text or a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Alpha,
    Numeric,
}

/// Positional field identifier such as `A1` or `N12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId {
    pub kind: FieldKind,
    /// 1-based position within fields of the same kind.
    pub index: u32,
}

impl FromStr for FieldId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let kind = match chars.next() {
            Some('A') => FieldKind::Alpha,
            Some('N') => FieldKind::Numeric,
            _ => return Err(()),
        };
        let index = chars.as_str().trim().parse().map_err(|_| ())?;
        Ok(FieldId { kind, index })
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            FieldKind::Alpha => 'A',
            FieldKind::Numeric => 'N',
        };
        write!(f, "{}{}", prefix, self.index)
    }
}

/// A single field of a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub id: FieldId,
    /// Flag values in file order; a repeated flag accumulates entries.
    pub flags: FxHashMap<FieldFlag, Vec<String>>,
    /// Display name from `\field`, if declared.
    pub name: Option<String>,
}

impl Field {
    /// Creates a field with no flags.
    pub fn new(id: FieldId) -> Self {
        Self {
            id,
            flags: FxHashMap::default(),
            name: None,
        }
    }

    pub fn kind(&self) -> FieldKind {
        self.id.kind
    }

    /// Display name, or an empty string when none was declared.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn has_flag(&self, flag: FieldFlag) -> bool {
        self.flags.contains_key(&flag)
    }

    /// All values recorded for a flag, in file order.
    pub fn flag_values(&self, flag: FieldFlag) -> &[String] {
        self.flags.get(&flag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First value recorded for a flag.
    pub fn first_value(&self, flag: FieldFlag) -> Option<&str> {
        self.flag_values(flag).first().map(String::as_str)
    }

    /// Appends a value to a flag's list.
    pub fn push_flag(&mut self, flag: FieldFlag, value: impl Into<String>) {
        self.flags.entry(flag).or_default().push(value.into());
    }
}

// =============================================================================
// RECORD TYPES AND GROUPS
// =============================================================================

/// A structured record type: name, object flags and ordered fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    pub name: String,
    /// Marker flags (`\unique-object`, `\required-object`) map to an empty list.
    pub flags: FxHashMap<ObjectFlag, Vec<String>>,
    /// Fields in file order; position matters for matching instance values.
    pub fields: Vec<Field>,
}

impl RecordType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: FxHashMap::default(),
            fields: Vec::new(),
        }
    }

    pub fn has_flag(&self, flag: ObjectFlag) -> bool {
        self.flags.contains_key(&flag)
    }

    pub fn flag_values(&self, flag: ObjectFlag) -> &[String] {
        self.flags.get(&flag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first_value(&self, flag: ObjectFlag) -> Option<&str> {
        self.flag_values(flag).first().map(String::as_str)
    }

    /// Number of leading fields an instance must carry, from `\min-fields`.
    pub fn min_fields(&self) -> Option<usize> {
        let value: f64 = self.first_value(ObjectFlag::MinFields)?.parse().ok()?;
        (value.is_finite() && value >= 0.0).then_some(value as usize)
    }

    /// True when the type asks to be written on a single line (`\format singleLine`).
    pub fn is_single_line_format(&self) -> bool {
        self.flag_values(ObjectFlag::Format)
            .iter()
            .any(|v| v == "singleLine")
    }

    /// Case-insensitive name comparison.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} fields", self.name, self.fields.len())
    }
}

/// A named container of record types (`\group` in the dictionary).
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub name: String,
    pub record_types: Vec<RecordType>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_types: Vec::new(),
        }
    }
}

// =============================================================================
// SCHEMA
// =============================================================================

/// Result of looking a type name up in a [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    /// A structured record type with fields.
    Record(&'a RecordType),
    /// A field-less type stored by name only.
    SingleLine(&'a str),
    NotFound,
}

impl<'a> Lookup<'a> {
    /// Returns the structured record type, if that is what was found.
    pub fn record_type(self) -> Option<&'a RecordType> {
        match self {
            Lookup::Record(rt) => Some(rt),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        !matches!(self, Lookup::NotFound)
    }
}

/// A parsed dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    /// Path or synthetic label the dictionary was read from.
    pub descriptor: String,
    pub version: String,
    pub version_number: VersionNumber,
    pub build: String,
    pub groups: Vec<Group>,
    /// Names of field-less types (`Lead Input;`).
    pub single_line_types: Vec<String>,
    /// SHA-256 of the dictionary text this schema was built from.
    pub source_digest: [u8; 32],
}

impl Schema {
    /// Key under which this schema is cached: `version__build`.
    pub fn cache_key(&self) -> String {
        cache_key(&self.version, &self.build)
    }

    /// Iterates over every structured record type in group order.
    pub fn record_types(&self) -> impl Iterator<Item = &RecordType> {
        self.groups.iter().flat_map(|g| g.record_types.iter())
    }

    /// Case-insensitive lookup of a type name.
    ///
    /// Structured record types are searched first, then single-line types.
    pub fn lookup(&self, name: &str) -> Lookup<'_> {
        if let Some(rt) = self.record_types().find(|rt| rt.is_named(name)) {
            return Lookup::Record(rt);
        }
        match self
            .single_line_types
            .iter()
            .find(|s| s.eq_ignore_ascii_case(name))
        {
            Some(s) => Lookup::SingleLine(s),
            None => Lookup::NotFound,
        }
    }

    /// Every structured record type carrying the given object flag.
    ///
    /// Single-line types never carry flags and are not considered.
    pub fn types_with_flag(&self, flag: ObjectFlag) -> Vec<&RecordType> {
        self.record_types().filter(|rt| rt.has_flag(flag)).collect()
    }

    /// Record types whose name matches a shell-style glob pattern.
    pub fn find_record_types(
        &self,
        pattern: &str,
        case_sensitive: bool,
    ) -> Result<Vec<&RecordType>, glob::PatternError> {
        let pattern = Pattern::new(pattern)?;
        let options = MatchOptions {
            case_sensitive,
            ..MatchOptions::new()
        };
        Ok(self
            .record_types()
            .filter(|rt| pattern.matches_with(&rt.name, options))
            .collect())
    }

    /// Total number of structured record types across all groups.
    pub fn record_type_count(&self) -> usize {
        self.groups.iter().map(|g| g.record_types.len()).sum()
    }
}

/// Builds the composite cache key for a version/build pair.
pub fn cache_key(version: &str, build: &str) -> String {
    format!("{}__{}", version, build)
}
