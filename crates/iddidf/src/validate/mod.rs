//! Validation of instance documents against a schema.
//!
//! Issues are returned as data and never as errors. Records whose type is
//! unknown to the schema, or is a single-line type, are never flagged.
//!
//! **Note:** validation fills blank or missing `\min-fields` positions with
//! the schema default, so the record's field list may grow or change.
//! Callers that need the original values should validate a clone.

use std::fmt;

use tracing::debug;

use crate::model::{
    Document, Field, FieldFlag, FieldKind, InstanceRecord, Lookup, ObjectFlag, RecordType, Schema,
};

/// How serious a validation issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Information,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Information => "INFORMATION",
            Severity::Warning => "*WARNING*",
            Severity::Error => "**ERROR**",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding from validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Record type being validated when the issue arose.
    pub type_name: String,
    pub severity: Severity,
    pub message: String,
    pub field_name: Option<String>,
}

impl ValidationIssue {
    pub fn warning(type_name: &str, message: impl Into<String>, field_name: Option<&str>) -> Self {
        Self {
            type_name: type_name.to_string(),
            severity: Severity::Warning,
            message: message.into(),
            field_name: field_name.map(str::to_string),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, " * Issue Found; severity = {}", self.severity)?;
        writeln!(f, "  Object Name = {}", self.type_name)?;
        if let Some(field) = &self.field_name {
            writeln!(f, "  Field Name = {}", field)?;
        }
        write!(f, "  Message = {}", self.message)
    }
}

// =============================================================================
// DOCUMENT CHECKS
// =============================================================================

/// Validates a whole document: required and unique types first, then every
/// record in document order.
pub fn validate_document(document: &mut Document, schema: &Schema) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for rt in schema.types_with_flag(ObjectFlag::RequiredObject) {
        if document.records_of_type(&rt.name).is_empty() {
            issues.push(ValidationIssue::warning(
                &rt.name,
                "Required object not found in IDF contents",
                None,
            ));
        }
    }
    for rt in schema.types_with_flag(ObjectFlag::UniqueObject) {
        if document.records_of_type(&rt.name).len() > 1 {
            issues.push(ValidationIssue::warning(
                &rt.name,
                "Unique object has multiple instances in IDF contents",
                None,
            ));
        }
    }

    for record in document.records_mut() {
        issues.extend(validate_record(record, schema));
    }
    issues
}

// =============================================================================
// RECORD CHECKS
// =============================================================================

/// Validates a record against whatever the schema knows about its type.
pub fn validate_record(record: &mut InstanceRecord, schema: &Schema) -> Vec<ValidationIssue> {
    match schema.lookup(&record.type_name) {
        Lookup::Record(rt) => validate_record_against(record, rt),
        Lookup::SingleLine(_) => Vec::new(),
        Lookup::NotFound => {
            debug!(
                record_type = %record.type_name,
                "no schema type for record, skipping validation"
            );
            Vec::new()
        }
    }
}

/// Validates a record against a known record type.
///
/// Applies `\min-fields` defaults first, then checks each value against the
/// field at the same position. Values beyond the last schema field are not checked.
pub fn validate_record_against(
    record: &mut InstanceRecord,
    record_type: &RecordType,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    fill_min_fields(record, record_type, &mut issues);

    for (value, field) in record.fields.iter().zip(&record_type.fields) {
        if field.has_flag(FieldFlag::RequiredField) && value.is_empty() {
            issues.push(ValidationIssue::warning(
                &record_type.name,
                "Blank required field found",
                field.name.as_deref(),
            ));
            continue;
        }
        if field.kind() == FieldKind::Numeric && !value.trim().is_empty() {
            check_numeric(value, field, &record_type.name, &mut issues);
        }
    }
    issues
}

fn fill_min_fields(
    record: &mut InstanceRecord,
    record_type: &RecordType,
    issues: &mut Vec<ValidationIssue>,
) {
    let Some(min_fields) = record_type.min_fields() else {
        return;
    };

    for (i, field) in record_type.fields.iter().take(min_fields).enumerate() {
        let default = field.first_value(FieldFlag::Default);
        match record.fields.get_mut(i) {
            Some(value) => {
                if value.is_empty() {
                    if let Some(default) = default {
                        *value = default.to_string();
                    }
                }
            }
            None => match default {
                Some(default) => record.fields.push(default.to_string()),
                None => {
                    record.fields.push(String::new());
                    issues.push(ValidationIssue::warning(
                        &record_type.name,
                        "Field within \\min-fields missing and no default",
                        field.name.as_deref(),
                    ));
                }
            },
        }
    }
}

/// A `\minimum`/`\maximum` bound; `exclusive` when written as `>x` or `<x`.
struct Bound {
    value: f64,
    exclusive: bool,
}

fn parse_bound(raw: &str, exclusive_marker: char) -> Option<Bound> {
    let raw = raw.trim();
    let (text, exclusive) = match raw.strip_prefix(exclusive_marker) {
        Some(rest) => (rest, true),
        None => (raw, false),
    };
    match text.trim().parse() {
        Ok(value) => Some(Bound { value, exclusive }),
        Err(_) => {
            debug!(bound = raw, "ignoring unparsable numeric bound");
            None
        }
    }
}

fn check_numeric(value: &str, field: &Field, type_name: &str, issues: &mut Vec<ValidationIssue>) {
    let field_name = field.name.as_deref();

    let Ok(number) = value.trim().parse::<f64>() else {
        let upper = value.trim().to_ascii_uppercase();
        let autosize = upper == "AUTOSIZE";
        let autocalculate = upper == "AUTOCALCULATE";
        if autosize && field.has_flag(FieldFlag::Autosizable) {
            return;
        }
        if (autosize || autocalculate) && field.has_flag(FieldFlag::Autocalculatable) {
            return;
        }
        let message = if autosize {
            "Autosize detected in numeric field that is _not_ listed autosizable"
        } else if autocalculate {
            "Autocalculate detected in numeric field that is _not_ listed autocalculatable"
        } else {
            "Non-numeric value in idd-specified numeric field"
        };
        issues.push(ValidationIssue::warning(type_name, message, field_name));
        return;
    };

    if let Some(max) = field.first_value(FieldFlag::Maximum).and_then(|m| parse_bound(m, '<')) {
        let over = if max.exclusive { number >= max.value } else { number > max.value };
        if over {
            let marker = if max.exclusive { "<" } else { "" };
            issues.push(ValidationIssue::warning(
                type_name,
                format!(
                    "Field value higher than idd-specified maximum{}; actual={}, max={}",
                    marker, number, max.value
                ),
                field_name,
            ));
        }
    }

    if let Some(min) = field.first_value(FieldFlag::Minimum).and_then(|m| parse_bound(m, '>')) {
        let under = if min.exclusive { number <= min.value } else { number < min.value };
        if under {
            let marker = if min.exclusive { ">" } else { "" };
            issues.push(ValidationIssue::warning(
                type_name,
                format!(
                    "Field value lower than idd-specified minimum{}; actual={}, min={}",
                    marker, number, min.value
                ),
                field_name,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_document, decode_schema};
    use std::sync::Arc;

    const FIELD_CHECKS: &str = r"
!IDD_Version 12.9.0
!IDD_BUILD abcdef1010
\group MyGroup
Version,
  \unique-object
  \required-object
  A1;  \field VersionID

MyObject,
  N1,  \field NumericFieldA
       \minimum 0
       \maximum 2
       \required-field
  N2,  \field NumericFieldB
       \minimum> 0
       \maximum< 2
  N3,  \field NumericFieldC
       \autosizable
       \autocalculatable
  N4;  \field NumericFieldD
       \autocalculatable

Lead Input;
";

    const MIN_FIELDS: &str = r"
!IDD_Version 13.9.0
!IDD_BUILD abcdef1018
\group MyGroup
MyObject,
       \min-fields 5
  A1,  \field Name
       \required-field
  A2,  \field Zone Name
       \required-field
  N1,  \field A
       \required-field
       \units m
  N2,  \field B
       \required-field
  N3;  \field C
       \default 0.8
       \required-field
";

    fn schema(text: &str) -> Arc<Schema> {
        decode_schema(text, "/string/idd/snippet", None).unwrap()
    }

    fn issues_for(schema_text: &str, idf: &str) -> Vec<ValidationIssue> {
        let schema = schema(schema_text);
        let mut doc = decode_document(idf, "/string/idf/snippet").unwrap();
        let record = doc
            .records_mut()
            .find(|r| r.is_type("MyObject"))
            .unwrap();
        validate_record(record, &schema)
    }

    #[test]
    fn test_valid_record() {
        assert!(issues_for(FIELD_CHECKS, "Version,12.9;MyObject,1,1,1;").is_empty());
    }

    #[test]
    fn test_exclusive_maximum() {
        assert_eq!(issues_for(FIELD_CHECKS, "MyObject,1,2,1;").len(), 1);
        assert!(issues_for(FIELD_CHECKS, "MyObject,1,1.999,1;").is_empty());
    }

    #[test]
    fn test_inclusive_maximum() {
        assert!(issues_for(FIELD_CHECKS, "MyObject,2,1,1;").is_empty());
        assert_eq!(issues_for(FIELD_CHECKS, "MyObject,2.001,1,1;").len(), 1);
    }

    #[test]
    fn test_minimums() {
        assert_eq!(issues_for(FIELD_CHECKS, "MyObject,-1,1,1;").len(), 1);
        assert!(issues_for(FIELD_CHECKS, "MyObject,0,1,1;").is_empty());
        let issues = issues_for(FIELD_CHECKS, "MyObject,1,0,1;");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field_name.as_deref(), Some("NumericFieldB"));
    }

    #[test]
    fn test_blank_required_field() {
        let issues = issues_for(FIELD_CHECKS, "MyObject,,1,1;");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "Blank required field found");
    }

    #[test]
    fn test_autosize_handling() {
        assert_eq!(issues_for(FIELD_CHECKS, "MyObject,AutoSize,1,1;").len(), 1);
        assert_eq!(issues_for(FIELD_CHECKS, "MyObject,1,autocalculate,1;").len(), 1);
        assert_eq!(issues_for(FIELD_CHECKS, "MyObject,1,1,banana;").len(), 1);
        assert!(issues_for(FIELD_CHECKS, "MyObject,1,1,AUTOSIZE;").is_empty());
        assert!(issues_for(FIELD_CHECKS, "MyObject,1,1,Autocalculate;").is_empty());
    }

    #[test]
    fn test_autocalculatable_field_accepts_autosize() {
        assert!(issues_for(FIELD_CHECKS, "MyObject,1,1,1,AUTOSIZE;").is_empty());
        assert!(issues_for(FIELD_CHECKS, "MyObject,1,1,1,autocalculate;").is_empty());
    }

    #[test]
    fn test_autosize_warning_names_field() {
        let issues = issues_for(FIELD_CHECKS, "MyObject,AutoSize,1,1;");
        assert_eq!(issues[0].field_name.as_deref(), Some("NumericFieldA"));
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn test_unknown_and_single_line_types_are_skipped() {
        let schema = schema(FIELD_CHECKS);
        let mut unknown = InstanceRecord::new("NoObject", vec!["x".to_string()]);
        assert!(validate_record(&mut unknown, &schema).is_empty());
        let mut single = InstanceRecord::new("lead input", vec!["x".to_string()]);
        assert!(validate_record(&mut single, &schema).is_empty());
    }

    #[test]
    fn test_required_and_unique_objects() {
        let schema = schema(FIELD_CHECKS);

        let mut missing = decode_document("MyObject,1,1,1;", "/string/idf/snippet").unwrap();
        let issues = validate_document(&mut missing, &schema);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].type_name, "Version");

        let mut once =
            decode_document("Version,12.9;MyObject,1,1,1;", "/string/idf/snippet").unwrap();
        assert!(validate_document(&mut once, &schema).is_empty());

        let mut twice =
            decode_document("Version,12.9;Version,12.9;", "/string/idf/snippet").unwrap();
        let issues = validate_document(&mut twice, &schema);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.starts_with("Unique object"));
    }

    #[test]
    fn test_document_issues_in_order() {
        let schema = schema(FIELD_CHECKS);
        let mut doc = decode_document(
            "Version,12.9;\n! note\nMyObject,-1,1,1;\nMyObject,1,1,banana;",
            "/string/idf/snippet",
        )
        .unwrap();
        let issues = validate_document(&mut doc, &schema);
        assert_eq!(issues.len(), 2);
        assert!(issues[0].message.contains("minimum"));
        assert!(issues[1].message.starts_with("Non-numeric"));
    }

    #[test]
    fn test_min_fields_default_appended() {
        let schema = schema(MIN_FIELDS);
        let mut doc =
            decode_document("MyObject,Name,ZoneName,1,2;", "/string/idf/snippet").unwrap();
        let record = doc.records_mut().next().unwrap();
        assert!(validate_record(record, &schema).is_empty());
        assert_eq!(record.fields.len(), 5);
        assert_eq!(record.fields[4], "0.8");
    }

    #[test]
    fn test_min_fields_blank_filled() {
        let schema = schema(MIN_FIELDS);
        let mut doc =
            decode_document("MyObject,Name,ZoneName,1,2,;", "/string/idf/snippet").unwrap();
        let record = doc.records_mut().next().unwrap();
        assert!(validate_record(record, &schema).is_empty());
        assert_eq!(record.fields[4], "0.8");
    }

    #[test]
    fn test_min_fields_missing_without_default() {
        let schema = schema(MIN_FIELDS);
        let mut doc = decode_document("MyObject,Name,ZoneName,1;", "/string/idf/snippet").unwrap();
        let record = doc.records_mut().next().unwrap();
        let issues = validate_record(record, &schema);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].message, "Field within \\min-fields missing and no default");
        assert_eq!(issues[0].field_name.as_deref(), Some("B"));
        assert_eq!(record.fields, vec!["Name", "ZoneName", "1", "", "0.8"]);
    }

    #[test]
    fn test_issue_display() {
        let issue = ValidationIssue::warning("Zone", "Blank required field found", Some("Name"));
        let text = issue.to_string();
        assert!(text.contains("severity = *WARNING*"));
        assert!(text.contains("Object Name = Zone"));
        assert!(text.contains("Field Name = Name"));
        assert_eq!(Severity::Error.to_string(), "**ERROR**");
    }
}
