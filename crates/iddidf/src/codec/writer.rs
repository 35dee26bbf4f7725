//! Canonical instance text output.
//!
//! Records are written one field per line, each value padded to a fixed
//! column and followed by a `!-` annotation naming the field when a record
//! type is known:
//!
//! ```text
//! Zone,
//!   Core,                    !- Name
//!   0;                       !- X Origin {m}
//! ```

use std::io;

use crate::model::{Document, Entry, FieldFlag, InstanceRecord, RecordType, Schema};

/// Layout options for written records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Column width that `value` plus its terminator is padded to.
    pub padding_width: usize,
    /// Prefix of every field line.
    pub indent: String,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            padding_width: 25,
            indent: "  ".to_string(),
        }
    }
}

impl WriteOptions {
    /// Default options: 25-column padding and a two-space indent.
    pub fn new() -> Self {
        Self::default()
    }
}

// =============================================================================
// RECORDS
// =============================================================================

fn push_field_line(
    out: &mut String,
    value: &str,
    last: bool,
    annotation: &str,
    options: &WriteOptions,
) {
    let terminator = if last { ';' } else { ',' };
    let cell = format!("{value}{terminator}");
    out.push_str(&options.indent);
    out.push_str(&format!("{:<width$}", cell, width = options.padding_width));
    out.push_str("!- ");
    out.push_str(annotation);
    out.push('\n');
}

fn annotation_for(record_type: Option<&RecordType>, index: usize) -> String {
    let Some(field) = record_type.and_then(|rt| rt.fields.get(index)) else {
        return String::new();
    };
    match field.first_value(FieldFlag::Units) {
        Some(units) => format!("{} {{{}}}", field.display_name(), units),
        None => field.display_name().to_string(),
    }
}

fn push_record(
    out: &mut String,
    record: &InstanceRecord,
    record_type: Option<&RecordType>,
    options: &WriteOptions,
) {
    if record.fields.is_empty() {
        out.push_str(&record.type_name);
        out.push_str(";\n");
        return;
    }

    if record_type.is_some_and(RecordType::is_single_line_format) {
        out.push_str(&record.type_name);
        out.push(',');
        out.push_str(&record.fields.join(","));
        out.push_str(";\n");
        return;
    }

    out.push_str(&record.type_name);
    out.push_str(",\n");
    let last = record.fields.len() - 1;
    for (index, value) in record.fields.iter().enumerate() {
        let annotation = annotation_for(record_type, index);
        push_field_line(out, value, index == last, &annotation, options);
    }
}

/// Renders a record, annotated with field names when its record type is given.
pub fn render_record(record: &InstanceRecord, record_type: Option<&RecordType>) -> String {
    render_record_with_options(record, record_type, &WriteOptions::default())
}

/// Renders a record with custom layout options.
pub fn render_record_with_options(
    record: &InstanceRecord,
    record_type: Option<&RecordType>,
    options: &WriteOptions,
) -> String {
    let mut out = String::new();
    push_record(&mut out, record, record_type, options);
    out
}

fn push_entry(out: &mut String, entry: &Entry, schema: Option<&Schema>, options: &WriteOptions) {
    match entry {
        Entry::Comment(lines) => {
            for line in lines {
                out.push_str(line);
                out.push('\n');
            }
        }
        Entry::Record(record) => {
            let record_type = schema.and_then(|s| s.lookup(&record.type_name).record_type());
            push_record(out, record, record_type, options);
        }
    }
}

/// Renders a comment block verbatim, or a record looked up in `schema`.
pub fn render_entry(entry: &Entry, schema: Option<&Schema>) -> String {
    let mut out = String::new();
    push_entry(&mut out, entry, schema, &WriteOptions::default());
    out
}

// =============================================================================
// DOCUMENTS
// =============================================================================

/// Renders every entry in order, each followed by a blank line.
pub fn render_document(document: &Document, schema: Option<&Schema>) -> String {
    render_document_with_options(document, schema, &WriteOptions::default())
}

/// Renders a document with custom layout options.
pub fn render_document_with_options(
    document: &Document,
    schema: Option<&Schema>,
    options: &WriteOptions,
) -> String {
    let mut out = String::new();
    for entry in &document.entries {
        push_entry(&mut out, entry, schema, options);
        out.push('\n');
    }
    out
}

/// Writes a rendered document to a sink.
pub fn write_document<W: io::Write>(
    writer: &mut W,
    document: &Document,
    schema: Option<&Schema>,
    options: &WriteOptions,
) -> io::Result<()> {
    writer.write_all(render_document_with_options(document, schema, options).as_bytes())?;
    writer.flush()
}
