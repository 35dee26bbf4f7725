//! IDD/IDF utility command line.
//!
//! Every operation prints a JSON object with a `message` and, on success,
//! a `content` payload.
//!
//! # Usage
//!
//! ```bash
//! # Report version, build and counts for a dictionary
//! iddidf Energy+.idd --idd-check
//!
//! # List record types matching a glob pattern
//! iddidf Energy+.idd --idd-obj-matches 'Zone*'
//!
//! # List the fields of one record type
//! iddidf Energy+.idd --summarize-idd-object zone
//!
//! # Validate an instance file against the dictionary
//! iddidf Energy+.idd --validate-idf in.idf
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgGroup, Parser};
use serde::Serialize;
use tracing::{debug, error};

use iddidf::{
    parse_document_file, parse_schema_file, validate_document, Schema, SchemaCache, ValidationIssue,
};

#[derive(Parser)]
#[command(name = "iddidf")]
#[command(version)]
#[command(about = "EnergyPlus IDD/IDF utility command line")]
#[command(group(ArgGroup::new("action").multiple(false)))]
struct Cli {
    /// Path to the IDD file to operate on
    file: PathBuf,

    /// Process the IDD file and report statistics
    #[arg(long, group = "action")]
    idd_check: bool,

    /// Find record types whose name matches a glob pattern
    #[arg(long, group = "action", value_name = "PATTERN")]
    idd_obj_matches: Option<String>,

    /// Print the fields of a single record type, matched case-insensitively
    #[arg(long, group = "action", value_name = "NAME")]
    summarize_idd_object: Option<String>,

    /// Validate an IDF file against the IDD
    #[arg(long, group = "action", value_name = "IDF")]
    validate_idf: Option<PathBuf>,
}

impl Cli {
    fn has_action(&self) -> bool {
        self.idd_check
            || self.idd_obj_matches.is_some()
            || self.summarize_idd_object.is_some()
            || self.validate_idf.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Ok = 0,
    ProcessingError = 1,
    BadArguments = 2,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit as u8)
    }
}

// =============================================================================
// OUTPUT
// =============================================================================

#[derive(Serialize)]
struct Report<T: Serialize> {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<T>,
}

#[derive(Serialize)]
struct IddCheck<'a> {
    idd_version: &'a str,
    idd_build_id: &'a str,
    num_groups: usize,
    num_objects: usize,
}

#[derive(Serialize)]
struct ObjectMatches<'a> {
    pattern: &'a str,
    matching_objects: Vec<&'a str>,
}

#[derive(Serialize)]
struct ObjectSummary<'a> {
    searched_object_name: &'a str,
    field: Vec<String>,
}

#[derive(Serialize)]
struct IssueEntry {
    object_name: String,
    severity: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field_name: Option<String>,
}

impl From<ValidationIssue> for IssueEntry {
    fn from(issue: ValidationIssue) -> Self {
        Self {
            object_name: issue.type_name,
            severity: issue.severity.to_string(),
            message: issue.message,
            field_name: issue.field_name,
        }
    }
}

#[derive(Serialize)]
struct ValidationSummary {
    idf_version: String,
    num_records: usize,
    issues: Vec<IssueEntry>,
}

fn emit<T: Serialize>(message: &str, content: Option<T>) {
    let report = Report {
        message: message.to_string(),
        content,
    };
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => error!(error = %e, "failed to serialize report"),
    }
}

fn emit_message(message: &str) {
    emit::<()>(message, None);
}

// =============================================================================
// MAIN
// =============================================================================

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse()).into()
}

fn run(cli: Cli) -> Exit {
    if !cli.has_action() {
        emit_message("Nothing to do...use command line switches to perform operations");
        return Exit::Ok;
    }
    if !cli.file.exists() {
        emit_message("Supplied file does not appear to exist, check paths and retry!");
        return Exit::BadArguments;
    }

    let schema = match parse_schema_file(&cli.file, Some(SchemaCache::global())) {
        Ok(schema) => schema,
        Err(e) => {
            error!(file = %cli.file.display(), error = %e, "dictionary processing failed");
            emit_message(&format!("Issues occurred during processing: {e}"));
            return Exit::ProcessingError;
        }
    };
    debug!(key = %schema.cache_key(), "dictionary loaded");

    if cli.idd_check {
        idd_check(&schema)
    } else if let Some(pattern) = &cli.idd_obj_matches {
        obj_matches(&schema, pattern)
    } else if let Some(name) = &cli.summarize_idd_object {
        summarize_object(&schema, name)
    } else if let Some(idf) = &cli.validate_idf {
        validate_idf(&schema, idf)
    } else {
        Exit::Ok
    }
}

// =============================================================================
// ACTIONS
// =============================================================================

fn idd_check(schema: &Schema) -> Exit {
    emit(
        "Everything looks OK",
        Some(IddCheck {
            idd_version: &schema.version,
            idd_build_id: &schema.build,
            num_groups: schema.groups.len(),
            num_objects: schema.record_type_count(),
        }),
    );
    Exit::Ok
}

fn obj_matches(schema: &Schema, pattern: &str) -> Exit {
    let matches = match schema.find_record_types(pattern, true) {
        Ok(matches) => matches,
        Err(e) => {
            emit_message(&format!("Invalid pattern {pattern:?}: {e}"));
            return Exit::BadArguments;
        }
    };
    emit(
        "Everything looks OK",
        Some(ObjectMatches {
            pattern,
            matching_objects: matches.iter().map(|rt| rt.name.as_str()).collect(),
        }),
    );
    Exit::Ok
}

fn summarize_object(schema: &Schema, name: &str) -> Exit {
    let found = match schema.find_record_types(name, false) {
        Ok(found) => found,
        Err(e) => {
            emit_message(&format!("Invalid pattern {name:?}: {e}"));
            return Exit::BadArguments;
        }
    };
    let Some(record_type) = found.first() else {
        emit_message(&format!("Could not find matching object by name {name}"));
        return Exit::BadArguments;
    };
    emit(
        "Everything looks OK",
        Some(ObjectSummary {
            searched_object_name: name,
            field: record_type
                .fields
                .iter()
                .map(|f| format!("{} : {}", f.id, f.display_name()))
                .collect(),
        }),
    );
    Exit::Ok
}

fn validate_idf(schema: &Schema, idf: &Path) -> Exit {
    if !idf.exists() {
        emit_message("Supplied IDF file does not appear to exist, check paths and retry!");
        return Exit::BadArguments;
    }
    let mut document = match parse_document_file(idf) {
        Ok(document) => document,
        Err(e) => {
            error!(file = %idf.display(), error = %e, "instance processing failed");
            emit_message(&format!("Issues occurred during processing: {e}"));
            return Exit::ProcessingError;
        }
    };

    let issues = validate_document(&mut document, schema);
    let message = if issues.is_empty() {
        "Everything looks OK"
    } else {
        "Validation issues found"
    };
    emit(
        message,
        Some(ValidationSummary {
            idf_version: document.version.clone(),
            num_records: document.record_count(),
            issues: issues.into_iter().map(IssueEntry::from).collect(),
        }),
    );
    Exit::Ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_actions_are_exclusive() {
        let parsed = Cli::try_parse_from([
            "iddidf",
            "a.idd",
            "--idd-check",
            "--idd-obj-matches",
            "Z*",
        ]);
        assert!(parsed.is_err());
        let parsed = Cli::try_parse_from(["iddidf", "a.idd"]).unwrap();
        assert!(!parsed.has_action());
    }

    #[test]
    fn test_missing_file_is_bad_arguments() {
        let cli = Cli::try_parse_from(["iddidf", "/no/such/file.idd", "--idd-check"]).unwrap();
        assert_eq!(run(cli), Exit::BadArguments);
    }
}
