//! IDD/IDF: dictionary and instance files for building energy simulation input.
//!
//! This crate parses EnergyPlus-style **dictionaries** (IDD), which define
//! record types, their ordered fields and per-field constraints, and
//! **instance documents** (IDF), which hold concrete records conforming to a
//! dictionary. It validates documents against a dictionary and writes them
//! back out in a canonical, annotated layout.
//!
//! # Quick Start
//!
//! ```rust
//! use iddidf::{parse_document_str, parse_schema_str, render_document, validate_document};
//!
//! let schema = parse_schema_str(
//!     "!IDD_Version 9.4.0\n!IDD_BUILD 998c4b761e\n\\group Zones\n\
//!      Zone,\n  A1, \\field Name\n  N1; \\field Multiplier\n       \\minimum 1\n",
//!     None,
//! )
//! .unwrap();
//!
//! let mut doc = parse_document_str("Zone,Core,0;").unwrap();
//! let issues = validate_document(&mut doc, &schema);
//! assert_eq!(issues.len(), 1);
//!
//! let text = render_document(&doc, Some(&schema));
//! assert!(text.contains("!- Multiplier"));
//! ```
//!
//! # Modules
//!
//! - [`model`]: Schema and document data types
//! - [`codec`]: Dictionary lexer, instance tokenizer and writer
//! - [`cache`]: Schema cache keyed by version and build
//! - [`validate`]: Document validation
//! - [`io`]: Path, stream and string entry points
//! - [`error`]: Error types
//!
//! # Caching
//!
//! Dictionary parsing takes an optional [`SchemaCache`]. A dictionary whose
//! `IDD_Version`/`IDD_BUILD` pair is already cached is not parsed further;
//! the cached schema is returned even if the remaining text differs.

pub mod cache;
pub mod codec;
pub mod error;
pub mod io;
pub mod model;
pub mod validate;

// Re-export commonly used types at crate root
pub use cache::SchemaCache;
pub use codec::{
    decode_document, decode_schema, render_document, render_entry, render_record, WriteOptions,
};
pub use error::{AccessError, AccessProblem, Error, ParseError, ParseErrorKind};
pub use io::{
    parse_document_file, parse_document_reader, parse_document_str, parse_schema_file,
    parse_schema_reader, parse_schema_str,
};
pub use model::{
    Document, Entry, Field, FieldFlag, FieldId, FieldKind, Group, InstanceRecord, Lookup,
    ObjectFlag, RecordType, Schema, VersionNumber,
};
pub use validate::{validate_document, validate_record, Severity, ValidationIssue};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
