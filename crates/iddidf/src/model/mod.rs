//! Data model types for dictionaries and instance documents.
//!
//! - Schema side: [`Schema`], [`Group`], [`RecordType`], [`Field`] and their flags
//! - Instance side: [`Document`], [`Entry`], [`InstanceRecord`]
//! - [`VersionNumber`] shared by both

pub mod document;
pub mod schema;
pub mod version;

pub use document::{Document, Entry, InstanceRecord, UNKNOWN_VERSION, VERSION_TYPE};
pub use schema::{
    cache_key, Field, FieldFlag, FieldId, FieldKind, Group, Lookup, ObjectFlag, RecordType, Schema,
};
pub use version::VersionNumber;
