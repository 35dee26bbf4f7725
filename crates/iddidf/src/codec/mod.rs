//! Text decoding and encoding for dictionary and instance files.
//!
//! Dictionaries are read by a character-level state machine; instance files
//! are grouped into line blobs first and then tokenized.

pub mod blob;
pub mod dictionary;
pub mod instance;
pub mod source;
pub mod writer;

pub use blob::{extract_blobs, Blob, SourceLine};
pub use dictionary::decode_schema;
pub use instance::decode_document;
pub use source::CharSource;
pub use writer::{
    render_document, render_document_with_options, render_entry, render_record,
    render_record_with_options, write_document, WriteOptions,
};
