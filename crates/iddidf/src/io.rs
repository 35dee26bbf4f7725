//! Entry points reading from paths, streams and strings, and writing documents to disk.
//!
//! Each source gets a descriptor recorded on the result: the path itself for
//! files, or one of the fixed labels below for streams and literal strings.

use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::cache::SchemaCache;
use crate::codec::{decode_document, decode_schema, render_document};
use crate::error::{AccessError, AccessProblem, Error};
use crate::model::{Document, Schema};

pub const STREAMED_SCHEMA: &str = "/streamed/idd";
pub const STREAMED_DOCUMENT: &str = "/streamed/idf";
pub const STRING_SCHEMA: &str = "/string/idd/snippet";
pub const STRING_DOCUMENT: &str = "/string/idf/snippet";

/// Reads a whole file, replacing byte sequences that are not UTF-8.
fn read_path(path: &Path) -> Result<String, AccessError> {
    let bytes = fs::read(path).map_err(|source| {
        let problem = match source.kind() {
            io::ErrorKind::NotFound => AccessProblem::CannotFindFile,
            _ => AccessProblem::CannotReadFile,
        };
        AccessError {
            path: path.to_path_buf(),
            problem,
            source,
        }
    })?;
    Ok(decode_lossy(bytes))
}

fn read_stream<R: Read>(mut reader: R) -> Result<String, Error> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(decode_lossy(bytes))
}

fn decode_lossy(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            debug!(
                valid_up_to = e.utf8_error().valid_up_to(),
                "input is not valid UTF-8, substituting replacement characters"
            );
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}

// =============================================================================
// DICTIONARIES
// =============================================================================

/// Parses a dictionary held in a string.
pub fn parse_schema_str(text: &str, cache: Option<&SchemaCache>) -> Result<Arc<Schema>, Error> {
    Ok(decode_schema(text, STRING_SCHEMA, cache)?)
}

/// Parses a dictionary read to the end of `reader`.
pub fn parse_schema_reader<R: Read>(
    reader: R,
    cache: Option<&SchemaCache>,
) -> Result<Arc<Schema>, Error> {
    let text = read_stream(reader)?;
    Ok(decode_schema(&text, STREAMED_SCHEMA, cache)?)
}

/// Parses a dictionary file.
///
/// The file is read fully and closed before parsing starts. Bytes that are
/// not valid UTF-8 become U+FFFD.
pub fn parse_schema_file(
    path: impl AsRef<Path>,
    cache: Option<&SchemaCache>,
) -> Result<Arc<Schema>, Error> {
    let path = path.as_ref();
    let text = read_path(path)?;
    Ok(decode_schema(&text, &path.to_string_lossy(), cache)?)
}

// =============================================================================
// INSTANCE DOCUMENTS
// =============================================================================

/// Parses an instance document held in a string.
pub fn parse_document_str(text: &str) -> Result<Document, Error> {
    Ok(decode_document(text, STRING_DOCUMENT)?)
}

/// Parses an instance document read to the end of `reader`.
pub fn parse_document_reader<R: Read>(reader: R) -> Result<Document, Error> {
    let text = read_stream(reader)?;
    Ok(decode_document(&text, STREAMED_DOCUMENT)?)
}

/// Parses an instance document file.
pub fn parse_document_file(path: impl AsRef<Path>) -> Result<Document, Error> {
    let path = path.as_ref();
    let text = read_path(path)?;
    Ok(decode_document(&text, &path.to_string_lossy())?)
}

impl Document {
    /// Writes the rendered document to `path`, replacing any existing file.
    pub fn write_to_path(
        &self,
        path: impl AsRef<Path>,
        schema: Option<&Schema>,
    ) -> Result<(), Error> {
        let path = path.as_ref();
        fs::write(path, render_document(self, schema)).map_err(|source| AccessError {
            path: path.to_path_buf(),
            problem: AccessProblem::CannotWriteFile,
            source,
        })?;
        Ok(())
    }
}
