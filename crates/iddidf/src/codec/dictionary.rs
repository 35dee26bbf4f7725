//! Dictionary (IDD) lexer.
//!
//! A single character-driven state machine turns dictionary text into a
//! [`Schema`]. The in-progress record type and field live inside the state
//! itself, so a state that needs a record type always has one.
//!
//! Grammar summary:
//! - `\group <name>` opens a group; it is appended when the next group starts
//! - `<Type>;` declares a field-less (single-line) type
//! - `<Type>,` starts a record type, followed by object flag lines and
//!   `A<n>`/`N<n>` field identifiers terminated by `,` or `;` (last field)
//! - field flag lines follow their identifier; a blank line after the last
//!   field closes the type
//! - `!` starts a comment, except inside field flag lines where it is data
//! - `!IDD_Version` and `!IDD_BUILD` comments declare the version and build

use std::mem;
use std::ops::ControlFlow;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{debug, trace, warn};

use crate::cache::SchemaCache;
use crate::codec::source::CharSource;
use crate::error::{ParseError, ParseErrorKind};
use crate::model::{
    cache_key, Field, FieldFlag, FieldId, Group, ObjectFlag, RecordType, Schema, VersionNumber,
};

const GROUP_KEYWORD: &str = "\\group";
const VERSION_KEYWORD: &str = "IDD_Version";
const BUILD_KEYWORD: &str = "IDD_BUILD";

// =============================================================================
// STATES
// =============================================================================

#[derive(Debug)]
enum State {
    /// Top level: comments, group declarations or the start of a type name.
    ReadAnything,
    ReadingGroupDeclaration,
    ReadingTypeName,
    /// Inside a record type; the type being built travels with the state.
    InType { record: RecordType, phase: TypePhase },
    /// Reading a comment to end of line, then continuing with `resume`.
    ReadingComment { resume: Box<State> },
}

impl State {
    /// True where `!` is ordinary data rather than a comment start.
    fn takes_bang_as_data(&self) -> bool {
        matches!(
            self,
            State::InType {
                phase: TypePhase::ReadingFieldMeta(_),
                ..
            }
        )
    }
}

#[derive(Debug)]
enum TypePhase {
    LookingForTypeMetaOrField,
    ReadingTypeMetaTag,
    ReadingTypeMetaContents(ObjectFlag),
    ReadingFieldIdentifier,
    FieldMetaOrNextFieldOrType(FieldDraft),
    ReadingFieldMeta(FieldDraft),
    LookingForFieldMetaOrNextField(Field),
    LookingForFieldMetaOrNextType(Field),
}

#[derive(Debug)]
struct FieldDraft {
    field: Field,
    /// The identifier was terminated by `;`.
    last: bool,
}

fn ends_type_meta_tag(next: Option<char>) -> bool {
    matches!(next, None | Some(' ' | '\t' | ':' | '\n' | '!'))
}

// =============================================================================
// LEXER
// =============================================================================

struct DictionaryLexer<'c> {
    state: State,
    token: String,
    line: usize,
    descriptor: String,
    digest: [u8; 32],
    version: Option<(String, VersionNumber)>,
    build: Option<String>,
    groups: Vec<Group>,
    pending_group: Option<Group>,
    single_line_types: Vec<String>,
    cache: Option<&'c SchemaCache>,
}

impl<'c> DictionaryLexer<'c> {
    fn new(descriptor: &str, digest: [u8; 32], cache: Option<&'c SchemaCache>) -> Self {
        Self {
            state: State::ReadAnything,
            token: String::new(),
            line: 1,
            descriptor: descriptor.to_string(),
            digest,
            version: None,
            build: None,
            groups: Vec::new(),
            pending_group: None,
            single_line_types: Vec::new(),
            cache,
        }
    }

    fn error(&self, kind: ParseErrorKind, type_name: Option<&str>) -> ParseError {
        ParseError::new(kind).at_line(self.line).in_type(type_name)
    }

    /// Advances the machine by one character.
    ///
    /// Breaks with a cached schema when the build header hits the cache.
    fn step(
        &mut self,
        c: char,
        next: Option<char>,
        line: usize,
    ) -> Result<ControlFlow<Arc<Schema>>, ParseError> {
        self.line = line;
        let state = mem::replace(&mut self.state, State::ReadAnything);
        self.state = match state {
            State::ReadingComment { resume } => {
                if c != '\n' {
                    self.token.push(c);
                    State::ReadingComment { resume }
                } else {
                    if let Some(hit) = self.finish_comment()? {
                        return Ok(ControlFlow::Break(hit));
                    }
                    *resume
                }
            }
            state if c == '!' && !state.takes_bang_as_data() => self.begin_comment(state)?,
            State::ReadAnything => self.read_anything(c),
            State::ReadingGroupDeclaration => {
                if c == '\n' {
                    self.finish_group_declaration()?;
                    State::ReadAnything
                } else {
                    self.token.push(c);
                    State::ReadingGroupDeclaration
                }
            }
            State::ReadingTypeName => self.read_type_name(c)?,
            State::InType { record, phase } => self.read_in_type(record, phase, c, next)?,
        };
        Ok(ControlFlow::Continue(()))
    }

    fn read_anything(&mut self, c: char) -> State {
        if c.is_whitespace() {
            return State::ReadAnything;
        }
        self.token.clear();
        self.token.push(c);
        if c == '\\' {
            State::ReadingGroupDeclaration
        } else {
            State::ReadingTypeName
        }
    }

    /// Wraps up whatever `state` was collecting and switches to comment reading.
    fn begin_comment(&mut self, state: State) -> Result<State, ParseError> {
        let resume = match state {
            State::ReadingGroupDeclaration => {
                self.finish_group_declaration()?;
                State::ReadAnything
            }
            State::ReadingTypeName => {
                return Err(self.error(
                    ParseErrorKind::UnterminatedTypeName,
                    Some(self.token.trim()),
                ));
            }
            State::InType { mut record, phase } => match phase {
                TypePhase::ReadingTypeMetaContents(flag) => {
                    self.commit_type_meta(&mut record, flag)?;
                    State::InType {
                        record,
                        phase: TypePhase::LookingForTypeMetaOrField,
                    }
                }
                TypePhase::ReadingTypeMetaTag => self.continue_type_meta_tag(record, None)?,
                TypePhase::ReadingFieldIdentifier => {
                    return Err(self.error(
                        ParseErrorKind::UnterminatedFieldIdentifier,
                        Some(&record.name),
                    ));
                }
                phase => State::InType { record, phase },
            },
            other => other,
        };
        self.token.clear();
        Ok(State::ReadingComment {
            resume: Box::new(resume),
        })
    }

    fn finish_comment(&mut self) -> Result<Option<Arc<Schema>>, ParseError> {
        let text = mem::take(&mut self.token);

        if let Some(pos) = text.find(VERSION_KEYWORD) {
            let value = text[pos + VERSION_KEYWORD.len()..]
                .split_whitespace()
                .next()
                .unwrap_or("");
            let number = VersionNumber::parse(value).ok_or_else(|| {
                self.error(
                    ParseErrorKind::InvalidVersion {
                        value: value.to_string(),
                    },
                    None,
                )
            })?;
            self.version = Some((value.to_string(), number));
        } else if let Some(pos) = text.find(BUILD_KEYWORD) {
            let Some(build) = text[pos + BUILD_KEYWORD.len()..].split_whitespace().next() else {
                return Ok(None);
            };
            self.build = Some(build.to_string());
        } else {
            return Ok(None);
        }
        Ok(self.check_cache())
    }

    /// Looks up the cache once both header values are known.
    fn check_cache(&self) -> Option<Arc<Schema>> {
        let cache = self.cache?;
        let (version, _) = self.version.as_ref()?;
        let build = self.build.as_deref()?;

        let key = cache_key(version, build);
        debug!(key = %key, "version and build known, checking schema cache");
        let hit = cache.get(&key)?;
        if hit.source_digest != self.digest {
            warn!(
                key = %key,
                cached = %hit.descriptor,
                descriptor = %self.descriptor,
                "schema cache key collision, returning schema built from other text"
            );
        } else {
            debug!(key = %key, "using cached schema");
        }
        Some(hit)
    }

    fn finish_group_declaration(&mut self) -> Result<(), ParseError> {
        let declaration = mem::take(&mut self.token);
        let name = declaration
            .trim()
            .strip_prefix(GROUP_KEYWORD)
            .ok_or_else(|| self.error(ParseErrorKind::InvalidGroupDeclaration, None))?;
        if let Some(group) = self.pending_group.take() {
            self.flush_group(group);
        }
        self.pending_group = Some(Group::new(name.trim()));
        Ok(())
    }

    fn flush_group(&mut self, group: Group) {
        trace!(group = %group.name, record_types = group.record_types.len(), "group complete");
        self.groups.push(group);
    }

    fn read_type_name(&mut self, c: char) -> Result<State, ParseError> {
        match c {
            ',' => {
                let name = mem::take(&mut self.token).trim().to_string();
                Ok(State::InType {
                    record: RecordType::new(name),
                    phase: TypePhase::LookingForTypeMetaOrField,
                })
            }
            ';' => {
                let name = mem::take(&mut self.token).trim().to_string();
                trace!(name = %name, "single-line type");
                self.single_line_types.push(name);
                Ok(State::ReadAnything)
            }
            '\n' => Err(self.error(
                ParseErrorKind::UnterminatedTypeName,
                Some(self.token.trim()),
            )),
            _ => {
                self.token.push(c);
                Ok(State::ReadingTypeName)
            }
        }
    }

    fn start_token(&mut self, c: char) {
        self.token.clear();
        self.token.push(c);
    }

    fn read_in_type(
        &mut self,
        mut record: RecordType,
        phase: TypePhase,
        c: char,
        next: Option<char>,
    ) -> Result<State, ParseError> {
        let phase = match phase {
            TypePhase::LookingForTypeMetaOrField => match c {
                '\\' => {
                    self.start_token(c);
                    return self.continue_type_meta_tag(record, next);
                }
                'A' | 'N' => {
                    self.start_token(c);
                    TypePhase::ReadingFieldIdentifier
                }
                _ => TypePhase::LookingForTypeMetaOrField,
            },
            TypePhase::ReadingTypeMetaTag => {
                self.token.push(c);
                return self.continue_type_meta_tag(record, next);
            }
            TypePhase::ReadingTypeMetaContents(flag) => match c {
                '\n' => {
                    self.commit_type_meta(&mut record, flag)?;
                    TypePhase::LookingForTypeMetaOrField
                }
                ':' if self.token.is_empty() => TypePhase::ReadingTypeMetaContents(flag),
                _ => {
                    self.token.push(c);
                    TypePhase::ReadingTypeMetaContents(flag)
                }
            },
            TypePhase::ReadingFieldIdentifier => match c {
                ',' | ';' => {
                    let field = self.take_field_identifier(&record)?;
                    TypePhase::FieldMetaOrNextFieldOrType(FieldDraft {
                        field,
                        last: c == ';',
                    })
                }
                '\n' => {
                    return Err(self.error(
                        ParseErrorKind::UnterminatedFieldIdentifier,
                        Some(&record.name),
                    ));
                }
                _ => {
                    self.token.push(c);
                    TypePhase::ReadingFieldIdentifier
                }
            },
            TypePhase::FieldMetaOrNextFieldOrType(draft) => match c {
                '\\' => {
                    self.start_token(c);
                    TypePhase::ReadingFieldMeta(draft)
                }
                '\n' if draft.last => TypePhase::LookingForFieldMetaOrNextType(draft.field),
                '\n' => TypePhase::LookingForFieldMetaOrNextField(draft.field),
                'A' | 'N' if !draft.last => {
                    record.fields.push(draft.field);
                    self.start_token(c);
                    TypePhase::ReadingFieldIdentifier
                }
                c if c.is_whitespace() || !draft.last => {
                    TypePhase::FieldMetaOrNextFieldOrType(draft)
                }
                _ => {
                    self.close_type(record, Some(draft.field));
                    return Ok(self.read_anything(c));
                }
            },
            TypePhase::ReadingFieldMeta(draft) => {
                if c == '\n' {
                    return self.finish_field_meta(record, draft);
                }
                self.token.push(c);
                TypePhase::ReadingFieldMeta(draft)
            }
            TypePhase::LookingForFieldMetaOrNextField(field) => match c {
                '\\' => {
                    self.start_token(c);
                    TypePhase::ReadingFieldMeta(FieldDraft { field, last: false })
                }
                'A' | 'N' => {
                    record.fields.push(field);
                    self.start_token(c);
                    TypePhase::ReadingFieldIdentifier
                }
                _ => TypePhase::LookingForFieldMetaOrNextField(field),
            },
            TypePhase::LookingForFieldMetaOrNextType(field) => match c {
                '\\' => {
                    self.start_token(c);
                    TypePhase::ReadingFieldMeta(FieldDraft { field, last: true })
                }
                '\n' => {
                    // blank line
                    self.close_type(record, Some(field));
                    return Ok(State::ReadAnything);
                }
                c if c.is_whitespace() => TypePhase::LookingForFieldMetaOrNextType(field),
                _ => {
                    self.close_type(record, Some(field));
                    return Ok(self.read_anything(c));
                }
            },
        };
        Ok(State::InType { record, phase })
    }

    /// Keeps collecting an object flag keyword until `next` ends it.
    fn continue_type_meta_tag(
        &mut self,
        mut record: RecordType,
        next: Option<char>,
    ) -> Result<State, ParseError> {
        if !ends_type_meta_tag(next) {
            return Ok(State::InType {
                record,
                phase: TypePhase::ReadingTypeMetaTag,
            });
        }

        let tag = mem::take(&mut self.token);
        let Some(flag) = ObjectFlag::from_keyword(tag.trim()) else {
            return Err(self.error(
                ParseErrorKind::UnknownObjectFlag { flag: tag },
                Some(&record.name),
            ));
        };

        let phase = if flag.carries_data() {
            TypePhase::ReadingTypeMetaContents(flag)
        } else {
            if record.has_flag(flag) {
                return Err(self.error(
                    ParseErrorKind::RepeatedObjectFlag {
                        flag: flag.as_str().to_string(),
                    },
                    Some(&record.name),
                ));
            }
            record.flags.insert(flag, Vec::new());
            TypePhase::LookingForTypeMetaOrField
        };
        Ok(State::InType { record, phase })
    }

    fn commit_type_meta(
        &mut self,
        record: &mut RecordType,
        flag: ObjectFlag,
    ) -> Result<(), ParseError> {
        let data = mem::take(&mut self.token);
        let data = data.trim();
        if flag == ObjectFlag::MinFields && data.parse::<f64>().is_err() {
            return Err(self.error(
                ParseErrorKind::NonNumericMinFields {
                    value: data.to_string(),
                },
                Some(&record.name),
            ));
        }
        record.flags.entry(flag).or_default().push(data.to_string());
        Ok(())
    }

    fn take_field_identifier(&mut self, record: &RecordType) -> Result<Field, ParseError> {
        let raw = mem::take(&mut self.token);
        let raw = raw.trim();
        let id: FieldId = raw.parse().map_err(|_| {
            self.error(
                ParseErrorKind::InvalidFieldIdentifier {
                    identifier: raw.to_string(),
                },
                Some(&record.name),
            )
        })?;
        Ok(Field::new(id))
    }

    fn finish_field_meta(
        &mut self,
        record: RecordType,
        draft: FieldDraft,
    ) -> Result<State, ParseError> {
        let text = mem::take(&mut self.token);
        let line = text.trim();
        let FieldDraft { mut field, last } = draft;

        // A group declaration right after the last field, without a blank line.
        if last && line.starts_with(GROUP_KEYWORD) {
            self.close_type(record, Some(field));
            self.token = line.to_string();
            self.finish_group_declaration()?;
            return Ok(State::ReadAnything);
        }

        let Some(flag) = FieldFlag::longest_prefix(line) else {
            return Err(self.error(
                ParseErrorKind::UnknownFieldFlag {
                    line: line.to_string(),
                },
                Some(&record.name),
            ));
        };
        let rest = &line[flag.as_str().len()..];
        if !rest.is_empty() && !rest.starts_with([' ', '<', '>']) {
            return Err(self.error(
                ParseErrorKind::MissingFlagSeparator {
                    flag: flag.as_str().to_string(),
                },
                Some(&record.name),
            ));
        }

        let data = rest.trim();
        match flag {
            FieldFlag::Field => field.name = Some(data.to_string()),
            _ => field.push_flag(flag, data),
        }

        let phase = if last {
            TypePhase::LookingForFieldMetaOrNextType(field)
        } else {
            TypePhase::LookingForFieldMetaOrNextField(field)
        };
        Ok(State::InType { record, phase })
    }

    fn close_type(&mut self, mut record: RecordType, field: Option<Field>) {
        if let Some(field) = field {
            record.fields.push(field);
        }
        trace!(record_type = %record.name, fields = record.fields.len(), "record type complete");
        self.pending_group
            .get_or_insert_with(|| Group::new(""))
            .record_types
            .push(record);
    }

    /// Handles end of input: the last line ends, open items are flushed and
    /// the version headers are checked.
    fn finish(mut self, line: usize) -> Result<Arc<Schema>, ParseError> {
        if let ControlFlow::Break(hit) = self.step('\n', None, line)? {
            return Ok(hit);
        }

        let state = mem::replace(&mut self.state, State::ReadAnything);
        if let State::InType { record, phase } = state {
            let field = match phase {
                TypePhase::FieldMetaOrNextFieldOrType(draft)
                | TypePhase::ReadingFieldMeta(draft) => Some(draft.field),
                TypePhase::LookingForFieldMetaOrNextField(field)
                | TypePhase::LookingForFieldMetaOrNextType(field) => Some(field),
                _ => None,
            };
            self.close_type(record, field);
        }
        if let Some(group) = self.pending_group.take() {
            self.flush_group(group);
        }

        let (Some((version, version_number)), Some(build)) = (self.version, self.build) else {
            return Err(ParseError::new(ParseErrorKind::MissingVersionHeaders).at_line(line));
        };

        let schema = Arc::new(Schema {
            descriptor: self.descriptor,
            version,
            version_number,
            build,
            groups: self.groups,
            single_line_types: self.single_line_types,
            source_digest: self.digest,
        });
        if let Some(cache) = self.cache {
            cache.insert(Arc::clone(&schema));
        }
        Ok(schema)
    }
}

/// Parses dictionary text into a schema.
///
/// With a cache, a dictionary whose `version__build` key is already cached
/// stops parsing as soon as its `IDD_BUILD` line is read and the cached
/// schema is returned as-is, even if the rest of the text differs. A fully
/// parsed schema is stored in the cache before being returned.
pub fn decode_schema(
    text: &str,
    descriptor: &str,
    cache: Option<&SchemaCache>,
) -> Result<Arc<Schema>, ParseError> {
    let hash = Sha256::digest(text.as_bytes());
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hash);

    let mut lexer = DictionaryLexer::new(descriptor, digest, cache);
    let mut source = CharSource::new(text.chars());
    loop {
        let line = source.line();
        let Some(c) = source.next() else { break };
        let next = source.peek();
        if let ControlFlow::Break(hit) = lexer.step(c, next, line)? {
            return Ok(hit);
        }
    }
    lexer.finish(source.line())
}
