//! Incremental document reconstruction.
//!
//! [`DocumentBuilder`] turns a token feed back into values with an explicit
//! stack of [`Frame`]s, one per open object or array. It never builds the
//! whole document: as soon as a record of a recognized section closes, the
//! record is handed to a [`SectionHandler`] and dropped.
//!
//! # Depths
//!
//! Depth is the number of open frames, with the document root at depth 1.
//! For a section key read at depth `d`:
//!
//! ```text
//! { "nodes": [ { "id": 0, ... }, ... ] }
//! ^d=1       ^d+1 ^d+2 = record depth
//!
//! { "configuration": { "ms-per-frame": 10 } }
//! ^d=1               ^d+1 = record depth
//! ```
//!
//! Keys push a placeholder frame (pending key, `Null` value). A container
//! opening right after a key adopts the placeholder; a primitive pops it
//! and merges `{key: value}` into the object below.
//!
//! Values under unrecognized top-level keys still get frames, so their
//! nesting is checked, but nothing is stored in them.

use crate::error::{Error, Result};
use crate::section::Section;
use crate::sink::TokenSink;
use crate::value::DocumentValue;

/// Consumer of completed section records.
pub trait SectionHandler {
    /// Called once per completed record: each element of a list section,
    /// or the whole `configuration` object.
    fn handle(&mut self, section: Section, record: DocumentValue) -> Result<()>;
}

/// One open nesting level.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Key this frame's value will be stored under in its parent object
    pub key: Option<String>,
    /// Partial value: an object or array being filled, or `Null` while
    /// the frame is only a pending key
    pub value: DocumentValue,
}

impl Frame {
    fn is_placeholder(&self) -> bool {
        self.key.is_some() && self.value.is_null()
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveSection {
    section: Section,
    /// Depth at which the section key was read
    key_depth: usize,
    /// Depth of the frames that are dispatched when they close
    record_depth: usize,
}

/// Push-down reconstructor driven by [`TokenSink`] callbacks.
pub struct DocumentBuilder<H> {
    stack: Vec<Frame>,
    active: Option<ActiveSection>,
    handler: H,
    dispatched: usize,
}

impl<H: SectionHandler> DocumentBuilder<H> {
    /// Create a builder that dispatches records to `handler`.
    pub fn new(handler: H) -> Self {
        Self {
            stack: Vec::with_capacity(8),
            active: None,
            handler,
            dispatched: 0,
        }
    }

    /// Number of open frames.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// The open frames, document root first.
    pub fn frames(&self) -> &[Frame] {
        &self.stack
    }

    /// Section currently being read.
    pub fn active_section(&self) -> Section {
        self.active.map_or(Section::None, |a| a.section)
    }

    /// Records handed to the handler so far.
    pub fn dispatched(&self) -> usize {
        self.dispatched
    }

    /// Borrow the handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// End of input. Fails if anything is still open.
    pub fn finish(self) -> Result<H> {
        if !self.stack.is_empty() {
            return Err(Error::structural(format!(
                "document ended with {} unclosed frame(s)",
                self.stack.len()
            )));
        }
        Ok(self.handler)
    }

    /// Inside the value of an unrecognized top-level key.
    fn ignoring(&self) -> bool {
        self.active.is_none() && self.stack.len() > 1
    }

    fn dispatch(&mut self, section: Section, record: DocumentValue) -> Result<()> {
        self.handler.handle(section, record)?;
        self.dispatched += 1;
        Ok(())
    }

    fn open(&mut self, value: DocumentValue) -> Result<()> {
        let depth = self.stack.len();

        if let Some(active) = self.active {
            if depth == active.key_depth {
                let is_array = matches!(value, DocumentValue::Array(_));
                if active.section.is_list() != is_array {
                    return Err(Error::schema(
                        active.section,
                        format!(
                            "section must be {}, found {}",
                            if active.section.is_list() { "an array" } else { "an object" },
                            value.type_name()
                        ),
                    ));
                }
                self.stack.push(Frame { key: None, value });
                return Ok(());
            }
        }

        if self.stack.is_empty() {
            return match value {
                DocumentValue::Object(_) => {
                    self.stack.push(Frame { key: None, value });
                    Ok(())
                }
                other => Err(Error::structural(format!(
                    "document root must be an object, found {}",
                    other.type_name()
                ))),
            };
        }

        let top = self
            .stack
            .last_mut()
            .ok_or_else(|| Error::structural("open with no frame"))?;

        if top.is_placeholder() {
            top.value = value;
            return Ok(());
        }

        match &top.value {
            DocumentValue::Array(_) => {}
            DocumentValue::Object(_) => {
                return Err(Error::structural(format!(
                    "{} opened inside an object without a key",
                    value.type_name()
                )))
            }
            DocumentValue::Null
            | DocumentValue::Bool(_)
            | DocumentValue::Integer(_)
            | DocumentValue::Unsigned(_)
            | DocumentValue::Float(_)
            | DocumentValue::String(_) => {
                return Err(Error::structural(format!(
                    "{} opened inside a {}",
                    value.type_name(),
                    top.value.type_name()
                )))
            }
        }

        self.stack.push(Frame { key: None, value });
        Ok(())
    }

    fn close(&mut self, closing_array: bool) -> Result<()> {
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| Error::structural("close with no open frame"))?;
        let depth = self.stack.len() + 1;

        let matches = match &frame.value {
            DocumentValue::Array(_) => closing_array,
            DocumentValue::Object(_) => !closing_array,
            DocumentValue::Null => {
                return Err(Error::structural(format!(
                    "key {:?} closed without a value",
                    frame.key.as_deref().unwrap_or_default()
                )))
            }
            DocumentValue::Bool(_)
            | DocumentValue::Integer(_)
            | DocumentValue::Unsigned(_)
            | DocumentValue::Float(_)
            | DocumentValue::String(_) => false,
        };
        if !matches {
            return Err(Error::structural(format!(
                "{} closed a {}",
                if closing_array { "']'" } else { "'}'" },
                frame.value.type_name()
            )));
        }

        if let Some(active) = self.active {
            if depth == active.record_depth {
                if !active.section.is_list() {
                    self.active = None;
                }
                return self.dispatch(active.section, frame.value);
            }
            if depth == active.key_depth + 1 {
                // A list section's array; its records were dispatched already.
                tracing::debug!(section = %active.section, "section complete");
                self.active = None;
                return Ok(());
            }
        }

        if self.stack.is_empty() {
            return Ok(());
        }
        self.merge(frame.key, frame.value)
    }

    fn primitive(&mut self, value: DocumentValue) -> Result<()> {
        let depth = self.stack.len();

        if let Some(active) = self.active {
            if depth == active.key_depth {
                return Err(Error::schema(
                    active.section,
                    format!("section must be a container, found {}", value.type_name()),
                ));
            }
            if active.section.is_list() && depth + 1 == active.record_depth {
                return self.dispatch(active.section, value);
            }
        }

        let keep = !self.ignoring();
        let top = self
            .stack
            .last_mut()
            .ok_or_else(|| Error::structural(format!("{} with no open frame", value.type_name())))?;

        match &mut top.value {
            DocumentValue::Array(items) => {
                if keep {
                    items.push(value);
                }
                return Ok(());
            }
            DocumentValue::Null => {}
            DocumentValue::Object(_) => {
                return Err(Error::structural(format!(
                    "{} inside an object without a key",
                    value.type_name()
                )))
            }
            DocumentValue::Bool(_)
            | DocumentValue::Integer(_)
            | DocumentValue::Unsigned(_)
            | DocumentValue::Float(_)
            | DocumentValue::String(_) => {
                return Err(Error::structural(format!(
                    "{} arrived on a frame already holding a {}",
                    value.type_name(),
                    top.value.type_name()
                )))
            }
        }

        // Top is a pending key: pop it and store `{key: value}` below.
        match self.stack.pop() {
            Some(Frame { key: Some(key), .. }) => self.merge(Some(key), value),
            _ => Err(Error::structural("value without a pending key")),
        }
    }

    /// Store a finished value into the frame now on top.
    fn merge(&mut self, key: Option<String>, value: DocumentValue) -> Result<()> {
        // Outside a section only the shape is checked.
        let keep = self.active.is_some();
        if !keep && self.stack.len() == 1 {
            tracing::debug!(key = ?key, "ignoring unrecognized top-level key");
        }

        let top = self
            .stack
            .last_mut()
            .ok_or_else(|| Error::structural("merge with no open frame"))?;

        match &mut top.value {
            DocumentValue::Array(items) => {
                if keep {
                    items.push(value);
                }
                Ok(())
            }
            DocumentValue::Object(map) => match key {
                Some(key) => {
                    if keep {
                        map.insert(key, value);
                    }
                    Ok(())
                }
                None => Err(Error::structural("object member without a key")),
            },
            DocumentValue::Null
            | DocumentValue::Bool(_)
            | DocumentValue::Integer(_)
            | DocumentValue::Unsigned(_)
            | DocumentValue::Float(_)
            | DocumentValue::String(_) => Err(Error::structural(format!(
                "cannot merge {} into a {}",
                value.type_name(),
                top.value.type_name()
            ))),
        }
    }
}

impl<H: SectionHandler> TokenSink for DocumentBuilder<H> {
    fn null(&mut self) -> Result<()> {
        self.primitive(DocumentValue::Null)
    }

    fn boolean(&mut self, value: bool) -> Result<()> {
        self.primitive(DocumentValue::Bool(value))
    }

    fn integer(&mut self, value: i64) -> Result<()> {
        self.primitive(DocumentValue::Integer(value))
    }

    fn unsigned(&mut self, value: u64) -> Result<()> {
        self.primitive(DocumentValue::Unsigned(value))
    }

    fn float(&mut self, value: f64, _raw: &str) -> Result<()> {
        self.primitive(DocumentValue::Float(value))
    }

    fn string(&mut self, value: String) -> Result<()> {
        self.primitive(DocumentValue::String(value))
    }

    fn start_object(&mut self, _size_hint: Option<usize>) -> Result<()> {
        self.open(DocumentValue::object())
    }

    fn end_object(&mut self) -> Result<()> {
        self.close(false)
    }

    fn start_array(&mut self, size_hint: Option<usize>) -> Result<()> {
        let size_hint = if self.ignoring() { None } else { size_hint };
        self.open(DocumentValue::array(size_hint))
    }

    fn end_array(&mut self) -> Result<()> {
        self.close(true)
    }

    fn key(&mut self, key: String) -> Result<()> {
        let depth = self.stack.len();
        match self.stack.last() {
            Some(Frame {
                value: DocumentValue::Object(_),
                ..
            }) => {}
            Some(top) => {
                return Err(Error::structural(format!(
                    "key {:?} inside a {}",
                    key,
                    if top.is_placeholder() { "pending key" } else { top.value.type_name() }
                )))
            }
            None => return Err(Error::structural(format!("key {:?} with no open object", key))),
        }

        if let Some(active) = self.active {
            if depth == active.key_depth {
                return Err(Error::structural(format!(
                    "key {:?} before section '{}' received a value",
                    key, active.section
                )));
            }
        } else if depth == 1 {
            let section = Section::classify(&key);
            if section != Section::None {
                let record_depth = if section.is_list() { depth + 2 } else { depth + 1 };
                tracing::debug!(section = %section, "entering section");
                self.active = Some(ActiveSection {
                    section,
                    key_depth: depth,
                    record_depth,
                });
                return Ok(());
            }
        }

        self.stack.push(Frame {
            key: Some(key),
            value: DocumentValue::Null,
        });
        Ok(())
    }

    fn parse_error(&mut self, position: u64, last_token: &str, cause: &str) -> Error {
        self.stack.clear();
        self.active = None;
        Error::Syntax {
            offset: position,
            last_token: last_token.to_string(),
            message: cause.to_string(),
        }
    }
}
