//! Netsim Scenario Parser
//!
//! Streams a scenario document into the typed model without ever holding
//! the document as a tree.
//!
//! # Pipeline
//!
//! ```text
//! bytes ─► tokenize ─► DocumentBuilder ─► EntityFactory ─► Scenario
//!          (tokens)    (frame stack)      (typed records)
//! ```
//!
//! 1. [`tokenize`] walks the input once and drives a [`TokenSink`]
//! 2. [`DocumentBuilder`] rebuilds one record at a time on an explicit
//!    stack of [`Frame`]s and hands each completed record to a
//!    [`SectionHandler`]
//! 3. [`EntityFactory`] validates the record and turns it into a node,
//!    building, series, event, ...
//!
//! Peak memory is the open nesting path plus the typed output.
//!
//! # Failure scope
//!
//! Syntax, structural and I/O errors abort the pass. Schema and range
//! errors concern one record; [`SchemaPolicy`] decides whether they abort
//! or just drop that record with a [`Warning`].

mod builder;
mod error;
mod factory;
mod scenario;
mod section;
mod sink;
mod tokenizer;
mod value;

pub use builder::{DocumentBuilder, Frame, SectionHandler};
pub use error::{Error, Result, Warning};
pub use factory::{
    parse_building, parse_configuration, parse_decoration, parse_node, parse_stream, EntityFactory,
    SchemaPolicy,
};
pub use scenario::{parse_file, parse_reader, parse_str, ParseOptions, Scenario};
pub use section::Section;
pub use sink::TokenSink;
pub use tokenizer::{tokenize, tokenize_str};
pub use value::DocumentValue;
