//! Token feed over `serde_json`'s streaming deserializer.
//!
//! `serde_json` reads the input once and calls back into a visitor for
//! every value. The visitor here never builds anything; it translates each
//! callback into the matching [`TokenSink`] call, so memory use is bounded
//! by whatever the sink keeps.
//!
//! Errors raised by the sink are smuggled through `serde` as a marker and
//! surfaced unchanged. Genuine syntax errors go through
//! [`TokenSink::parse_error`] with the byte offset reached so far and the
//! last token read.

use std::cell::Cell;
use std::fmt;
use std::io::{self, BufReader, Read};
use std::rc::Rc;

use serde::de::{self, DeserializeSeed, Deserializer, MapAccess, SeqAccess, Visitor};

use crate::error::{Error, Result};
use crate::sink::TokenSink;

const SINK_STOPPED: &str = "token sink stopped the feed";

/// Longest string token echoed back in diagnostics.
const MAX_TOKEN_ECHO: usize = 40;

/// Counts bytes as `serde_json` pulls them.
struct CountingReader<R> {
    inner: R,
    consumed: Rc<Cell<u64>>,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.consumed.set(self.consumed.get() + n as u64);
        Ok(n)
    }
}

struct Feed<'s, S> {
    sink: &'s mut S,
    last_token: String,
    failure: Option<Error>,
}

impl<S: TokenSink> Feed<'_, S> {
    fn emit<E: de::Error>(
        &mut self,
        token: impl Into<String>,
        call: impl FnOnce(&mut S) -> Result<()>,
    ) -> std::result::Result<(), E> {
        self.last_token = token.into();
        call(&mut *self.sink).map_err(|err| {
            self.failure = Some(err);
            E::custom(SINK_STOPPED)
        })
    }
}

fn quoted(s: &str) -> String {
    if s.chars().count() <= MAX_TOKEN_ECHO {
        format!("{s:?}")
    } else {
        let head: String = s.chars().take(MAX_TOKEN_ECHO).collect();
        format!("{head:?}...")
    }
}

/// One value position in the document.
struct Token<'f, 's, S>(&'f mut Feed<'s, S>);

impl<'de, S: TokenSink> DeserializeSeed<'de> for Token<'_, '_, S> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<(), D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de, S: TokenSink> Visitor<'de> for Token<'_, '_, S> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<(), E> {
        self.0.emit("null", |s| s.null())
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<(), E> {
        self.0.emit(v.to_string(), |s| s.boolean(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<(), E> {
        self.0.emit(v.to_string(), |s| s.integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<(), E> {
        self.0.emit(v.to_string(), |s| s.unsigned(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<(), E> {
        // serde_json only hands over the parsed value; re-render it.
        let raw = v.to_string();
        self.0.emit(raw.clone(), |s| s.float(v, &raw))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<(), E> {
        self.0.emit(quoted(v), |s| s.string(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<(), E> {
        self.0.emit(quoted(&v), |s| s.string(v))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<(), A::Error> {
        let feed = self.0;
        let hint = map.size_hint();
        feed.emit("{", |s| s.start_object(hint))?;
        while let Some(key) = map.next_key::<String>()? {
            feed.emit(quoted(&key), |s| s.key(key))?;
            map.next_value_seed(Token(&mut *feed))?;
        }
        feed.emit("}", |s| s.end_object())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<(), A::Error> {
        let feed = self.0;
        let hint = seq.size_hint();
        feed.emit("[", |s| s.start_array(hint))?;
        while let Some(()) = seq.next_element_seed(Token(&mut *feed))? {}
        feed.emit("]", |s| s.end_array())
    }
}

/// Feed every token of `reader` to `sink`, in document order.
///
/// Stops at the first error, whether raised by the sink or by malformed
/// input. Trailing non-whitespace after the document is a syntax error.
pub fn tokenize<R: Read, S: TokenSink>(reader: R, sink: &mut S) -> Result<()> {
    let consumed = Rc::new(Cell::new(0u64));
    let reader = CountingReader {
        inner: BufReader::new(reader),
        consumed: Rc::clone(&consumed),
    };
    let mut deserializer = serde_json::Deserializer::from_reader(reader);
    let mut feed = Feed {
        sink,
        last_token: String::new(),
        failure: None,
    };

    let outcome = Token(&mut feed)
        .deserialize(&mut deserializer)
        .and_then(|()| deserializer.end());

    match outcome {
        Ok(()) => Ok(()),
        Err(err) => match feed.failure.take() {
            Some(failure) => Err(failure),
            None if err.is_io() => Err(Error::Io(err.into())),
            None => Err(feed.sink.parse_error(consumed.get(), &feed.last_token, &err.to_string())),
        },
    }
}

/// [`tokenize`] over an in-memory document.
pub fn tokenize_str<S: TokenSink>(input: &str, sink: &mut S) -> Result<()> {
    tokenize(input.as_bytes(), sink)
}
