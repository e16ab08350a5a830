//! Canonical JSON encoding.
//!
//! Validation, `save` and `submit` all go through [`to_canonical_string`] so
//! the document that was checked is byte-for-byte the document that is
//! written or sent. Layout: four-space indentation, `": "` between a key and
//! its value, one element per line, keys in struct declaration order.

use crate::error::CardError;
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{PrettyFormatter, Serializer};

const INDENT: &[u8] = b"    ";

/// Encode `value` as canonical JSON text.
pub fn to_canonical_string<T: Serialize + ?Sized>(value: &T) -> Result<String, CardError> {
    let mut buf = Vec::with_capacity(1024);
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    value.serialize(&mut ser)?;
    // serde_json only ever emits valid UTF-8
    String::from_utf8(buf).map_err(|e| CardError::invalid_input(e.to_string()))
}

/// Encode `value` canonically and parse the text back into a JSON tree.
///
/// This is what the schema validator sees; going through the text rather
/// than `serde_json::to_value` keeps the checked document identical to the
/// persisted one.
pub fn to_canonical_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, CardError> {
    let text = to_canonical_string(value)?;
    Ok(serde_json::from_str(&text)?)
}
