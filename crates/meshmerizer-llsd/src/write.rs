//! Binary LLSD serialization.

use crate::error::{LlsdError, LlsdResult};
use crate::value::Value;

/// Serialize `value` to binary LLSD without a preamble.
pub fn to_vec(value: &Value) -> LlsdResult<Vec<u8>> {
    let mut out = Vec::new();
    write_value(&mut out, value)?;
    Ok(out)
}

/// Append the binary encoding of `value` to `out`.
///
/// Fails only when a string, binary blob or container is longer than the
/// format's 32-bit length prefix can express.
pub fn write_value(out: &mut Vec<u8>, value: &Value) -> LlsdResult<()> {
    match value {
        Value::Undefined => out.push(b'!'),
        Value::Boolean(true) => out.push(b'1'),
        Value::Boolean(false) => out.push(b'0'),
        Value::Integer(i) => {
            out.push(b'i');
            out.extend_from_slice(&i.to_be_bytes());
        }
        Value::Real(r) => {
            out.push(b'r');
            out.extend_from_slice(&r.to_be_bytes());
        }
        Value::Date(d) => {
            out.push(b'd');
            out.extend_from_slice(&d.to_le_bytes());
        }
        Value::Uuid(id) => {
            out.push(b'u');
            out.extend_from_slice(id);
        }
        Value::Binary(bytes) => write_sized(out, b'b', bytes)?,
        Value::String(s) => write_sized(out, b's', s.as_bytes())?,
        Value::Uri(s) => write_sized(out, b'l', s.as_bytes())?,
        Value::Array(items) => {
            out.push(b'[');
            out.extend_from_slice(&len_u32(items.len())?.to_be_bytes());
            for item in items {
                write_value(out, item)?;
            }
            out.push(b']');
        }
        Value::Map(map) => {
            out.push(b'{');
            out.extend_from_slice(&len_u32(map.len())?.to_be_bytes());
            for (key, item) in map {
                write_sized(out, b'k', key.as_bytes())?;
                write_value(out, item)?;
            }
            out.push(b'}');
        }
    }
    Ok(())
}

fn write_sized(out: &mut Vec<u8>, marker: u8, bytes: &[u8]) -> LlsdResult<()> {
    out.push(marker);
    out.extend_from_slice(&len_u32(bytes.len())?.to_be_bytes());
    out.extend_from_slice(bytes);
    Ok(())
}

fn len_u32(len: usize) -> LlsdResult<u32> {
    u32::try_from(len).map_err(|_| LlsdError::TooLarge(len))
}
