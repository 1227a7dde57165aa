//! Binary LLSD parsing.

use crate::error::{LlsdError, LlsdResult};
use crate::value::{Map, Value};
use crate::BINARY_HEADER;

/// Maximum nesting of arrays and maps accepted by the parser.
pub const MAX_DEPTH: usize = 64;

/// Parse one binary LLSD value from the front of `data`.
///
/// Returns the value and the number of bytes consumed, including the optional
/// [`BINARY_HEADER`] preamble. Anything after the value is left untouched,
/// which is how mesh assets locate the start of their body region.
pub fn from_slice(data: &[u8]) -> LlsdResult<(Value, usize)> {
    let mut reader = Reader { data, pos: 0 };
    if data.starts_with(BINARY_HEADER) {
        reader.pos = BINARY_HEADER.len();
    }
    let value = reader.value(0)?;
    Ok((value, reader.pos))
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> LlsdResult<&'a [u8]> {
        let remaining = self.data.len() - self.pos;
        if len > remaining {
            return Err(LlsdError::UnexpectedEof {
                offset: self.pos,
                needed: len - remaining,
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn byte(&mut self) -> LlsdResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn array<const N: usize>(&mut self) -> LlsdResult<[u8; N]> {
        let mut out = [0; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u32_be(&mut self) -> LlsdResult<usize> {
        Ok(u32::from_be_bytes(self.array()?) as usize)
    }

    fn sized(&mut self) -> LlsdResult<&'a [u8]> {
        let len = self.u32_be()?;
        self.take(len)
    }

    fn string(&mut self) -> LlsdResult<String> {
        let offset = self.pos;
        let bytes = self.sized()?;
        String::from_utf8(bytes.to_vec()).map_err(|_| LlsdError::InvalidUtf8 { offset })
    }

    fn expect(&mut self, terminator: u8) -> LlsdResult<()> {
        let offset = self.pos;
        match self.byte() {
            Ok(b) if b == terminator => Ok(()),
            Ok(_) | Err(LlsdError::UnexpectedEof { .. }) => Err(LlsdError::MissingTerminator {
                expected: char::from(terminator),
                offset,
            }),
            Err(e) => Err(e),
        }
    }

    fn value(&mut self, depth: usize) -> LlsdResult<Value> {
        let offset = self.pos;
        let marker = self.byte()?;
        let value = match marker {
            b'!' => Value::Undefined,
            b'1' => Value::Boolean(true),
            b'0' => Value::Boolean(false),
            b'i' => Value::Integer(i32::from_be_bytes(self.array()?)),
            b'r' => Value::Real(f64::from_be_bytes(self.array()?)),
            b'd' => Value::Date(f64::from_le_bytes(self.array()?)),
            b'u' => Value::Uuid(self.array()?),
            b'b' => Value::Binary(self.sized()?.to_vec()),
            b's' => Value::String(self.string()?),
            b'l' => Value::Uri(self.string()?),
            b'[' => {
                let depth = Self::nest(depth)?;
                let count = self.u32_be()?;
                // Every element takes at least one byte.
                let mut items = Vec::with_capacity(count.min(self.data.len() - self.pos));
                for _ in 0..count {
                    items.push(self.value(depth)?);
                }
                self.expect(b']')?;
                Value::Array(items)
            }
            b'{' => {
                let depth = Self::nest(depth)?;
                let count = self.u32_be()?;
                let mut map = Map::new();
                for _ in 0..count {
                    let key_offset = self.pos;
                    let key = match self.byte()? {
                        b'k' | b's' => self.string()?,
                        other => {
                            return Err(LlsdError::ExpectedKey {
                                marker: other,
                                offset: key_offset,
                            });
                        }
                    };
                    let value = self.value(depth)?;
                    map.insert(key, value);
                }
                self.expect(b'}')?;
                Value::Map(map)
            }
            other => {
                return Err(LlsdError::UnknownMarker {
                    marker: other,
                    offset,
                });
            }
        };
        Ok(value)
    }

    fn nest(depth: usize) -> LlsdResult<usize> {
        if depth >= MAX_DEPTH {
            return Err(LlsdError::TooDeep(MAX_DEPTH));
        }
        Ok(depth + 1)
    }
}
