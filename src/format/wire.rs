//! Tag-length-value wire primitives.
//!
//! The body encoding is protobuf-compatible: every field starts with a varint tag
//! `(field_number << 3) | wire_type`, followed by a varint, a fixed 4/8-byte value, or a
//! varint length and that many bytes.

use crate::foundation::error::{SvgaError, SvgaResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WireType {
    Varint,
    Fixed64,
    Len,
    Fixed32,
}

impl WireType {
    fn from_bits(bits: u64) -> SvgaResult<Self> {
        match bits {
            0 => Ok(Self::Varint),
            1 => Ok(Self::Fixed64),
            2 => Ok(Self::Len),
            5 => Ok(Self::Fixed32),
            other => Err(SvgaError::format(format!("unsupported wire type {other}"))),
        }
    }

    fn bits(self) -> u64 {
        match self {
            Self::Varint => 0,
            Self::Fixed64 => 1,
            Self::Len => 2,
            Self::Fixed32 => 5,
        }
    }
}

/// Cursor over one message body.
#[derive(Clone, Debug)]
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    fn take(&mut self, n: usize, what: &str) -> SvgaResult<&'a [u8]> {
        if n > self.remaining() {
            return Err(SvgaError::truncated(format!(
                "{what} needs {n} bytes at offset {}, {} remain",
                self.pos,
                self.remaining()
            )));
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub(crate) fn read_varint(&mut self) -> SvgaResult<u64> {
        let mut value = 0u64;
        for shift in (0..64).step_by(7) {
            let Some(&byte) = self.buf.get(self.pos) else {
                return Err(SvgaError::truncated(format!(
                    "varint runs past end of input at offset {}",
                    self.pos
                )));
            };
            self.pos += 1;
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(SvgaError::format("varint longer than 10 bytes"))
    }

    /// Read the next field tag. Returns `(field_number, wire_type)`.
    pub(crate) fn read_tag(&mut self) -> SvgaResult<(u32, WireType)> {
        let raw = self.read_varint()?;
        let field = u32::try_from(raw >> 3)
            .map_err(|_| SvgaError::format(format!("field number out of range in tag {raw}")))?;
        if field == 0 {
            return Err(SvgaError::format("field number 0 is reserved"));
        }
        Ok((field, WireType::from_bits(raw & 0x7)?))
    }

    pub(crate) fn read_fixed32(&mut self) -> SvgaResult<u32> {
        let b = self.take(4, "fixed32")?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn read_fixed64(&mut self) -> SvgaResult<u64> {
        let b = self.take(8, "fixed64")?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(b);
        Ok(u64::from_le_bytes(arr))
    }

    /// Read a length-delimited payload.
    pub(crate) fn read_len(&mut self) -> SvgaResult<&'a [u8]> {
        let len = self.read_varint()?;
        let len = usize::try_from(len)
            .map_err(|_| SvgaError::truncated(format!("declared length {len} exceeds input")))?;
        self.take(len, "length-delimited field")
    }

    pub(crate) fn read_string(&mut self) -> SvgaResult<String> {
        let bytes = self.read_len()?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| SvgaError::format(format!("invalid utf-8 string: {e}")))
    }

    /// Read a float-valued field, accepting either fixed32 (`float`) or fixed64 (`double`).
    pub(crate) fn read_float(&mut self, wt: WireType) -> SvgaResult<f64> {
        match wt {
            WireType::Fixed32 => Ok(f64::from(f32::from_bits(self.read_fixed32()?))),
            WireType::Fixed64 => Ok(f64::from_bits(self.read_fixed64()?)),
            other => Err(SvgaError::format(format!(
                "expected a float field, found {other:?}"
            ))),
        }
    }

    pub(crate) fn read_uint(&mut self, wt: WireType) -> SvgaResult<u64> {
        match wt {
            WireType::Varint => self.read_varint(),
            other => Err(SvgaError::format(format!(
                "expected a varint field, found {other:?}"
            ))),
        }
    }

    /// Skip a field whose number is not known to the caller.
    pub(crate) fn skip(&mut self, wt: WireType) -> SvgaResult<()> {
        match wt {
            WireType::Varint => self.read_varint().map(|_| ()),
            WireType::Fixed64 => self.take(8, "fixed64").map(|_| ()),
            WireType::Fixed32 => self.take(4, "fixed32").map(|_| ()),
            WireType::Len => self.read_len().map(|_| ()),
        }
    }
}

/// Append-only writer producing the same encoding [`Reader`] consumes.
#[derive(Debug, Default)]
pub(crate) struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub(crate) fn write_varint(&mut self, mut v: u64) {
        while v >= 0x80 {
            self.buf.push((v as u8) | 0x80);
            v >>= 7;
        }
        self.buf.push(v as u8);
    }

    fn write_tag(&mut self, field: u32, wt: WireType) {
        self.write_varint((u64::from(field) << 3) | wt.bits());
    }

    pub(crate) fn uint(&mut self, field: u32, v: u64) {
        self.write_tag(field, WireType::Varint);
        self.write_varint(v);
    }

    pub(crate) fn float(&mut self, field: u32, v: f64) {
        self.write_tag(field, WireType::Fixed32);
        self.buf.extend_from_slice(&(v as f32).to_bits().to_le_bytes());
    }

    pub(crate) fn bytes(&mut self, field: u32, v: &[u8]) {
        self.write_tag(field, WireType::Len);
        self.write_varint(v.len() as u64);
        self.buf.extend_from_slice(v);
    }

    pub(crate) fn string(&mut self, field: u32, v: &str) {
        self.bytes(field, v.as_bytes());
    }

    /// Write a nested message built by `f`.
    pub(crate) fn message(&mut self, field: u32, f: impl FnOnce(&mut Writer)) {
        let mut inner = Writer::new();
        f(&mut inner);
        self.bytes(field, &inner.buf);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/format/wire.rs"]
mod tests;
