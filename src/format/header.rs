use crate::foundation::error::{SvgaError, SvgaResult};
use crate::model::FormatVersion;

/// Container magic.
pub const MAGIC: [u8; 4] = *b"SVGA";

/// Fixed header length: magic, major, minor.
pub const HEADER_LEN: usize = 6;

/// Parsed fixed header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub version: FormatVersion,
    pub minor: u8,
}

/// Inspect the fixed header and report which schema version the body uses.
///
/// Fails with [`SvgaError::Format`] on a short buffer or bad magic and with
/// [`SvgaError::Version`] when the major version is not one this crate decodes.
pub fn sniff_version(bytes: &[u8]) -> SvgaResult<Header> {
    if bytes.len() < HEADER_LEN {
        return Err(SvgaError::format(format!(
            "header needs {HEADER_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    if bytes[..4] != MAGIC {
        return Err(SvgaError::format("bad magic"));
    }
    let (major, minor) = (bytes[4], bytes[5]);
    let version =
        FormatVersion::from_major(major).ok_or(SvgaError::Version { major, minor })?;
    Ok(Header { version, minor })
}

pub(crate) fn write_header(out: &mut Vec<u8>, version: FormatVersion) {
    out.extend_from_slice(&MAGIC);
    out.push(version.major());
    out.push(0);
}
