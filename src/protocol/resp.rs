//! RESP2 reply parsing and request encoding
//!
//! [`parse`] is incremental: it looks at the bytes buffered so far and either
//! returns one complete reply together with the number of bytes it consumed,
//! or `Ok(None)` when more input is required. It never blocks and never
//! consumes a partial reply, so callers can keep appending socket reads to
//! the same buffer.

use std::fmt;
use thiserror::Error;

/// Maximum nesting depth accepted for array replies
pub const MAX_DEPTH: usize = 8;

/// Maximum length accepted for a single bulk string (512 MB, the store's own limit)
const MAX_BULK_LEN: i64 = 512 * 1024 * 1024;

/// Errors raised for input that can never become a valid reply
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProtocolError {
    #[error("unknown reply type byte 0x{0:02x}")]
    UnknownType(u8),

    #[error("invalid length field: {0}")]
    InvalidLength(String),

    #[error("invalid integer reply: {0}")]
    InvalidInteger(String),

    #[error("bulk string is not terminated by CRLF")]
    MissingTerminator,

    #[error("array nesting deeper than {MAX_DEPTH} levels")]
    TooDeep,
}

/// A single decoded reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// `+OK`
    Simple(String),
    /// `-ERR ...`
    Error(String),
    /// `:42`
    Integer(i64),
    /// `$3\r\nfoo` or the null bulk string `$-1`
    Bulk(Option<Vec<u8>>),
    /// `*2\r\n...` or the null array `*-1`
    Array(Option<Vec<RespValue>>),
}

impl RespValue {
    /// Interpret the value as text, if it is a simple or bulk string
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Simple(s) => Some(s.clone()),
            Self::Bulk(Some(bytes)) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        }
    }

    /// Borrow the elements of a non-null array
    #[must_use]
    pub fn as_array(&self) -> Option<&[RespValue]> {
        match self {
            Self::Array(Some(items)) => Some(items),
            _ => None,
        }
    }

    /// Check whether the value is the `+OK` status reply
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Simple(s) if s == "OK")
    }
}

impl fmt::Display for RespValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(s) => write!(f, "+{}", s),
            Self::Error(s) => write!(f, "-{}", s),
            Self::Integer(n) => write!(f, ":{}", n),
            Self::Bulk(None) | Self::Array(None) => f.write_str("(nil)"),
            Self::Bulk(Some(bytes)) => write!(f, "{:?}", String::from_utf8_lossy(bytes)),
            Self::Array(Some(items)) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Encode a command as an array of bulk strings
///
/// ```
/// use queue_scouter::protocol::encode_command;
///
/// assert_eq!(encode_command(&["PING"]), b"*1\r\n$4\r\nPING\r\n");
/// ```
#[must_use]
pub fn encode_command<S: AsRef<[u8]>>(args: &[S]) -> Vec<u8> {
    let payload: usize = args.iter().map(|a| a.as_ref().len() + 16).sum();
    let mut out = Vec::with_capacity(16 + payload);
    out.extend_from_slice(format!("*{}\r\n", args.len()).as_bytes());
    for arg in args {
        let arg = arg.as_ref();
        out.extend_from_slice(format!("${}\r\n", arg.len()).as_bytes());
        out.extend_from_slice(arg);
        out.extend_from_slice(b"\r\n");
    }
    out
}

/// Parse one reply from the front of `buf`
///
/// Returns `Ok(Some((value, consumed)))` for a complete reply, `Ok(None)`
/// when the buffer holds only a prefix of a reply, and an error for input
/// that can never become valid.
pub fn parse(buf: &[u8]) -> Result<Option<(RespValue, usize)>, ProtocolError> {
    parse_at(buf, 0, 0)
}

fn parse_at(
    buf: &[u8],
    pos: usize,
    depth: usize,
) -> Result<Option<(RespValue, usize)>, ProtocolError> {
    let Some(&type_byte) = buf.get(pos) else {
        return Ok(None);
    };
    let Some((line, after_line)) = read_line(buf, pos + 1) else {
        return Ok(None);
    };

    match type_byte {
        b'+' => Ok(Some((RespValue::Simple(lossy(line)), after_line))),
        b'-' => Ok(Some((RespValue::Error(lossy(line)), after_line))),
        b':' => {
            let n = parse_int(line).ok_or_else(|| ProtocolError::InvalidInteger(lossy(line)))?;
            Ok(Some((RespValue::Integer(n), after_line)))
        }
        b'$' => {
            let len = parse_len(line)?;
            if len < 0 {
                return Ok(Some((RespValue::Bulk(None), after_line)));
            }
            if len > MAX_BULK_LEN {
                return Err(ProtocolError::InvalidLength(lossy(line)));
            }
            let len = len as usize;
            let end = after_line + len;
            if buf.len() < end + 2 {
                return Ok(None);
            }
            if &buf[end..end + 2] != b"\r\n" {
                return Err(ProtocolError::MissingTerminator);
            }
            Ok(Some((
                RespValue::Bulk(Some(buf[after_line..end].to_vec())),
                end + 2,
            )))
        }
        b'*' => {
            let len = parse_len(line)?;
            if len < 0 {
                return Ok(Some((RespValue::Array(None), after_line)));
            }
            if depth >= MAX_DEPTH {
                return Err(ProtocolError::TooDeep);
            }
            let mut items = Vec::with_capacity((len as usize).min(64));
            let mut cursor = after_line;
            for _ in 0..len {
                match parse_at(buf, cursor, depth + 1)? {
                    Some((item, next)) => {
                        items.push(item);
                        cursor = next;
                    }
                    None => return Ok(None),
                }
            }
            Ok(Some((RespValue::Array(Some(items)), cursor)))
        }
        other => Err(ProtocolError::UnknownType(other)),
    }
}

/// Find the CRLF-terminated line starting at `start`
fn read_line(buf: &[u8], start: usize) -> Option<(&[u8], usize)> {
    let rest = buf.get(start..)?;
    let mut offset = 0;
    while let Some(idx) = memchr::memchr(b'\r', &rest[offset..]) {
        let cr = offset + idx;
        match rest.get(cr + 1) {
            Some(b'\n') => return Some((&rest[..cr], start + cr + 2)),
            Some(_) => offset = cr + 1,
            None => return None,
        }
    }
    None
}

fn parse_int(line: &[u8]) -> Option<i64> {
    std::str::from_utf8(line).ok()?.parse().ok()
}

fn parse_len(line: &[u8]) -> Result<i64, ProtocolError> {
    match parse_int(line) {
        Some(n) if n >= -1 => Ok(n),
        _ => Err(ProtocolError::InvalidLength(lossy(line))),
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
