//! Result codec: one byte buffer per operation outcome.
//!
//! Layout is a single tag byte followed by either the raw success payload or
//! the UTF-8 error message. Buffers crossing the bridge are base64 encoded
//! after encoding.

use crate::error::{ChainError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};

pub const OK_TAG: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorKind {
    Query = 1,
    Execute = 2,
}

impl ErrorKind {
    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(ErrorKind::Query),
            2 => Some(ErrorKind::Execute),
            _ => None,
        }
    }
}

pub fn encode_ok(payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(payload.len() + 1);
    buf.push(OK_TAG);
    buf.extend_from_slice(payload);
    buf
}

pub fn encode_err(kind: ErrorKind, message: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(message.len() + 1);
    buf.push(kind.tag());
    buf.extend_from_slice(message.as_bytes());
    buf
}

pub fn encode_ok_base64(payload: &[u8]) -> String {
    STANDARD.encode(encode_ok(payload))
}

pub fn encode_err_base64(kind: ErrorKind, message: &str) -> String {
    STANDARD.encode(encode_err(kind, message))
}

/// A decoded result buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawResult {
    Ok(Vec<u8>),
    Err { kind: ErrorKind, message: String },
}

impl RawResult {
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let (&tag, rest) = buf
            .split_first()
            .ok_or_else(|| ChainError::InvalidTransaction("empty result buffer".to_string()))?;
        if tag == OK_TAG {
            return Ok(RawResult::Ok(rest.to_vec()));
        }
        let kind = ErrorKind::from_tag(tag).ok_or_else(|| {
            ChainError::InvalidTransaction(format!("unknown result tag {}", tag))
        })?;
        Ok(RawResult::Err {
            kind,
            message: String::from_utf8_lossy(rest).into_owned(),
        })
    }

    pub fn from_base64(text: &str) -> Result<Self> {
        let buf = STANDARD.decode(text)?;
        Self::decode(&buf)
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, RawResult::Ok(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_is_first_byte() {
        assert_eq!(encode_ok(b"abc"), vec![0, b'a', b'b', b'c']);
        assert_eq!(encode_ok(&[]), vec![0]);
        assert_eq!(encode_err(ErrorKind::Query, "x"), vec![1, b'x']);
        assert_eq!(encode_err(ErrorKind::Execute, ""), vec![2]);
    }

    #[test]
    fn test_decode_base64_error_buffer() {
        let text = encode_err_base64(ErrorKind::Query, "No route found for `/a/b`");
        let decoded = RawResult::from_base64(&text).unwrap();
        assert_eq!(
            decoded,
            RawResult::Err {
                kind: ErrorKind::Query,
                message: "No route found for `/a/b`".to_string()
            }
        );
    }

    #[test]
    fn test_empty_success_payload() {
        let decoded = RawResult::from_base64(&encode_ok_base64(&[])).unwrap();
        assert_eq!(decoded, RawResult::Ok(Vec::new()));
        assert!(decoded.is_ok());
    }

    #[test]
    fn test_malformed_buffers() {
        assert!(RawResult::decode(&[]).is_err());
        assert!(RawResult::decode(&[9, 1, 2]).is_err());
        assert!(RawResult::from_base64("not base64!").is_err());
    }
}
