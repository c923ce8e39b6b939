//! Packing of a multipart message into one binary buffer.
//!
//! Layout: `u32` big-endian part count, then for every part a `u32`
//! big-endian length followed by the part bytes.

use crate::error::transport::TransportError;
use crate::transport::Multipart;

use common::ErrorLocation;

use std::panic::Location;

const LEN_SIZE: usize = 4;

/// Upper bound on parts per message; real envelopes carry at most five.
pub const MAX_PARTS: usize = 64;

pub fn encode_multipart(parts: &[Vec<u8>]) -> Vec<u8> {
    let total: usize = parts.iter().map(|p| LEN_SIZE + p.len()).sum();
    let mut buf = Vec::with_capacity(LEN_SIZE + total);
    buf.extend_from_slice(&(parts.len() as u32).to_be_bytes());
    for part in parts {
        buf.extend_from_slice(&(part.len() as u32).to_be_bytes());
        buf.extend_from_slice(part);
    }
    buf
}

pub fn decode_multipart(buf: &[u8]) -> Result<Multipart, TransportError> {
    let mut cursor = 0usize;
    let count = read_len(buf, &mut cursor)?;
    if count > MAX_PARTS {
        return Err(TransportError::Frame {
            message: format!("Too many parts: {count} (max {MAX_PARTS})"),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    let mut parts = Vec::with_capacity(count);
    for index in 0..count {
        let len = read_len(buf, &mut cursor)?;
        let end = cursor.checked_add(len).filter(|end| *end <= buf.len()).ok_or_else(|| {
            TransportError::Frame {
                message: format!(
                    "Part {index} declares {len} bytes but only {} remain",
                    buf.len() - cursor
                ),
                location: ErrorLocation::from(Location::caller()),
            }
        })?;
        parts.push(buf[cursor..end].to_vec());
        cursor = end;
    }

    if cursor != buf.len() {
        return Err(TransportError::Frame {
            message: format!("{} trailing bytes after last part", buf.len() - cursor),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    Ok(parts)
}

fn read_len(buf: &[u8], cursor: &mut usize) -> Result<usize, TransportError> {
    let bytes: [u8; LEN_SIZE] = buf
        .get(*cursor..*cursor + LEN_SIZE)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| TransportError::Frame {
            message: format!("Truncated length field at offset {}", *cursor),
            location: ErrorLocation::from(Location::caller()),
        })?;
    *cursor += LEN_SIZE;
    Ok(u32::from_be_bytes(bytes) as usize)
}
