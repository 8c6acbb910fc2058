//! MessagePack codec helpers.
//!
//! Thin wrappers around `rmp-serde` for appending values to a buffer and
//! reading them back one at a time.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ArchiveError;

/// Append the MessagePack encoding of `value` to `buf`.
///
/// # Errors
///
/// Returns [`ArchiveError::Encode`] if serialisation fails.
pub fn encode_into<T: Serialize + ?Sized>(buf: &mut Vec<u8>, value: &T) -> Result<(), ArchiveError> {
    rmp_serde::encode::write(buf, value).map_err(ArchiveError::Encode)
}

/// Decode one value from the front of `bytes`.
///
/// Returns the value and the number of bytes it occupied.
///
/// # Errors
///
/// Returns [`ArchiveError::Exhausted`] if `bytes` is empty, or
/// [`ArchiveError::Decode`] if deserialisation fails.
pub fn decode_prefix<T: DeserializeOwned>(bytes: &[u8]) -> Result<(T, usize), ArchiveError> {
    if bytes.is_empty() {
        return Err(ArchiveError::Exhausted);
    }
    let mut reader = bytes;
    let value = rmp_serde::from_read(&mut reader).map_err(ArchiveError::Decode)?;
    Ok((value, bytes.len() - reader.len()))
}
