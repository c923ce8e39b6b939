//! Authorization payload appended to signed RPC requests.

use crate::{AuthBlobError, ErrorLocation};

use std::fmt;
use std::panic::Location;

use serde::ser::Error;
use zeroize::Zeroize;

/// Opaque authorization bytes that never show up in logs or debug output.
///
/// The RPC client appends the blob as the final envelope part when a call is
/// signed. The bytes are wiped when the value is dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthBlob {
    inner: Vec<u8>,
}

impl AuthBlob {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            inner: bytes.into(),
        }
    }

    /// Raw bytes for transmission.
    ///
    /// # Security Note
    /// Only call this when building the outgoing envelope.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    /// Blob length (safe to log).
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for AuthBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthBlob([REDACTED] {} bytes)", self.inner.len())
    }
}

impl fmt::Display for AuthBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED AUTH]")
    }
}

impl Drop for AuthBlob {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

impl serde::Serialize for AuthBlob {
    fn serialize<S>(&self, _serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        Err(S::Error::custom(AuthBlobError::Serialization {
            message: String::from("AuthBlob cannot be serialized - use as_bytes() explicitly"),
            location: ErrorLocation::from(Location::caller()),
        }))
    }
}
