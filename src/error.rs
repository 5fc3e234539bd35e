//! Error types for the bulletin decoding crate.
use std::error::Error;
use std::fmt;

/// An error indicating text that does not follow the WMO bulletin format.
///
/// Almost nothing inside a message body is fatal; malformed groups decode to
/// missing values and truncated messages yield the records accumulated so
/// far. This type is reserved for structural failures, such as a file with no
/// decodable message in it at all, or a token that is not a known message
/// type.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BulletinFormatError {}

impl BulletinFormatError {
    /// Create a new `BulletinFormatError`.
    pub fn new() -> BulletinFormatError {
        BulletinFormatError {}
    }
}

impl fmt::Display for BulletinFormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid WMO bulletin format")
    }
}

impl Error for BulletinFormatError {}
