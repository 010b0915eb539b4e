use std::fmt;

/// Structural violations in the key directory or its side arrays.
///
/// Any of these means the directory is malformed and no partial parse is
/// returned. Semantic checks (unknown codes, missing keys) belong to the
/// decoder, not this layer.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoKeyError {
    BadHeader,
    UnsupportedVersion(u16),
    ValueOutOfBounds {
        key: u16,
        offset: u16,
        count: u16,
    },
    BadKeyLocation {
        key: u16,
        location: u16,
    },
}

impl fmt::Display for GeoKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoKeyError::BadHeader => write!(f, "key directory header is truncated"),
            GeoKeyError::UnsupportedVersion(v) => {
                write!(f, "unsupported key directory version {v}")
            }
            GeoKeyError::ValueOutOfBounds { key, offset, count } => write!(
                f,
                "key {key} addresses [{offset}..{}] past the end of its value array",
                offset + count
            ),
            GeoKeyError::BadKeyLocation { key, location } => {
                write!(f, "key {key} references unknown location tag {location}")
            }
        }
    }
}

impl std::error::Error for GeoKeyError {}
