use crate::decode::DecodeError;
use crate::encode::EncodeError;
use crate::geokeys::GeoKeyError;
use crate::projstring::ProjError;
use crate::wkt::WktError;
use std::fmt;

pub type SrsResult<T> = Result<T, SrsError>;

/// Crate-level error, aggregating the per-module failures.
#[derive(Debug, Clone)]
pub enum SrsError {
    MalformedDirectory(GeoKeyError),
    Decode(DecodeError),
    Encode(EncodeError),
    Wkt(WktError),
    Proj(ProjError),
}

impl fmt::Display for SrsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SrsError::MalformedDirectory(e) => write!(f, "malformed key directory: {e}"),
            SrsError::Decode(e) => write!(f, "{e}"),
            SrsError::Encode(e) => write!(f, "{e}"),
            SrsError::Wkt(e) => write!(f, "WKT parse error: {e}"),
            SrsError::Proj(e) => write!(f, "proj string error: {e}"),
        }
    }
}

impl std::error::Error for SrsError {}

impl From<GeoKeyError> for SrsError {
    fn from(e: GeoKeyError) -> Self {
        SrsError::MalformedDirectory(e)
    }
}

impl From<DecodeError> for SrsError {
    fn from(e: DecodeError) -> Self {
        SrsError::Decode(e)
    }
}

impl From<EncodeError> for SrsError {
    fn from(e: EncodeError) -> Self {
        SrsError::Encode(e)
    }
}

impl From<WktError> for SrsError {
    fn from(e: WktError) -> Self {
        SrsError::Wkt(e)
    }
}

impl From<ProjError> for SrsError {
    fn from(e: ProjError) -> Self {
        SrsError::Proj(e)
    }
}
