use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum WktError {
    UnexpectedEnd,
    Unexpected { position: usize, found: char },
    BadNumber { position: usize },
    UnknownRoot(String),
    UnknownProjection(String),
    Missing(&'static str),
}

impl fmt::Display for WktError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WktError::UnexpectedEnd => write!(f, "unexpected end of input"),
            WktError::Unexpected { position, found } => {
                write!(f, "unexpected character '{found}' at offset {position}")
            }
            WktError::BadNumber { position } => {
                write!(f, "malformed number at offset {position}")
            }
            WktError::UnknownRoot(keyword) => write!(f, "unknown root keyword {keyword}"),
            WktError::UnknownProjection(name) => write!(f, "unknown projection {name}"),
            WktError::Missing(what) => write!(f, "missing {what}"),
        }
    }
}

impl std::error::Error for WktError {}
