use std::fmt::Display;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitKind {
    Angular,
    Linear,
}

/// A measurement unit with its conversion factor to the SI base:
/// radians for angular units, metres for linear ones.
#[derive(Clone, Debug, PartialEq)]
pub struct Unit {
    pub kind: UnitKind,
    pub name: String,
    pub factor: f64,
    pub authority_code: Option<u16>,
}

impl Unit {
    pub fn angular<S: Into<String>>(name: S, factor: f64) -> Self {
        Self {
            kind: UnitKind::Angular,
            name: name.into(),
            factor,
            authority_code: None,
        }
    }

    pub fn linear<S: Into<String>>(name: S, factor: f64) -> Self {
        Self {
            kind: UnitKind::Linear,
            name: name.into(),
            factor,
            authority_code: None,
        }
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.authority_code = Some(code);
        self
    }

    pub fn metre() -> Self {
        Self::linear("metre", 1.0).with_code(9001)
    }

    pub fn degree() -> Self {
        Self::angular("degree", 0.0174532925199433).with_code(9102)
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.factor)
    }
}
