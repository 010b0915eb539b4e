//! The coordinate reference system object graph.
//!
//! Everything here is an immutable value object; the codec modules build and
//! consume these without sharing state. Authority codes are carried as
//! metadata: a component may keep its code while one of its fields has been
//! overridden away from the authority definition.

use std::collections::BTreeMap;
use std::fmt::Display;

mod method;
mod unit;

pub use method::{ProjMethod, ProjParam};
pub use unit::{Unit, UnitKind};

/// Relative tolerance for the semantic-equivalence comparison.
pub const SAME_TOLERANCE: f64 = 1e-10;

#[derive(Clone, Debug, PartialEq)]
pub enum Crs {
    Geographic2D(GeographicCrs),
    Geographic3D(GeographicCrs),
    Projected(ProjectedCrs),
    Geocentric(GeocentricCrs),
    Vertical(VerticalCrs),
    Compound(CompoundCrs),
    Local(LocalCrs),
    Unknown,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Ellipsoid {
    pub name: String,
    pub authority_code: Option<u16>,
    pub semi_major: f64,
    /// Zero means a sphere.
    pub inv_flattening: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PrimeMeridian {
    pub name: String,
    pub authority_code: Option<u16>,
    /// Degrees east of Greenwich.
    pub longitude: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Datum {
    pub name: String,
    pub authority_code: Option<u16>,
    pub ellipsoid: Ellipsoid,
    pub towgs84: Option<[f64; 7]>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AxisOrder {
    #[default]
    Standard,
    Reversed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeographicCrs {
    pub name: String,
    pub authority_code: Option<u16>,
    pub datum: Datum,
    pub prime_meridian: PrimeMeridian,
    pub angular_unit: Unit,
    pub axis_order: AxisOrder,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    pub method: ProjMethod,
    pub parameters: BTreeMap<ProjParam, f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProjectedCrs {
    pub name: String,
    pub authority_code: Option<u16>,
    pub geographic: GeographicCrs,
    pub projection: Projection,
    pub linear_unit: Unit,
    pub axis_order: AxisOrder,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeocentricCrs {
    pub name: String,
    pub authority_code: Option<u16>,
    pub datum: Datum,
    pub prime_meridian: PrimeMeridian,
    pub linear_unit: Unit,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VerticalDatum {
    pub name: String,
    pub authority_code: Option<u16>,
    /// Legacy WKT vertical datum type code (2005 = geoid model).
    pub datum_type: u16,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VerticalCrs {
    pub name: String,
    pub authority_code: Option<u16>,
    pub datum: VerticalDatum,
    pub unit: Unit,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompoundCrs {
    pub name: String,
    pub horizontal: Box<Crs>,
    pub vertical: Box<Crs>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LocalCrs {
    pub name: String,
    pub linear_unit: Unit,
}

impl Ellipsoid {
    pub fn new<S: Into<String>>(name: S, semi_major: f64, inv_flattening: f64) -> Self {
        Self {
            name: name.into(),
            authority_code: None,
            semi_major,
            inv_flattening,
        }
    }

    pub fn from_semi_minor<S: Into<String>>(name: S, semi_major: f64, semi_minor: f64) -> Self {
        let inv_flattening = if semi_minor == semi_major {
            0.0
        } else {
            semi_major / (semi_major - semi_minor)
        };
        Self::new(name, semi_major, inv_flattening)
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.authority_code = Some(code);
        self
    }

    pub fn is_sphere(&self) -> bool {
        self.inv_flattening == 0.0
    }

    pub fn semi_minor(&self) -> f64 {
        if self.is_sphere() {
            self.semi_major
        } else {
            self.semi_major * (1.0 - 1.0 / self.inv_flattening)
        }
    }
}

impl PrimeMeridian {
    pub fn greenwich() -> Self {
        Self {
            name: "Greenwich".to_string(),
            authority_code: Some(8901),
            longitude: 0.0,
        }
    }

    pub fn new<S: Into<String>>(name: S, longitude: f64) -> Self {
        Self {
            name: name.into(),
            authority_code: None,
            longitude,
        }
    }
}

impl Datum {
    pub fn new<S: Into<String>>(name: S, ellipsoid: Ellipsoid) -> Self {
        Self {
            name: name.into(),
            authority_code: None,
            ellipsoid,
            towgs84: None,
        }
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.authority_code = Some(code);
        self
    }

    pub fn with_towgs84(mut self, towgs84: [f64; 7]) -> Self {
        self.towgs84 = Some(towgs84);
        self
    }
}

impl Projection {
    pub fn new(method: ProjMethod) -> Self {
        Self {
            method,
            parameters: BTreeMap::new(),
        }
    }

    pub fn with(mut self, param: ProjParam, value: f64) -> Self {
        self.parameters.insert(param, value);
        self
    }

    /// Missing parameters read as zero, matching how they are stored.
    pub fn parameter(&self, param: ProjParam) -> f64 {
        self.parameters.get(&param).copied().unwrap_or(0.0)
    }
}

impl Crs {
    pub fn name(&self) -> Option<&str> {
        match self {
            Crs::Geographic2D(gcs) | Crs::Geographic3D(gcs) => Some(&gcs.name),
            Crs::Projected(pcs) => Some(&pcs.name),
            Crs::Geocentric(ccs) => Some(&ccs.name),
            Crs::Vertical(vcs) => Some(&vcs.name),
            Crs::Compound(compound) => Some(&compound.name),
            Crs::Local(local) => Some(&local.name),
            Crs::Unknown => None,
        }
    }

    pub fn authority_code(&self) -> Option<u16> {
        match self {
            Crs::Geographic2D(gcs) | Crs::Geographic3D(gcs) => gcs.authority_code,
            Crs::Projected(pcs) => pcs.authority_code,
            Crs::Geocentric(ccs) => ccs.authority_code,
            Crs::Vertical(vcs) => vcs.authority_code,
            Crs::Compound(_) | Crs::Local(_) | Crs::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Crs::Unknown)
    }

    /// Semantic equivalence: structural comparison with numeric fields at
    /// [`SAME_TOLERANCE`] relative tolerance, parameter maps unordered, and
    /// authority codes treated as informative only. Names are not compared
    /// except for local systems, where the name is the only content.
    pub fn is_same(&self, other: &Crs) -> bool {
        match (self, other) {
            (Crs::Geographic2D(a), Crs::Geographic2D(b))
            | (Crs::Geographic3D(a), Crs::Geographic3D(b)) => same_geographic(a, b),
            (Crs::Projected(a), Crs::Projected(b)) => {
                a.projection.method == b.projection.method
                    && same_parameters(&a.projection, &b.projection)
                    && same_unit(&a.linear_unit, &b.linear_unit)
                    && same_geographic(&a.geographic, &b.geographic)
            }
            (Crs::Geocentric(a), Crs::Geocentric(b)) => {
                same_datum(&a.datum, &b.datum)
                    && nearly(a.prime_meridian.longitude, b.prime_meridian.longitude)
                    && same_unit(&a.linear_unit, &b.linear_unit)
            }
            (Crs::Vertical(a), Crs::Vertical(b)) => same_vertical(a, b),
            (Crs::Compound(a), Crs::Compound(b)) => {
                a.horizontal.is_same(&b.horizontal) && a.vertical.is_same(&b.vertical)
            }
            (Crs::Local(a), Crs::Local(b)) => {
                a.name == b.name && same_unit(&a.linear_unit, &b.linear_unit)
            }
            (Crs::Unknown, Crs::Unknown) => true,
            _ => false,
        }
    }
}

impl GeographicCrs {
    /// True while this definition still matches the authority one; a datum
    /// shift override alone does not break the match.
    pub fn matches_authority(&self, authority: &GeographicCrs) -> bool {
        let mut authority = authority.clone();
        authority.datum.towgs84 = self.datum.towgs84;
        Crs::Geographic2D(self.clone()).is_same(&Crs::Geographic2D(authority))
    }
}

impl ProjectedCrs {
    pub fn matches_authority(&self, authority: &ProjectedCrs) -> bool {
        let mut authority = authority.clone();
        authority.geographic.datum.towgs84 = self.geographic.datum.towgs84;
        Crs::Projected(self.clone()).is_same(&Crs::Projected(authority))
    }
}

fn nearly(a: f64, b: f64) -> bool {
    (a - b).abs() <= SAME_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

fn same_unit(a: &Unit, b: &Unit) -> bool {
    a.kind == b.kind && nearly(a.factor, b.factor)
}

fn same_ellipsoid(a: &Ellipsoid, b: &Ellipsoid) -> bool {
    nearly(a.semi_major, b.semi_major) && nearly(a.inv_flattening, b.inv_flattening)
}

fn same_datum(a: &Datum, b: &Datum) -> bool {
    let zero = [0.0; 7];
    let towgs84_same = match (&a.towgs84, &b.towgs84) {
        (None, None) => true,
        (Some(x), Some(y)) => x.iter().zip(y.iter()).all(|(p, q)| nearly(*p, *q)),
        // An all-zero shift is indistinguishable from an absent one.
        (Some(x), None) | (None, Some(x)) => *x == zero,
    };
    same_ellipsoid(&a.ellipsoid, &b.ellipsoid) && towgs84_same
}

fn same_geographic(a: &GeographicCrs, b: &GeographicCrs) -> bool {
    same_datum(&a.datum, &b.datum)
        && nearly(a.prime_meridian.longitude, b.prime_meridian.longitude)
        && same_unit(&a.angular_unit, &b.angular_unit)
}

fn same_vertical(a: &VerticalCrs, b: &VerticalCrs) -> bool {
    same_unit(&a.unit, &b.unit)
        && (a.datum.authority_code.is_none()
            || b.datum.authority_code.is_none()
            || a.datum.authority_code == b.datum.authority_code)
}

fn same_parameters(a: &Projection, b: &Projection) -> bool {
    a.parameters
        .keys()
        .chain(b.parameters.keys())
        .all(|param| nearly(a.parameter(*param), b.parameter(*param)))
}

impl Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Crs::Geographic2D(gcs) => write!(f, "Geographic2D({})", gcs.name),
            Crs::Geographic3D(gcs) => write!(f, "Geographic3D({})", gcs.name),
            Crs::Projected(pcs) => write!(f, "Projected({})", pcs.name),
            Crs::Geocentric(ccs) => write!(f, "Geocentric({})", ccs.name),
            Crs::Vertical(vcs) => write!(f, "Vertical({})", vcs.name),
            Crs::Compound(compound) => write!(
                f,
                "Compound({} + {})",
                compound.horizontal, compound.vertical
            ),
            Crs::Local(local) => write!(f, "Local({})", local.name),
            Crs::Unknown => write!(f, "Unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wgs84() -> GeographicCrs {
        GeographicCrs {
            name: "WGS 84".to_string(),
            authority_code: Some(4326),
            datum: Datum::new(
                "World Geodetic System 1984",
                Ellipsoid::new("WGS 84", 6378137.0, 298.257223563).with_code(7030),
            )
            .with_code(6326),
            prime_meridian: PrimeMeridian::greenwich(),
            angular_unit: Unit::degree(),
            axis_order: AxisOrder::default(),
        }
    }

    #[test]
    fn same_ignores_authority_codes() {
        let a = Crs::Geographic2D(wgs84());
        let mut anonymous = wgs84();
        anonymous.authority_code = None;
        anonymous.datum.authority_code = None;
        let b = Crs::Geographic2D(anonymous);
        assert!(a.is_same(&b));
    }

    #[test]
    fn same_tolerates_tiny_numeric_noise() {
        let a = Crs::Geographic2D(wgs84());
        let mut noisy = wgs84();
        noisy.datum.ellipsoid.semi_major += 1e-7;
        let b = Crs::Geographic2D(noisy);
        assert!(a.is_same(&b));
    }

    #[test]
    fn same_detects_datum_shift_difference() {
        let a = Crs::Geographic2D(wgs84());
        let mut shifted = wgs84();
        shifted.datum.towgs84 = Some([584.8, 67.0, 400.3, 0.105, 0.013, -2.378, 10.29]);
        let b = Crs::Geographic2D(shifted);
        assert!(!a.is_same(&b));
    }

    #[test]
    fn zero_towgs84_matches_absent() {
        let a = Crs::Geographic2D(wgs84());
        let mut zeroed = wgs84();
        zeroed.datum.towgs84 = Some([0.0; 7]);
        let b = Crs::Geographic2D(zeroed);
        assert!(a.is_same(&b));
    }

    #[test]
    fn dimension_mismatch_differs() {
        let a = Crs::Geographic2D(wgs84());
        let b = Crs::Geographic3D(wgs84());
        assert!(!a.is_same(&b));
    }

    #[test]
    fn semi_minor_round_trip() {
        let ellipsoid = Ellipsoid::new("WGS 84", 6378137.0, 298.257223563);
        let back =
            Ellipsoid::from_semi_minor("WGS 84", ellipsoid.semi_major, ellipsoid.semi_minor());
        assert!((back.inv_flattening - 298.257223563).abs() < 1e-6);
    }

    #[test]
    fn sphere_has_equal_axes() {
        let sphere = Ellipsoid::new("sphere", 6370997.0, 0.0);
        assert!(sphere.is_sphere());
        assert_eq!(sphere.semi_minor(), 6370997.0);
    }
}
